use anyhow::Error;
use serde::{Deserialize, Serialize};
use tracing::debug;
use crate::config::config::{PipelineConfig, WordConfig};
use crate::helper::landmark_facts::LandmarkFacts;
use crate::modules::geometry_classifier::GeometryLetterClassifier;
use crate::modules::hand_tracker::HandTracker;
use crate::modules::learned_classifier::{ClassNames, ClassifierClient, LearnedClassifier, ModelPrediction};
use crate::modules::shape_classifier::{ShapeLabel, StaticShapeClassifier};
use crate::pipeline::fusion::{ConflictTable, FusionResolver, FusionRule};
use crate::pipeline::word_assembler::WordAssembler;
use crate::utils::coordinate::{HandFrame, LandmarkSet};

/// FrameResult is what the pipeline reports for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameResult {
    pub confirmed_letter: Option<char>,
    pub confidence: f32,
    pub model_prediction: Option<char>,
    pub geometry_prediction: Option<char>,
    pub geometry_word: Option<ShapeLabel>,
    pub alternatives: Vec<(char, f32)>,
    pub word: String,
    pub timestamp: f64,
    pub fusion_rule: FusionRule,
}

/// RecognitionSession holds the state of one signing session.
#[derive(Debug, Clone)]
pub struct RecognitionSession {
    assembler: WordAssembler,
    last_timestamp: Option<f64>,
}

impl RecognitionSession {
    pub fn new(config: WordConfig) -> Self {
        RecognitionSession { assembler: WordAssembler::new(config), last_timestamp: None }
    }

    pub fn word(&self) -> &str {
        self.assembler.word()
    }

    /// last_timestamp is the timestamp of the newest frame applied to the session.
    pub fn last_timestamp(&self) -> Option<f64> {
        self.last_timestamp
    }

    /// reset clears the word. Frame ordering is kept.
    pub fn reset(&mut self) {
        self.assembler.reset();
    }

    /// accept records `timestamp` if it is finite and newer than every frame seen so far.
    fn accept(&mut self, timestamp: f64) -> bool {
        if !timestamp.is_finite() {
            return false
        }
        match self.last_timestamp {
            Some(last) if timestamp <= last => false,
            _ => {
                self.last_timestamp = Some(timestamp);
                true
            }
        }
    }
}

/// ASLPipeline runs the letter classifiers over hand frames and feeds the
/// results into a session's word.
#[derive(Debug, Clone)]
pub struct ASLPipeline<C> {
    geometry: GeometryLetterClassifier,
    shapes: StaticShapeClassifier,
    fusion: FusionResolver,
    classifier: ClassifierClient<C>,
    config: PipelineConfig,
}

impl<C: LearnedClassifier> ASLPipeline<C> {

    /// new initializes the pipeline with the default conflict table.
    ///
    /// # Arguments
    /// * `classifier` - the learned letter model
    /// * `class_names` - the model's output alphabet
    /// * `config` - PipelineConfig
    ///
    /// # Returns
    /// * `Result<ASLPipeline<C>, Error>` - fails on an invalid configuration
    pub fn new(classifier: C, class_names: ClassNames, config: PipelineConfig) -> Result<Self, Error> {
        Self::with_conflicts(classifier, class_names, config, ConflictTable::default())
    }

    /// with_conflicts is [`ASLPipeline::new`] with a custom conflict table.
    pub fn with_conflicts(
        classifier: C,
        class_names: ClassNames,
        config: PipelineConfig,
        conflicts: ConflictTable,
    ) -> Result<Self, Error> {
        config.validate()?;
        Ok(ASLPipeline {
            geometry: GeometryLetterClassifier::new(config.geometry.clone()),
            shapes: StaticShapeClassifier::new(config.geometry.clone()),
            fusion: FusionResolver::new(config.fusion.clone(), conflicts),
            classifier: ClassifierClient::new(classifier, class_names, config.classifier.clone()),
            config,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// new_session returns an empty session using this pipeline's word settings.
    pub fn new_session(&self) -> RecognitionSession {
        RecognitionSession::new(self.config.word.clone())
    }

    /// process_frame classifies the configured hand of `frame` and updates the session.
    ///
    /// Returns `None` for frames that are out of order, have no complete hand,
    /// or fall below the reporting gate.
    pub async fn process_frame(&self, session: &mut RecognitionSession, frame: HandFrame) -> Option<FrameResult> {
        if !session.accept(frame.timestamp) {
            debug!(timestamp = frame.timestamp, last = ?session.last_timestamp, "dropped out-of-order or non-finite frame");
            return None
        }
        let hand = match frame.hands.into_iter().nth(self.config.hand_index) {
            Some(hand) => hand,
            None => {
                debug!(timestamp = frame.timestamp, hand_index = self.config.hand_index, "no hand at index");
                return None
            }
        };
        self.process_landmarks(session, &hand.landmarks, frame.timestamp).await
    }

    /// process_landmarks runs one hand through the classifiers, assuming the
    /// frame has already been accepted by the session.
    async fn process_landmarks(
        &self,
        session: &mut RecognitionSession,
        landmarks: &LandmarkSet,
        timestamp: f64,
    ) -> Option<FrameResult> {
        let facts = match LandmarkFacts::extract(landmarks, &self.config.geometry) {
            Ok(facts) => facts,
            Err(e) => {
                debug!(timestamp, "skipped frame: {e}");
                return None
            }
        };
        let geometry = self.geometry.classify_facts(&facts);
        let shape = self.shapes.classify_vector(facts.extension());

        let prediction = self.classifier
            .predict(landmarks)
            .await
            .unwrap_or_else(|_| ModelPrediction::empty());

        let outcome = self.fusion.resolve(prediction.letter, prediction.confidence, prediction.top, geometry);
        if !outcome.is_reportable(self.fusion.config()) {
            return None
        }
        if let Some(letter) = outcome.resolved {
            session.assembler.confirm(letter, timestamp);
        }

        Some(FrameResult {
            confirmed_letter: outcome.resolved,
            confidence: outcome.confidence,
            model_prediction: outcome.model,
            geometry_prediction: outcome.geometry,
            geometry_word: shape,
            alternatives: outcome.alternatives,
            word: session.word().to_string(),
            timestamp,
            fusion_rule: outcome.rule,
        })
    }

    /// process_image runs a hand tracker on a camera image and processes the result.
    ///
    /// # Arguments
    /// * `tracker` - HandTracker
    /// * `session` - &mut RecognitionSession
    /// * `image` - encoded image bytes
    /// * `timestamp` - capture time in seconds
    ///
    /// # Returns
    /// * `Result<Option<FrameResult>, Error>` - errors only when the tracker fails
    pub async fn process_image<T: HandTracker + ?Sized>(
        &self,
        tracker: &T,
        session: &mut RecognitionSession,
        image: &[u8],
        timestamp: f64,
    ) -> Result<Option<FrameResult>, Error> {
        let hands = tracker.detect(image).await?;
        Ok(self.process_frame(session, HandFrame { hands, timestamp }).await)
    }
}
