use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use anyhow::Error;
use async_trait::async_trait;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::warn;
use crate::config::config::ClassifierConfig;
use crate::error::RecognitionError;
use crate::utils::conversion::normalize_pose;
use crate::utils::coordinate::LandmarkSet;
use crate::utils::utils::{argsort_desc, u8_to_f32_vec};

/// LearnedClassifier is the boundary to the trained letter model.
///
/// It receives the hand as an `(n, 2)` pose normalised into the model's square
/// input frame (see [`crate::utils::conversion::normalize_pose`]) and returns
/// one probability per class, in the order of the model's class-name list.
#[async_trait]
pub trait LearnedClassifier: Send + Sync {
    async fn classify(&self, pose: &Array2<f32>) -> Result<Array1<f32>, Error>;
}

#[async_trait]
impl<T: LearnedClassifier + ?Sized> LearnedClassifier for Arc<T> {
    async fn classify(&self, pose: &Array2<f32>) -> Result<Array1<f32>, Error> {
        (**self).classify(pose).await
    }
}

/// The model's alphabet, one letter per output index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassNames {
    names: Vec<char>,
}

impl ClassNames {
    pub fn new(names: Vec<char>) -> Result<Self, RecognitionError> {
        if names.is_empty() {
            return Err(RecognitionError::InvalidClassNames("class list is empty".to_string()))
        }
        Ok(ClassNames { names })
    }

    /// parse reads a newline-separated class list. Blank lines are skipped and
    /// every other line must hold exactly one letter.
    pub fn parse(raw: &str) -> Result<Self, RecognitionError> {
        let mut names = Vec::new();
        for (lineno, line) in raw.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let mut chars = line.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => names.push(c.to_ascii_uppercase()),
                _ => {
                    return Err(RecognitionError::InvalidClassNames(format!(
                        "line {}: expected a single letter, got {line:?}", lineno + 1
                    )))
                }
            }
        }
        Self::new(names)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Ok(Self::parse(&raw)?)
    }

    /// alphabet returns the default A-Z class list.
    pub fn alphabet() -> Self {
        ClassNames { names: ('A'..='Z').collect() }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<char> {
        self.names.get(idx).copied()
    }
}

/// ModelPrediction is the ranked output of the learned classifier for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPrediction {
    pub letter: Option<char>,
    pub confidence: f32,
    /// Best classes first; confidences need not sum to one.
    pub top: Vec<(char, f32)>,
}

impl ModelPrediction {
    /// empty is the prediction used when no model output is available.
    pub fn empty() -> Self {
        ModelPrediction { letter: None, confidence: 0.0, top: vec![] }
    }

    /// from_distribution ranks a probability vector against the class names.
    ///
    /// # Arguments
    /// * `distribution` - one probability per class
    /// * `names` - &ClassNames
    /// * `k` - number of alternatives to keep
    ///
    /// # Returns
    /// * `Result<ModelPrediction, RecognitionError>`
    pub fn from_distribution(distribution: &Array1<f32>, names: &ClassNames, k: usize) -> Result<Self, RecognitionError> {
        if distribution.len() != names.len() {
            return Err(RecognitionError::MissingModelOutput(format!(
                "model returned {} scores for {} classes", distribution.len(), names.len()
            )))
        }
        if distribution.iter().any(|p| !p.is_finite()) {
            return Err(RecognitionError::MissingModelOutput("model returned non-finite scores".to_string()))
        }

        let scores = distribution.to_vec();
        let top: Vec<(char, f32)> = argsort_desc(&scores)
            .into_iter()
            .take(k)
            .filter_map(|idx| names.get(idx).map(|c| (c, scores[idx].clamp(0.0, 1.0))))
            .collect();

        let (letter, confidence) = match top.first() {
            Some((c, p)) => (Some(*c), *p),
            None => (None, 0.0),
        };
        Ok(ModelPrediction { letter, confidence, top })
    }

    /// from_raw_output decodes a little-endian f32 output tensor before ranking it.
    pub fn from_raw_output(raw: &[u8], names: &ClassNames, k: usize) -> Result<Self, RecognitionError> {
        let scores = Array1::from(u8_to_f32_vec(raw));
        Self::from_distribution(&scores, names, k)
    }
}

/// ClassifierClient wraps a [`LearnedClassifier`] with its class names and deadline.
#[derive(Debug, Clone)]
pub struct ClassifierClient<C> {
    classifier: C,
    class_names: ClassNames,
    pub model_name: String,
    pub timeout: u64,
    pub imsize: usize,
    pub top_k: usize,
}

impl<C: LearnedClassifier> ClassifierClient<C> {
    pub fn new(classifier: C, class_names: ClassNames, config: ClassifierConfig) -> Self {
        ClassifierClient {
            classifier,
            class_names,
            model_name: config.model_name,
            timeout: config.timeout,
            imsize: config.imsize,
            top_k: config.top_k,
        }
    }

    pub fn class_names(&self) -> &ClassNames {
        &self.class_names
    }

    /// pose_input lays the landmarks out in the square frame the model was trained on.
    pub fn pose_input(&self, landmarks: &LandmarkSet) -> Result<Array2<f32>, Error> {
        normalize_pose(landmarks, self.imsize)
    }

    /// predict normalises one hand and runs the model on it, bounded by the
    /// configured timeout.
    ///
    /// Failures and timeouts are reported as [`RecognitionError::MissingModelOutput`].
    pub async fn predict(&self, landmarks: &LandmarkSet) -> Result<ModelPrediction, RecognitionError> {
        let pose = self.pose_input(landmarks)
            .map_err(|e| RecognitionError::MissingModelOutput(format!("no pose input: {e}")))?;
        let deadline = Duration::from_millis(self.timeout);
        let distribution = match tokio::time::timeout(deadline, self.classifier.classify(&pose)).await {
            Ok(Ok(distribution)) => distribution,
            Ok(Err(e)) => {
                warn!(model = %self.model_name, "learned classifier failed: {e:#}");
                return Err(RecognitionError::MissingModelOutput(e.to_string()))
            }
            Err(_) => {
                warn!(model = %self.model_name, timeout_ms = self.timeout, "learned classifier timed out");
                return Err(RecognitionError::MissingModelOutput(format!("timed out after {}ms", self.timeout)))
            }
        };
        ModelPrediction::from_distribution(&distribution, &self.class_names, self.top_k)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::sync::Mutex;
    use std::time::Duration;
    use anyhow::Error;
    use async_trait::async_trait;
    use ndarray::{Array1, Array2};
    use crate::modules::learned_classifier::LearnedClassifier;

    /// FixedClassifier returns the same A-Z distribution for every hand and
    /// remembers the last pose it was given.
    pub struct FixedClassifier {
        pub scores: Vec<f32>,
        pub delay: Option<Duration>,
        pub fail: bool,
        pub last_pose: Mutex<Option<Array2<f32>>>,
    }

    impl FixedClassifier {
        /// peaked puts `confidence` on `letter` and spreads a little on `runner_up`.
        pub fn peaked(letter: char, confidence: f32, runner_up: char) -> Self {
            let mut scores = vec![0.0; 26];
            scores[(letter as u8 - b'A') as usize] = confidence;
            scores[(runner_up as u8 - b'A') as usize] = (1.0 - confidence) / 2.0;
            FixedClassifier { scores, delay: None, fail: false, last_pose: Mutex::new(None) }
        }
    }

    #[async_trait]
    impl LearnedClassifier for FixedClassifier {
        async fn classify(&self, pose: &Array2<f32>) -> Result<Array1<f32>, Error> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail {
                return Err(Error::msg("model offline"))
            }
            if let Ok(mut last) = self.last_pose.lock() {
                *last = Some(pose.clone());
            }
            Ok(Array1::from(self.scores.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;
    use ndarray::Array1;
    use crate::config::config::ClassifierConfig;
    use crate::error::RecognitionError;
    use crate::modules::learned_classifier::fixtures::FixedClassifier;
    use crate::modules::learned_classifier::{ClassNames, ClassifierClient, ModelPrediction};
    use crate::helper::landmark_facts::fixtures::HandBuilder;
    use crate::utils::coordinate::{Coordinate2D, LandmarkSet};

    #[test]
    fn test_parse_class_names() {
        let names = ClassNames::parse("A\nb\n\n  C \n").unwrap();
        assert_eq!(names.len(), 3);
        assert_eq!(names.get(1), Some('B'));
        assert_eq!(names.get(2), Some('C'));

        assert!(matches!(ClassNames::parse("A\ndel\n"), Err(RecognitionError::InvalidClassNames(_))));
        assert!(ClassNames::parse("\n\n").is_err());
    }

    #[test]
    fn test_load_class_names() {
        let path = std::env::temp_dir().join(format!("asl_class_names_{}.txt", std::process::id()));
        std::fs::write(&path, "A\nB\nC\n").unwrap();
        let names = ClassNames::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(names, ClassNames::new(vec!['A', 'B', 'C']).unwrap());
    }

    #[test]
    fn test_top_k_from_distribution() {
        let names = ClassNames::new(vec!['A', 'B', 'C', 'D']).unwrap();
        let dist = Array1::from(vec![0.1, 0.6, 0.05, 0.25]);
        let pred = ModelPrediction::from_distribution(&dist, &names, 3).unwrap();
        assert_eq!(pred.letter, Some('B'));
        assert_eq!(pred.confidence, 0.6);
        assert_eq!(pred.top, vec![('B', 0.6), ('D', 0.25), ('A', 0.1)]);
    }

    #[test]
    fn test_distribution_shape_mismatch() {
        let names = ClassNames::alphabet();
        let dist = Array1::from(vec![0.5, 0.5]);
        assert!(matches!(
            ModelPrediction::from_distribution(&dist, &names, 3),
            Err(RecognitionError::MissingModelOutput(_))
        ));
        let dist = Array1::from(vec![f32::NAN; 26]);
        assert!(ModelPrediction::from_distribution(&dist, &names, 3).is_err());
    }

    #[test]
    fn test_from_raw_output() {
        let names = ClassNames::new(vec!['X', 'Y']).unwrap();
        let mut raw = Vec::new();
        raw.extend_from_slice(&0.25f32.to_le_bytes());
        raw.extend_from_slice(&0.75f32.to_le_bytes());
        let pred = ModelPrediction::from_raw_output(&raw, &names, 3).unwrap();
        assert_eq!(pred.letter, Some('Y'));
        assert_eq!(pred.top.len(), 2);
    }

    #[tokio::test]
    async fn test_client_predict() {
        let client = ClassifierClient::new(FixedClassifier::peaked('K', 0.8, 'V'), ClassNames::alphabet(), ClassifierConfig::new());
        let pred = client.predict(&HandBuilder::fist().build()).await.unwrap();
        assert_eq!(pred.letter, Some('K'));
        assert_eq!(pred.top[1].0, 'V');
    }

    #[test]
    fn test_pose_input_uses_imsize() {
        let config = ClassifierConfig { imsize: 32, ..ClassifierConfig::new() };
        let client = ClassifierClient::new(FixedClassifier::peaked('A', 0.9, 'S'), ClassNames::alphabet(), config);
        let set = LandmarkSet::new(vec![Coordinate2D::new(0.0, 0.0), Coordinate2D::new(10.0, 10.0)]);
        let pose = client.pose_input(&set).unwrap();
        assert_eq!(pose.shape(), &[2, 2]);
        assert!((pose[[1, 0]] - 31.0).abs() < 1e-3);
    }

    #[tokio::test]
    async fn test_predict_feeds_normalised_pose() {
        let config = ClassifierConfig { imsize: 32, ..ClassifierConfig::new() };
        let client = ClassifierClient::new(FixedClassifier::peaked('A', 0.9, 'S'), ClassNames::alphabet(), config);
        client.predict(&HandBuilder::fist().build()).await.unwrap();

        let pose = client.classifier.last_pose.lock().unwrap().clone().unwrap();
        assert_eq!(pose.shape(), &[21, 2]);
        let max = pose.iter().cloned().fold(f32::MIN, f32::max);
        let min = pose.iter().cloned().fold(f32::MAX, f32::min);
        assert!((max - 31.0).abs() < 1e-3);
        assert!(min >= 0.0);
    }

    #[tokio::test]
    async fn test_empty_hand_never_reaches_model() {
        let client = ClassifierClient::new(FixedClassifier::peaked('A', 0.9, 'S'), ClassNames::alphabet(), ClassifierConfig::new());
        let err = client.predict(&LandmarkSet::default()).await.unwrap_err();
        assert!(matches!(err, RecognitionError::MissingModelOutput(_)));
        assert!(client.classifier.last_pose.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_client_failure_is_missing_output() {
        let mut model = FixedClassifier::peaked('K', 0.8, 'V');
        model.fail = true;
        let client = ClassifierClient::new(model, ClassNames::alphabet(), ClassifierConfig::new());
        assert!(matches!(client.predict(&HandBuilder::fist().build()).await, Err(RecognitionError::MissingModelOutput(_))));
    }

    #[tokio::test]
    async fn test_client_timeout_is_missing_output() {
        let mut model = FixedClassifier::peaked('K', 0.8, 'V');
        model.delay = Some(Duration::from_millis(200));
        let config = ClassifierConfig { timeout: 10, ..ClassifierConfig::new() };
        let client = ClassifierClient::new(model, ClassNames::alphabet(), config);
        let err = client.predict(&HandBuilder::fist().build()).await.unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }
}
