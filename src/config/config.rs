use std::path::Path;
use anyhow::Error;
use serde::{Deserialize, Serialize};
use crate::error::RecognitionError;

/// Pixel thresholds used by the landmark geometry rules. They are tied to the
/// camera framing (a 640x480 capture by default).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GeometryConfig {
    /// How far a fingertip must sit left of its pip joint to count as pointing sideways.
    pub sideways_margin_px: f32,
    /// Maximum index-tip to middle-dip horizontal spread that still reads as "U" rather than "V".
    pub spread_margin_px: f32,
    /// How far the thumb tip must sit left of its ip joint to count as extended.
    pub thumb_margin_px: f32,
}

impl GeometryConfig {
    pub fn new() -> Self {
        GeometryConfig {
            sideways_margin_px: 25.0,
            spread_margin_px: 50.0,
            thumb_margin_px: 20.0,
        }
    }
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FusionConfig {
    /// Above this the model wins an unlisted disagreement.
    pub confident_model_threshold: f32,
    /// Frames are reported when the model confidence exceeds this or a letter was resolved.
    pub report_confidence_threshold: f32,
    /// Letters where the geometry rules beat the model on a low-confidence disagreement.
    pub reliable_geometry_letters: Vec<char>,
}

impl FusionConfig {
    pub fn new() -> Self {
        FusionConfig {
            confident_model_threshold: 0.7,
            report_confidence_threshold: 0.3,
            reliable_geometry_letters: vec!['A', 'B', 'C', 'D', 'Y'],
        }
    }
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WordConfig {
    /// Confirmations closer together than this are the same held pose.
    pub letter_pause_secs: f64,
    /// A gap longer than this starts a new word.
    pub space_pause_secs: f64,
    /// A gap longer than this clears the word before the next letter. Disabled when `None`.
    pub idle_reset_secs: Option<f64>,
    /// Upper bound on the assembled word, in characters.
    pub max_word_len: usize,
}

impl WordConfig {
    pub fn new() -> Self {
        WordConfig {
            letter_pause_secs: 1.0,
            space_pause_secs: 2.5,
            idle_reset_secs: None,
            max_word_len: 256,
        }
    }
}

impl Default for WordConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClassifierConfig {
    pub model_name: String,
    /// Inference deadline in milliseconds.
    pub timeout: u64,
    /// Side of the square pose frame handed to the model.
    pub imsize: usize,
    pub top_k: usize,
}

impl ClassifierConfig {
    pub fn new() -> Self {
        ClassifierConfig {
            model_name: "asl_wireframe".to_string(),
            timeout: 500,
            imsize: 64,
            top_k: 3,
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    pub geometry: GeometryConfig,
    pub fusion: FusionConfig,
    pub word: WordConfig,
    pub classifier: ClassifierConfig,
    /// Which tracked hand to classify when several are reported.
    pub hand_index: usize,
    /// Capacity of a session worker's result channel.
    pub result_buffer: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        PipelineConfig {
            geometry: GeometryConfig::new(),
            fusion: FusionConfig::new(),
            word: WordConfig::new(),
            classifier: ClassifierConfig::new(),
            hand_index: 0,
            result_buffer: 32,
        }
    }

    /// from_json_str parses and validates a configuration. Missing fields take their defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, Error> {
        let config: PipelineConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// from_json_file reads a configuration file, see [`PipelineConfig::from_json_str`].
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&raw)
    }

    /// validate returns the first out-of-range setting.
    pub fn validate(&self) -> Result<(), RecognitionError> {
        let geometry = &self.geometry;
        for (name, value) in [
            ("sideways_margin_px", geometry.sideways_margin_px),
            ("spread_margin_px", geometry.spread_margin_px),
            ("thumb_margin_px", geometry.thumb_margin_px),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(RecognitionError::Config(format!("{name} must be a non-negative number, got {value}")))
            }
        }

        let fusion = &self.fusion;
        for (name, value) in [
            ("confident_model_threshold", fusion.confident_model_threshold),
            ("report_confidence_threshold", fusion.report_confidence_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(RecognitionError::Config(format!("{name} must be in [0, 1], got {value}")))
            }
        }

        let word = &self.word;
        if !word.letter_pause_secs.is_finite() || word.letter_pause_secs < 0.0 {
            return Err(RecognitionError::Config(format!(
                "letter_pause_secs must be a non-negative number, got {}", word.letter_pause_secs
            )))
        }
        if !word.space_pause_secs.is_finite() || word.space_pause_secs < word.letter_pause_secs {
            return Err(RecognitionError::Config(format!(
                "space_pause_secs must be at least letter_pause_secs, got {}", word.space_pause_secs
            )))
        }
        if let Some(idle) = word.idle_reset_secs {
            if !idle.is_finite() || idle < word.space_pause_secs {
                return Err(RecognitionError::Config(format!(
                    "idle_reset_secs must be at least space_pause_secs, got {idle}"
                )))
            }
        }
        if word.max_word_len == 0 {
            return Err(RecognitionError::Config("max_word_len must be > 0".to_string()))
        }

        let classifier = &self.classifier;
        if !(1..=26).contains(&classifier.top_k) {
            return Err(RecognitionError::Config(format!("top_k must be in 1..=26, got {}", classifier.top_k)))
        }
        if classifier.imsize < 2 {
            return Err(RecognitionError::Config(format!("imsize must be at least 2, got {}", classifier.imsize)))
        }
        if classifier.timeout == 0 {
            return Err(RecognitionError::Config("timeout must be > 0".to_string()))
        }
        if self.result_buffer == 0 {
            return Err(RecognitionError::Config("result_buffer must be > 0".to_string()))
        }
        Ok(())
    }
}
