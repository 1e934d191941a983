use serde::{Deserialize, Serialize};
use crate::config::config::GeometryConfig;
use crate::helper::landmark_facts::{ExtensionVector, LandmarkFacts};
use crate::utils::coordinate::LandmarkSet;

/// Whole-hand shapes recognised from the extension vector alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShapeLabel {
    ThankYou,
    ThumbsUp,
    Ily,
    Shaka,
    RockOn,
    Ok,
}

impl ShapeLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShapeLabel::ThankYou => "THANK_YOU",
            ShapeLabel::ThumbsUp => "THUMBS_UP",
            ShapeLabel::Ily => "ILY",
            ShapeLabel::Shaka => "SHAKA",
            ShapeLabel::RockOn => "ROCK_ON",
            ShapeLabel::Ok => "OK",
        }
    }
}

impl std::fmt::Display for ShapeLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// [thumb, index, middle, ring, pinky]
const EXACT_SHAPES: [([u8; 5], ShapeLabel); 5] = [
    ([1, 1, 1, 1, 1], ShapeLabel::ThankYou),
    ([1, 0, 0, 0, 0], ShapeLabel::ThumbsUp),
    ([1, 1, 0, 0, 1], ShapeLabel::Ily),
    ([1, 0, 0, 0, 1], ShapeLabel::Shaka),
    ([0, 1, 0, 0, 1], ShapeLabel::RockOn),
];

/// StaticShapeClassifier names a hand shape from its extension vector.
///
/// Exact vectors are checked first; the OK sign only looks at the middle,
/// ring and pinky fingers and would otherwise shadow THANK_YOU.
#[derive(Debug, Clone, Default)]
pub struct StaticShapeClassifier {
    config: GeometryConfig,
}

impl StaticShapeClassifier {
    pub fn new(config: GeometryConfig) -> Self {
        StaticShapeClassifier { config }
    }

    pub fn classify(&self, landmarks: &LandmarkSet) -> Option<ShapeLabel> {
        let facts = LandmarkFacts::extract(landmarks, &self.config).ok()?;
        self.classify_vector(facts.extension())
    }

    pub fn classify_vector(&self, vector: &ExtensionVector) -> Option<ShapeLabel> {
        let bits = vector.bits();
        if let Some((_, label)) = EXACT_SHAPES.iter().find(|(pattern, _)| *pattern == bits) {
            return Some(*label)
        }
        if bits[2] == 1 && bits[3] == 1 && bits[4] == 1 {
            return Some(ShapeLabel::Ok)
        }
        None
    }
}
