use serde::{Deserialize, Serialize};
use tracing::debug;
use crate::config::config::GeometryConfig;
use crate::error::RecognitionError;
use crate::utils::coordinate::{Coordinate2D, LandmarkSet, FINGER_JOINTS, HAND_LANDMARK_COUNT, PINKY_TIP, RING_TIP, THUMB_IP, THUMB_TIP};

/// Discretised bend of a non-thumb finger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FingerCurlState {
    Folded,
    HalfCurled,
    SidewaysExtended,
    Extended,
}

/// Curl states of `[index, middle, ring, pinky]`. `None` marks a finger whose
/// pose matched no curl state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FingerVector(pub [Option<FingerCurlState>; 4]);

impl FingerVector {
    /// count returns how many determined fingers are in `state`.
    pub fn count(&self, state: FingerCurlState) -> usize {
        self.0.iter().filter(|s| **s == Some(state)).count()
    }

    /// get returns the state at `pos`, or `None` when it is out of range or undetermined.
    pub fn get(&self, pos: usize) -> Option<FingerCurlState> {
        self.0.get(pos).copied().flatten()
    }

    /// is reports whether finger `pos` is in `state`. Missing positions never match.
    pub fn is(&self, pos: usize, state: FingerCurlState) -> bool {
        self.get(pos) == Some(state)
    }

    /// require returns the state at `pos` or the reason it is missing.
    pub fn require(&self, pos: usize) -> Result<FingerCurlState, RecognitionError> {
        self.get(pos).ok_or(RecognitionError::FingerUndetermined { finger: pos })
    }

    pub fn determined(&self) -> usize {
        self.0.iter().filter(|s| s.is_some()).count()
    }
}

/// Binary `[thumb, index, middle, ring, pinky]` extension vector, `true` = extended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExtensionVector(pub [bool; 5]);

impl ExtensionVector {
    pub fn from_bits(bits: [u8; 5]) -> Self {
        ExtensionVector(bits.map(|b| b != 0))
    }

    pub fn bits(&self) -> [u8; 5] {
        self.0.map(u8::from)
    }
}

/// LandmarkFacts holds everything the rule sets read from one hand.
///
/// The finger and extension vectors are computed once per frame. Coordinate
/// comparisons are crate-internal and only take landmark index constants.
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkFacts {
    points: [Coordinate2D; HAND_LANDMARK_COUNT],
    fingers: FingerVector,
    extension: ExtensionVector,
    spread_margin_px: f32,
}

impl LandmarkFacts {
    /// extract derives the facts of one landmark set.
    ///
    /// Fails closed with [`RecognitionError::InsufficientLandmarks`] when fewer
    /// than 21 landmarks are present. Callers treat that as "no hand".
    ///
    /// # Arguments
    /// * `landmarks` - &LandmarkSet
    /// * `config` - &GeometryConfig
    ///
    /// # Returns
    /// * `Result<LandmarkFacts, RecognitionError>`
    pub fn extract(landmarks: &LandmarkSet, config: &GeometryConfig) -> Result<Self, RecognitionError> {
        if !landmarks.is_complete() {
            return Err(RecognitionError::InsufficientLandmarks { found: landmarks.len() })
        }

        let mut points = [Coordinate2D::default(); HAND_LANDMARK_COUNT];
        points.copy_from_slice(&landmarks.points()[..HAND_LANDMARK_COUNT]);

        let ring_above_pinky = points[RING_TIP].y < points[PINKY_TIP].y;
        let mut fingers = [None; 4];
        for (slot, &(pip, dip, tip)) in fingers.iter_mut().zip(FINGER_JOINTS.iter()) {
            *slot = curl_state(&points[pip], &points[dip], &points[tip], ring_above_pinky, config.sideways_margin_px);
        }
        let fingers = FingerVector(fingers);

        let thumb_extended = points[THUMB_IP].x - points[THUMB_TIP].x > config.thumb_margin_px;
        let mut extension = [thumb_extended, false, false, false, false];
        for pos in 0..4 {
            extension[pos + 1] = fingers.is(pos, FingerCurlState::Extended);
        }

        Ok(LandmarkFacts {
            points,
            fingers,
            extension: ExtensionVector(extension),
            spread_margin_px: config.spread_margin_px,
        })
    }

    pub fn fingers(&self) -> &FingerVector {
        &self.fingers
    }

    pub fn extension(&self) -> &ExtensionVector {
        &self.extension
    }

    /// left_of reports whether landmark `a` sits strictly left of landmark `b`.
    pub(crate) fn left_of(&self, a: usize, b: usize) -> bool {
        self.points[a].x < self.points[b].x
    }

    /// above reports whether landmark `a` sits strictly above landmark `b` (smaller y).
    pub(crate) fn above(&self, a: usize, b: usize) -> bool {
        self.points[a].y < self.points[b].y
    }

    pub fn count(&self, state: FingerCurlState) -> usize {
        self.fingers.count(state)
    }

    /// finger_is reports whether finger `pos` is in `state`. An undetermined
    /// finger never satisfies the check.
    pub fn finger_is(&self, pos: usize, state: FingerCurlState) -> bool {
        match self.fingers.require(pos) {
            Ok(current) => current == state,
            Err(e) => {
                debug!("finger check not satisfied: {e}");
                false
            }
        }
    }

    /// within_spread reports whether `x(a) - x(b)` stays within the configured spread margin.
    pub fn within_spread(&self, a: usize, b: usize) -> bool {
        self.points[a].x - self.points[b].x <= self.spread_margin_px
    }
}

fn curl_state(
    pip: &Coordinate2D,
    dip: &Coordinate2D,
    tip: &Coordinate2D,
    ring_above_pinky: bool,
    sideways_margin: f32,
) -> Option<FingerCurlState> {
    if tip.x + sideways_margin < pip.x && ring_above_pinky {
        Some(FingerCurlState::SidewaysExtended)
    } else if tip.y > pip.y {
        Some(FingerCurlState::Folded)
    } else if tip.y < dip.y {
        Some(FingerCurlState::Extended)
    } else if tip.x > dip.x && tip.x > pip.x {
        Some(FingerCurlState::HalfCurled)
    } else {
        None
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::utils::coordinate::{Coordinate2D, LandmarkSet, HAND_LANDMARK_COUNT};

    /// HandBuilder starts from a closed fist with the thumb tucked up in front
    /// of the index finger and lets tests move individual landmarks.
    pub struct HandBuilder {
        points: [Coordinate2D; HAND_LANDMARK_COUNT],
    }

    impl HandBuilder {
        pub fn fist() -> Self {
            let mut points = [Coordinate2D::default(); HAND_LANDMARK_COUNT];
            points[0] = Coordinate2D::new(150.0, 300.0);
            // thumb: cmc, mcp, ip, tip
            points[1] = Coordinate2D::new(60.0, 260.0);
            points[2] = Coordinate2D::new(70.0, 220.0);
            points[3] = Coordinate2D::new(110.0, 160.0);
            points[4] = Coordinate2D::new(120.0, 140.0);
            for (finger, x) in [100.0, 130.0, 160.0, 190.0].iter().enumerate() {
                let base = 5 + finger * 4;
                points[base] = Coordinate2D::new(*x, 200.0);
                points[base + 1] = Coordinate2D::new(*x, 150.0);
                points[base + 2] = Coordinate2D::new(*x, 170.0);
                points[base + 3] = Coordinate2D::new(*x, 190.0);
            }
            HandBuilder { points }
        }

        /// extended straightens finger `pos` (0 = index) upward.
        pub fn extended(mut self, pos: usize) -> Self {
            let base = 5 + pos * 4;
            let x = self.points[base].x;
            self.points[base + 1] = Coordinate2D::new(x, 150.0);
            self.points[base + 2] = Coordinate2D::new(x, 120.0);
            self.points[base + 3] = Coordinate2D::new(x, 90.0);
            self
        }

        /// half_curled hooks finger `pos` forward: tip level with the joints and to their right.
        pub fn half_curled(mut self, pos: usize) -> Self {
            let base = 5 + pos * 4;
            let x = self.points[base].x;
            self.points[base + 1] = Coordinate2D::new(x, 150.0);
            self.points[base + 2] = Coordinate2D::new(x + 5.0, 140.0);
            self.points[base + 3] = Coordinate2D::new(x + 15.0, 145.0);
            self
        }

        /// sideways points finger `pos` to the left, level with its pip joint.
        pub fn sideways(mut self, pos: usize) -> Self {
            let base = 5 + pos * 4;
            let x = self.points[base].x;
            self.points[base + 1] = Coordinate2D::new(x, 150.0);
            self.points[base + 2] = Coordinate2D::new(x - 20.0, 150.0);
            self.points[base + 3] = Coordinate2D::new(x - 40.0, 150.0);
            self
        }

        /// undetermined leaves finger `pos` between states: tip level with the
        /// pip, below the dip and left of both joints.
        pub fn undetermined(mut self, pos: usize) -> Self {
            let base = 5 + pos * 4;
            let x = self.points[base].x;
            self.points[base + 1] = Coordinate2D::new(x, 150.0);
            self.points[base + 2] = Coordinate2D::new(x, 140.0);
            self.points[base + 3] = Coordinate2D::new(x - 5.0, 150.0);
            self
        }

        pub fn at(mut self, idx: usize, x: f32, y: f32) -> Self {
            self.points[idx] = Coordinate2D::new(x, y);
            self
        }

        pub fn build(self) -> LandmarkSet {
            LandmarkSet::new(self.points.to_vec())
        }
    }
}
