use serde::{Deserialize, Serialize};

/// Number of landmarks in a complete hand.
pub const HAND_LANDMARK_COUNT: usize = 21;

pub const WRIST: usize = 0;
pub const THUMB_CMC: usize = 1;
pub const THUMB_MCP: usize = 2;
pub const THUMB_IP: usize = 3;
pub const THUMB_TIP: usize = 4;
pub const INDEX_MCP: usize = 5;
pub const INDEX_PIP: usize = 6;
pub const INDEX_DIP: usize = 7;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_DIP: usize = 11;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP: usize = 13;
pub const RING_PIP: usize = 14;
pub const RING_DIP: usize = 15;
pub const RING_TIP: usize = 16;
pub const PINKY_MCP: usize = 17;
pub const PINKY_PIP: usize = 18;
pub const PINKY_DIP: usize = 19;
pub const PINKY_TIP: usize = 20;

/// (pip, dip, tip) landmark indices of the index, middle, ring and pinky fingers.
pub const FINGER_JOINTS: [(usize, usize, usize); 4] = [
    (INDEX_PIP, INDEX_DIP, INDEX_TIP),
    (MIDDLE_PIP, MIDDLE_DIP, MIDDLE_TIP),
    (RING_PIP, RING_DIP, RING_TIP),
    (PINKY_PIP, PINKY_DIP, PINKY_TIP),
];

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Coordinate2D {
    pub x: f32,
    pub y: f32,
}

impl Coordinate2D {
    pub fn new(x: f32, y: f32) -> Self {
        Coordinate2D { x, y }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BoundingBox {
    pub x_min: f32,
    pub y_min: f32,
    pub x_max: f32,
    pub y_max: f32,
}

impl BoundingBox {
    pub fn width(&self) -> f32 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f32 {
        self.y_max - self.y_min
    }
}

/// LandmarkSet is the ordered list of pixel-space points tracked for one hand.
///
/// Index `i` holds the anatomical landmark `i` (see the `WRIST`..`PINKY_TIP`
/// constants). A set holding fewer than [`HAND_LANDMARK_COUNT`] points is
/// treated as "no hand" by every classifier.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct LandmarkSet {
    points: Vec<Coordinate2D>,
}

impl LandmarkSet {
    /// new wraps the given points without validation.
    pub fn new(points: Vec<Coordinate2D>) -> Self {
        LandmarkSet { points }
    }

    /// from_indexed_rows builds a set from the tracker's `[id, x, y]` rows.
    ///
    /// Rows may arrive in any order and ids outside `0..21` are ignored. When an
    /// id repeats, the last row wins. The set stops at the first missing id, so
    /// a gap leaves an incomplete set rather than shifting later landmarks.
    ///
    /// # Arguments
    /// * `rows` - &[[f32; 3]]
    ///
    /// # Returns
    /// * `LandmarkSet`
    pub fn from_indexed_rows(rows: &[[f32; 3]]) -> Self {
        let mut slots: [Option<Coordinate2D>; HAND_LANDMARK_COUNT] = [None; HAND_LANDMARK_COUNT];
        for row in rows {
            if row[0] < 0.0 || row[0].fract() != 0.0 {
                continue;
            }
            let id = row[0] as usize;
            if id < HAND_LANDMARK_COUNT {
                slots[id] = Some(Coordinate2D::new(row[1], row[2]));
            }
        }

        let points = slots.iter().map_while(|slot| *slot).collect();
        LandmarkSet { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// is_complete reports whether all 21 landmarks are present.
    pub fn is_complete(&self) -> bool {
        self.points.len() >= HAND_LANDMARK_COUNT
    }

    pub fn get(&self, idx: usize) -> Option<&Coordinate2D> {
        self.points.get(idx)
    }

    pub fn points(&self) -> &[Coordinate2D] {
        &self.points
    }

    /// bounding_box returns the extremes of all tracked points, or `None` for an empty set.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let first = self.points.first()?;
        let init = BoundingBox { x_min: first.x, y_min: first.y, x_max: first.x, y_max: first.y };
        Some(self.points.iter().fold(init, |bbox, p| BoundingBox {
            x_min: bbox.x_min.min(p.x),
            y_min: bbox.y_min.min(p.y),
            x_max: bbox.x_max.max(p.x),
            y_max: bbox.y_max.max(p.y),
        }))
    }
}

/// TrackedHand is one hand reported by the hand tracker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackedHand {
    pub landmarks: LandmarkSet,
    pub bbox: Option<BoundingBox>,
}

impl TrackedHand {
    /// from_landmarks derives the bounding box from the landmarks themselves.
    pub fn from_landmarks(landmarks: LandmarkSet) -> Self {
        let bbox = landmarks.bounding_box();
        TrackedHand { landmarks, bbox }
    }
}

/// HandFrame is everything the tracker reported for one captured frame.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HandFrame {
    pub hands: Vec<TrackedHand>,
    /// Capture time in seconds.
    pub timestamp: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_indexed_rows_reorders() {
        let mut rows: Vec<[f32; 3]> = (0..21).map(|i| [i as f32, i as f32 * 2.0, i as f32 * 3.0]).collect();
        rows.reverse();
        let set = LandmarkSet::from_indexed_rows(&rows);
        assert!(set.is_complete());
        assert_eq!(set.get(THUMB_TIP), Some(&Coordinate2D::new(8.0, 12.0)));
        assert_eq!(set.get(PINKY_TIP), Some(&Coordinate2D::new(40.0, 60.0)));
    }

    #[test]
    fn test_from_indexed_rows_gap_truncates() {
        let rows: Vec<[f32; 3]> = (0..21)
            .filter(|i| *i != 9)
            .map(|i| [i as f32, 1.0, 1.0])
            .collect();
        let set = LandmarkSet::from_indexed_rows(&rows);
        assert_eq!(set.len(), 9);
        assert!(!set.is_complete());
    }

    #[test]
    fn test_from_indexed_rows_ignores_unknown_ids() {
        let mut rows: Vec<[f32; 3]> = (0..21).map(|i| [i as f32, 0.0, 0.0]).collect();
        rows.push([25.0, 9.0, 9.0]);
        rows.push([-1.0, 9.0, 9.0]);
        rows.push([4.0, 7.0, 7.0]);
        let set = LandmarkSet::from_indexed_rows(&rows);
        assert_eq!(set.len(), 21);
        assert_eq!(set.get(THUMB_TIP), Some(&Coordinate2D::new(7.0, 7.0)));
    }

    #[test]
    fn test_bounding_box() {
        let set = LandmarkSet::new(vec![
            Coordinate2D::new(10.0, 40.0),
            Coordinate2D::new(-5.0, 12.0),
            Coordinate2D::new(30.0, 20.0),
        ]);
        let bbox = set.bounding_box().unwrap();
        assert_eq!(bbox, BoundingBox { x_min: -5.0, y_min: 12.0, x_max: 30.0, y_max: 40.0 });
        assert_eq!(bbox.width(), 35.0);
        assert_eq!(bbox.height(), 28.0);
        assert!(LandmarkSet::default().bounding_box().is_none());
    }

    #[test]
    fn test_landmark_set_json_is_a_plain_list() {
        let set: LandmarkSet = serde_json::from_str(r#"[{"x":1.0,"y":2.0},{"x":3.5,"y":4.5}]"#).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.get(1), Some(&Coordinate2D::new(3.5, 4.5)));
    }
}
