use anyhow::Error;
use ndarray::Array2;
use crate::utils::coordinate::{HandFrame, LandmarkSet, TrackedHand};

/// convert_json_rows_to_landmarks parses the tracker's `[[id, x, y], ...]` payload.
pub fn convert_json_rows_to_landmarks(payload: &str) -> Result<LandmarkSet, Error> {
    let rows: Vec<[f32; 3]> = serde_json::from_str(payload)?;
    Ok(LandmarkSet::from_indexed_rows(&rows))
}

/// convert_json_to_hand_frame parses a frame payload of the form
/// `{"hands": [[[id, x, y], ...], ...], "timestamp": 12.5}`.
///
/// Bounding boxes are derived from the landmarks.
pub fn convert_json_to_hand_frame(payload: &str) -> Result<HandFrame, Error> {
    #[derive(serde::Deserialize)]
    struct RawFrame {
        hands: Vec<Vec<[f32; 3]>>,
        timestamp: f64,
    }

    let raw: RawFrame = serde_json::from_str(payload)?;
    if !raw.timestamp.is_finite() {
        return Err(Error::msg("frame timestamp must be finite"))
    }
    let hands = raw.hands
        .iter()
        .map(|rows| TrackedHand::from_landmarks(LandmarkSet::from_indexed_rows(rows)))
        .collect();

    Ok(HandFrame { hands, timestamp: raw.timestamp })
}

/// convert_landmarks_to_ndarray returns the landmarks as an `(n, 2)` array of `[x, y]` rows.
pub fn convert_landmarks_to_ndarray(landmarks: &LandmarkSet) -> Result<Array2<f32>, Error> {
    let flat: Vec<f32> = landmarks.points().iter().flat_map(|p| [p.x, p.y]).collect();
    let arr = Array2::from_shape_vec((landmarks.len(), 2), flat)?;
    Ok(arr)
}

/// normalize_pose maps the landmarks into a `size x size` frame.
///
/// The hand's bounding box is scaled uniformly so its longer side spans
/// `[0, size - 1]` and the shorter side is centred, which is the canonical
/// input layout for the learned classifier. A degenerate box (all points on a
/// single spot) collapses every landmark onto the centre.
///
/// # Arguments
/// * `landmarks` - &LandmarkSet
/// * `size` - output frame side in pixels
///
/// # Returns
/// * `Result<Array2<f32>, Error>`
pub fn normalize_pose(landmarks: &LandmarkSet, size: usize) -> Result<Array2<f32>, Error> {
    if size < 2 {
        return Err(Error::msg("pose frame size must be at least 2"))
    }
    let bbox = match landmarks.bounding_box() {
        Some(bbox) => bbox,
        None => return Err(Error::msg("cannot normalize an empty landmark set")),
    };

    let span = (size - 1) as f32;
    let extent = bbox.width().max(bbox.height());
    let mut arr = convert_landmarks_to_ndarray(landmarks)?;

    if extent <= f32::EPSILON {
        arr.fill(span / 2.0);
        return Ok(arr)
    }

    let scale = span / extent;
    let off_x = (span - bbox.width() * scale) / 2.0;
    let off_y = (span - bbox.height() * scale) / 2.0;
    for mut row in arr.rows_mut() {
        row[0] = (row[0] - bbox.x_min) * scale + off_x;
        row[1] = (row[1] - bbox.y_min) * scale + off_y;
    }
    Ok(arr)
}
