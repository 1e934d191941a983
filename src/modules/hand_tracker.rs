use anyhow::Error;
use async_trait::async_trait;
use crate::utils::coordinate::TrackedHand;
use crate::utils::conversion::convert_json_to_hand_frame;

/// HandTracker turns a camera image into tracked hands.
///
/// The returned landmarks are in image pixel coordinates with y growing
/// downward; an empty vector means no hand was found.
#[async_trait]
pub trait HandTracker: Send + Sync {
    async fn detect(&self, image: &[u8]) -> Result<Vec<TrackedHand>, Error>;
}

/// JsonHandTracker reads hands that an upstream tracker already serialised as
/// a hand-frame JSON payload. The payload's timestamp is ignored.
#[derive(Debug, Clone, Default)]
pub struct JsonHandTracker;

impl JsonHandTracker {
    pub fn new() -> Self {
        JsonHandTracker
    }
}

#[async_trait]
impl HandTracker for JsonHandTracker {
    async fn detect(&self, image: &[u8]) -> Result<Vec<TrackedHand>, Error> {
        let raw = std::str::from_utf8(image)?;
        let frame = convert_json_to_hand_frame(raw)?;
        Ok(frame.hands)
    }
}
