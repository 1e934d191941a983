use std::sync::Arc;
use anyhow::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};
use crate::modules::learned_classifier::LearnedClassifier;
use crate::pipeline::pipeline::{ASLPipeline, FrameResult, RecognitionSession};
use crate::utils::coordinate::HandFrame;

/// SessionHandle feeds frames to a running [`SessionWorker`].
///
/// Frames submitted while an inference is in flight replace each other, so the
/// worker always picks up the newest one.
#[derive(Debug)]
pub struct SessionHandle {
    frames: watch::Sender<Option<HandFrame>>,
    task: JoinHandle<RecognitionSession>,
}

impl SessionHandle {
    /// submit hands a frame to the worker, replacing any frame not yet picked up.
    pub fn submit(&self, frame: HandFrame) -> Result<(), Error> {
        self.frames
            .send(Some(frame))
            .map_err(|_| Error::msg("session worker has stopped"))
    }

    /// close stops the worker once the pending frame is processed and returns the session.
    pub async fn close(self) -> Result<RecognitionSession, Error> {
        drop(self.frames);
        let session = self.task.await?;
        Ok(session)
    }
}

/// SessionWorker owns one [`RecognitionSession`] and runs its frames on a dedicated task.
pub struct SessionWorker<C> {
    pipeline: Arc<ASLPipeline<C>>,
    session: RecognitionSession,
}

impl<C: LearnedClassifier + 'static> SessionWorker<C> {
    pub fn new(pipeline: Arc<ASLPipeline<C>>) -> Self {
        let session = pipeline.new_session();
        SessionWorker { pipeline, session }
    }

    /// spawn starts the worker on the tokio runtime.
    ///
    /// # Returns
    /// * `(SessionHandle, mpsc::Receiver<FrameResult>)` - the frame input and the reported results
    pub fn spawn(self) -> (SessionHandle, mpsc::Receiver<FrameResult>) {
        let (frames_tx, frames_rx) = watch::channel(None);
        let (results_tx, results_rx) = mpsc::channel(self.pipeline.config().result_buffer);
        let task = tokio::spawn(self.run(frames_rx, results_tx));
        (SessionHandle { frames: frames_tx, task }, results_rx)
    }

    async fn run(
        mut self,
        mut frames: watch::Receiver<Option<HandFrame>>,
        results: mpsc::Sender<FrameResult>,
    ) -> RecognitionSession {
        info!("recognition session started");
        while frames.changed().await.is_ok() {
            let latest = frames.borrow_and_update().clone();
            let frame = match latest {
                Some(frame) => frame,
                None => continue,
            };
            let timestamp = frame.timestamp;
            let result = match self.pipeline.process_frame(&mut self.session, frame).await {
                Some(result) => result,
                None => continue,
            };
            if results.send(result).await.is_err() {
                debug!(timestamp, "result receiver dropped");
                break;
            }
        }
        info!(word = self.session.word(), "recognition session stopped");
        self.session
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;
    use crate::config::config::PipelineConfig;
    use crate::helper::landmark_facts::fixtures::HandBuilder;
    use crate::modules::learned_classifier::fixtures::FixedClassifier;
    use crate::modules::learned_classifier::ClassNames;
    use crate::pipeline::pipeline::ASLPipeline;
    use crate::pipeline::session::SessionWorker;
    use crate::utils::coordinate::{HandFrame, TrackedHand};

    fn fist_at(timestamp: f64) -> HandFrame {
        HandFrame { hands: vec![TrackedHand::from_landmarks(HandBuilder::fist().build())], timestamp }
    }

    fn pipeline(delay: Option<Duration>) -> Arc<ASLPipeline<FixedClassifier>> {
        let mut model = FixedClassifier::peaked('A', 0.9, 'S');
        model.delay = delay;
        Arc::new(ASLPipeline::new(model, ClassNames::alphabet(), PipelineConfig::new()).unwrap())
    }

    #[tokio::test]
    async fn test_worker_reports_results_in_order() {
        let (handle, mut results) = SessionWorker::new(pipeline(None)).spawn();
        for t in [0.0, 2.0, 4.0] {
            handle.submit(fist_at(t)).unwrap();
            let result = results.recv().await.unwrap();
            assert_eq!(result.timestamp, t);
        }
        let session = handle.close().await.unwrap();
        assert_eq!(session.word(), "AAA");
    }

    #[tokio::test]
    async fn test_worker_coalesces_to_latest_frame() {
        let (handle, mut results) = SessionWorker::new(pipeline(Some(Duration::from_millis(50)))).spawn();
        handle.submit(fist_at(1.0)).unwrap();
        // let the worker start on the first frame
        tokio::time::sleep(Duration::from_millis(10)).await;
        for t in [2.0, 3.0, 4.0] {
            handle.submit(fist_at(t)).unwrap();
        }
        let session = handle.close().await.unwrap();

        let mut seen = Vec::new();
        while let Some(result) = results.recv().await {
            seen.push(result.timestamp);
        }
        assert_eq!(seen, vec![1.0, 4.0]);
        assert_eq!(session.last_timestamp(), Some(4.0));
    }

    #[tokio::test]
    async fn test_worker_drops_stale_frames() {
        let (handle, mut results) = SessionWorker::new(pipeline(None)).spawn();
        handle.submit(fist_at(5.0)).unwrap();
        assert_eq!(results.recv().await.unwrap().timestamp, 5.0);
        handle.submit(fist_at(1.0)).unwrap();
        let session = handle.close().await.unwrap();
        assert!(results.recv().await.is_none());
        assert_eq!(session.last_timestamp(), Some(5.0));
    }

    #[tokio::test]
    async fn test_submit_after_worker_stopped() {
        let (handle, results) = SessionWorker::new(pipeline(None)).spawn();
        drop(results);
        handle.submit(fist_at(1.0)).unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(handle.submit(fist_at(2.0)).is_err());
    }
}
