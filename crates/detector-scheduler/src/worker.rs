//! Detector Worker

use tracing::{debug, info, warn};

use crate::detection::{DetectionResult, ObjectDetector};
use crate::scheduler::DetectorMailbox;

/// Drains detection requests and publishes results.
///
/// Each call to the detector runs on the blocking pool so a slow model
/// never stalls the async runtime driving the frame loop.
pub struct DetectorWorker<D: ObjectDetector> {
    detector: D,
    mailbox: DetectorMailbox<D::Frame>,
}

impl<D: ObjectDetector> DetectorWorker<D> {
    pub fn new(detector: D, mailbox: DetectorMailbox<D::Frame>) -> Self {
        Self { detector, mailbox }
    }

    /// Run until the scheduler goes away or the detector panics
    pub async fn run(self) {
        info!("Starting detector worker");

        let Self {
            mut detector,
            mut mailbox,
        } = self;

        while let Some(request) = mailbox.recv().await {
            let sequence = request.sequence;
            let timestamp = request.timestamp;

            let joined = tokio::task::spawn_blocking(move || {
                let outcome = detector.detect(&request.frame, &request.region);
                (detector, outcome)
            })
            .await;

            let outcome = match joined {
                Ok((returned, outcome)) => {
                    detector = returned;
                    outcome
                }
                Err(e) => {
                    warn!("Detector task aborted: {}", e);
                    break;
                }
            };

            match outcome {
                Ok(boxes) => {
                    debug!("Detection for frame {}: {} boxes", sequence, boxes.len());
                    let result = DetectionResult {
                        boxes,
                        timestamp,
                        sequence,
                    };
                    if !mailbox.publish(result) {
                        break;
                    }
                }
                Err(e) => {
                    // Previous result stays in effect
                    warn!("Detection failed for frame {}: {}", sequence, e);
                }
            }
        }

        info!("Detector worker stopped");
    }
}
