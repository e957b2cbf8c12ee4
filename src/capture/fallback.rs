//! Stub capture backend for platforms without raw-input support.

use crate::capture::ring::MotionProducer;
use crate::capture::tracker::CaptureError;
use crossbeam_channel::Sender;
use std::time::Duration;

/// Placeholder listener; [`CaptureListener::spawn`] always fails, so the
/// tracker never starts and the watcher runs without trace enrichment.
pub struct CaptureListener;

impl CaptureListener {
    pub fn spawn(_producer: MotionProducer, _wake: Sender<()>) -> Result<Self, CaptureError> {
        Err(CaptureError::Platform(
            "raw mouse capture is only implemented on Windows".to_string(),
        ))
    }

    pub fn request_quit(&self) {}

    pub fn wait(&mut self, _timeout: Duration) -> bool {
        true
    }
}
