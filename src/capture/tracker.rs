//! Mouse tracker
//!
//! Owns the capture listener, the aggregator worker, and the shared sample
//! window, and exposes the provider surface the scenario watcher consumes.

use crate::capture::aggregator::Aggregator;
use crate::capture::ring::{MotionRing, DEFAULT_RING_CAPACITY};
use crate::capture::types::{unix_millis, Sample};
use crate::capture::window::SampleWindow;
use chrono::{DateTime, Local};
use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use thiserror::Error;

#[cfg(target_os = "windows")]
use crate::capture::windows::input as platform;

#[cfg(not(target_os = "windows"))]
use crate::capture::fallback as platform;

/// Default retention for the in-memory sample buffer.
pub const DEFAULT_BUFFER_DURATION: Duration = Duration::from_secs(2 * 60);

/// Bounded wait for the capture listener to exit on stop.
const LISTENER_STOP_TIMEOUT: Duration = Duration::from_secs(1);

/// Bounded wait for the aggregator worker to exit after the wake channel
/// closes.
const WORKER_STOP_TIMEOUT: Duration = Duration::from_millis(500);

/// Errors from the capture subsystem.
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("raw input registration failed: {0}")]
    Registration(String),

    #[error("platform error: {0}")]
    Platform(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Supplies time-ranged cursor samples for session enrichment.
pub trait MouseProvider: Send + Sync {
    fn enabled(&self) -> bool;
    fn get_range(&self, start: DateTime<Local>, end: DateTime<Local>) -> Vec<Sample>;
}

struct CaptureState {
    listener: platform::CaptureListener,
    /// Kept alive so the wake channel only closes when both the listener and
    /// this handle are gone.
    wake_tx: Sender<()>,
    worker: Option<JoinHandle<()>>,
    worker_done: crossbeam_channel::Receiver<()>,
}

/// OS-level mouse tracker accumulating raw motion into a time-windowed
/// buffer of virtual cursor samples.
pub struct MouseTracker {
    window: Arc<RwLock<SampleWindow>>,
    running: AtomicBool,
    state: Mutex<Option<CaptureState>>,
}

impl MouseTracker {
    pub fn new(buffer_duration: Duration) -> Self {
        Self {
            window: Arc::new(RwLock::new(SampleWindow::new(buffer_duration))),
            running: AtomicBool::new(false),
            state: Mutex::new(None),
        }
    }

    /// Start capture. Idempotent; returns an error if OS registration fails,
    /// or [`CaptureError::Platform`] where raw capture is unsupported.
    pub fn start(&self) -> Result<(), CaptureError> {
        let mut state = self.state.lock();
        if state.is_some() {
            return Ok(());
        }

        let (producer, consumer) = MotionRing::with_capacity(DEFAULT_RING_CAPACITY).split();
        // Coalesced wake: multiple pending signals collapse into one token.
        let (wake_tx, wake_rx) = bounded::<()>(1);

        let listener = platform::CaptureListener::spawn(producer, wake_tx.clone())?;

        let (done_tx, done_rx) = bounded::<()>(1);
        let window = Arc::clone(&self.window);
        let worker = std::thread::Builder::new()
            .name("mouse-aggregator".into())
            .spawn(move || {
                Aggregator::new(consumer, wake_rx, window).run();
                let _ = done_tx.send(());
            })?;

        *state = Some(CaptureState {
            listener,
            wake_tx,
            worker: Some(worker),
            worker_done: done_rx,
        });
        self.running.store(true, Ordering::SeqCst);
        tracing::info!("mouse tracking started");
        Ok(())
    }

    /// Stop capture. Idempotent. Waits are bounded so a hung subsystem
    /// cannot block shutdown indefinitely.
    pub fn stop(&self) {
        let mut guard = self.state.lock();
        let Some(mut state) = guard.take() else {
            return;
        };
        self.running.store(false, Ordering::SeqCst);

        state.listener.request_quit();
        if !state.listener.wait(LISTENER_STOP_TIMEOUT) {
            tracing::warn!("capture listener did not exit within timeout");
        }

        // The listener thread has dropped its wake sender (or timed out);
        // dropping ours closes the channel and lets the aggregator exit.
        drop(state.wake_tx);
        match state.worker_done.recv_timeout(WORKER_STOP_TIMEOUT) {
            Err(RecvTimeoutError::Timeout) => {
                tracing::warn!("aggregator did not exit within timeout");
            }
            _ => {
                if let Some(worker) = state.worker.take() {
                    let _ = worker.join();
                }
            }
        }
        tracing::info!("mouse tracking stopped");
    }

    /// Update the sample retention duration and prune immediately.
    pub fn set_buffer_duration(&self, duration: Duration) {
        self.window.write().set_retention(duration, unix_millis());
    }
}

impl MouseProvider for MouseTracker {
    fn enabled(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Samples within `[start, end]`. Empty (not an error) when the tracker
    /// is disabled or nothing falls inside the window.
    fn get_range(&self, start: DateTime<Local>, end: DateTime<Local>) -> Vec<Sample> {
        if !self.enabled() {
            return Vec::new();
        }
        self.window
            .read()
            .range(start.timestamp_millis(), end.timestamp_millis())
    }
}

impl Drop for MouseTracker {
    fn drop(&mut self) {
        self.stop();
    }
}
