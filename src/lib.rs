//! Aimtrace - mouse traces for aim-trainer sessions.
//!
//! Captures raw pointer motion at the OS level, watches a directory of
//! exported session stats files, correlates each session's time window with
//! the captured motion, and persists the result as compact binary traces.
//!
//! The host application supplies the session parsers and an event sink;
//! everything else (capture pipeline, watcher, codec) lives here.

pub mod capture;
pub mod service;
pub mod traces;
pub mod watcher;

pub use capture::{CaptureError, MotionEvent, MouseProvider, MouseTracker, Sample};
pub use service::{TrackingService, TrackingSettings};
pub use traces::{TraceContainer, TraceError, TraceStore};
pub use watcher::{
    ScenarioRecord, ScenarioSink, ScenarioWatcher, SessionMeta, SessionParser, StatsMap,
    WatcherConfig, WatcherError,
};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging for host applications that have not set up a
/// subscriber of their own. Safe to call more than once.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aimtrace=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
