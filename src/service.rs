//! Tracking service
//!
//! Wires the mouse tracker, the scenario watcher, and the trace store into
//! one facade driven by application settings. Process-presence detection and
//! settings persistence stay outside; callers toggle tracking and apply
//! settings from there.

use crate::capture::tracker::{MouseTracker, DEFAULT_BUFFER_DURATION};
use crate::capture::CaptureError;
use crate::traces::TraceStore;
use crate::watcher::config::DEFAULT_POLL_INTERVAL;
use crate::watcher::{ScenarioRecord, ScenarioSink, ScenarioWatcher, SessionParser, WatcherConfig};
use anyhow::Result;
use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Application-level settings consumed by the service. Persistence of these
/// values is the caller's concern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingSettings {
    /// Directory containing exported session stats files.
    pub stats_dir: PathBuf,
    /// Directory receiving persisted `.trace` files.
    pub traces_dir: PathBuf,
    /// Minutes of cursor history retained in memory.
    pub buffer_minutes: u64,
    /// Minutes separating two play sessions (passed through to analysis).
    pub session_gap_minutes: u64,
    /// Cap on pre-existing files parsed when the watcher starts.
    pub max_existing_on_start: usize,
}

impl Default for TrackingSettings {
    fn default() -> Self {
        Self {
            stats_dir: PathBuf::new(),
            traces_dir: PathBuf::new(),
            buffer_minutes: 2,
            session_gap_minutes: 20,
            max_existing_on_start: 1000,
        }
    }
}

impl TrackingSettings {
    fn watcher_config(&self) -> WatcherConfig {
        WatcherConfig {
            path: self.stats_dir.clone(),
            session_gap: Duration::from_secs(self.session_gap_minutes * 60),
            poll_interval: DEFAULT_POLL_INTERVAL,
            parse_existing_on_start: true,
            parse_existing_limit: self.max_existing_on_start,
        }
    }

    fn buffer_duration(&self) -> Duration {
        if self.buffer_minutes == 0 {
            DEFAULT_BUFFER_DURATION
        } else {
            Duration::from_secs(self.buffer_minutes * 60)
        }
    }
}

/// Coordinates the capture and watcher subsystems.
pub struct TrackingService {
    tracker: Arc<MouseTracker>,
    watcher: ScenarioWatcher,
    traces: Arc<TraceStore>,
    settings: RwLock<TrackingSettings>,
}

impl TrackingService {
    pub fn new(settings: TrackingSettings, parser: Arc<dyn SessionParser>) -> Self {
        let traces = Arc::new(TraceStore::new(settings.traces_dir.clone()));
        let tracker = Arc::new(MouseTracker::new(settings.buffer_duration()));
        let watcher =
            ScenarioWatcher::new(settings.watcher_config(), parser, Arc::clone(&traces));
        watcher.set_mouse_provider(tracker.clone());
        Self {
            tracker,
            watcher,
            traces,
            settings: RwLock::new(settings),
        }
    }

    pub fn set_sink(&self, sink: Arc<dyn ScenarioSink>) {
        self.watcher.set_sink(sink);
    }

    pub fn tracker(&self) -> &Arc<MouseTracker> {
        &self.tracker
    }

    pub fn traces(&self) -> &Arc<TraceStore> {
        &self.traces
    }

    /// Start watching. An explicit `path` overrides the stored stats
    /// directory. Fails if the watcher is already running (stop it first).
    pub async fn start_watcher(&self, path: Option<PathBuf>) -> Result<()> {
        if let Some(path) = path {
            self.settings.write().stats_dir = path;
        }
        let cfg = self.settings.read().watcher_config();
        self.watcher.update_config(cfg)?;
        self.watcher.clear();
        self.watcher.start().await?;
        Ok(())
    }

    pub fn stop_watcher(&self) {
        self.watcher.stop();
    }

    pub fn is_watcher_running(&self) -> bool {
        self.watcher.is_running()
    }

    pub fn get_recent(&self, limit: usize) -> Vec<ScenarioRecord> {
        self.watcher.get_recent(limit)
    }

    pub fn clear(&self) {
        self.watcher.clear();
    }

    pub async fn reload_traces(&self) -> usize {
        self.watcher.reload_traces().await
    }

    /// Begin OS-level mouse capture (driven by process-presence detection
    /// upstream).
    pub fn start_tracking(&self) -> Result<(), CaptureError> {
        self.tracker.start()
    }

    pub fn stop_tracking(&self) {
        self.tracker.stop();
    }

    /// Apply new settings: retention changes take effect immediately, a
    /// traces-directory change re-checks existing records, and the watcher is
    /// restarted only when its own configuration actually changed.
    pub async fn apply_settings(&self, new: TrackingSettings) -> Result<()> {
        let prev = {
            let mut guard = self.settings.write();
            std::mem::replace(&mut *guard, new.clone())
        };

        self.tracker.set_buffer_duration(new.buffer_duration());

        let watcher_changed = prev.stats_dir != new.stats_dir
            || prev.session_gap_minutes != new.session_gap_minutes
            || prev.max_existing_on_start != new.max_existing_on_start;

        if watcher_changed {
            if self.watcher.is_running() {
                self.watcher.stop();
                self.watcher.update_config(new.watcher_config())?;
                self.watcher.clear();
                self.watcher.start().await?;
            } else {
                self.watcher.update_config(new.watcher_config())?;
                self.watcher.clear();
            }
        } else if !self.watcher.is_running() {
            self.watcher.update_config(new.watcher_config())?;
        }

        if prev.traces_dir != new.traces_dir {
            self.traces.set_base_dir(new.traces_dir.clone());
            let flagged = self.watcher.reload_traces().await;
            tracing::info!(flagged, "re-checked traces after directory change");
        }
        Ok(())
    }
}
