use std::path::PathBuf;
use std::time::Duration;

/// Default directory poll cadence.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Default gap separating two play sessions, carried for downstream session
/// grouping.
pub const DEFAULT_SESSION_GAP: Duration = Duration::from_secs(20 * 60);

/// Default cap on pre-existing files parsed at startup.
pub const DEFAULT_PARSE_EXISTING_LIMIT: usize = 1000;

/// Scenario watcher configuration.
///
/// Mutable only while the watcher is stopped; `update_config` enforces this.
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Directory containing exported session stats files.
    pub path: PathBuf,
    /// Gap between files that starts a new session (not consumed by the
    /// scan loop itself; exposed to downstream analysis).
    pub session_gap: Duration,
    pub poll_interval: Duration,
    /// Parse files already present when the watcher starts.
    pub parse_existing_on_start: bool,
    /// Cap on how many pre-existing files are parsed; the oldest excess is
    /// marked seen without parsing. Zero means parse everything.
    pub parse_existing_limit: usize,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::new(),
            session_gap: DEFAULT_SESSION_GAP,
            poll_interval: DEFAULT_POLL_INTERVAL,
            parse_existing_on_start: true,
            parse_existing_limit: DEFAULT_PARSE_EXISTING_LIMIT,
        }
    }
}
