//! Scenario file watcher
//!
//! Polls the stats directory for newly exported session files, deduplicates
//! by absolute path, bounds the initial backlog, derives each session's time
//! window, correlates it with the mouse provider, and keeps a bounded
//! in-memory history of parsed records.

pub mod config;
mod correlate;
pub mod recent;
pub mod types;
pub mod window;

pub use config::WatcherConfig;
pub use recent::DEFAULT_RECENT_CAP;
pub use types::{ScenarioRecord, ScenarioSink, SessionMeta, SessionParser, StatsMap};

use crate::capture::tracker::MouseProvider;
use crate::traces::TraceStore;
use crate::watcher::recent::RecentStore;
use crate::watcher::window::derive_session_window;
use chrono::{DateTime, Local};
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;

/// Recognized suffix of exported session stats files (case-insensitive).
const STATS_FILE_SUFFIX: &str = " stats.csv";

/// Errors from the watcher surface.
#[derive(Error, Debug)]
pub enum WatcherError {
    #[error("cannot update config while running")]
    Running,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

struct WatcherInner {
    cfg: RwLock<WatcherConfig>,
    running: AtomicBool,
    stop_tx: Mutex<Option<watch::Sender<bool>>>,
    /// Absolute paths already processed (or deliberately skipped).
    seen: RwLock<HashSet<PathBuf>>,
    recent: RwLock<RecentStore>,
    mouse: RwLock<Option<Arc<dyn MouseProvider>>>,
    sink: RwLock<Option<Arc<dyn ScenarioSink>>>,
    parser: Arc<dyn SessionParser>,
    traces: Arc<TraceStore>,
}

/// Directory watcher producing correlated [`ScenarioRecord`]s.
#[derive(Clone)]
pub struct ScenarioWatcher {
    inner: Arc<WatcherInner>,
}

impl ScenarioWatcher {
    pub fn new(
        cfg: WatcherConfig,
        parser: Arc<dyn SessionParser>,
        traces: Arc<TraceStore>,
    ) -> Self {
        let cap = cfg.parse_existing_limit;
        Self {
            inner: Arc::new(WatcherInner {
                cfg: RwLock::new(cfg),
                running: AtomicBool::new(false),
                stop_tx: Mutex::new(None),
                seen: RwLock::new(HashSet::new()),
                recent: RwLock::new(RecentStore::new(cap)),
                mouse: RwLock::new(None),
                sink: RwLock::new(None),
                parser,
                traces,
            }),
        }
    }

    /// Inject the mouse provider used for trace enrichment.
    pub fn set_mouse_provider(&self, provider: Arc<dyn MouseProvider>) {
        *self.inner.mouse.write() = Some(provider);
    }

    /// Inject the event sink notified about parsed and updated records.
    pub fn set_sink(&self, sink: Arc<dyn ScenarioSink>) {
        *self.inner.sink.write() = Some(sink);
    }

    /// Start the poll loop. Idempotent. The initial backlog scan (when
    /// configured) completes before this returns.
    pub async fn start(&self) -> Result<(), WatcherError> {
        let inner = &self.inner;
        if inner.running.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let cfg = inner.cfg.read().clone();
        // Do not create the directory; just warn and keep retrying each poll.
        match std::fs::metadata(&cfg.path) {
            Ok(_) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %cfg.path.display(), "watch path does not exist (will retry)");
            }
            Err(err) => {
                tracing::warn!(path = %cfg.path.display(), error = %err, "watch path not accessible");
            }
        }

        inner
            .recent
            .write()
            .set_cap(cfg.parse_existing_limit);

        if let Some(sink) = self.sink() {
            sink.watcher_started(&cfg.path).await;
        }

        if cfg.parse_existing_on_start {
            self.scan_once(true).await;
        }

        let (stop_tx, mut stop_rx) = watch::channel(false);
        *inner.stop_tx.lock() = Some(stop_tx);

        let watcher = self.clone();
        let poll_interval = if cfg.poll_interval.is_zero() {
            config::DEFAULT_POLL_INTERVAL
        } else {
            cfg.poll_interval
        };
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            ticker.tick().await; // immediate first tick; the start scan covered it
            loop {
                tokio::select! {
                    biased;
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        watcher.scan_once(false).await;
                    }
                }
            }
            tracing::debug!("watcher poll loop exited");
        });
        Ok(())
    }

    /// Stop the poll loop. Idempotent.
    pub fn stop(&self) {
        if !self.inner.running.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Some(stop_tx) = self.inner.stop_tx.lock().take() {
            let _ = stop_tx.send(true);
        }
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }

    /// Replace the configuration. Rejected while the watcher runs.
    pub fn update_config(&self, cfg: WatcherConfig) -> Result<(), WatcherError> {
        if self.is_running() {
            return Err(WatcherError::Running);
        }
        self.inner.recent.write().set_cap(cfg.parse_existing_limit);
        *self.inner.cfg.write() = cfg;
        Ok(())
    }

    /// Up to `limit` records, most recent first. Zero means "all retained".
    pub fn get_recent(&self, limit: usize) -> Vec<ScenarioRecord> {
        self.inner.recent.read().recent(limit)
    }

    /// Reset the seen-set and the record history.
    pub fn clear(&self) {
        self.inner.seen.write().clear();
        self.inner.recent.write().clear();
    }

    /// Re-check disk for traces that appeared after the fact (e.g. after a
    /// traces-directory change) and flag the affected records. Returns how
    /// many records were newly marked.
    pub async fn reload_traces(&self) -> usize {
        let mut updated = Vec::new();
        {
            let mut recent = self.inner.recent.write();
            for record in recent.iter_mut() {
                if !record.has_trace && self.inner.traces.exists(&record.file_name) {
                    record.has_trace = true;
                    updated.push(record.clone());
                }
            }
        }
        if let Some(sink) = self.sink() {
            for record in &updated {
                sink.scenario_updated(record).await;
            }
        }
        updated.len()
    }

    fn sink(&self) -> Option<Arc<dyn ScenarioSink>> {
        self.inner.sink.read().clone()
    }

    fn mouse(&self) -> Option<Arc<dyn MouseProvider>> {
        self.inner.mouse.read().clone()
    }

    /// One scan pass over the watch directory.
    ///
    /// `include_all` is the startup pass: seen-set filtering is skipped and
    /// the backlog limit applies. Candidates are ordered by the timestamp
    /// embedded in the file name — filenames are not guaranteed to sort
    /// lexically by date.
    async fn scan_once(&self, include_all: bool) {
        let cfg = self.inner.cfg.read().clone();
        let entries = match std::fs::read_dir(&cfg.path) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(path = %cfg.path.display(), error = %err, "scan failed; will retry");
                return;
            }
        };

        let mut candidates: Vec<(PathBuf, SessionMeta)> = Vec::new();
        for entry in entries.flatten() {
            if entry.file_type().map(|t| t.is_dir()).unwrap_or(true) {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if !is_stats_file(&name) {
                continue;
            }
            let full = cfg.path.join(&name);

            // Skip known files before invoking the filename parser; this is
            // what keeps steady-state polls cheap over large directories.
            if !include_all && self.inner.seen.read().contains(&full) {
                continue;
            }

            // Not a parseable session file name: skip silently, retry never
            // escalates because the name will not change.
            let Ok(meta) = self.inner.parser.parse_filename(&name) else {
                continue;
            };
            candidates.push((full, meta));
        }

        // Oldest first, by embedded timestamp.
        candidates.sort_by(|a, b| a.1.date_played.cmp(&b.1.date_played));

        if include_all && cfg.parse_existing_limit > 0 && candidates.len() > cfg.parse_existing_limit
        {
            // Mark the oldest excess as seen without parsing so it is never
            // retroactively processed.
            let cut = candidates.len() - cfg.parse_existing_limit;
            {
                let mut seen = self.inner.seen.write();
                for (path, _) in &candidates[..cut] {
                    seen.insert(path.clone());
                }
            }
            tracing::info!(
                skipped = cut,
                parsed = cfg.parse_existing_limit,
                "backlog exceeds limit; skipping oldest files"
            );
            candidates.drain(..cut);
        }

        for (path, meta) in candidates {
            if !include_all && self.inner.seen.read().contains(&path) {
                continue;
            }
            match self.parse_file(&path, &meta) {
                Ok(record) => {
                    self.inner.seen.write().insert(path);
                    self.inner.recent.write().push(record.clone());
                    if let Some(sink) = self.sink() {
                        sink.scenario_added(&record).await;
                    }
                }
                Err(err) => {
                    // Not marked seen: retried on the next poll.
                    tracing::error!(file = %path.display(), error = %err, "failed to parse stats file");
                }
            }
        }
    }

    /// Parse one session file into a correlated record.
    fn parse_file(&self, path: &Path, meta: &SessionMeta) -> anyhow::Result<ScenarioRecord> {
        let (events, mut stats) = self.inner.parser.parse_file(path)?;

        stats.insert(
            "Date Played".to_string(),
            Value::String(meta.date_played.to_rfc3339()),
        );

        let (start, end) = derive_session_window(meta.date_played.naive_local(), &stats, &events);
        let duration_secs = (end - start).num_milliseconds() as f64 / 1000.0;
        stats.insert("Duration".to_string(), Value::from(duration_secs));

        let mut record = ScenarioRecord {
            file_path: path.to_path_buf(),
            file_name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            stats,
            events,
            trace: None,
            has_trace: false,
        };

        let provider = self.mouse();
        correlate::attach_trace(
            &mut record,
            meta,
            start,
            end,
            provider.as_ref(),
            &self.inner.traces,
        );
        Ok(record)
    }
}

/// Whether a file name looks like an exported session stats file.
fn is_stats_file(name: &str) -> bool {
    name.to_lowercase().ends_with(STATS_FILE_SUFFIX)
}

/// Convenience for collaborators building [`SessionMeta`] values in tests
/// and adapters.
pub fn session_meta(scenario_name: impl Into<String>, date_played: DateTime<Local>) -> SessionMeta {
    SessionMeta {
        scenario_name: scenario_name.into(),
        date_played,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::types::Sample;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use parking_lot::Mutex as PlMutex;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    /// Parser for synthetic stats files named `<scenario>__<epoch secs> Stats.csv`
    /// whose contents are `key=value` lines; a `fail` value poisons the parse.
    struct TestParser {
        file_parses: AtomicUsize,
    }

    impl TestParser {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                file_parses: AtomicUsize::new(0),
            })
        }
    }

    impl SessionParser for TestParser {
        fn parse_filename(&self, file_name: &str) -> anyhow::Result<SessionMeta> {
            let base = file_name
                .strip_suffix(" Stats.csv")
                .ok_or_else(|| anyhow::anyhow!("not a stats file"))?;
            let (scenario, epoch) = base
                .rsplit_once("__")
                .ok_or_else(|| anyhow::anyhow!("missing timestamp"))?;
            let secs: i64 = epoch.parse()?;
            let date = Local
                .timestamp_opt(secs, 0)
                .single()
                .ok_or_else(|| anyhow::anyhow!("bad timestamp"))?;
            Ok(session_meta(scenario, date))
        }

        fn parse_file(&self, path: &Path) -> anyhow::Result<(Vec<Vec<String>>, StatsMap)> {
            self.file_parses.fetch_add(1, Ordering::SeqCst);
            let contents = std::fs::read_to_string(path)?;
            let mut stats = StatsMap::new();
            for line in contents.lines() {
                if let Some((key, value)) = line.split_once('=') {
                    if value == "fail" {
                        anyhow::bail!("poisoned file");
                    }
                    stats.insert(key.to_string(), Value::String(value.to_string()));
                }
            }
            Ok((Vec::new(), stats))
        }
    }

    struct CollectingSink {
        added: PlMutex<Vec<String>>,
        updated: PlMutex<Vec<String>>,
    }

    impl CollectingSink {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                added: PlMutex::new(Vec::new()),
                updated: PlMutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ScenarioSink for CollectingSink {
        async fn scenario_added(&self, record: &ScenarioRecord) {
            self.added.lock().push(record.file_name.clone());
        }

        async fn scenario_updated(&self, record: &ScenarioRecord) {
            self.updated.lock().push(record.file_name.clone());
        }
    }

    struct FakeProvider {
        enabled: bool,
        samples: Vec<Sample>,
    }

    impl MouseProvider for FakeProvider {
        fn enabled(&self) -> bool {
            self.enabled
        }

        fn get_range(&self, start: DateTime<Local>, end: DateTime<Local>) -> Vec<Sample> {
            let (s, e) = (start.timestamp_millis(), end.timestamp_millis());
            self.samples
                .iter()
                .filter(|p| p.ts >= s && p.ts <= e)
                .copied()
                .collect()
        }
    }

    fn stats_name(scenario: &str, epoch: i64) -> String {
        format!("{scenario}__{epoch} Stats.csv")
    }

    fn write_stats(dir: &Path, scenario: &str, epoch: i64, body: &str) -> PathBuf {
        let path = dir.join(stats_name(scenario, epoch));
        std::fs::write(&path, body).unwrap();
        path
    }

    fn watcher_for(
        dir: &Path,
        traces_dir: &Path,
        parser: Arc<TestParser>,
        limit: usize,
    ) -> ScenarioWatcher {
        let cfg = WatcherConfig {
            path: dir.to_path_buf(),
            poll_interval: Duration::from_secs(3600), // steady-state polls driven manually
            parse_existing_on_start: true,
            parse_existing_limit: limit,
            ..WatcherConfig::default()
        };
        ScenarioWatcher::new(cfg, parser, Arc::new(TraceStore::new(traces_dir)))
    }

    #[tokio::test]
    async fn test_backlog_limited_to_most_recent_by_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let traces = tempfile::tempdir().unwrap();
        // lexical order deliberately disagrees with timestamp order
        for (scenario, epoch) in [
            ("zz", 1_700_000_100),
            ("aa", 1_700_000_900),
            ("mm", 1_700_000_500),
            ("bb", 1_700_000_200),
            ("cc", 1_700_000_800),
            ("dd", 1_700_000_300),
            ("ee", 1_700_000_700),
            ("ff", 1_700_000_400),
            ("gg", 1_700_000_600),
            ("hh", 1_700_000_050),
        ] {
            write_stats(dir.path(), scenario, epoch, "Score=100\n");
        }

        let parser = TestParser::new();
        let watcher = watcher_for(dir.path(), traces.path(), Arc::clone(&parser), 3);
        let sink = CollectingSink::new();
        watcher.set_sink(sink.clone());
        watcher.start().await.unwrap();

        // exactly the 3 most recent by timestamp, oldest-first emission
        assert_eq!(
            *sink.added.lock(),
            vec![
                stats_name("ee", 1_700_000_700),
                stats_name("cc", 1_700_000_800),
                stats_name("aa", 1_700_000_900),
            ]
        );
        assert_eq!(parser.file_parses.load(Ordering::SeqCst), 3);

        // a later poll must not pick up the skipped backlog
        watcher.scan_once(false).await;
        assert_eq!(parser.file_parses.load(Ordering::SeqCst), 3);
        assert_eq!(watcher.get_recent(0).len(), 3);
        watcher.stop();
    }

    #[tokio::test]
    async fn test_new_files_parsed_once() {
        let dir = tempfile::tempdir().unwrap();
        let traces = tempfile::tempdir().unwrap();
        let parser = TestParser::new();
        let watcher = watcher_for(dir.path(), traces.path(), Arc::clone(&parser), 100);
        watcher.start().await.unwrap();
        assert_eq!(parser.file_parses.load(Ordering::SeqCst), 0);

        write_stats(dir.path(), "fresh", 1_700_000_000, "Score=1\n");
        watcher.scan_once(false).await;
        watcher.scan_once(false).await;
        assert_eq!(parser.file_parses.load(Ordering::SeqCst), 1);

        let recent = watcher.get_recent(0);
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].file_name, stats_name("fresh", 1_700_000_000));
        assert!(recent[0].stats.contains_key("Date Played"));
        assert!(recent[0].stats.contains_key("Duration"));
        watcher.stop();
    }

    #[tokio::test]
    async fn test_parse_failure_retried_not_marked_seen() {
        let dir = tempfile::tempdir().unwrap();
        let traces = tempfile::tempdir().unwrap();
        let path = write_stats(dir.path(), "bad", 1_700_000_000, "Score=fail\n");

        let parser = TestParser::new();
        let watcher = watcher_for(dir.path(), traces.path(), Arc::clone(&parser), 100);
        watcher.start().await.unwrap();
        assert_eq!(parser.file_parses.load(Ordering::SeqCst), 1);
        assert!(watcher.get_recent(0).is_empty());

        // still retried on subsequent polls
        watcher.scan_once(false).await;
        assert_eq!(parser.file_parses.load(Ordering::SeqCst), 2);

        // once the file becomes parseable it goes through and stops retrying
        std::fs::write(&path, "Score=200\n").unwrap();
        watcher.scan_once(false).await;
        watcher.scan_once(false).await;
        assert_eq!(parser.file_parses.load(Ordering::SeqCst), 3);
        assert_eq!(watcher.get_recent(0).len(), 1);
        watcher.stop();
    }

    #[tokio::test]
    async fn test_non_stats_files_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let traces = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "hi").unwrap();
        std::fs::write(dir.path().join("weird Stats.csv.bak"), "hi").unwrap();
        std::fs::create_dir(dir.path().join("sub Stats.csv")).unwrap();

        let parser = TestParser::new();
        let watcher = watcher_for(dir.path(), traces.path(), Arc::clone(&parser), 100);
        watcher.start().await.unwrap();
        assert_eq!(parser.file_parses.load(Ordering::SeqCst), 0);
        watcher.stop();
    }

    #[tokio::test]
    async fn test_update_config_rejected_while_running() {
        let dir = tempfile::tempdir().unwrap();
        let traces = tempfile::tempdir().unwrap();
        let watcher = watcher_for(dir.path(), traces.path(), TestParser::new(), 100);
        watcher.start().await.unwrap();
        assert!(matches!(
            watcher.update_config(WatcherConfig::default()),
            Err(WatcherError::Running)
        ));

        watcher.stop();
        assert!(watcher.update_config(WatcherConfig::default()).is_ok());
    }

    #[tokio::test]
    async fn test_clear_resets_seen_set() {
        let dir = tempfile::tempdir().unwrap();
        let traces = tempfile::tempdir().unwrap();
        write_stats(dir.path(), "again", 1_700_000_000, "Score=1\n");

        let parser = TestParser::new();
        let watcher = watcher_for(dir.path(), traces.path(), Arc::clone(&parser), 100);
        watcher.start().await.unwrap();
        assert_eq!(parser.file_parses.load(Ordering::SeqCst), 1);

        watcher.clear();
        assert!(watcher.get_recent(0).is_empty());
        watcher.scan_once(false).await;
        assert_eq!(parser.file_parses.load(Ordering::SeqCst), 2);
        watcher.stop();
    }

    #[tokio::test]
    async fn test_trace_captured_and_persisted_write_once() {
        let dir = tempfile::tempdir().unwrap();
        let traces_dir = tempfile::tempdir().unwrap();
        let epoch = 1_700_000_000i64;
        write_stats(dir.path(), "aimbot", epoch, "Challenge Start=garbage\n");

        let parser = TestParser::new();
        let watcher = watcher_for(dir.path(), traces_dir.path(), parser, 100);
        // samples inside the [end-60s, end] fallback window
        let provider = Arc::new(FakeProvider {
            enabled: true,
            samples: vec![
                Sample {
                    ts: epoch * 1000 - 30_000,
                    x: 4,
                    y: 5,
                    buttons: 0,
                },
                Sample {
                    ts: epoch * 1000 - 10_000,
                    x: 6,
                    y: 7,
                    buttons: 1,
                },
            ],
        });
        watcher.set_mouse_provider(provider);
        watcher.start().await.unwrap();

        let recent = watcher.get_recent(0);
        assert_eq!(recent.len(), 1);
        // payload dropped from the record, flag set instead
        assert!(recent[0].has_trace);
        assert!(recent[0].trace.is_none());

        let trace_path = traces_dir.path().join(format!("aimbot__{epoch}.trace"));
        assert!(trace_path.is_file());
        let first_bytes = std::fs::read(&trace_path).unwrap();

        // reprocessing the same identity never overwrites the stored trace
        watcher.stop();
        watcher.clear();
        watcher.start().await.unwrap();
        assert_eq!(std::fs::read(&trace_path).unwrap(), first_bytes);
        watcher.stop();
    }

    #[tokio::test]
    async fn test_has_trace_from_existence_when_provider_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let traces_dir = tempfile::tempdir().unwrap();
        let epoch = 1_700_000_000i64;
        write_stats(dir.path(), "cold", epoch, "Score=1\n");
        // persisted trace from a previous run
        std::fs::write(
            traces_dir.path().join(format!("cold__{epoch}.trace")),
            b"placeholder",
        )
        .unwrap();

        let watcher = watcher_for(dir.path(), traces_dir.path(), TestParser::new(), 100);
        watcher.set_mouse_provider(Arc::new(FakeProvider {
            enabled: false,
            samples: Vec::new(),
        }));
        watcher.start().await.unwrap();

        let recent = watcher.get_recent(0);
        assert!(recent[0].has_trace);
        assert!(recent[0].trace.is_none());
        watcher.stop();
    }

    #[tokio::test]
    async fn test_reload_traces_flags_late_arrivals() {
        let dir = tempfile::tempdir().unwrap();
        let traces_dir = tempfile::tempdir().unwrap();
        let epoch = 1_700_000_000i64;
        write_stats(dir.path(), "late", epoch, "Score=1\n");

        let watcher = watcher_for(dir.path(), traces_dir.path(), TestParser::new(), 100);
        let sink = CollectingSink::new();
        watcher.set_sink(sink.clone());
        watcher.start().await.unwrap();
        assert!(!watcher.get_recent(0)[0].has_trace);
        assert_eq!(watcher.reload_traces().await, 0);

        // a trace file shows up afterwards (e.g. directory switch)
        std::fs::write(
            traces_dir.path().join(format!("late__{epoch}.trace")),
            b"placeholder",
        )
        .unwrap();
        assert_eq!(watcher.reload_traces().await, 1);
        assert!(watcher.get_recent(0)[0].has_trace);
        assert_eq!(*sink.updated.lock(), vec![stats_name("late", epoch)]);
        // already flagged: second pass reports nothing new
        assert_eq!(watcher.reload_traces().await, 0);
        watcher.stop();
    }

    #[tokio::test]
    async fn test_poll_loop_picks_up_new_files() {
        let dir = tempfile::tempdir().unwrap();
        let traces = tempfile::tempdir().unwrap();
        let parser = TestParser::new();
        let cfg = WatcherConfig {
            path: dir.path().to_path_buf(),
            poll_interval: Duration::from_millis(50),
            parse_existing_on_start: false,
            parse_existing_limit: 100,
            ..WatcherConfig::default()
        };
        let watcher = ScenarioWatcher::new(
            cfg,
            Arc::clone(&parser) as Arc<dyn SessionParser>,
            Arc::new(TraceStore::new(traces.path())),
        );
        watcher.start().await.unwrap();

        write_stats(dir.path(), "polled", 1_700_000_000, "Score=1\n");
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(watcher.get_recent(0).len(), 1);

        watcher.stop();
        let parsed_after_stop = parser.file_parses.load(Ordering::SeqCst);
        write_stats(dir.path(), "ignored", 1_700_000_001, "Score=1\n");
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(parser.file_parses.load(Ordering::SeqCst), parsed_after_stop);
    }
}
