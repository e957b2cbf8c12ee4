use crate::capture::types::Sample;
use async_trait::async_trait;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Key/value statistics extracted from a session file by the content parser.
pub type StatsMap = HashMap<String, serde_json::Value>;

/// Timestamp and scenario name embedded in a session file's base name,
/// extracted by the collaborator filename parser.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionMeta {
    pub scenario_name: String,
    pub date_played: DateTime<Local>,
}

/// One parsed session, optionally enriched with a cursor trace.
///
/// Created by the scanner, mutated once by the correlator, then immutable
/// inside the recent-records store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioRecord {
    pub file_path: PathBuf,
    pub file_name: String,
    pub stats: StatsMap,
    pub events: Vec<Vec<String>>,
    /// Captured trace, present only transiently; persisted traces are
    /// loaded on demand via the trace store, not kept resident.
    #[serde(rename = "mouseTrace", skip_serializing_if = "Option::is_none")]
    pub trace: Option<Vec<Sample>>,
    /// Whether a persisted trace exists for this record's identity key.
    #[serde(default)]
    pub has_trace: bool,
}

/// Collaborator-supplied parsing of session files.
///
/// The watcher treats both methods as fallible per file: a filename that does
/// not parse is skipped, a content failure is logged and retried next poll.
pub trait SessionParser: Send + Sync {
    /// Extract the session timestamp and scenario name from a base name.
    fn parse_filename(&self, file_name: &str) -> anyhow::Result<SessionMeta>;

    /// Parse the file contents into `(event rows, stats map)`.
    fn parse_file(&self, path: &Path) -> anyhow::Result<(Vec<Vec<String>>, StatsMap)>;
}

/// Receives watcher lifecycle and record events (e.g. for an event bus).
#[async_trait]
pub trait ScenarioSink: Send + Sync {
    async fn watcher_started(&self, _path: &Path) {}

    async fn scenario_added(&self, record: &ScenarioRecord);

    async fn scenario_updated(&self, _record: &ScenarioRecord) {}
}
