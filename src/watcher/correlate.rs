//! Trace correlation
//!
//! Attaches the mouse trace captured during a session's derived window to the
//! parsed record and decides whether to persist it. Persistence is
//! write-once: an existing trace file is never overwritten, so repeated
//! restarts over the same stats backlog cause no churn.

use crate::capture::tracker::MouseProvider;
use crate::traces::{TraceContainer, TraceStore, TRACE_VERSION};
use crate::watcher::types::{ScenarioRecord, SessionMeta};
use crate::watcher::window::resolve_local;
use chrono::NaiveDateTime;
use std::sync::Arc;

/// Query the provider for the session window, persist a non-empty capture,
/// and collapse the record's trace payload into the `has_trace` flag.
///
/// Traces are never kept resident in memory; consumers load them on demand
/// through the trace store.
pub(crate) fn attach_trace(
    record: &mut ScenarioRecord,
    meta: &SessionMeta,
    start: NaiveDateTime,
    end: NaiveDateTime,
    provider: Option<&Arc<dyn MouseProvider>>,
    store: &TraceStore,
) {
    if let Some(provider) = provider.filter(|p| p.enabled()) {
        if let (Some(start), Some(end)) = (resolve_local(start), resolve_local(end)) {
            if start < end {
                let samples = provider.get_range(start, end);
                tracing::debug!(
                    points = samples.len(),
                    file = %record.file_name,
                    window_start = %start.to_rfc3339(),
                    window_end = %end.to_rfc3339(),
                    "queried trace for session window"
                );
                record.trace = Some(samples);
            }
        }
    }

    let captured = record.trace.as_ref().is_some_and(|t| !t.is_empty());
    if captured {
        if !store.exists(&record.file_name) {
            let container = TraceContainer {
                version: TRACE_VERSION,
                file_name: record.file_name.clone(),
                scenario_name: meta.scenario_name.clone(),
                date_played: meta.date_played.to_rfc3339(),
                samples: record.trace.clone().unwrap_or_default(),
            };
            if let Err(err) = store.save(&container) {
                tracing::warn!(file = %record.file_name, error = %err, "failed to persist trace");
            }
        }
        record.has_trace = true;
    } else if store.exists(&record.file_name) {
        // No live capture (e.g. after a restart), but a persisted trace is
        // already on disk: flag it without loading.
        record.has_trace = true;
    }
    record.trace = None;
}
