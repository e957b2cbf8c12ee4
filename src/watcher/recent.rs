use crate::watcher::types::ScenarioRecord;
use std::collections::VecDeque;

/// In-memory cap when configuration does not bound the backlog.
pub const DEFAULT_RECENT_CAP: usize = 500;

/// Capacity-bounded FIFO of the most recently parsed records.
pub struct RecentStore {
    records: VecDeque<ScenarioRecord>,
    cap: usize,
}

impl RecentStore {
    pub fn new(cap: usize) -> Self {
        Self {
            records: VecDeque::new(),
            cap: if cap == 0 { DEFAULT_RECENT_CAP } else { cap },
        }
    }

    pub fn set_cap(&mut self, cap: usize) {
        self.cap = if cap == 0 { DEFAULT_RECENT_CAP } else { cap };
        while self.records.len() > self.cap {
            self.records.pop_front();
        }
    }

    /// Append a record, evicting the oldest past the capacity.
    pub fn push(&mut self, record: ScenarioRecord) {
        self.records.push_back(record);
        while self.records.len() > self.cap {
            self.records.pop_front();
        }
    }

    /// Up to `limit` records, most recent first. Zero means "all".
    pub fn recent(&self, limit: usize) -> Vec<ScenarioRecord> {
        let take = if limit == 0 || limit > self.records.len() {
            self.records.len()
        } else {
            limit
        };
        self.records.iter().rev().take(take).cloned().collect()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ScenarioRecord> {
        self.records.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}
