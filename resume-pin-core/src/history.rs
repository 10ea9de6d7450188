//! Bounded, newest-first record of successful deployments.
//!
//! The ledger is an owned value handed to whoever needs it (usually wrapped in
//! an `Arc`); there is no global instance. Insertion and eviction happen under
//! one lock so the capacity bound holds under concurrent writers.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};
use uuid::Uuid;

use crate::templates::DEFAULT_TEMPLATE_ID;

pub const DEFAULT_TITLE: &str = "Untitled Resume";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Success,
}

/// Input to [`HistoryLedger::record`]; optional fields get defaults.
#[derive(Debug, Clone)]
pub struct NewHistoryEntry {
    pub title: Option<String>,
    pub file_name: String,
    pub content_id: String,
    pub primary_url: String,
    pub mirror_urls: Vec<String>,
    pub template_id: Option<String>,
    pub deployed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub id: String,
    pub title: String,
    pub file_name: String,
    pub content_id: String,
    pub primary_url: String,
    pub mirror_urls: Vec<String>,
    pub template_id: String,
    pub deployed_at: DateTime<Utc>,
    pub status: RecordStatus,
}

#[derive(Debug)]
pub struct HistoryLedger {
    capacity: usize,
    records: Mutex<VecDeque<HistoryRecord>>,
}

impl HistoryLedger {
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            records: Mutex::new(VecDeque::with_capacity(capacity + 1)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // A panic while holding the lock cannot leave the deque half-updated,
    // so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, VecDeque<HistoryRecord>> {
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Prepend a new record and evict the oldest beyond capacity.
    pub fn record(&self, entry: NewHistoryEntry) -> HistoryRecord {
        let record = HistoryRecord {
            id: Uuid::new_v4().to_string(),
            title: entry
                .title
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            file_name: entry.file_name,
            content_id: entry.content_id,
            primary_url: entry.primary_url,
            mirror_urls: entry.mirror_urls,
            template_id: entry
                .template_id
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_TEMPLATE_ID.to_string()),
            deployed_at: entry.deployed_at,
            status: RecordStatus::Success,
        };

        let mut records = self.lock();
        records.push_front(record.clone());
        while records.len() > self.capacity {
            if let Some(evicted) = records.pop_back() {
                debug!(id = %evicted.id, "[LEDGER] Evicted oldest record");
            }
        }
        info!(id = %record.id, len = records.len(), "[LEDGER] Recorded deployment");
        record
    }

    /// Snapshot of the records, newest first.
    pub fn list(&self) -> Vec<HistoryRecord> {
        self.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        let mut records = self.lock();
        let removed = records.len();
        records.clear();
        info!(removed, "[LEDGER] Cleared history");
    }
}

impl Default for HistoryLedger {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_HISTORY_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(n: usize) -> NewHistoryEntry {
        NewHistoryEntry {
            title: None,
            file_name: format!("resume-{n}.html"),
            content_id: format!("bafybei{n}"),
            primary_url: format!("https://r{n}.pinit.eth.limo"),
            mirror_urls: vec![],
            template_id: None,
            deployed_at: Utc::now(),
        }
    }

    #[test]
    fn defaults_are_filled() {
        let ledger = HistoryLedger::new(5);
        let rec = ledger.record(entry(1));
        assert_eq!(rec.title, DEFAULT_TITLE);
        assert_eq!(rec.template_id, DEFAULT_TEMPLATE_ID);
        assert_eq!(rec.status, RecordStatus::Success);
        assert!(!rec.id.is_empty());
    }

    #[test]
    fn zero_capacity_keeps_latest() {
        let ledger = HistoryLedger::new(0);
        ledger.record(entry(1));
        ledger.record(entry(2));
        let list = ledger.list();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].file_name, "resume-2.html");
    }

    #[test]
    fn status_serialises_lowercase() {
        let ledger = HistoryLedger::new(1);
        let rec = ledger.record(entry(1));
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["fileName"], "resume-1.html");
    }
}
