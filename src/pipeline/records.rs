//! Last-run bookkeeping for incremental stages.

use std::time::SystemTime;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

/// Per-stage timestamp of the last completed batch.
///
/// Written only by the stage runner after a batch completes; read by the
/// incremental selector before the next one starts. Timestamps never go
/// backwards within a session and are not persisted across sessions, so
/// the first run of every stage is always a full run.
#[derive(Debug, Default)]
pub struct RunRecords {
    inner: Mutex<FxHashMap<String, SystemTime>>,
}

impl RunRecords {
    pub fn new() -> Self {
        Self::default()
    }

    /// Timestamp of the last completed batch for `stage`, if any.
    pub fn last_run(&self, stage: &str) -> Option<SystemTime> {
        self.inner.lock().get(stage).copied()
    }

    /// Record a completed batch. `started` is the batch start time, so a
    /// file modified while the batch ran is still picked up next time.
    pub fn mark_completed(&self, stage: &str, started: SystemTime) {
        let mut inner = self.inner.lock();
        let entry = inner.entry(stage.to_string()).or_insert(started);
        if started > *entry {
            *entry = started;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_first_run_has_no_record() {
        let records = RunRecords::new();
        assert!(records.last_run("css").is_none());
    }

    #[test]
    fn test_mark_and_read_back() {
        let records = RunRecords::new();
        let t = SystemTime::now();
        records.mark_completed("css", t);
        assert_eq!(records.last_run("css"), Some(t));
        assert!(records.last_run("js").is_none());
    }

    #[test]
    fn test_timestamps_never_regress() {
        let records = RunRecords::new();
        let later = SystemTime::now();
        let earlier = later - Duration::from_secs(5);
        records.mark_completed("css", later);
        records.mark_completed("css", earlier);
        assert_eq!(records.last_run("css"), Some(later));
    }
}
