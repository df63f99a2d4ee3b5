//! File-backed state table sync.
//!
//! Stands in for the remote counterpart: published tables are written to a
//! file, and a second file is polled for tables pushed from outside.

use cadtree::{load_state_table, write_state_table, StateSync, StateTable};
use std::fs;
use std::time::{Duration, Instant, SystemTime};

/// Writes every published table to `out_path`.
pub struct FileSync {
    out_path: String,
    published: usize,
    last_error: Option<String>,
}

impl FileSync {
    pub fn new(out_path: impl Into<String>) -> Self {
        Self {
            out_path: out_path.into(),
            published: 0,
            last_error: None,
        }
    }

    pub fn out_path(&self) -> &str {
        &self.out_path
    }

    pub fn published(&self) -> usize {
        self.published
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

impl StateSync for FileSync {
    fn publish(&mut self, table: StateTable) {
        match write_state_table(&self.out_path, &table) {
            Ok(()) => {
                self.published += 1;
                self.last_error = None;
                tracing::debug!(path = %self.out_path, rows = table.len(), "state table written");
            }
            Err(e) => {
                let message = format!("{:#}", e);
                tracing::error!(path = %self.out_path, error = %message, "failed to write state table");
                self.last_error = Some(message);
            }
        }
    }
}

/// Polls a state table file and yields its contents whenever it changes.
pub struct StateFileWatcher {
    path: String,
    interval: Duration,
    last_poll: Option<Instant>,
    last_modified: Option<SystemTime>,
}

impl StateFileWatcher {
    pub fn new(path: impl Into<String>, interval: Duration) -> Self {
        let path = path.into();
        let last_modified = modified_time(&path);
        Self {
            path,
            interval,
            last_poll: None,
            last_modified,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns the new table if the file changed since the last poll.
    ///
    /// Polls at most once per interval. Unreadable or malformed files are
    /// logged and skipped; the next modification is picked up again.
    pub fn poll(&mut self) -> Option<StateTable> {
        if let Some(last) = self.last_poll {
            if last.elapsed() < self.interval {
                return None;
            }
        }
        self.last_poll = Some(Instant::now());

        let modified = modified_time(&self.path)?;
        if self.last_modified == Some(modified) {
            return None;
        }
        self.last_modified = Some(modified);

        match load_state_table(&self.path) {
            Ok(table) => {
                tracing::info!(path = %self.path, rows = table.len(), "external state table received");
                Some(table)
            }
            Err(e) => {
                tracing::warn!(path = %self.path, error = %format!("{:#}", e), "ignoring unreadable state table");
                None
            }
        }
    }
}

fn modified_time(path: &str) -> Option<SystemTime> {
    fs::metadata(path).and_then(|meta| meta.modified()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadtree::State;
    use std::env;

    #[test]
    fn test_publish_writes_table() {
        let path = env::temp_dir().join("cadtree_file_sync_test.json");
        let path = path.to_str().unwrap();
        let _ = fs::remove_file(path);

        let mut sync = FileSync::new(path);
        let mut table = StateTable::new();
        table.insert("/a", vec![State::Selected, State::Empty]);
        sync.publish(table.clone());

        assert_eq!(sync.published(), 1);
        assert!(sync.last_error().is_none());
        assert_eq!(load_state_table(path).unwrap(), table);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_publish_failure_is_recorded() {
        let mut sync = FileSync::new("/nonexistent-dir/cadtree/state.json");
        sync.publish(StateTable::new());
        assert_eq!(sync.published(), 0);
        assert!(sync.last_error().is_some());
    }

    #[test]
    fn test_watcher_ignores_missing_file() {
        let mut watcher = StateFileWatcher::new("/nonexistent-dir/state.json", Duration::ZERO);
        assert!(watcher.poll().is_none());
    }
}
