//! Date-stamped audit snapshots of each step's payload.
//!
//! Steps hand typed values directly to each other; these files are written
//! for operator inspection only and nothing reads them back. A failed write
//! is logged at warn and never fails the step.

use std::path::PathBuf;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

pub struct SnapshotWriter {
    dir: PathBuf,
}

impl SnapshotWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Write `value` as pretty JSON to `{dir}/{prefix}_{YYYY-MM-DD}.json`,
    /// overwriting any snapshot already taken today.
    pub fn record<T: Serialize>(&self, prefix: &str, value: &T) {
        let filename = format!("{prefix}_{}.json", Utc::now().format("%Y-%m-%d"));
        let path = self.dir.join(&filename);

        let json = match serde_json::to_vec_pretty(value) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(prefix, error = %e, "snapshot serialization failed; skipping");
                return;
            }
        };
        if let Err(e) = std::fs::create_dir_all(&self.dir) {
            warn!(dir = %self.dir.display(), error = %e, "snapshot dir unavailable; skipping");
            return;
        }
        match std::fs::write(&path, json) {
            Ok(()) => info!(path = %path.display(), "snapshot written"),
            Err(e) => warn!(path = %path.display(), error = %e, "snapshot write failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn unique_dir() -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("unix time")
            .as_nanos();
        std::env::temp_dir().join(format!("adweekly-snapshot-{nanos}"))
    }

    #[test]
    fn writes_a_dated_json_file() {
        let dir = unique_dir();
        let writer = SnapshotWriter::new(&dir);
        writer.record("ads_data", &json!({"campaigns": []}));

        let expected = dir.join(format!("ads_data_{}.json", Utc::now().format("%Y-%m-%d")));
        let contents = std::fs::read_to_string(expected).expect("snapshot file");
        assert!(contents.contains("campaigns"));
    }

    #[test]
    fn unwritable_directory_does_not_panic() {
        let writer = SnapshotWriter::new("/proc/adweekly-cannot-write-here");
        writer.record("leads", &json!({"total_leads": 0}));
    }
}
