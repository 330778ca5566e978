use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use crate::domain::ports::run_log::{RunEvent, RunLog, RunLogError};

/// Appends one JSON object per run event to
/// `<dir>/hostcheck-<YYYYMMDDTHHMMSSZ>.jsonl`.
pub struct JsonLinesRunLog {
    path: PathBuf,
    // serializes appends from a single run
    lock: Mutex<()>,
}

impl JsonLinesRunLog {
    /// Names the artifact after the run start time.
    #[must_use]
    pub fn for_run(dir: &Path, started_at: DateTime<Utc>) -> Self {
        Self::at(dir.join(file_name(started_at)))
    }

    #[must_use]
    pub fn at(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append_json_line(&self, json: &str) -> Result<(), RunLogError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|e| RunLogError::WriteFailed(format!("run log lock poisoned: {e}")))?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                RunLogError::WriteFailed(format!("cannot create {}: {e}", parent.display()))
            })?;
        }

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                RunLogError::WriteFailed(format!("cannot open {}: {e}", self.path.display()))
            })?;

        writeln!(file, "{json}").map_err(|e| {
            RunLogError::WriteFailed(format!("cannot write {}: {e}", self.path.display()))
        })
    }
}

impl RunLog for JsonLinesRunLog {
    fn record(&self, event: &RunEvent) -> Result<(), RunLogError> {
        let json = serde_json::to_string(event)
            .map_err(|e| RunLogError::WriteFailed(format!("JSON serialization failed: {e}")))?;
        self.append_json_line(&json)
    }
}

fn file_name(started_at: DateTime<Utc>) -> String {
    format!("hostcheck-{}.jsonl", started_at.format("%Y%m%dT%H%M%SZ"))
}
