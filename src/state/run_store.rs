use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};
use crate::types::RunResult;

/// Holds exactly one "last known" run result between cycles.
pub trait RunResultStore: Send {
    /// `Ok(None)` when nothing has been saved yet.
    fn load(&self) -> Result<Option<RunResult>>;
    /// Replaces whatever was stored before.
    fn save(&mut self, result: &RunResult) -> Result<()>;
}

/// Pretty-printed JSON file, rewritten in full on every save.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RunResultStore for JsonFileStore {
    fn load(&self) -> Result<Option<RunResult>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(AppError::Store(format!(
                    "failed to read {}: {e}",
                    self.path.display()
                )))
            }
        };

        serde_json::from_str(&raw).map(Some).map_err(|e| {
            AppError::Store(format!("failed to parse {}: {e}", self.path.display()))
        })
    }

    fn save(&mut self, result: &RunResult) -> Result<()> {
        let json = serde_json::to_string_pretty(result)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        // Write next to the target and rename so a crash never leaves half a record.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| {
            AppError::Store(format!("failed to write {}: {e}", tmp.display()))
        })?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            AppError::Store(format!("failed to replace {}: {e}", self.path.display()))
        })
    }
}
