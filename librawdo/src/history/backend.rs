//! where the history log lives

use super::{HistoryError, HistoryLog};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;

/// directory under the user data dir
pub const APP_DIR: &str = "rawdodendron";
pub const HISTORY_FILE: &str = "history.json";
/// extension given to an unreadable log before it is replaced
pub const BACKUP_EXTENSION: &str = "bak";

/// whole-log persistence, no incremental updates
pub trait HistoryBackend {
    /// read the full log; a missing log is empty, not an error
    fn load(&self) -> Result<HistoryLog, HistoryError>;

    /// replace the persisted log
    fn save(&mut self, log: &HistoryLog) -> Result<(), HistoryError>;
}

impl<T: HistoryBackend + ?Sized> HistoryBackend for Box<T> {
    fn load(&self) -> Result<HistoryLog, HistoryError> {
        (**self).load()
    }

    fn save(&mut self, log: &HistoryLog) -> Result<(), HistoryError> {
        (**self).save(log)
    }
}

/// JSON document on disk
///
/// No locking: two processes sharing the file race and the last writer wins.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileBackend { path: path.into() }
    }

    /// `<data dir>/rawdodendron/history.json` for the current user
    pub fn default_location() -> Result<Self, HistoryError> {
        let dir = dirs::data_dir().ok_or(HistoryError::NoDataDir)?;
        Ok(Self::new(dir.join(APP_DIR).join(HISTORY_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// where a corrupt log is moved before being replaced
    pub fn backup_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".");
        name.push(BACKUP_EXTENSION);
        PathBuf::from(name)
    }

    fn io_error(&self, source: io::Error) -> HistoryError {
        HistoryError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl HistoryBackend for JsonFileBackend {
    fn load(&self) -> Result<HistoryLog, HistoryError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(HistoryLog::default()),
            Err(e) => return Err(self.io_error(e)),
        };

        serde_json::from_str(&text).map_err(|source| HistoryError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    /// A log on disk that does not parse is renamed to [`Self::backup_path`]
    /// first.
    fn save(&mut self, log: &HistoryLog) -> Result<(), HistoryError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        if let Err(HistoryError::Corrupt { .. }) = self.load() {
            let backup = self.backup_path();
            warn!("moving unreadable history to {}", backup.display());
            fs::rename(&self.path, &backup).map_err(|e| self.io_error(e))?;
        }
        let text = serde_json::to_string_pretty(log).map_err(HistoryError::Serialize)?;
        fs::write(&self.path, text).map_err(|e| self.io_error(e))
    }
}

/// keeps the log in memory only
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    log: HistoryLog,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_log(log: HistoryLog) -> Self {
        MemoryBackend { log }
    }

    pub fn log(&self) -> &HistoryLog {
        &self.log
    }
}

impl HistoryBackend for MemoryBackend {
    fn load(&self) -> Result<HistoryLog, HistoryError> {
        Ok(self.log.clone())
    }

    fn save(&mut self, log: &HistoryLog) -> Result<(), HistoryError> {
        self.log = log.clone();
        Ok(())
    }
}
