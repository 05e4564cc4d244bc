//! Persisted active-team choice
//!
//! A single slot holding the id of the last team the user switched to. It is
//! read when a session is restored, written on every explicit switch and
//! cleared on sign-out.

use parking_lot::Mutex;
use std::io;
use std::path::{Path, PathBuf};
#[cfg(unix)]
use std::{io::Write, os::unix::fs::OpenOptionsExt};
use td_core::error::TdError;
use td_core::traits::Id;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PreferenceError {
    #[error("Preference file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Preference file {path} holds {value:?}, not a team id")]
    Malformed { path: PathBuf, value: String },
}

impl From<PreferenceError> for TdError {
    fn from(err: PreferenceError) -> Self {
        TdError::Internal(err.to_string())
    }
}

pub type PreferenceResult<T> = Result<T, PreferenceError>;

pub trait PreferenceStore: Send + Sync {
    fn load_active_team(&self) -> PreferenceResult<Option<Id>>;

    fn save_active_team(&self, team_id: Id) -> PreferenceResult<()>;

    fn clear(&self) -> PreferenceResult<()>;
}

/// Slot backed by a small file, readable only by the owner on unix
#[derive(Debug, Clone)]
pub struct FilePreferenceStore {
    path: PathBuf,
}

impl FilePreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> PreferenceError {
        PreferenceError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

fn secure_write(path: &Path, content: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    #[cfg(unix)]
    {
        std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)?
            .write_all(content.as_bytes())?;
    }

    #[cfg(not(unix))]
    {
        std::fs::write(path, content)?;
    }

    Ok(())
}

impl PreferenceStore for FilePreferenceStore {
    fn load_active_team(&self) -> PreferenceResult<Option<Id>> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(self.io_error(err)),
        };

        let value = raw.trim();
        if value.is_empty() {
            return Ok(None);
        }
        value
            .parse()
            .map(Some)
            .map_err(|_| PreferenceError::Malformed {
                path: self.path.clone(),
                value: value.to_string(),
            })
    }

    fn save_active_team(&self, team_id: Id) -> PreferenceResult<()> {
        secure_write(&self.path, &team_id.to_string()).map_err(|e| self.io_error(e))
    }

    fn clear(&self) -> PreferenceResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(self.io_error(err)),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    slot: Mutex<Option<Id>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_team(team_id: Id) -> Self {
        Self {
            slot: Mutex::new(Some(team_id)),
        }
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn load_active_team(&self) -> PreferenceResult<Option<Id>> {
        Ok(*self.slot.lock())
    }

    fn save_active_team(&self, team_id: Id) -> PreferenceResult<()> {
        *self.slot.lock() = Some(team_id);
        Ok(())
    }

    fn clear(&self) -> PreferenceResult<()> {
        *self.slot.lock() = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("taskdesk-{}", uuid::Uuid::new_v4()))
            .join("active_team")
    }

    #[test]
    fn test_file_round_trip() {
        let store = FilePreferenceStore::new(temp_path());
        assert_eq!(store.load_active_team().unwrap(), None);

        store.save_active_team(42).unwrap();
        assert_eq!(store.load_active_team().unwrap(), Some(42));

        store.clear().unwrap();
        store.clear().unwrap();
        assert_eq!(store.load_active_team().unwrap(), None);
    }

    #[test]
    fn test_malformed_file() {
        let path = temp_path();
        secure_write(&path, "engineering\n").unwrap();
        let store = FilePreferenceStore::new(&path);
        assert!(matches!(
            store.load_active_team(),
            Err(PreferenceError::Malformed { .. })
        ));
        store.clear().unwrap();
    }

    #[test]
    fn test_memory_slot() {
        let store = MemoryPreferenceStore::with_team(3);
        assert_eq!(store.load_active_team().unwrap(), Some(3));
        store.clear().unwrap();
        assert_eq!(store.load_active_team().unwrap(), None);
    }
}
