//! Persistence of the "last handled post" marker.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::RelayError;

/// Default marker file, relative to the working directory.
pub const DEFAULT_MARKER_PATH: &str = "./last_id.txt";

/// Storage for the single marker value carried between runs.
pub trait MarkerStore: Send + Sync {
    /// Load the current marker, `None` when nothing was stored yet.
    fn load(&self) -> Result<Option<String>, RelayError>;

    /// Replace the stored marker.
    fn save(&self, id: &str) -> Result<(), RelayError>;
}

/// Marker kept as a plain-text file holding just the id.
#[derive(Debug, Clone)]
pub struct FileMarkerStore {
    path: PathBuf,
}

impl FileMarkerStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> RelayError {
        RelayError::Marker {
            path: self.path.clone(),
            source,
        }
    }
}

impl MarkerStore for FileMarkerStore {
    fn load(&self) -> Result<Option<String>, RelayError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.path).map_err(|e| self.io_error(e))?;
        let marker = content.trim();
        if marker.is_empty() {
            Ok(None)
        } else {
            Ok(Some(marker.to_string()))
        }
    }

    fn save(&self, id: &str) -> Result<(), RelayError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
            }
        }
        std::fs::write(&self.path, id).map_err(|e| self.io_error(e))?;
        tracing::debug!(path = %self.path.display(), id, "Saved marker");
        Ok(())
    }
}

/// In-memory marker, used by tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryMarkerStore {
    inner: Mutex<MemoryMarker>,
}

#[derive(Debug, Default)]
struct MemoryMarker {
    current: Option<String>,
    history: Vec<String>,
}

impl MemoryMarkerStore {
    /// Create a store that already holds `marker`.
    #[must_use]
    pub fn with_marker(marker: impl Into<String>) -> Self {
        Self {
            inner: Mutex::new(MemoryMarker {
                current: Some(marker.into()),
                history: Vec::new(),
            }),
        }
    }

    /// Copy the marker currently held by `store`.
    ///
    /// Saves go to the copy only, leaving `store` untouched.
    pub fn snapshot_of(store: &dyn MarkerStore) -> Result<Self, RelayError> {
        Ok(match store.load()? {
            Some(marker) => Self::with_marker(marker),
            None => Self::default(),
        })
    }

    /// Current marker value.
    #[must_use]
    pub fn current(&self) -> Option<String> {
        self.lock().current.clone()
    }

    /// Every id saved so far, in order.
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.lock().history.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryMarker> {
        // A poisoned lock only means a test panicked mid-save; the data is still usable.
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl MarkerStore for MemoryMarkerStore {
    fn load(&self) -> Result<Option<String>, RelayError> {
        Ok(self.current())
    }

    fn save(&self, id: &str) -> Result<(), RelayError> {
        let mut inner = self.lock();
        inner.current = Some(id.to_string());
        inner.history.push(id.to_string());
        Ok(())
    }
}
