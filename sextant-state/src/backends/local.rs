//! Local file backend for state storage
//!
//! State lives in a JSON file (default: sextant.state.json). Writes go to a
//! temporary sibling first and are renamed into place, so a crash never
//! leaves a half-written state. A sibling `.lock` file holds the lock; it is
//! hard-linked into place so only one writer can create it.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::backend::{BackendConfig, BackendError, BackendResult, StateBackend};
use crate::lock::LockInfo;
use crate::state::StateFile;

/// Local file backend
pub struct LocalBackend {
    state_path: PathBuf,
    lock_path: PathBuf,
}

impl LocalBackend {
    pub const DEFAULT_STATE_FILE: &'static str = "sextant.state.json";

    pub fn new() -> Self {
        Self::with_path(PathBuf::from(Self::DEFAULT_STATE_FILE))
    }

    pub fn with_path(state_path: PathBuf) -> Self {
        let lock_path = state_path.with_extension("lock");
        Self {
            state_path,
            lock_path,
        }
    }

    pub fn from_config(config: &BackendConfig) -> BackendResult<Self> {
        let path = config
            .get_string("path")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(Self::DEFAULT_STATE_FILE));

        if path.as_os_str().is_empty() {
            return Err(BackendError::configuration("state path must not be empty"));
        }

        Ok(Self::with_path(path))
    }

    pub fn state_path(&self) -> &Path {
        &self.state_path
    }

    async fn read_lock(&self) -> BackendResult<Option<LockInfo>> {
        let content = match fs::read_to_string(&self.lock_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(BackendError::Io(format!("Failed to read lock file: {}", e)));
            }
        };

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| BackendError::InvalidState(format!("Failed to parse lock file: {}", e)))
    }

    async fn remove_lock(&self) -> BackendResult<()> {
        fs::remove_file(&self.lock_path)
            .await
            .map_err(|e| BackendError::Io(format!("Failed to remove lock file: {}", e)))
    }

    async fn try_create_lock(&self, lock: &LockInfo) -> BackendResult<bool> {
        let content = serde_json::to_string_pretty(lock)
            .map_err(|e| BackendError::Serialization(format!("Failed to serialize lock: {}", e)))?;

        create_exclusive(&self.lock_path, content.as_bytes())
            .await
            .map_err(|e| BackendError::Io(format!("Failed to write lock file: {}", e)))
    }

    /// Remove the expired lock `stale`, unless someone already replaced it
    async fn remove_stale_lock(&self, stale: &LockInfo) -> BackendResult<()> {
        match self.read_lock().await? {
            Some(current) if current.id == stale.id => match fs::remove_file(&self.lock_path).await {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                Err(e) => Err(BackendError::Io(format!("Failed to remove lock file: {}", e))),
            },
            _ => Ok(()),
        }
    }
}

impl Default for LocalBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Write `content` to a fresh temporary sibling of `path`
async fn write_temp(path: &Path, content: &[u8]) -> std::io::Result<PathBuf> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(format!(".{}.tmp", uuid::Uuid::new_v4().simple()));
    let tmp = PathBuf::from(tmp);

    let mut file = fs::File::create(&tmp).await?;
    let written = match file.write_all(content).await {
        Ok(()) => file.sync_all().await,
        Err(e) => Err(e),
    };
    drop(file);

    if let Err(e) = written {
        let _ = fs::remove_file(&tmp).await;
        return Err(e);
    }
    Ok(tmp)
}

/// Write `content` next to `path` and rename it into place
async fn write_atomic(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let tmp = write_temp(path, content).await?;

    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(e);
    }
    Ok(())
}

/// Publish `content` at `path` only if nothing is there yet.
///
/// The content is complete before the link appears, so readers never see a
/// partial file. Returns `false` when `path` already exists.
async fn create_exclusive(path: &Path, content: &[u8]) -> std::io::Result<bool> {
    let tmp = write_temp(path, content).await?;
    let linked = fs::hard_link(&tmp, path).await;
    let _ = fs::remove_file(&tmp).await;

    match linked {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(e),
    }
}

#[async_trait]
impl StateBackend for LocalBackend {
    async fn read_state(&self) -> BackendResult<Option<StateFile>> {
        let content = match fs::read_to_string(&self.state_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(BackendError::Io(format!("Failed to read state file: {}", e)));
            }
        };

        let state: StateFile = serde_json::from_str(&content).map_err(|e| {
            BackendError::InvalidState(format!("Failed to parse state file: {}", e))
        })?;

        if state.version > StateFile::CURRENT_VERSION {
            return Err(BackendError::InvalidState(format!(
                "state file format version {} is newer than supported version {}",
                state.version,
                StateFile::CURRENT_VERSION
            )));
        }

        Ok(Some(state))
    }

    async fn write_state(&self, state: &StateFile) -> BackendResult<()> {
        let content = serde_json::to_string_pretty(state).map_err(|e| {
            BackendError::Serialization(format!("Failed to serialize state: {}", e))
        })?;

        write_atomic(&self.state_path, content.as_bytes())
            .await
            .map_err(|e| BackendError::Io(format!("Failed to write state file: {}", e)))?;

        log::debug!(
            "wrote state serial {} to {}",
            state.serial,
            self.state_path.display()
        );
        Ok(())
    }

    async fn acquire_lock(&self, operation: &str) -> BackendResult<LockInfo> {
        let lock = LockInfo::new(operation);

        // One retry: after an expired lock is removed, or a lock released
        // between our attempt and the read.
        for _ in 0..2 {
            if self.try_create_lock(&lock).await? {
                log::debug!("acquired lock {} for '{}'", lock.id, operation);
                return Ok(lock);
            }

            match self.read_lock().await? {
                Some(existing) if !existing.is_expired() => {
                    return Err(BackendError::locked(&existing));
                }
                Some(existing) => {
                    log::warn!("taking over expired lock {}", existing);
                    self.remove_stale_lock(&existing).await?;
                }
                None => {}
            }
        }

        match self.read_lock().await? {
            Some(existing) => Err(BackendError::locked(&existing)),
            None => Err(BackendError::Io(
                "lock file changed while acquiring the lock; try again".to_string(),
            )),
        }
    }

    async fn release_lock(&self, lock: &LockInfo) -> BackendResult<()> {
        let existing = self
            .read_lock()
            .await?
            .ok_or_else(|| BackendError::LockNotFound(lock.id.clone()))?;

        if existing.id != lock.id {
            return Err(BackendError::LockMismatch {
                expected: lock.id.clone(),
                actual: existing.id,
            });
        }

        self.remove_lock().await
    }

    async fn force_unlock(&self, lock_id: &str) -> BackendResult<()> {
        let existing = self
            .read_lock()
            .await?
            .ok_or_else(|| BackendError::LockNotFound(lock_id.to_string()))?;

        if existing.id != lock_id {
            return Err(BackendError::LockMismatch {
                expected: lock_id.to_string(),
                actual: existing.id,
            });
        }

        log::info!("force-unlocking {}", existing);
        self.remove_lock().await
    }

    fn location(&self) -> String {
        self.state_path.display().to_string()
    }
}
