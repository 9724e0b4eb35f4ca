//! State backend trait and error types

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::lock::LockInfo;
use crate::state::StateFile;

/// Errors that can occur when interacting with a state backend
#[derive(Debug, Error)]
pub enum BackendError {
    /// The state is locked by another process
    #[error("State is locked by {who} (lock ID: {lock_id}, operation: {operation})")]
    Locked {
        lock_id: String,
        who: String,
        operation: String,
    },

    #[error("Lock not found: {0}")]
    LockNotFound(String),

    #[error("Lock ID mismatch: expected {expected}, got {actual}")]
    LockMismatch { expected: String, actual: String },

    #[error("Unsupported backend type: {0}")]
    UnsupportedBackend(String),

    #[error("Backend configuration error: {0}")]
    Configuration(String),

    /// State file is corrupted or invalid
    #[error("Invalid state file: {0}")]
    InvalidState(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl BackendError {
    pub fn locked(lock: &LockInfo) -> Self {
        Self::Locked {
            lock_id: lock.id.clone(),
            who: lock.who.clone(),
            operation: lock.operation.clone(),
        }
    }

    pub fn unsupported_backend(backend_type: impl Into<String>) -> Self {
        Self::UnsupportedBackend(backend_type.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Trait for state storage backends
///
/// Stores and retrieves the state file and arbitrates concurrent writers
/// through a lock.
#[async_trait]
pub trait StateBackend: Send + Sync {
    /// Read the current state. `None` when no state has been written yet.
    async fn read_state(&self) -> BackendResult<Option<StateFile>>;

    /// Write the state. Callers bump the serial first.
    async fn write_state(&self, state: &StateFile) -> BackendResult<()>;

    /// Acquire a lock for the given operation
    ///
    /// Fails while another unexpired lock is held.
    async fn acquire_lock(&self, operation: &str) -> BackendResult<LockInfo>;

    /// Release a lock previously returned by `acquire_lock`
    async fn release_lock(&self, lock: &LockInfo) -> BackendResult<()>;

    /// Remove a lock by ID regardless of who holds it
    async fn force_unlock(&self, lock_id: &str) -> BackendResult<()>;

    /// Describe where the state lives, for messages
    fn location(&self) -> String;
}

/// Configuration for a state backend
#[derive(Debug, Clone, Default)]
pub struct BackendConfig {
    /// Backend type (currently only "local")
    pub backend_type: String,
    /// Backend-specific attributes
    pub attributes: HashMap<String, String>,
}

impl BackendConfig {
    pub fn local(path: impl Into<String>) -> Self {
        Self {
            backend_type: "local".to_string(),
            attributes: HashMap::from([("path".to_string(), path.into())]),
        }
    }

    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}
