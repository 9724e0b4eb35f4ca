//! Sextant State Management
//!
//! Persists the state of managed resources and keeps it readable as resource
//! schemas evolve.
//!
//! - **StateFile**: all managed resources, each tagged with the schema version
//!   its attributes were written under
//! - **StateBackend**: storage and locking (a local JSON file for now)
//! - **upgrade_state**: runs registered state upgraders over a whole file
//!
//! # Example
//!
//! ```ignore
//! use sextant_state::{BackendConfig, create_backend, upgrade_state};
//!
//! let backend = create_backend(&BackendConfig::local("sextant.state.json"))?;
//! let lock = backend.acquire_lock("state upgrade").await?;
//!
//! if let Some(mut state) = backend.read_state().await? {
//!     let report = upgrade_state(&mut state, &sextant_provider_ssm::resource_types())?;
//!     if !report.is_empty() {
//!         state.increment_serial();
//!         backend.write_state(&state).await?;
//!     }
//! }
//!
//! backend.release_lock(&lock).await?;
//! ```

pub mod backend;
pub mod backends;
pub mod lock;
pub mod state;
pub mod upgrade;

pub use backend::{BackendConfig, BackendError, BackendResult, StateBackend};
pub use backends::{LocalBackend, create_backend};
pub use lock::LockInfo;
pub use state::{ResourceState, StateFile};
pub use upgrade::{UpgradeError, UpgradeReport, UpgradedResource, upgrade_state};
