//! Data source queries against the SSM API
//!
//! A data source must resolve; a lookup that finds nothing is an error rather
//! than a missing state.

mod document;
mod instances;
mod parameter;
mod parameters_by_path;
mod patch_baseline;

pub use patch_baseline::select_patch_baseline;

use sextant_core::provider::ProviderError;
use sextant_core::resource::Resource;

/// Error for a query whose target does not exist
pub(crate) fn not_found(query: &Resource, what: &str) -> ProviderError {
    ProviderError::new(format!("{} not found", what)).for_resource(query.id.clone())
}

/// `with_decryption` defaults to true
pub(crate) fn with_decryption(query: &Resource) -> bool {
    query.get_bool("with_decryption").unwrap_or(true)
}
