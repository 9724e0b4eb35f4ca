//! SSM resource and data source schema definitions

pub mod association;
pub mod data_sources;
pub mod document;
pub mod parameter;
pub mod patch_baseline;
pub mod patch_group;
pub mod service_setting;

use sextant_core::schema::ResourceSchema;

/// Returns all SSM resource schemas
pub fn all_schemas() -> Vec<ResourceSchema> {
    vec![
        parameter::schema(),
        document::schema(),
        association::schema(),
        patch_baseline::schema(),
        patch_group::schema(),
        service_setting::schema(),
    ]
}

/// Returns all SSM data source schemas
pub fn all_data_source_schemas() -> Vec<ResourceSchema> {
    vec![
        data_sources::parameter(),
        data_sources::parameters_by_path(),
        data_sources::document(),
        data_sources::patch_baseline(),
        data_sources::instances(),
    ]
}
