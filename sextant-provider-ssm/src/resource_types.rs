//! Resource and data source type definitions
//!
//! Each type ties a type name to its schema and, for types whose persisted
//! layout changed, to the upgraders that bring old state forward.

use sextant_core::provider::ResourceType;
use sextant_core::schema::ResourceSchema;
use sextant_core::upgrade::StateUpgrader;

use crate::migrate::{association_upgraders, patch_group_upgraders};
use crate::schemas::{
    association, data_sources, document, parameter, patch_baseline, patch_group, service_setting,
};

// =============================================================================
// Type Definitions
// =============================================================================

macro_rules! define_resource_type {
    ($name:ident, $type_name:expr, $schema:expr) => {
        pub struct $name;
        impl ResourceType for $name {
            fn name(&self) -> &'static str {
                $type_name
            }
            fn schema(&self) -> ResourceSchema {
                $schema()
            }
        }
    };
    ($name:ident, $type_name:expr, $schema:expr, upgraders = $upgraders:expr) => {
        pub struct $name;
        impl ResourceType for $name {
            fn name(&self) -> &'static str {
                $type_name
            }
            fn schema(&self) -> ResourceSchema {
                $schema()
            }
            fn state_upgraders(&self) -> Vec<StateUpgrader> {
                $upgraders()
            }
        }
    };
}

define_resource_type!(ParameterType, parameter::RESOURCE_TYPE, parameter::schema);
define_resource_type!(DocumentType, document::RESOURCE_TYPE, document::schema);
define_resource_type!(
    AssociationType,
    association::RESOURCE_TYPE,
    association::schema,
    upgraders = association_upgraders
);
define_resource_type!(
    PatchBaselineType,
    patch_baseline::RESOURCE_TYPE,
    patch_baseline::schema
);
define_resource_type!(
    PatchGroupType,
    patch_group::RESOURCE_TYPE,
    patch_group::schema,
    upgraders = patch_group_upgraders
);
define_resource_type!(
    ServiceSettingType,
    service_setting::RESOURCE_TYPE,
    service_setting::schema
);

define_resource_type!(
    ParameterDataSource,
    data_sources::PARAMETER,
    data_sources::parameter
);
define_resource_type!(
    ParametersByPathDataSource,
    data_sources::PARAMETERS_BY_PATH,
    data_sources::parameters_by_path
);
define_resource_type!(
    DocumentDataSource,
    data_sources::DOCUMENT,
    data_sources::document
);
define_resource_type!(
    PatchBaselineDataSource,
    data_sources::PATCH_BASELINE,
    data_sources::patch_baseline
);
define_resource_type!(
    InstancesDataSource,
    data_sources::INSTANCES,
    data_sources::instances
);

/// Returns all resource types supported by this provider
pub fn resource_types() -> Vec<Box<dyn ResourceType>> {
    vec![
        Box::new(ParameterType),
        Box::new(DocumentType),
        Box::new(AssociationType),
        Box::new(PatchBaselineType),
        Box::new(PatchGroupType),
        Box::new(ServiceSettingType),
    ]
}

/// Returns all data source types supported by this provider
pub fn data_source_types() -> Vec<Box<dyn ResourceType>> {
    vec![
        Box::new(ParameterDataSource),
        Box::new(ParametersByPathDataSource),
        Box::new(DocumentDataSource),
        Box::new(PatchBaselineDataSource),
        Box::new(InstancesDataSource),
    ]
}

/// Find a resource type by name
pub fn find_resource_type(name: &str) -> Option<Box<dyn ResourceType>> {
    resource_types().into_iter().find(|t| t.name() == name)
}

/// Find a data source type by name
pub fn find_data_source_type(name: &str) -> Option<Box<dyn ResourceType>> {
    data_source_types().into_iter().find(|t| t.name() == name)
}
