//! Sextant Core
//!
//! Resource model, attribute schemas, flat state records and schema
//! upgrades shared by the Sextant provider, state store and CLI.

pub mod differ;
pub mod flatmap;
pub mod provider;
pub mod resource;
pub mod schema;
pub mod upgrade;
