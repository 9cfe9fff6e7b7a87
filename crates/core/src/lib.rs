//! Core types and traits for the Strata database manager
//!
//! This crate defines the foundational types used throughout the system:
//! - DatabaseId: Identity of a database incarnation (name + uuid)
//! - AccessMode: Read-write / read-only declaration
//! - StrataError: Error type hierarchy
//! - Traits: Instance and factory seams, runtime manager and access checker capabilities
//! - Catalog: Read interface over the durable catalog, plus an in-memory implementation

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod catalog;
pub mod error;
pub mod traits;
pub mod types;

pub use catalog::{
    Catalog, CatalogReadTransaction, DatabaseRecord, DatabaseStatus, GrantEdge, GrantSource,
    MemoryCatalog,
};
pub use error::{StrataError, StrataResult};
pub use traits::{
    DatabaseAccessChecker, DatabaseInstance, DatabaseRuntimeManager, InstanceFactory,
    InstanceOptions,
};
pub use types::{
    validate_database_name, AccessMode, DatabaseId, MAX_DATABASE_NAME_LENGTH,
    SYSTEM_DATABASE_NAME, SYSTEM_DATABASE_UUID,
};
