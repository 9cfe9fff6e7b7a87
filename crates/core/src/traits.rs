//! Core traits at the seams of the database manager
//!
//! Consumed (implemented by the surrounding server):
//! - [`DatabaseInstance`]: one running database engine
//! - [`InstanceFactory`]: builds instances for a given identity
//!
//! Exposed (implemented by the manager, called by the command layer):
//! - [`DatabaseRuntimeManager`]: CREATE / DROP DATABASE at runtime
//! - [`DatabaseAccessChecker`]: connection-time authorization and GRANT / REVOKE
//!
//! Thread safety: all traits require `Send + Sync`; implementations are
//! shared across request-handling threads.

use crate::error::StrataResult;
use crate::types::{AccessMode, DatabaseId};
use std::sync::Arc;
use uuid::Uuid;

/// Handle to one database engine bound to a single [`DatabaseId`]
///
/// Both `start` and `stop` are fallible. The manager treats an `Err` and a
/// panic from either method the same way: the fault is captured on the
/// database and not propagated.
pub trait DatabaseInstance: Send + Sync {
    /// Identity this instance is bound to
    fn id(&self) -> &DatabaseId;

    /// Start the engine
    fn start(&self) -> StrataResult<()>;

    /// Stop the engine
    fn stop(&self) -> StrataResult<()>;
}

/// Options passed to the [`InstanceFactory`] when a database is created
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstanceOptions {
    /// Access mode declared for the database
    pub access_mode: AccessMode,
}

impl InstanceOptions {
    /// Create options with default settings (read-write mode)
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the access mode
    pub fn access_mode(mut self, mode: AccessMode) -> Self {
        self.access_mode = mode;
        self
    }
}

/// Builds database instances
pub trait InstanceFactory: Send + Sync {
    /// Construct (but do not start) an instance for `id`
    ///
    /// `options` is `None` when the caller has no catalog-declared settings,
    /// e.g. for a CREATE DATABASE issued at runtime.
    fn create(
        &self,
        id: &DatabaseId,
        options: Option<&InstanceOptions>,
    ) -> StrataResult<Arc<dyn DatabaseInstance>>;
}

/// Runtime database management, used when translating CREATE / DROP DATABASE
pub trait DatabaseRuntimeManager: Send + Sync {
    /// Create and start a database at runtime, granting `owner` access.
    ///
    /// Idempotent per `(name, uuid)`: an already loaded database is not
    /// recreated, but the owner grant is still applied. An empty `owner`
    /// grants nothing.
    fn create_and_start_database(&self, name: &str, uuid: Uuid, owner: &str) -> StrataResult<()>;

    /// Create and start a database with no owner (admin-only access)
    fn create_and_start_database_unowned(&self, name: &str, uuid: Uuid) -> StrataResult<()> {
        self.create_and_start_database(name, uuid, "")
    }

    /// [`create_and_start_database`](Self::create_and_start_database) for
    /// callers holding the uuid as text, as parsed from a command.
    ///
    /// # Errors
    /// Returns `InvalidInput` if the name is invalid or the uuid does not parse.
    fn create_and_start_database_from_str(
        &self,
        name: &str,
        uuid: &str,
        owner: &str,
    ) -> StrataResult<()> {
        let id = DatabaseId::parse(name, uuid)?;
        self.create_and_start_database(id.name(), id.uuid(), owner)
    }

    /// Stop and forget a database. Idempotent: unknown names are a no-op.
    fn drop_database(&self, name: &str) -> StrataResult<()>;
}

/// Per-database user authorization
pub trait DatabaseAccessChecker: Send + Sync {
    /// True if `username` may open transactions against `database`.
    ///
    /// An empty username means authorization is disabled.
    fn can_user_access_database(&self, username: &str, database: &str) -> bool;

    /// Record that `username` may access `database`.
    ///
    /// Only the in-memory index is updated; the caller persists the
    /// matching catalog grant edge.
    fn grant_user_access_to_database(&self, username: &str, database: &str);

    /// Remove the in-memory grant of `username` on `database`.
    fn revoke_user_access_to_database(&self, username: &str, database: &str);
}
