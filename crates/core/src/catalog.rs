//! Durable catalog interface
//!
//! The catalog is the source of truth for which databases should exist and
//! who may access them. It lives in the system database and is mutated by
//! the command layer; the manager only ever reads it through a
//! [`CatalogReadTransaction`].
//!
//! ## Records
//!
//! - [`DatabaseRecord`]: one declared database `{name, uuid, status, access_mode, timestamps}`
//! - [`GrantEdge`]: an incoming access edge pointing at a declared database
//!
//! [`MemoryCatalog`] is an in-process implementation for embedders and tests.

use crate::error::{StrataError, StrataResult};
use crate::types::{AccessMode, DatabaseId};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Declared status of a database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DatabaseStatus {
    /// Database should be running
    #[default]
    Online,
    /// Database was taken offline by an administrator
    Offline,
}

/// A database declaration stored in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseRecord {
    /// Database name
    pub name: String,
    /// Incarnation uuid
    pub uuid: Uuid,
    /// Declared status
    pub status: DatabaseStatus,
    /// Declared access mode
    pub access_mode: AccessMode,
    /// When the declaration was created
    pub created_at: DateTime<Utc>,
    /// When the declaration was last modified
    pub updated_at: DateTime<Utc>,
}

impl DatabaseRecord {
    /// Create an online, read-write declaration stamped with the current time
    pub fn new(name: impl Into<String>, uuid: Uuid) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            uuid,
            status: DatabaseStatus::Online,
            access_mode: AccessMode::ReadWrite,
            created_at: now,
            updated_at: now,
        }
    }

    /// Identity declared by this record
    pub fn database_id(&self) -> DatabaseId {
        DatabaseId::new(self.name.clone(), self.uuid)
    }
}

/// The entity an access edge originates from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GrantSource {
    /// A user node; carries the username
    User(String),
    /// Any other node kind (roles, groups), identified by its label
    Other(String),
}

/// An access edge `source -> database` stored in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantEdge {
    /// Where the edge starts
    pub source: GrantSource,
    /// Name of the database the edge points at
    pub database: String,
}

impl GrantEdge {
    /// Edge from a user to a database
    pub fn user(username: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            source: GrantSource::User(username.into()),
            database: database.into(),
        }
    }

    /// Username if the edge originates from a user node
    pub fn username(&self) -> Option<&str> {
        match &self.source {
            GrantSource::User(name) => Some(name),
            GrantSource::Other(_) => None,
        }
    }
}

/// A consistent read view of the catalog
pub trait CatalogReadTransaction {
    /// All database declarations
    fn databases(&self) -> StrataResult<Vec<DatabaseRecord>>;

    /// The declaration for `name`, if any
    fn database_by_name(&self, name: &str) -> StrataResult<Option<DatabaseRecord>>;

    /// Access edges pointing at `database`
    fn incoming_grants(&self, database: &str) -> StrataResult<Vec<GrantEdge>>;
}

/// Durable catalog store
pub trait Catalog: Send + Sync {
    /// Open a read transaction
    fn begin_read(&self) -> StrataResult<Box<dyn CatalogReadTransaction + '_>>;
}

#[derive(Debug, Clone, Default)]
struct CatalogState {
    databases: BTreeMap<String, DatabaseRecord>,
    grants: Vec<GrantEdge>,
}

/// In-process catalog
///
/// Read transactions take a point-in-time copy, so a reader never observes
/// a half-applied mutation.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    state: RwLock<CatalogState>,
}

impl MemoryCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a database
    ///
    /// ## Errors
    /// - `AlreadyExists` if a database with the same name is declared
    /// - `Catalog` if another database is declared with the same uuid
    pub fn declare_database(&self, record: DatabaseRecord) -> StrataResult<()> {
        let mut state = self.state.write();
        if state.databases.contains_key(&record.name) {
            return Err(StrataError::already_exists(record.name));
        }
        if let Some(other) = state.databases.values().find(|r| r.uuid == record.uuid) {
            return Err(StrataError::catalog(format!(
                "uuid {} of '{}' is already declared by '{}'",
                record.uuid, record.name, other.name
            )));
        }
        state.databases.insert(record.name.clone(), record);
        Ok(())
    }

    /// Remove a declaration together with every edge pointing at it
    ///
    /// Returns the removed record, or `None` if nothing was declared.
    pub fn undeclare_database(&self, name: &str) -> Option<DatabaseRecord> {
        let mut state = self.state.write();
        let removed = state.databases.remove(name);
        if removed.is_some() {
            state.grants.retain(|edge| edge.database != name);
        }
        removed
    }

    /// Change the declared status of a database
    ///
    /// ## Errors
    /// - `NotFound` if the database is not declared
    pub fn set_status(&self, name: &str, status: DatabaseStatus) -> StrataResult<()> {
        let mut state = self.state.write();
        let record = state
            .databases
            .get_mut(name)
            .ok_or_else(|| StrataError::not_found(name))?;
        record.status = status;
        record.updated_at = Utc::now();
        Ok(())
    }

    /// Add an access edge. Duplicate edges are stored once.
    ///
    /// ## Errors
    /// - `NotFound` if the target database is not declared
    pub fn add_grant(&self, edge: GrantEdge) -> StrataResult<()> {
        let mut state = self.state.write();
        if !state.databases.contains_key(&edge.database) {
            return Err(StrataError::not_found(edge.database));
        }
        if !state.grants.contains(&edge) {
            state.grants.push(edge);
        }
        Ok(())
    }

    /// Remove the user edge `username -> database`. Returns true if removed.
    pub fn remove_grant(&self, username: &str, database: &str) -> bool {
        let mut state = self.state.write();
        let before = state.grants.len();
        state
            .grants
            .retain(|edge| !(edge.database == database && edge.username() == Some(username)));
        state.grants.len() != before
    }
}

struct MemoryReadTransaction {
    snapshot: CatalogState,
}

impl CatalogReadTransaction for MemoryReadTransaction {
    fn databases(&self) -> StrataResult<Vec<DatabaseRecord>> {
        Ok(self.snapshot.databases.values().cloned().collect())
    }

    fn database_by_name(&self, name: &str) -> StrataResult<Option<DatabaseRecord>> {
        Ok(self.snapshot.databases.get(name).cloned())
    }

    fn incoming_grants(&self, database: &str) -> StrataResult<Vec<GrantEdge>> {
        Ok(self
            .snapshot
            .grants
            .iter()
            .filter(|edge| edge.database == database)
            .cloned()
            .collect())
    }
}

impl Catalog for MemoryCatalog {
    fn begin_read(&self) -> StrataResult<Box<dyn CatalogReadTransaction + '_>> {
        let snapshot = self.state.read().clone();
        Ok(Box::new(MemoryReadTransaction { snapshot }))
    }
}
