//! Core types for the Strata database manager
//!
//! This module defines the foundational types:
//! - DatabaseId: Identity of one incarnation of a logical database (name + uuid)
//! - AccessMode: Whether a database accepts writes
//! - Database name validation
//!
//! A logical database keeps its name across drop/recreate cycles while each
//! incarnation gets a fresh uuid. The name alone therefore identifies the
//! *current* incarnation, and the `(name, uuid)` pair identifies exactly one.

use crate::error::{StrataError, StrataResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Name of the system (catalog) database
pub const SYSTEM_DATABASE_NAME: &str = "system";

/// Fixed uuid of the system database
pub const SYSTEM_DATABASE_UUID: Uuid = Uuid::from_u128(1);

/// Maximum length of a database name
pub const MAX_DATABASE_NAME_LENGTH: usize = 63;

/// Identity of a database incarnation
///
/// Equality and hashing use both the name and the uuid, so two incarnations
/// of `tenant1` separated by a drop are distinct identities.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatabaseId {
    name: String,
    uuid: Uuid,
}

impl DatabaseId {
    /// Create a DatabaseId from a name and uuid
    pub fn new(name: impl Into<String>, uuid: Uuid) -> Self {
        Self {
            name: name.into(),
            uuid,
        }
    }

    /// The reserved identity of the system database
    pub fn system() -> Self {
        Self::new(SYSTEM_DATABASE_NAME, SYSTEM_DATABASE_UUID)
    }

    /// Parse a DatabaseId from a name and a uuid string
    ///
    /// # Errors
    /// Returns `InvalidInput` if the name is invalid or the uuid does not parse.
    pub fn parse(name: &str, uuid: &str) -> StrataResult<Self> {
        validate_database_name(name)?;
        let uuid = Uuid::parse_str(uuid).map_err(|e| {
            StrataError::invalid_input(format!("invalid uuid '{}' for database '{}': {}", uuid, name, e))
        })?;
        Ok(Self::new(name, uuid))
    }

    /// Database name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Incarnation uuid
    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// True for the reserved system database identity
    pub fn is_system(&self) -> bool {
        self.name == SYSTEM_DATABASE_NAME && self.uuid == SYSTEM_DATABASE_UUID
    }
}

impl fmt::Display for DatabaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.uuid)
    }
}

/// Controls whether a database allows writes or is read-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AccessMode {
    /// Allow both reads and writes (default).
    #[default]
    ReadWrite,
    /// Read-only mode.
    ReadOnly,
}

/// Validate a database name
///
/// Database names must:
/// - Be 1-63 characters
/// - Start with an ASCII letter
/// - Contain only ASCII alphanumerics, dash, underscore, dot
///
/// # Errors
/// Returns `InvalidInput` describing the first violated rule.
pub fn validate_database_name(name: &str) -> StrataResult<()> {
    if name.is_empty() {
        return Err(StrataError::invalid_input("database name cannot be empty"));
    }
    if name.len() > MAX_DATABASE_NAME_LENGTH {
        return Err(StrataError::invalid_input(format!(
            "database name too long: {} chars (max {})",
            name.len(),
            MAX_DATABASE_NAME_LENGTH
        )));
    }
    let mut chars = name.chars();
    if let Some(first) = chars.next() {
        if !first.is_ascii_alphabetic() {
            return Err(StrataError::invalid_input(format!(
                "database name cannot start with '{}' (must start with a letter)",
                first
            )));
        }
    }
    for (position, c) in name.chars().enumerate() {
        if !(c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.') {
            return Err(StrataError::invalid_input(format!(
                "invalid character '{}' at position {} in database name",
                c, position
            )));
        }
    }
    Ok(())
}
