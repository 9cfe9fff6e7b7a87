//! AccessIndex: per-database user grants
//!
//! ## Decision order
//!
//! `is_authorized(user, db)`:
//! 1. empty username (authorization disabled) → allowed
//! 2. the built-in admin user → allowed
//! 3. an exempt database (system or default) → allowed
//! 4. otherwise allowed iff `user` is in the grant set of `db`
//!
//! ## Concurrency
//!
//! Grants live in a sharded `DashMap`. Each call locks only the shard that
//! holds its database name, so grant/revoke on different databases do not
//! serialize behind a single index-wide lock.

use dashmap::DashMap;
use std::collections::HashSet;
use strata_core::{DatabaseAccessChecker, SYSTEM_DATABASE_NAME};
use tracing::debug;

/// Name of the built-in administrative user
pub const DEFAULT_ADMIN_USER: &str = "admin";

/// Who and what bypasses the grant map
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPolicy {
    /// Configured default database; open to every authenticated user
    pub default_database: String,
    /// Built-in administrative user; may access every database
    pub admin_user: String,
}

impl AccessPolicy {
    /// Policy with the given default database and the built-in admin user
    pub fn new(default_database: impl Into<String>) -> Self {
        Self {
            default_database: default_database.into(),
            admin_user: DEFAULT_ADMIN_USER.to_string(),
        }
    }

    /// Override the administrative user
    pub fn with_admin_user(mut self, admin_user: impl Into<String>) -> Self {
        self.admin_user = admin_user.into();
        self
    }

    /// True for databases every authenticated user may access
    pub fn is_exempt(&self, database: &str) -> bool {
        database == SYSTEM_DATABASE_NAME || database == self.default_database
    }
}

/// In-memory map: database name → usernames granted access
#[derive(Debug)]
pub struct AccessIndex {
    policy: AccessPolicy,
    grants: DashMap<String, HashSet<String>>,
}

impl AccessIndex {
    /// Create an empty index governed by `policy`
    pub fn new(policy: AccessPolicy) -> Self {
        Self {
            policy,
            grants: DashMap::new(),
        }
    }

    /// The policy this index enforces
    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    /// True if `username` may access `database`
    pub fn is_authorized(&self, username: &str, database: &str) -> bool {
        if username.is_empty() {
            return true;
        }
        if username == self.policy.admin_user {
            return true;
        }
        if self.policy.is_exempt(database) {
            return true;
        }
        self.grants
            .get(database)
            .map_or(false, |users| users.contains(username))
    }

    /// Grant `username` access to `database`. No-op if either is empty.
    pub fn grant(&self, username: &str, database: &str) {
        if username.is_empty() || database.is_empty() {
            return;
        }
        let inserted = self
            .grants
            .entry(database.to_string())
            .or_default()
            .insert(username.to_string());
        if inserted {
            debug!(target: "strata::dbms", user = username, database, "Granted database access");
        }
    }

    /// Revoke `username`'s access to `database`.
    ///
    /// No-op if either is empty or the database has no grants. A set left
    /// empty by the revoke stays in place.
    pub fn revoke(&self, username: &str, database: &str) {
        if username.is_empty() || database.is_empty() {
            return;
        }
        if let Some(mut users) = self.grants.get_mut(database) {
            if users.remove(username) {
                debug!(target: "strata::dbms", user = username, database, "Revoked database access");
            }
        }
    }

    /// Drop every grant of `database`. Used when the database is dropped.
    pub fn clear_database(&self, database: &str) {
        if self.grants.remove(database).is_some() {
            debug!(target: "strata::dbms", database, "Cleared database grants");
        }
    }

    /// Users explicitly granted access to `database`, sorted
    pub fn granted_users(&self, database: &str) -> Vec<String> {
        let mut users: Vec<String> = self
            .grants
            .get(database)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        users.sort();
        users
    }

    /// True if `database` has a grant set, even an empty one
    pub fn has_grant_set(&self, database: &str) -> bool {
        self.grants.contains_key(database)
    }
}

impl DatabaseAccessChecker for AccessIndex {
    fn can_user_access_database(&self, username: &str, database: &str) -> bool {
        self.is_authorized(username, database)
    }

    fn grant_user_access_to_database(&self, username: &str, database: &str) {
        self.grant(username, database)
    }

    fn revoke_user_access_to_database(&self, username: &str, database: &str) {
        self.revoke(username, database)
    }
}
