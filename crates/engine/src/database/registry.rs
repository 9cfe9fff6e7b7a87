//! Registry of loaded databases
//!
//! Maps each loaded database to its [`DatabaseContext`]. Entries are keyed by
//! name, which enforces at most one live incarnation per name: a database
//! must be dropped before a new incarnation with the same name is added.
//! Lookups by full [`DatabaseId`] also compare the uuid.
//!
//! Uses a sharded `DashMap`, so concurrent add/remove/lookup on different
//! names do not contend. [`DatabaseRegistry::all`] returns a copy, so callers
//! can iterate while other threads mutate the registry.

use super::context::DatabaseContext;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use strata_core::{DatabaseId, StrataError, StrataResult};

/// Loaded databases, keyed by name
#[derive(Debug, Default)]
pub struct DatabaseRegistry {
    databases: DashMap<String, Arc<DatabaseContext>>,
}

impl DatabaseRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a database
    ///
    /// ## Errors
    /// - `AlreadyExists` if a database with the same name is registered
    pub fn add(&self, context: Arc<DatabaseContext>) -> StrataResult<()> {
        match self.databases.entry(context.id().name().to_string()) {
            Entry::Occupied(existing) => Err(StrataError::already_exists(existing.key().clone())),
            Entry::Vacant(slot) => {
                slot.insert(context);
                Ok(())
            }
        }
    }

    /// Remove the entry for `id`. No-op if absent or if the registered
    /// incarnation has a different uuid.
    pub fn remove(&self, id: &DatabaseId) -> Option<Arc<DatabaseContext>> {
        self.databases
            .remove_if(id.name(), |_, context| context.id() == id)
            .map(|(_, context)| context)
    }

    /// Look up the exact incarnation `id`
    pub fn get(&self, id: &DatabaseId) -> Option<Arc<DatabaseContext>> {
        self.databases
            .get(id.name())
            .filter(|context| context.id() == id)
            .map(|context| Arc::clone(context.value()))
    }

    /// Look up the current incarnation of `name`
    pub fn get_by_name(&self, name: &str) -> Option<Arc<DatabaseContext>> {
        self.databases
            .get(name)
            .map(|context| Arc::clone(context.value()))
    }

    /// True if `id` is registered
    pub fn contains(&self, id: &DatabaseId) -> bool {
        self.get(id).is_some()
    }

    /// Point-in-time copy of all entries
    pub fn all(&self) -> Vec<(DatabaseId, Arc<DatabaseContext>)> {
        self.databases
            .iter()
            .map(|entry| (entry.value().id().clone(), Arc::clone(entry.value())))
            .collect()
    }

    /// Number of registered databases
    pub fn len(&self) -> usize {
        self.databases.len()
    }

    /// True if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.databases.is_empty()
    }
}
