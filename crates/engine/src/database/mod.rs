//! Database lifecycle controller
//!
//! [`DatabaseLifecycles`] owns the set of loaded databases and the access
//! index, and performs every create/start/stop/drop transition:
//!
//! - `create_database`: build an instance through the factory and register it
//! - `start_database` / `stop_database`: run the instance, capturing faults
//! - `drop_database`: stop, forget, clear grants (idempotent)
//! - `create_and_start_database`: idempotent create+start plus owner grant
//! - `initialize_default_database`: bring up the configured default database
//! - `shutdown_all`: stop everything, system database last
//!
//! ## Locking
//!
//! Create, drop, default initialization and create-and-start run under one
//! manager-wide lock, so a database is never created twice or created while
//! it is being dropped. Start and stop of an already registered database
//! only serialize on that database. The access index has its own sharded
//! locking and never waits on the manager lock.
//!
//! ## Failures
//!
//! Start and stop faults are recorded on the database and logged, never
//! returned, so bulk startup and shutdown proceed past one bad database.
//! The catalog is not touched here: a CREATE whose catalog write succeeded
//! but whose start failed is only visible through [`DatabaseLifecycles::database_health`].

pub mod config;
mod context;
mod reconcile;
mod registry;

pub use config::{DbmsConfig, CONFIG_FILE_NAME, DEFAULT_DATABASE_NAME};
pub use context::{DatabaseContext, DatabaseHealth, InstanceState};
pub use reconcile::ReconcileReport;
pub use registry::DatabaseRegistry;

use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;
use strata_core::{
    validate_database_name, Catalog, DatabaseAccessChecker, DatabaseId, DatabaseRuntimeManager,
    InstanceFactory, InstanceOptions, StrataError, StrataResult, SYSTEM_DATABASE_NAME,
};
use strata_security::AccessIndex;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Runtime multi-database manager
pub struct DatabaseLifecycles {
    registry: DatabaseRegistry,
    access: AccessIndex,
    factory: Arc<dyn InstanceFactory>,
    catalog: Arc<dyn Catalog>,
    default_database: String,
    /// Held by create/drop/initialize for their whole duration
    lifecycle_lock: Mutex<()>,
}

impl DatabaseLifecycles {
    /// Create a manager with an empty registry and access index
    ///
    /// # Errors
    /// Returns an error if `config` does not validate.
    pub fn new(
        config: &DbmsConfig,
        factory: Arc<dyn InstanceFactory>,
        catalog: Arc<dyn Catalog>,
    ) -> StrataResult<Self> {
        config.validate()?;
        Ok(Self {
            registry: DatabaseRegistry::new(),
            access: AccessIndex::new(config.access_policy()),
            factory,
            catalog,
            default_database: config.default_database.clone(),
            lifecycle_lock: Mutex::new(()),
        })
    }

    /// Loaded databases
    pub fn registry(&self) -> &DatabaseRegistry {
        &self.registry
    }

    /// Per-database user grants
    pub fn access_index(&self) -> &AccessIndex {
        &self.access
    }

    /// The catalog this manager reconciles against
    pub fn catalog(&self) -> &Arc<dyn Catalog> {
        &self.catalog
    }

    /// Name of the configured default database
    pub fn default_database_name(&self) -> &str {
        &self.default_database
    }

    /// Context of the system database
    ///
    /// ## Errors
    /// - `NotFound` if the system database is not registered
    pub fn system_context(&self) -> StrataResult<Arc<DatabaseContext>> {
        self.registry
            .get(&DatabaseId::system())
            .ok_or_else(|| StrataError::not_found(SYSTEM_DATABASE_NAME))
    }

    // ========== Transitions ==========

    /// Build and register a database
    ///
    /// ## Errors
    /// - `AlreadyExists` if a database with the same name is registered
    /// - any error from the instance factory
    pub fn create_database(&self, id: DatabaseId) -> StrataResult<Arc<DatabaseContext>> {
        let guard = self.lifecycle_lock.lock();
        self.create_database_locked(&guard, &id, None)
    }

    fn create_database_locked(
        &self,
        _guard: &MutexGuard<'_, ()>,
        id: &DatabaseId,
        options: Option<&InstanceOptions>,
    ) -> StrataResult<Arc<DatabaseContext>> {
        if self.registry.get_by_name(id.name()).is_some() {
            return Err(StrataError::already_exists(id.name()));
        }
        info!(target: "strata::dbms", database = %id, "Creating database");
        let instance = context::guarded(|| self.factory.create(id, options))?;
        let context = Arc::new(DatabaseContext::new(instance));
        self.registry.add(Arc::clone(&context))?;
        Ok(context)
    }

    /// Start a database. A fault is recorded on the context, not returned.
    pub fn start_database(&self, context: &DatabaseContext) {
        let id = context.id();
        info!(target: "strata::dbms", database = %id, "Starting database");
        if let Err(e) = context.run_start() {
            error!(target: "strata::dbms", database = %id, error = %e, "Failed to start database");
            context.fail(StrataError::unable_to_start(id.clone(), e));
        }
    }

    /// Stop a database. A fault is recorded on the context, not returned.
    ///
    /// Any earlier failure is cleared first so that a start failure is not
    /// reported again as a stop failure.
    pub fn stop_database(&self, context: &DatabaseContext) {
        let id = context.id();
        context.clear_failure();
        info!(target: "strata::dbms", database = %id, "Stopping database");
        match context.run_stop() {
            Ok(()) => info!(target: "strata::dbms", database = %id, "Stopped database successfully"),
            Err(e) => {
                error!(target: "strata::dbms", database = %id, error = %e, "Failed to stop database");
                context.fail(StrataError::unable_to_stop(id.clone(), e));
            }
        }
    }

    /// Stop and forget the database registered under `name`, and clear its
    /// grants. Idempotent: an unknown name is a no-op.
    ///
    /// ## Errors
    /// - `InvalidInput` if the system database is registered under `name`
    pub fn drop_database(&self, name: &str) -> StrataResult<()> {
        let _guard = self.lifecycle_lock.lock();
        if let Some(context) = self.registry.get_by_name(name) {
            if name == SYSTEM_DATABASE_NAME {
                return Err(StrataError::invalid_input("the system database cannot be dropped"));
            }
            self.stop_database(&context);
            self.registry.remove(context.id());
            info!(target: "strata::dbms", database = %context.id(), "Dropped database");
        }
        self.access.clear_database(name);
        Ok(())
    }

    /// Create and start `(name, uuid)` unless already loaded, then grant
    /// `owner` access if non-empty.
    ///
    /// Concurrent calls for the same identity result in one create+start and
    /// every caller's owner grant.
    ///
    /// ## Errors
    /// - `InvalidInput` if `name` is not a valid database name
    /// - `AlreadyExists` if another incarnation of `name` is loaded
    /// - any error from the instance factory
    pub fn create_and_start_database(
        &self,
        name: &str,
        uuid: Uuid,
        owner: &str,
    ) -> StrataResult<()> {
        validate_database_name(name)?;
        let id = DatabaseId::new(name, uuid);
        let guard = self.lifecycle_lock.lock();
        if !self.registry.contains(&id) {
            let context = self.create_database_locked(&guard, &id, None)?;
            self.start_database(&context);
        }
        self.access.grant(owner, name);
        Ok(())
    }

    /// Create and start the configured default database
    ///
    /// ## Errors
    /// - `NotFound` if the catalog does not declare the default database
    /// - `AlreadyExists` if it is already loaded
    pub fn initialize_default_database(&self) -> StrataResult<()> {
        let guard = self.lifecycle_lock.lock();
        let tx = self.catalog.begin_read()?;
        let record = tx
            .database_by_name(&self.default_database)?
            .ok_or_else(|| StrataError::not_found(self.default_database.clone()))?;
        drop(tx);

        let id = record.database_id();
        if self.registry.contains(&id) {
            return Err(StrataError::already_exists(id.name()));
        }
        let options = InstanceOptions::new().access_mode(record.access_mode);
        let context = self.create_database_locked(&guard, &id, Some(&options))?;
        self.start_database(&context);
        Ok(())
    }

    /// Stop every database, the system database last
    ///
    /// Every database is attempted regardless of earlier failures.
    ///
    /// ## Errors
    /// - `ShutdownFailed` naming the first database (by name, system last)
    ///   whose stop failed. Databases that only failed to start are not
    ///   reported.
    /// - `NotFound` if the system database is not registered
    pub fn shutdown_all(&self) -> StrataResult<()> {
        let mut contexts: Vec<Arc<DatabaseContext>> = self
            .registry
            .all()
            .into_iter()
            .filter(|(id, _)| !id.is_system())
            .map(|(_, context)| context)
            .collect();
        contexts.sort_by(|a, b| a.id().name().cmp(b.id().name()));

        for context in &contexts {
            self.stop_database(context);
        }

        let system = self.system_context();
        match &system {
            Ok(context) => {
                self.stop_database(context);
                contexts.push(Arc::clone(context));
            }
            Err(_) => warn!(target: "strata::dbms", "System database not registered at shutdown"),
        }

        let failures: Vec<(String, Arc<StrataError>)> = contexts
            .iter()
            .filter_map(|context| {
                context
                    .failure_cause()
                    .filter(|cause| !cause.is_start_failure())
                    .map(|cause| (context.id().name().to_string(), cause))
            })
            .collect();

        if let Some((database, cause)) = failures.first() {
            return Err(StrataError::ShutdownFailed {
                database: database.clone(),
                others: failures.len() - 1,
                cause: Arc::clone(cause),
            });
        }
        system.map(|_| ())
    }

    // ========== Health ==========

    /// Health of the database registered under `name`
    pub fn database_health(&self, name: &str) -> Option<DatabaseHealth> {
        self.registry.get_by_name(name).map(|context| context.health())
    }

    /// Health of every registered database, sorted by name
    pub fn list_databases(&self) -> Vec<DatabaseHealth> {
        let mut health: Vec<DatabaseHealth> = self
            .registry
            .all()
            .iter()
            .map(|(_, context)| context.health())
            .collect();
        health.sort_by(|a, b| a.name.cmp(&b.name));
        health
    }

    // ========== Access ==========

    /// True if `username` may access `database`
    pub fn is_authorized(&self, username: &str, database: &str) -> bool {
        self.access.is_authorized(username, database)
    }

    /// Grant `username` access to `database`
    pub fn grant_access(&self, username: &str, database: &str) {
        self.access.grant(username, database)
    }

    /// Revoke `username`'s access to `database`
    pub fn revoke_access(&self, username: &str, database: &str) {
        self.access.revoke(username, database)
    }
}

impl DatabaseRuntimeManager for DatabaseLifecycles {
    fn create_and_start_database(&self, name: &str, uuid: Uuid, owner: &str) -> StrataResult<()> {
        DatabaseLifecycles::create_and_start_database(self, name, uuid, owner)
    }

    fn drop_database(&self, name: &str) -> StrataResult<()> {
        DatabaseLifecycles::drop_database(self, name)
    }
}

impl DatabaseAccessChecker for DatabaseLifecycles {
    fn can_user_access_database(&self, username: &str, database: &str) -> bool {
        self.is_authorized(username, database)
    }

    fn grant_user_access_to_database(&self, username: &str, database: &str) {
        self.grant_access(username, database)
    }

    fn revoke_user_access_to_database(&self, username: &str, database: &str) {
        self.revoke_access(username, database)
    }
}

impl std::fmt::Debug for DatabaseLifecycles {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseLifecycles")
            .field("default_database", &self.default_database)
            .field("registered", &self.registry.len())
            .finish()
    }
}
