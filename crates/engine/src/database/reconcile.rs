//! Startup reconciliation against the catalog
//!
//! Runs once at boot, after the system database is running:
//!
//! 1. Open a read transaction on the catalog
//! 2. For every declared database other than the system and default databases:
//!    - create and start it if it is not loaded (failures are logged and skipped)
//!    - copy its user grant edges into the access index
//!
//! The access index is never persisted, so this pass is the only way grants
//! survive a restart.

use super::DatabaseLifecycles;
use strata_core::{DatabaseRecord, InstanceOptions, StrataResult};
use tracing::{error, info};

/// What a reconciliation pass did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Databases created and started by this pass
    pub created: Vec<String>,
    /// Databases already loaded before this pass
    pub already_loaded: Vec<String>,
    /// Databases that could not be created or whose grants could not be read
    pub failed: Vec<String>,
    /// Number of user grants copied into the access index
    pub grants_restored: usize,
}

impl DatabaseLifecycles {
    /// Bring loaded databases and the access index in line with the catalog
    ///
    /// ## Errors
    /// - `NotFound` if the system database is not registered
    /// - any error opening or scanning the catalog; per-database failures
    ///   are logged and reported in [`ReconcileReport::failed`] instead
    pub fn reconcile_with_catalog(&self) -> StrataResult<ReconcileReport> {
        self.system_context()?;

        let tx = self.catalog().begin_read()?;
        let mut report = ReconcileReport::default();

        for record in tx.databases()? {
            if !self.is_extra(&record) {
                continue;
            }

            if self.registry().contains(&record.database_id()) {
                report.already_loaded.push(record.name.clone());
            } else {
                match self.load_declared(&record) {
                    Ok(()) => report.created.push(record.name.clone()),
                    Err(e) => {
                        error!(
                            target: "strata::dbms",
                            database = %record.name,
                            error = %e,
                            "Failed to initialise additional database"
                        );
                        report.failed.push(record.name.clone());
                    }
                }
            }

            // Grants are restored whether or not the database came up
            match tx.incoming_grants(&record.name) {
                Ok(edges) => {
                    for username in edges.iter().filter_map(|edge| edge.username()) {
                        if !username.is_empty() {
                            self.access_index().grant(username, &record.name);
                            report.grants_restored += 1;
                        }
                    }
                }
                Err(e) => {
                    error!(
                        target: "strata::dbms",
                        database = %record.name,
                        error = %e,
                        "Failed to read grants of database"
                    );
                    if !report.failed.contains(&record.name) {
                        report.failed.push(record.name.clone());
                    }
                }
            }
        }

        info!(
            target: "strata::dbms",
            created = report.created.len(),
            already_loaded = report.already_loaded.len(),
            failed = report.failed.len(),
            grants_restored = report.grants_restored,
            "Reconciliation complete"
        );
        Ok(report)
    }

    /// Neither the system database nor the default database
    fn is_extra(&self, record: &DatabaseRecord) -> bool {
        !record.database_id().is_system() && record.name != self.default_database_name()
    }

    fn load_declared(&self, record: &DatabaseRecord) -> StrataResult<()> {
        let guard = self.lifecycle_lock.lock();
        let id = record.database_id();
        if self.registry().contains(&id) {
            return Ok(());
        }
        let options = InstanceOptions::new().access_mode(record.access_mode);
        let context = self.create_database_locked(&guard, &id, Some(&options))?;
        self.start_database(&context);
        Ok(())
    }
}
