//! Startup and shutdown phases
//!
//! The host server brings the manager up and down through a [`PhaseRunner`]
//! holding plain [`PhaseParticipant`]s: a name plus a function pointer run
//! for every [`Phase`]. The manager supplies three of them:
//!
//! | Participant | Init | Start | Stop |
//! |-------------|------|-------|------|
//! | system database starter | create system db | start system db | - |
//! | default database starter | - | init default db, reconcile | - |
//! | all database stopper | - | - | stop all databases |
//!
//! ```ignore
//! let mut runner = PhaseRunner::new(dbms.clone());
//! runner.register(DatabaseLifecycles::system_database_starter());
//! runner.register(DatabaseLifecycles::default_database_starter());
//! runner.register(DatabaseLifecycles::all_database_stopper());
//! runner.init()?;
//! runner.start()?;
//! // ...
//! runner.stop()?;
//! ```

use crate::database::DatabaseLifecycles;
use std::sync::Arc;
use strata_core::{DatabaseId, StrataResult};
use tracing::{error, info};

/// A step of the host's lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Build resources
    Init,
    /// Begin serving
    Start,
    /// Stop serving
    Stop,
    /// Release resources
    Shutdown,
}

impl Phase {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Init => "init",
            Phase::Start => "start",
            Phase::Stop => "stop",
            Phase::Shutdown => "shutdown",
        }
    }
}

/// Function run by a participant for a phase
pub type PhaseFn = fn(&DatabaseLifecycles, Phase) -> StrataResult<()>;

/// A named hook run for every phase
#[derive(Clone)]
pub struct PhaseParticipant {
    /// Human-readable name for logging
    pub name: &'static str,
    /// Function to call
    pub run: PhaseFn,
}

impl PhaseParticipant {
    /// Create a new participant
    pub const fn new(name: &'static str, run: PhaseFn) -> Self {
        Self { name, run }
    }
}

impl std::fmt::Debug for PhaseParticipant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhaseParticipant")
            .field("name", &self.name)
            .finish()
    }
}

/// Runs participants in registration order on the way up and in reverse
/// order on the way down
#[derive(Debug)]
pub struct PhaseRunner {
    lifecycles: Arc<DatabaseLifecycles>,
    participants: Vec<PhaseParticipant>,
}

impl PhaseRunner {
    /// Create a runner with no participants
    pub fn new(lifecycles: Arc<DatabaseLifecycles>) -> Self {
        Self {
            lifecycles,
            participants: Vec::new(),
        }
    }

    /// Register a participant. A second participant with the same name is ignored.
    pub fn register(&mut self, participant: PhaseParticipant) {
        if !self.participants.iter().any(|p| p.name == participant.name) {
            self.participants.push(participant);
        }
    }

    /// Names of the registered participants, in registration order
    pub fn participants(&self) -> Vec<&'static str> {
        self.participants.iter().map(|p| p.name).collect()
    }

    /// Run `Init` for every participant, stopping at the first error
    pub fn init(&self) -> StrataResult<()> {
        self.run_forward(Phase::Init)
    }

    /// Run `Start` for every participant, stopping at the first error
    pub fn start(&self) -> StrataResult<()> {
        self.run_forward(Phase::Start)
    }

    /// Run `Stop` for every participant in reverse order.
    /// Every participant runs; the first error is returned.
    pub fn stop(&self) -> StrataResult<()> {
        self.run_backward(Phase::Stop)
    }

    /// Run `Shutdown` for every participant in reverse order.
    /// Every participant runs; the first error is returned.
    pub fn shutdown(&self) -> StrataResult<()> {
        self.run_backward(Phase::Shutdown)
    }

    fn run_forward(&self, phase: Phase) -> StrataResult<()> {
        for participant in &self.participants {
            info!(target: "strata::dbms", name = participant.name, phase = phase.as_str(), "Running phase");
            (participant.run)(&self.lifecycles, phase)?;
        }
        Ok(())
    }

    fn run_backward(&self, phase: Phase) -> StrataResult<()> {
        let mut first_error = None;
        for participant in self.participants.iter().rev() {
            info!(target: "strata::dbms", name = participant.name, phase = phase.as_str(), "Running phase");
            if let Err(e) = (participant.run)(&self.lifecycles, phase) {
                error!(target: "strata::dbms", name = participant.name, phase = phase.as_str(), error = %e, "Phase failed");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl DatabaseLifecycles {
    /// Creates the system database on `Init` and starts it on `Start`
    pub fn system_database_starter() -> PhaseParticipant {
        PhaseParticipant::new("system-database-starter", run_system_database_starter)
    }

    /// Brings up the default database and reconciles with the catalog on `Start`
    pub fn default_database_starter() -> PhaseParticipant {
        PhaseParticipant::new("default-database-starter", run_default_database_starter)
    }

    /// Stops every database on `Stop`
    pub fn all_database_stopper() -> PhaseParticipant {
        PhaseParticipant::new("all-database-stopper", run_all_database_stopper)
    }
}

fn run_system_database_starter(dbms: &DatabaseLifecycles, phase: Phase) -> StrataResult<()> {
    match phase {
        Phase::Init => dbms.create_database(DatabaseId::system()).map(|_| ()),
        Phase::Start => {
            let system = dbms.system_context()?;
            dbms.start_database(&system);
            Ok(())
        }
        Phase::Stop | Phase::Shutdown => Ok(()),
    }
}

fn run_default_database_starter(dbms: &DatabaseLifecycles, phase: Phase) -> StrataResult<()> {
    if phase != Phase::Start {
        return Ok(());
    }
    dbms.initialize_default_database()?;
    if let Err(e) = dbms.reconcile_with_catalog() {
        error!(target: "strata::dbms", error = %e, "Failed to scan catalog for additional databases");
    }
    Ok(())
}

fn run_all_database_stopper(dbms: &DatabaseLifecycles, phase: Phase) -> StrataResult<()> {
    match phase {
        Phase::Stop => dbms.shutdown_all(),
        Phase::Init | Phase::Start | Phase::Shutdown => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{DbmsConfig, InstanceState};
    use parking_lot::Mutex;
    use strata_core::{
        DatabaseInstance, DatabaseRecord, GrantEdge, InstanceFactory, InstanceOptions,
        MemoryCatalog, StrataError, SYSTEM_DATABASE_NAME,
    };
    use uuid::Uuid;

    struct NoopInstance(DatabaseId);

    impl DatabaseInstance for NoopInstance {
        fn id(&self) -> &DatabaseId {
            &self.0
        }

        fn start(&self) -> StrataResult<()> {
            Ok(())
        }

        fn stop(&self) -> StrataResult<()> {
            Ok(())
        }
    }

    struct NoopFactory;

    impl InstanceFactory for NoopFactory {
        fn create(
            &self,
            id: &DatabaseId,
            _options: Option<&InstanceOptions>,
        ) -> StrataResult<Arc<dyn DatabaseInstance>> {
            Ok(Arc::new(NoopInstance(id.clone())))
        }
    }

    fn setup() -> (Arc<MemoryCatalog>, Arc<DatabaseLifecycles>, PhaseRunner) {
        let catalog = Arc::new(MemoryCatalog::new());
        let dbms = Arc::new(
            DatabaseLifecycles::new(&DbmsConfig::default(), Arc::new(NoopFactory), catalog.clone())
                .unwrap(),
        );
        let mut runner = PhaseRunner::new(Arc::clone(&dbms));
        runner.register(DatabaseLifecycles::system_database_starter());
        runner.register(DatabaseLifecycles::default_database_starter());
        runner.register(DatabaseLifecycles::all_database_stopper());
        (catalog, dbms, runner)
    }

    #[test]
    fn test_duplicate_registration_ignored() {
        let (_catalog, _dbms, mut runner) = setup();
        runner.register(DatabaseLifecycles::system_database_starter());
        assert_eq!(
            runner.participants(),
            vec![
                "system-database-starter",
                "default-database-starter",
                "all-database-stopper"
            ]
        );
    }

    #[test]
    fn test_full_boot_and_shutdown() {
        let (catalog, dbms, runner) = setup();
        catalog
            .declare_database(DatabaseRecord::new("default", Uuid::new_v4()))
            .unwrap();
        catalog
            .declare_database(DatabaseRecord::new("tenant2", Uuid::new_v4()))
            .unwrap();
        catalog.add_grant(GrantEdge::user("bob", "tenant2")).unwrap();

        runner.init().unwrap();
        assert_eq!(
            dbms.database_health(SYSTEM_DATABASE_NAME).unwrap().state,
            InstanceState::Registered
        );

        runner.start().unwrap();
        for name in [SYSTEM_DATABASE_NAME, "default", "tenant2"] {
            assert_eq!(
                dbms.database_health(name).unwrap().state,
                InstanceState::Running,
                "{}",
                name
            );
        }
        assert!(dbms.is_authorized("bob", "tenant2"));

        runner.stop().unwrap();
        for health in dbms.list_databases() {
            assert_eq!(health.state, InstanceState::Stopped);
        }
    }

    #[test]
    fn test_start_fails_without_default_declaration() {
        let (_catalog, _dbms, runner) = setup();
        runner.init().unwrap();
        let err = runner.start().unwrap_err();
        assert!(err.is_not_found());
    }

    static ORDER: Mutex<Vec<&'static str>> = parking_lot::const_mutex(Vec::new());

    fn record_a(_: &DatabaseLifecycles, phase: Phase) -> StrataResult<()> {
        ORDER.lock().push("a");
        if phase == Phase::Stop {
            return Err(StrataError::instance("a failed"));
        }
        Ok(())
    }

    fn record_b(_: &DatabaseLifecycles, phase: Phase) -> StrataResult<()> {
        ORDER.lock().push("b");
        if phase == Phase::Stop {
            return Err(StrataError::instance("b failed"));
        }
        Ok(())
    }

    #[test]
    fn test_ordering_and_error_collection() {
        let (_catalog, dbms, _runner) = setup();
        let mut runner = PhaseRunner::new(dbms);
        runner.register(PhaseParticipant::new("a", record_a));
        runner.register(PhaseParticipant::new("b", record_b));

        runner.start().unwrap();
        assert_eq!(*ORDER.lock(), vec!["a", "b"]);

        ORDER.lock().clear();
        let err = runner.stop().unwrap_err();
        // Both ran, in reverse; the first error encountered wins
        assert_eq!(*ORDER.lock(), vec!["b", "a"]);
        assert!(err.to_string().contains("b failed"));
    }
}
