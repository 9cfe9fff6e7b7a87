//! Shared test utilities for the engine integration suites.
//!
//! Import via `mod common;`.

#![allow(dead_code)]

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use std::time::Duration;
pub use strata_core::{
    DatabaseId, DatabaseInstance, DatabaseRecord, GrantEdge, InstanceFactory, InstanceOptions,
    MemoryCatalog, StrataError, StrataResult,
};
pub use strata_engine::{DatabaseLifecycles, DbmsConfig, InstanceState};

static INIT_TRACING: Once = Once::new();

/// Route engine logs to the test writer once per binary.
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

/// How a scripted instance behaves
#[derive(Debug, Clone, Copy, Default)]
pub struct Script {
    pub fail_start: bool,
    pub fail_stop: bool,
    pub panic_start: bool,
    /// Sleep inside start, to widen race windows
    pub start_delay: Option<Duration>,
}

/// Instance that counts its transitions and follows a [`Script`]
pub struct ScriptedInstance {
    id: DatabaseId,
    script: Script,
    starts: Arc<AtomicUsize>,
    stops: Arc<AtomicUsize>,
}

impl DatabaseInstance for ScriptedInstance {
    fn id(&self) -> &DatabaseId {
        &self.id
    }

    fn start(&self) -> StrataResult<()> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.script.start_delay {
            std::thread::sleep(delay);
        }
        if self.script.panic_start {
            panic!("engine panicked while starting {}", self.id);
        }
        if self.script.fail_start {
            return Err(StrataError::instance("store files are locked"));
        }
        Ok(())
    }

    fn stop(&self) -> StrataResult<()> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        if self.script.fail_stop {
            return Err(StrataError::instance("checkpoint failed"));
        }
        Ok(())
    }
}

/// Factory producing [`ScriptedInstance`]s, scripted per database name
#[derive(Default)]
pub struct ScriptedFactory {
    scripts: Mutex<HashMap<String, Script>>,
    created: AtomicUsize,
    starts: Arc<AtomicUsize>,
    stops: Arc<AtomicUsize>,
}

impl ScriptedFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn script(&self, name: &str, script: Script) {
        self.scripts.lock().insert(name.to_string(), script);
    }

    /// Instances built so far
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    /// `start` calls across all instances
    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    /// `stop` calls across all instances
    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

impl InstanceFactory for ScriptedFactory {
    fn create(
        &self,
        id: &DatabaseId,
        _options: Option<&InstanceOptions>,
    ) -> StrataResult<Arc<dyn DatabaseInstance>> {
        let script = self
            .scripts
            .lock()
            .get(id.name())
            .copied()
            .unwrap_or_default();
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(ScriptedInstance {
            id: id.clone(),
            script,
            starts: Arc::clone(&self.starts),
            stops: Arc::clone(&self.stops),
        }))
    }
}

/// A manager over a fresh catalog, with the system database running
pub struct Harness {
    pub factory: Arc<ScriptedFactory>,
    pub catalog: Arc<MemoryCatalog>,
    pub dbms: Arc<DatabaseLifecycles>,
}

impl Harness {
    pub fn new() -> Self {
        init_tracing();
        let factory = ScriptedFactory::new();
        let catalog = Arc::new(MemoryCatalog::new());
        let dbms = Arc::new(
            DatabaseLifecycles::new(&DbmsConfig::default(), factory.clone(), catalog.clone())
                .unwrap(),
        );
        let system = dbms.create_database(DatabaseId::system()).unwrap();
        dbms.start_database(&system);
        Self {
            factory,
            catalog,
            dbms,
        }
    }

    /// Declare a database in the catalog and return its record
    pub fn declare(&self, name: &str) -> DatabaseRecord {
        let record = DatabaseRecord::new(name, uuid::Uuid::new_v4());
        self.catalog.declare_database(record.clone()).unwrap();
        record
    }

    pub fn state_of(&self, name: &str) -> Option<InstanceState> {
        self.dbms.database_health(name).map(|h| h.state)
    }
}
