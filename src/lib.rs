//! Strata DBMS - runtime manager for many named databases in one process
//!
//! Hosts the system database, the configured default database and any
//! number of user databases, and decides which users may open which one.
//!
//! # Quick Start
//!
//! ```ignore
//! use strata_dbms::{DatabaseLifecycles, DbmsConfig, MemoryCatalog, PhaseRunner};
//!
//! let catalog = Arc::new(MemoryCatalog::new());
//! let dbms = Arc::new(DatabaseLifecycles::new(&DbmsConfig::default(), factory, catalog)?);
//!
//! let mut runner = PhaseRunner::new(dbms.clone());
//! runner.register(DatabaseLifecycles::system_database_starter());
//! runner.register(DatabaseLifecycles::default_database_starter());
//! runner.register(DatabaseLifecycles::all_database_stopper());
//! runner.init()?;
//! runner.start()?;
//!
//! dbms.create_and_start_database("tenant1", Uuid::new_v4(), "alice")?;
//! assert!(dbms.is_authorized("alice", "tenant1"));
//! ```
//!
//! # Architecture
//!
//! - `strata-core`: identifiers, errors, the catalog view and the seams
//!   (`DatabaseInstance`, `InstanceFactory`, `DatabaseRuntimeManager`,
//!   `DatabaseAccessChecker`)
//! - `strata-security`: the in-memory access index
//! - `strata-engine`: lifecycle control, reconciliation and phases

pub use strata_core::*;
pub use strata_engine::*;
pub use strata_security::*;
