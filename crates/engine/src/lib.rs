//! Multi-database runtime manager for Strata servers
//!
//! This crate orchestrates the databases hosted by one server process:
//! - Registry: which database incarnations are loaded
//! - Lifecycle: create/start/stop/drop without a restart
//! - Reconciliation: bring loaded databases and grants in line with the catalog at boot
//! - Phases: startup/shutdown hooks for the host's lifecycle sequencer
//!
//! The storage engine, the catalog and the command layer are external; they
//! meet this crate through the traits in `strata_core`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod database;
pub mod phase;

pub use database::{
    DatabaseContext, DatabaseHealth, DatabaseLifecycles, DatabaseRegistry, DbmsConfig,
    InstanceState, ReconcileReport, CONFIG_FILE_NAME, DEFAULT_DATABASE_NAME,
};
pub use phase::{Phase, PhaseFn, PhaseParticipant, PhaseRunner};
