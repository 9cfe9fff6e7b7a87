//! Runtime context of one registered database
//!
//! A `DatabaseContext` pairs an engine instance with the manager's view of
//! it: a lifecycle state and an orthogonal failure flag.
//!
//! ```text
//! Registered --start ok--> Running --stop ok--> Stopped
//!     |  ^                                         ^
//!     |  '-- start failed (flag set) ---'          |
//!     '------------- stop (flag cleared first) ----'  stop failed: Stopped, flag set
//! ```
//!
//! The failure flag is set from either the start or the stop path and is
//! cleared before every stop attempt, so a fault recorded while starting is
//! never reported again as a stop failure.

use parking_lot::Mutex;
use serde::Serialize;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use strata_core::{DatabaseId, DatabaseInstance, StrataError, StrataResult};

/// Lifecycle state of a registered database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum InstanceState {
    /// Created and registered, not (successfully) started
    Registered,
    /// Start in progress
    Starting,
    /// Started successfully
    Running,
    /// Stop in progress
    Stopping,
    /// Stop attempted
    Stopped,
}

impl InstanceState {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceState::Registered => "registered",
            InstanceState::Starting => "starting",
            InstanceState::Running => "running",
            InstanceState::Stopping => "stopping",
            InstanceState::Stopped => "stopped",
        }
    }
}

/// Point-in-time health of a registered database
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatabaseHealth {
    /// Database name
    pub name: String,
    /// Incarnation uuid
    pub uuid: String,
    /// Lifecycle state
    pub state: InstanceState,
    /// Description of the captured failure, if any
    pub failure: Option<String>,
}

/// A registered database
pub struct DatabaseContext {
    instance: Arc<dyn DatabaseInstance>,
    state: Mutex<InstanceState>,
    failure: Mutex<Option<Arc<StrataError>>>,
    /// Serializes start/stop of this one instance
    transition: Mutex<()>,
}

impl DatabaseContext {
    /// Wrap a freshly built instance
    pub fn new(instance: Arc<dyn DatabaseInstance>) -> Self {
        Self {
            instance,
            state: Mutex::new(InstanceState::Registered),
            failure: Mutex::new(None),
            transition: Mutex::new(()),
        }
    }

    /// Identity of the wrapped instance
    pub fn id(&self) -> &DatabaseId {
        self.instance.id()
    }

    /// The wrapped instance
    pub fn instance(&self) -> &Arc<dyn DatabaseInstance> {
        &self.instance
    }

    /// Current lifecycle state
    pub fn state(&self) -> InstanceState {
        *self.state.lock()
    }

    /// True if a failure is recorded
    pub fn is_failed(&self) -> bool {
        self.failure.lock().is_some()
    }

    /// The recorded failure, if any
    pub fn failure_cause(&self) -> Option<Arc<StrataError>> {
        self.failure.lock().clone()
    }

    /// Record a failure, replacing any earlier one
    pub fn fail(&self, cause: StrataError) {
        *self.failure.lock() = Some(Arc::new(cause));
    }

    /// Forget the recorded failure
    pub fn clear_failure(&self) {
        *self.failure.lock() = None;
    }

    /// Health snapshot
    pub fn health(&self) -> DatabaseHealth {
        DatabaseHealth {
            name: self.id().name().to_string(),
            uuid: self.id().uuid().to_string(),
            state: self.state(),
            failure: self.failure_cause().map(|cause| describe(&cause)),
        }
    }

    /// Run the instance's start. Faults are returned, not recorded.
    pub(crate) fn run_start(&self) -> StrataResult<()> {
        let _transition = self.transition.lock();
        self.set_state(InstanceState::Starting);
        match guarded(|| self.instance.start()) {
            Ok(()) => {
                self.set_state(InstanceState::Running);
                Ok(())
            }
            Err(e) => {
                self.set_state(InstanceState::Registered);
                Err(e)
            }
        }
    }

    /// Run the instance's stop. Faults are returned, not recorded.
    pub(crate) fn run_stop(&self) -> StrataResult<()> {
        let _transition = self.transition.lock();
        self.set_state(InstanceState::Stopping);
        let result = guarded(|| self.instance.stop());
        self.set_state(InstanceState::Stopped);
        result
    }

    fn set_state(&self, state: InstanceState) {
        *self.state.lock() = state;
    }
}

impl std::fmt::Debug for DatabaseContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseContext")
            .field("id", self.id())
            .field("state", &self.state())
            .field("failed", &self.is_failed())
            .finish()
    }
}

/// Run an engine or factory operation, turning a panic into an `Instance` error
pub(crate) fn guarded<T, F>(op: F) -> StrataResult<T>
where
    F: FnOnce() -> StrataResult<T>,
{
    match panic::catch_unwind(AssertUnwindSafe(op)) {
        Ok(result) => result,
        Err(payload) => Err(StrataError::instance(format!(
            "panicked: {}",
            panic_message(payload.as_ref())
        ))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Error message followed by its source chain
fn describe(err: &StrataError) -> String {
    let mut out = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}
