//! Lifecycle state machine types.

use tokio::sync::watch;

/// Outcome broadcast to concurrent initializers: `None` while running.
pub(crate) type InitOutcome = Option<std::result::Result<(), String>>;

/// Internal lifecycle state.
///
/// Transitions: `Uninitialized → Initializing → Ready`, with
/// `Initializing → Failed` on any stage error and `Failed → Initializing`
/// on retry. The `Initializing` receiver lets concurrent `initialize()`
/// callers await the in-flight attempt instead of racing a second spawn.
pub(crate) enum Lifecycle {
    Uninitialized,
    Initializing(watch::Receiver<InitOutcome>),
    Ready,
    Failed(String),
}

/// Observable snapshot of the client's lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleState {
    /// `initialize()` has never been called.
    Uninitialized,
    /// An initialization attempt is in flight.
    Initializing,
    /// The service is up and the model is loaded.
    Ready,
    /// The last attempt failed, or the service crashed. Retry with
    /// `initialize()`.
    Failed(String),
}

impl Lifecycle {
    pub(crate) fn snapshot(&self) -> LifecycleState {
        match self {
            Self::Uninitialized => LifecycleState::Uninitialized,
            Self::Initializing(_) => LifecycleState::Initializing,
            Self::Ready => LifecycleState::Ready,
            Self::Failed(msg) => LifecycleState::Failed(msg.clone()),
        }
    }
}

/// Events observable through [`crate::RetrievalClient::events`].
#[derive(Debug, Clone)]
pub enum ServiceEvent {
    /// Initialization completed; retrieval is live.
    Ready,
    /// Initialization failed.
    Failed {
        /// Human-readable failure description.
        message: String,
    },
    /// The service process exited unexpectedly after being ready.
    Crashed {
        /// Exit code, if the OS reported one.
        code: Option<i32>,
    },
}
