use crate::process::ProcessId;
use thiserror::Error;

/// Errors that may be encountered while building or running a simulation.
///
/// The [`BackInTime`] variant originates from the scheduling interface of
/// [`Simulation`] to indicate that an action's computed execution time is
/// prior to the current clock. This error likely corresponds to a logical
/// bug on the client side, e.g. passing a negative delay to
/// [`signal_event_with_delay()`].
///
/// The registry variants ([`AlreadyTerminated`], [`UnknownProcess`],
/// [`OutsideDispatch`]) report requests that name a process the registry
/// cannot act on.
///
/// The [`BadExecution`] variant originates from client code, providing a
/// wrapper that can pass through [`run_simulation()`] in a type-safe
/// manner. Invoking [`std::error::Error::source()`] on this variant will
/// acquire a shared reference to the wrapped [`std::error::Error`] for
/// handling on the client side.
///
/// [`Simulation`]: crate::Simulation
/// [`signal_event_with_delay()`]: crate::Simulation::signal_event_with_delay
/// [`run_simulation()`]: crate::Simulation::run_simulation
/// [`BackInTime`]: Error::BackInTime
/// [`AlreadyTerminated`]: Error::AlreadyTerminated
/// [`UnknownProcess`]: Error::UnknownProcess
/// [`OutsideDispatch`]: Error::OutsideDispatch
/// [`BadExecution`]: Error::BadExecution
#[derive(Debug, Error)]
pub enum Error {
    /// The scheduler rejected an action whose execution time lies before
    /// the current clock, e.g. because of a negative delay.
    #[error("action execution time is less than current simulation time")]
    BackInTime,
    /// A stop was requested for a process that has already run its stop
    /// callback.
    #[error("process {0} has already terminated")]
    AlreadyTerminated(ProcessId),
    /// The named pid was never returned by a registration in this run.
    #[error("no process is registered under id {0}")]
    UnknownProcess(ProcessId),
    /// An operation that targets the currently dispatching process was
    /// invoked while no dispatch is in progress.
    #[error("no process is currently being dispatched")]
    OutsideDispatch,
    /// A client-generated error was encountered while executing a process
    /// or error-handler callback. Call [`source()`] or unpack this value
    /// to handle it directly.
    ///
    /// [`source()`]: std::error::Error::source
    #[error("error while executing callback: {0}")]
    BadExecution(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Error::BackInTime, Error::BackInTime) => true,
            (Error::OutsideDispatch, Error::OutsideDispatch) => true,
            (Error::AlreadyTerminated(p1), Error::AlreadyTerminated(p2)) => p1 == p2,
            (Error::UnknownProcess(p1), Error::UnknownProcess(p2)) => p1 == p2,
            (Error::BadExecution(e1), Error::BadExecution(e2)) => {
                let e1: *const dyn std::error::Error = e1.as_ref();
                let e2: *const dyn std::error::Error = e2.as_ref();
                std::ptr::eq(e1, e2)
            },
            _ => false,
        }
    }
}

impl Eq for Error {}

/// [`std::result::Result`]`<(), `[`procsim::Error`]`>`
///
/// A type alias that simplifies the signatures of the scheduling façade
/// and of process and error-handler callbacks.
///
/// [`procsim::Error`]: Error
pub type Result = std::result::Result<(), Error>;
