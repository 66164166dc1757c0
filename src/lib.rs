//! A generic discrete-event sequential simulator.
//!
//! A [`Simulation`] maintains a virtual clock and a time-ordered
//! schedule of pending actions, and dispatches those actions to
//! user-defined [`Process`] objects in non-decreasing virtual-time order
//! until the schedule is exhausted or a termination condition is met.
//!
//! Processes are reactive: each supplies `init`, `process_event`, and
//! `stop` callbacks, runs one callback to completion at a time, and
//! expresses the passage of time either by scheduling future events or
//! by consuming time inside a callback with
//! [`Simulation::advance_delay()`]. Event payloads are opaque,
//! reference-counted values shared between queue entries; the simulator
//! destroys each payload exactly once, when the last reference to it is
//! released.
//!
//! Actions that target a process which has terminated, or which is still
//! busy consuming time from an earlier callback, are diverted to an
//! optional [`ErrorHandler`] instead of being delivered.
//!
//! The simulator is single-threaded and cooperative: there is exactly
//! one logical thread of simulated execution, and the core performs no
//! locking. See [`Simulation`] for the full workflow and an example.

mod actions;
mod error;
mod events;
mod handler;
mod process;
mod simulation;

pub use crate::error::{Error, Result};
pub use crate::events::{Event, EventRef};
pub use crate::handler::ErrorHandler;
pub use crate::process::{OkProcess, PidCell, Process, ProcessId};
pub use crate::simulation::{Simulation, Time, INIT_TIME};
