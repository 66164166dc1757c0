use crate::events::EventRef;
use crate::process::ProcessId;
use crate::simulation::Simulation;
use crate::Result;

use std::fmt::Debug;

/// Handles simulation anomalies: actions that target a process which is
/// either terminated or busy processing other events.
///
/// These conditions may or may not represent application errors; the
/// simulator delegates the judgement to an installed handler and
/// otherwise drops the affected action silently.
///
/// Both `handle_*` callbacks execute within the simulation in the
/// context of the affected process: the handler may read the current
/// time through [`Simulation::clock()`] and may itself schedule events,
/// including back to the affected process. An error returned from a
/// callback aborts the run the same way a process callback error does.
///
/// Install a handler with [`Simulation::set_error_handler()`]; the
/// simulator keeps a shared handle, so the caller can retain another
/// clone for inspecting counters after a run.
///
/// [`Simulation::clock()`]: crate::Simulation::clock
/// [`Simulation::set_error_handler()`]: crate::Simulation::set_error_handler
pub trait ErrorHandler: Debug {
    /// Called by [`Simulation::clear()`] so any counters or other
    /// internal state of the handler can be reset as necessary. The
    /// handler itself stays installed.
    ///
    /// [`Simulation::clear()`]: crate::Simulation::clear
    fn clear(&mut self) {}

    /// A process was scheduled to handle an event at a time when it is
    /// still busy working through an earlier callback's
    /// [`advance_delay()`] window. `event` is the dropped action's
    /// payload, if any.
    ///
    /// [`advance_delay()`]: crate::Simulation::advance_delay
    #[allow(unused_variables)]
    fn handle_busy(&mut self, sim: &mut Simulation, pid: ProcessId, event: Option<&EventRef>) -> Result {
        Ok(())
    }

    /// An action targeted a process that has already terminated.
    /// `event` is the dropped action's payload, if any.
    #[allow(unused_variables)]
    fn handle_terminated(&mut self, sim: &mut Simulation, pid: ProcessId, event: Option<&EventRef>) -> Result {
        Ok(())
    }
}
