use crate::actions::{Action, ActionKind, ActionQueue};
use crate::error::{Error, Result};
use crate::events::{Event, EventRef};
use crate::handler::ErrorHandler;
use crate::process::{Process, ProcessDescriptor, ProcessId};

use std::cell::RefCell;
use std::fmt::{Display, Formatter};
use std::rc::Rc;
use tracing::{debug, trace};

/// Virtual time.
///
/// A continuous quantity; the semantics of the time unit are determined
/// by the simulated application. An interval of 1 may be interpreted as
/// one second, one year, or any other duration.
pub type Time = f64;

/// Beginning of time. Doubles as the sentinel meaning "no stop time
/// configured" for [`Simulation::set_stop_time()`].
pub const INIT_TIME: Time = 0.0;

/// Which diversion a popped action took instead of reaching its target.
enum Diversion {
    Busy,
    Terminated,
}

/// A generic discrete-event sequential simulator.
///
/// A `Simulation` maintains a virtual clock and a time-ordered schedule
/// of pending actions, and dispatches those actions to registered
/// [`Process`] objects in non-decreasing virtual-time order until the
/// schedule is exhausted or a termination condition is met.
///
/// The expected workflow is:
///
/// 1. Register one or more processes with [`create_process()`] (each
///    registration schedules that process's [`init()`] callback).
/// 2. Call [`run_simulation()`]. Handle any error it might return.
/// 3. Inspect results through the process handles the caller retained,
///    then optionally [`clear()`] and reuse the simulator.
///
/// Processes interact with the simulation from inside their callbacks
/// through the same object, received as a `&mut Simulation` parameter:
/// they may schedule events to themselves or others, create further
/// processes, stop processes, advance the clock, or stop the whole run.
///
/// Exactly one action is in flight at any moment; each callback runs to
/// completion before the next action is considered. The simulator is
/// single-threaded and must not be shared across threads.
///
/// The `service_desk` example program walks through the full workflow on
/// a small retrying service desk.
///
/// [`create_process()`]: Simulation::create_process
/// [`init()`]: Process::init
/// [`run_simulation()`]: Simulation::run_simulation
/// [`clear()`]: Simulation::clear
#[derive(Debug, Default)]
pub struct Simulation {
    actions: ActionQueue,
    processes: Vec<ProcessDescriptor>,
    error_handler: Option<Rc<RefCell<dyn ErrorHandler>>>,
    current_time: Time,
    stop_time: Time,
    current_process: Option<ProcessId>,
    running: bool,
    lock: bool,
}

impl Simulation {
    /// A simulator with an empty schedule, an empty process table, and
    /// the clock set to [`INIT_TIME`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new process with the given [`Process`] object and
    /// returns its id.
    ///
    /// Registration schedules the object's [`init()`] callback at the
    /// current time; it is guaranteed to run before any event is
    /// delivered to the new process. This method can be used safely
    /// within the simulation as well as outside it.
    ///
    /// The registry keeps a clone of the shared handle. Ownership of the
    /// process object remains with the caller, who typically retains a
    /// handle of the concrete type for inspecting results after the run.
    ///
    /// [`init()`]: Process::init
    pub fn create_process(&mut self, process: Rc<RefCell<dyn Process>>) -> ProcessId {
        self.processes.push(ProcessDescriptor::new(process));
        let pid = self.processes.len() - 1;
        trace!(pid, clock = self.current_time, "process registered");
        self.actions.insert(self.current_time, ActionKind::Init, pid, None);
        pid
    }

    /// Stops the execution of the given process: schedules its
    /// [`stop()`] callback at the current time. Events already scheduled
    /// before this call still reach the process first.
    ///
    /// # Errors
    ///
    /// [`Error::AlreadyTerminated`] if `pid` has already run its stop
    /// callback, [`Error::UnknownProcess`] if `pid` was never returned
    /// by [`create_process()`].
    ///
    /// [`stop()`]: Process::stop
    /// [`create_process()`]: Simulation::create_process
    pub fn stop_process(&mut self, pid: ProcessId) -> Result {
        let Some(descriptor) = self.processes.get(pid) else {
            return Err(Error::UnknownProcess(pid));
        };
        if descriptor.terminated {
            return Err(Error::AlreadyTerminated(pid));
        }
        self.actions.insert(self.current_time, ActionKind::Stop, pid, None);
        Ok(())
    }

    /// Stops the execution of the currently dispatching process.
    ///
    /// # Errors
    ///
    /// [`Error::OutsideDispatch`] if no process is being dispatched;
    /// otherwise as [`stop_process()`].
    ///
    /// [`stop_process()`]: Simulation::stop_process
    pub fn stop_current_process(&mut self) -> Result {
        let Some(pid) = self.current_process else {
            return Err(Error::OutsideDispatch);
        };
        self.stop_process(pid)
    }

    /// Signal an event to the given process at the current time.
    ///
    /// The payload, if any, is handed over to the scheduler, which
    /// releases it once no queue entry and no in-flight dispatch refers
    /// to it.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownProcess`] if `pid` was never returned by
    /// [`create_process()`].
    ///
    /// [`create_process()`]: Simulation::create_process
    pub fn signal_event(&mut self, pid: ProcessId, event: Option<EventRef>) -> Result {
        self.signal_event_with_delay(pid, event, 0.0)
    }

    /// Signal an event to the given process `delay` time units from now.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownProcess`] as for [`signal_event()`];
    /// [`Error::BackInTime`] if `delay` is negative, with no
    /// modifications to the schedule.
    ///
    /// [`signal_event()`]: Simulation::signal_event
    pub fn signal_event_with_delay(&mut self, pid: ProcessId, event: Option<EventRef>, delay: Time) -> Result {
        if pid >= self.processes.len() {
            return Err(Error::UnknownProcess(pid));
        }
        let time = self.current_time + delay;
        if time < self.current_time {
            return Err(Error::BackInTime);
        }
        self.actions.insert(time, ActionKind::Event, pid, event);
        Ok(())
    }

    /// Signal an event to the currently dispatching process at the
    /// current time.
    ///
    /// # Errors
    ///
    /// [`Error::OutsideDispatch`] if no process is being dispatched.
    pub fn self_signal_event(&mut self, event: Option<EventRef>) -> Result {
        self.self_signal_event_with_delay(event, 0.0)
    }

    /// Signal an event to the currently dispatching process `delay` time
    /// units from now.
    ///
    /// # Errors
    ///
    /// [`Error::OutsideDispatch`] if no process is being dispatched;
    /// [`Error::BackInTime`] if `delay` is negative.
    pub fn self_signal_event_with_delay(&mut self, event: Option<EventRef>, delay: Time) -> Result {
        let Some(pid) = self.current_process else {
            return Err(Error::OutsideDispatch);
        };
        self.signal_event_with_delay(pid, event, delay)
    }

    /// Advance the execution time of the current callback by `delay`.
    ///
    /// This represents wall time consumed by the response to an event:
    /// subsequent schedules in the same callback use the advanced time,
    /// and once the callback returns the process is unavailable until
    /// the advanced time. Events falling inside the consumed window are
    /// diverted to the error handler as busy-process conditions.
    ///
    /// If the simulation is not running, this is a no-op.
    pub fn advance_delay(&mut self, delay: Time) {
        if !self.running {
            return;
        }
        self.current_time += delay;
    }

    /// The current virtual time.
    pub fn clock(&self) -> Time {
        self.current_time
    }

    /// The id of the process currently being dispatched, or `None`
    /// outside a dispatch.
    pub fn this_process(&self) -> Option<ProcessId> {
        self.current_process
    }

    /// Sets the absolute virtual time at which the simulation will
    /// terminate, even in the presence of schedulable actions. Passing
    /// [`INIT_TIME`] cancels any prior stop time, restoring normal
    /// termination on an empty schedule.
    pub fn set_stop_time(&mut self, stop_time: Time) {
        self.stop_time = stop_time;
    }

    /// Stops execution of the simulation: the dispatch loop exits after
    /// the current callback returns and before any further action is
    /// popped.
    pub fn stop_simulation(&mut self) {
        self.running = false;
    }

    /// Registers a callback object that handles all simulation errors,
    /// replacing any previous one. Passing `None` uninstalls the current
    /// handler; with no handler installed, anomalous actions are dropped
    /// silently.
    pub fn set_error_handler(&mut self, handler: Option<Rc<RefCell<dyn ErrorHandler>>>) {
        self.error_handler = handler;
    }

    /// Remove every scheduled event action whose payload satisfies
    /// `pred`. Init and stop actions are untouched regardless of the
    /// predicate, as are event actions carrying no payload. Payloads
    /// referenced by no other queue entry are destroyed at removal.
    pub fn remove_event<F>(&mut self, pred: F)
    where
        F: Fn(&dyn Event) -> bool,
    {
        let removed = self.actions.remove_matching(pred);
        trace!(removed, clock = self.current_time, "event actions removed from schedule");
    }

    /// Executes scheduled actions, one at a time, in non-decreasing
    /// order of execution time, until the schedule is exhausted, a stop
    /// condition fires, or a callback fails.
    ///
    /// For each popped action the loop advances the clock to the
    /// action's time, exits if a configured stop time is exceeded, and
    /// otherwise hands the action to its target process: [`init()`],
    /// [`process_event()`], or [`stop()`] according to the action's
    /// kind. Actions targeting a terminated process, or a process still
    /// busy inside an [`advance_delay()`] window, are diverted to the
    /// installed [`ErrorHandler`] instead.
    ///
    /// A nested invocation from within a callback is a silent no-op, so
    /// a callback cannot restart the loop that is already driving it.
    ///
    /// # Errors
    ///
    /// The first error returned by a process or error-handler callback
    /// aborts the run and is forwarded to the caller unchanged. The
    /// simulator remains in a consistent state: the failing action has
    /// been consumed and the loop may be resumed by calling this method
    /// again.
    ///
    /// [`init()`]: Process::init
    /// [`process_event()`]: Process::process_event
    /// [`stop()`]: Process::stop
    /// [`advance_delay()`]: Simulation::advance_delay
    pub fn run_simulation(&mut self) -> Result {
        if self.lock {
            return Ok(());
        }
        self.lock = true;
        self.running = true;
        debug!(clock = self.current_time, pending = self.actions.len(), "dispatch loop entered");

        let outcome = self.dispatch_pending();

        self.lock = false;
        self.running = false;
        self.current_process = None;
        debug!(clock = self.current_time, pending = self.actions.len(), "dispatch loop exited");
        outcome
    }

    // the call to expect is a false alarm as it is immediately preceded
    // by a check that the schedule is non-empty
    fn dispatch_pending(&mut self) -> Result {
        while self.running && !self.actions.is_empty() {
            let action = self
                .actions
                .pop_earliest()
                .expect("a non-empty schedule always yields an action");
            self.current_time = action.time;
            if self.stop_time != INIT_TIME && self.current_time > self.stop_time {
                break;
            }
            self.current_process = Some(action.pid);
            self.dispatch(action)?;
            // the popped action drops here, releasing its payload handle
        }
        Ok(())
    }

    fn dispatch(&mut self, action: Action) -> Result {
        let Some(descriptor) = self.processes.get(action.pid) else {
            // reachable when a callback cleared the simulator mid-run
            trace!(pid = action.pid, "dropping action for unregistered process");
            return Ok(());
        };
        let terminated = descriptor.terminated;
        let available_at = descriptor.available_at;
        let process = Rc::clone(&descriptor.process);

        if terminated {
            return self.divert(action, Diversion::Terminated);
        }
        if self.current_time < available_at {
            return self.divert(action, Diversion::Busy);
        }

        trace!(pid = action.pid, clock = self.current_time, kind = ?action.kind, "dispatching");
        match action.kind {
            ActionKind::Event => process.borrow_mut().process_event(self, action.payload.as_ref())?,
            ActionKind::Init => process.borrow_mut().init(self)?,
            ActionKind::Stop => {
                process.borrow_mut().stop(self)?;
                // the callback may have grown the process table and
                // relocated its backing storage; index again rather than
                // holding a descriptor across the call
                if let Some(descriptor) = self.processes.get_mut(action.pid) {
                    descriptor.terminated = true;
                }
            },
        }
        if let Some(descriptor) = self.processes.get_mut(action.pid) {
            descriptor.available_at = self.current_time;
        }
        Ok(())
    }

    fn divert(&mut self, action: Action, diversion: Diversion) -> Result {
        let Some(handler) = self.error_handler.clone() else {
            trace!(pid = action.pid, clock = self.current_time, "anomalous action dropped: no handler installed");
            return Ok(());
        };
        let mut handler = handler.borrow_mut();
        match diversion {
            Diversion::Busy => handler.handle_busy(self, action.pid, action.payload.as_ref()),
            Diversion::Terminated => handler.handle_terminated(self, action.pid, action.payload.as_ref()),
        }
    }

    /// Clears out internal data structures, making the simulator
    /// available for a completely new simulation.
    ///
    /// All scheduled actions are dropped together with the payload
    /// handles they carry; the clock returns to [`INIT_TIME`]; a
    /// configured stop time is cancelled; the process table is emptied,
    /// invalidating every id returned by previous registrations. An
    /// installed error handler stays installed but has its internal
    /// state reset through [`ErrorHandler::clear()`].
    ///
    /// Process objects themselves are not destroyed: the registry only
    /// drops its clones of the shared handles, and ownership remains
    /// with the caller.
    pub fn clear(&mut self) {
        debug!(pending = self.actions.len(), processes = self.processes.len(), "clearing simulator");
        self.running = false;
        self.current_time = INIT_TIME;
        self.stop_time = INIT_TIME;
        self.current_process = None;
        self.processes.clear();
        if let Some(handler) = &self.error_handler {
            // a handler that calls clear() from inside one of its own
            // callbacks is already borrowed; skip its reset
            if let Ok(mut handler) = handler.try_borrow_mut() {
                handler.clear();
            }
        }
        self.actions.clear();
    }

    /// Whether the dispatch loop is currently executing. Observable from
    /// inside callbacks; always `false` once [`run_simulation()`] has
    /// returned.
    ///
    /// [`run_simulation()`]: Simulation::run_simulation
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Number of actions currently scheduled.
    pub fn pending_actions(&self) -> usize {
        self.actions.len()
    }

    /// Number of registered processes, terminated ones included.
    pub fn process_count(&self) -> usize {
        self.processes.len()
    }
}

impl Display for Simulation {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "simulation at time {} with {} pending actions over {} processes",
            self.current_time,
            self.actions.len(),
            self.processes.len()
        )
    }
}
