use crate::events::EventRef;
use crate::simulation::{Simulation, Time, INIT_TIME};
use crate::Result;

use std::cell::{Cell, RefCell};
use std::fmt::Debug;
use std::rc::Rc;

/// Identifies a registered process.
///
/// Ids are dense and assigned in registration order within a run; they
/// are invalidated by [`Simulation::clear()`]. "No process" is expressed
/// as `Option<ProcessId>::None` throughout the crate.
///
/// [`Simulation::clear()`]: crate::Simulation::clear
pub type ProcessId = usize;

/// A process running within the simulator.
///
/// A simulated process is a reactive entity: it does nothing until the
/// dispatch loop hands it one of the three callbacks below, and each
/// callback runs to completion before the loop considers the next
/// scheduled action. All interaction with the simulation, from
/// scheduling events to advancing the clock, goes through the `sim`
/// parameter.
///
/// Every callback defaults to a no-op, so an implementor overrides only
/// the reactions it cares about. Callbacks are fallible; an error
/// returned from any of them aborts the run and surfaces from
/// [`Simulation::run_simulation()`]. Implementations that cannot fail
/// may prefer the [`OkProcess`] adapter, which drops the return type.
///
/// Requiring implementors to be [`Debug`] enables printing the full
/// contents of the process table when necessary.
///
/// [`Simulation::run_simulation()`]: crate::Simulation::run_simulation
pub trait Process: Debug {
    /// Invoked exactly once, before any event delivery, when the process
    /// is registered through [`Simulation::create_process()`].
    ///
    /// This method is not a constructor. It is an initialization step
    /// executed within the simulation, typically used to schedule the
    /// process's first events.
    ///
    /// [`Simulation::create_process()`]: crate::Simulation::create_process
    #[allow(unused_variables)]
    fn init(&mut self, sim: &mut Simulation) -> Result {
        Ok(())
    }

    /// Invoked whenever an event action targeting this process is
    /// dispatched; `event` may be absent for payload-less signals.
    ///
    /// The payload reference is valid for the duration of this call
    /// only. The handler may re-signal the same payload to other
    /// processes by cloning the [`EventRef`], which extends the
    /// payload's lifetime through the new queue entries; it must not
    /// retain the reference past return.
    ///
    /// The implementation may represent time consumed by this response
    /// with [`Simulation::advance_delay()`]; the process then misses
    /// (diverts to the error handler) any event scheduled for it inside
    /// the consumed window.
    ///
    /// [`Simulation::advance_delay()`]: crate::Simulation::advance_delay
    #[allow(unused_variables)]
    fn process_event(&mut self, sim: &mut Simulation, event: Option<&EventRef>) -> Result {
        Ok(())
    }

    /// Invoked when a stop action targeting this process is dispatched.
    /// After this call returns the process is marked terminated; any
    /// further action targeting it is diverted to the error handler.
    #[allow(unused_variables)]
    fn stop(&mut self, sim: &mut Simulation) -> Result {
        Ok(())
    }
}

/// A [`Process`] that is guaranteed not to return an [`Error`] from its
/// callbacks.
///
/// The callbacks on this trait differ from those on [`Process`] only by
/// omitting the return type. An implementation of [`Process`] is
/// provided for all implementors of this trait which simply invokes the
/// matching [`OkProcess`] callback then returns `Ok(())`.
///
/// [`Error`]: crate::Error
pub trait OkProcess: Debug {
    /// Infallible counterpart of [`Process::init()`].
    #[allow(unused_variables)]
    fn init(&mut self, sim: &mut Simulation) {}

    /// Infallible counterpart of [`Process::process_event()`].
    #[allow(unused_variables)]
    fn process_event(&mut self, sim: &mut Simulation, event: Option<&EventRef>) {}

    /// Infallible counterpart of [`Process::stop()`].
    #[allow(unused_variables)]
    fn stop(&mut self, sim: &mut Simulation) {}
}

impl<P> Process for P
where
    P: OkProcess,
{
    fn init(&mut self, sim: &mut Simulation) -> Result {
        OkProcess::init(self, sim);
        Ok(())
    }

    fn process_event(&mut self, sim: &mut Simulation, event: Option<&EventRef>) -> Result {
        OkProcess::process_event(self, sim, event);
        Ok(())
    }

    fn stop(&mut self, sim: &mut Simulation) -> Result {
        OkProcess::stop(self, sim);
        Ok(())
    }
}

/// Registry entry for one process: the shared handle to the process
/// object, its lifecycle flag, and the earliest virtual time at which it
/// may next be dispatched.
#[derive(Debug)]
pub(crate) struct ProcessDescriptor {
    pub process: Rc<RefCell<dyn Process>>,
    pub terminated: bool,
    pub available_at: Time,
}

impl ProcessDescriptor {
    pub fn new(process: Rc<RefCell<dyn Process>>) -> Self {
        Self {
            process,
            terminated: false,
            available_at: INIT_TIME,
        }
    }
}

/// One-shot cell that records the id a process was registered under.
///
/// A process that wants to know its own id embeds a `PidCell` and is
/// registered through [`activate()`] instead of a direct call to
/// [`Simulation::create_process()`]. The same cell can be activated
/// only once: a second activation is refused with `None` and leaves the
/// recorded id untouched.
///
/// [`activate()`]: PidCell::activate
/// [`Simulation::create_process()`]: crate::Simulation::create_process
#[derive(Debug, Default)]
pub struct PidCell {
    id: Cell<Option<ProcessId>>,
}

impl PidCell {
    /// An empty cell, not yet associated with a registered process.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `process` with the simulator and record the returned id.
    ///
    /// Returns the new id, or `None` if this cell has already been
    /// activated.
    pub fn activate(&self, sim: &mut Simulation, process: Rc<RefCell<dyn Process>>) -> Option<ProcessId> {
        if self.id.get().is_some() {
            return None;
        }
        let id = sim.create_process(process);
        self.id.set(Some(id));
        Some(id)
    }

    /// The id recorded by [`activate()`], or `None` if this cell was
    /// never activated.
    ///
    /// [`activate()`]: PidCell::activate
    pub fn pid(&self) -> Option<ProcessId> {
        self.id.get()
    }
}
