use std::any::Any;
use std::fmt::Debug;
use std::rc::Rc;

/// A piece of information or a signal exchanged between two processes
/// through the simulator.
///
/// Any `'static` value that implements [`Debug`] is an event payload; a
/// blanket implementation covers all such types, so client code never
/// implements this trait by hand. The simulator treats payloads as
/// opaque: it shares them between scheduled actions and releases them
/// once no action and no in-flight dispatch refers to them.
///
/// A receiving process typically discriminates on the concrete payload
/// type with the `downcast_ref()` helper, selecting its reaction from
/// the payload types it understands and falling through for the rest;
/// the `service_desk` example program shows the pattern.
///
/// Requiring implementors to be [`Debug`] enables printing the full
/// contents of the action queue when necessary.
pub trait Event: Any + Debug {
    /// Upcast to [`Any`] for concrete-type discrimination.
    fn as_any(&self) -> &dyn Any;
}

impl<T> Event for T
where
    T: Any + Debug,
{
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl dyn Event {
    /// Reports whether the payload's concrete type is `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.as_any().is::<T>()
    }

    /// Borrow the payload as its concrete type, or `None` if the payload
    /// is of a different type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_any().downcast_ref()
    }
}

/// Shared handle to an event payload.
///
/// Payloads are handed to the scheduler by value and shared between every
/// queue entry that refers to them; the handle dropped last destroys the
/// payload. A process handler receives `Option<&EventRef>` and may
/// re-signal the same payload to other processes by cloning the handle,
/// which extends the payload's lifetime through the new queue entries. It
/// must not retain the reference past the handler's return.
pub type EventRef = Rc<dyn Event>;
