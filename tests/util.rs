#![allow(dead_code)]

use procsim::Time;
use std::cell::RefCell;
use std::rc::Rc;

/// Shared journal of labelled dispatch records written by test processes
/// and error handlers. Each entry pairs a label with the clock value at
/// which it was recorded.
pub type Trace = Rc<RefCell<Vec<(String, Time)>>>;

pub fn new_trace() -> Trace {
    Rc::new(RefCell::new(Vec::new()))
}

pub fn record(trace: &Trace, label: &str, time: Time) {
    trace.borrow_mut().push((label.to_string(), time));
}

pub fn entries(trace: &Trace) -> Vec<(String, Time)> {
    trace.borrow().clone()
}

/// Build the expected shape of a trace from literals.
pub fn expected(entries: &[(&str, Time)]) -> Vec<(String, Time)> {
    entries.iter().map(|(label, time)| (label.to_string(), *time)).collect()
}
