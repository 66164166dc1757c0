mod util;

use procsim::*;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use util::{entries, expected, new_trace, record, Trace};

/// Payload that bumps a shared counter when destroyed.
#[derive(Debug)]
struct Tag {
    x: i32,
    drops: Rc<Cell<usize>>,
}

impl Drop for Tag {
    fn drop(&mut self) {
        self.drops.set(self.drops.get() + 1);
    }
}

fn tag(x: i32, drops: &Rc<Cell<usize>>) -> EventRef {
    Rc::new(Tag {
        x,
        drops: Rc::clone(drops),
    })
}

/// Journals the `x` field of every payload it receives.
#[derive(Debug)]
struct Sink {
    trace: Trace,
}

impl OkProcess for Sink {
    fn process_event(&mut self, sim: &mut Simulation, event: Option<&EventRef>) {
        let tag = event
            .expect("every event in these tests carries a payload")
            .downcast_ref::<Tag>()
            .expect("every payload in these tests is a Tag");
        record(&self.trace, &format!("x={}", tag.x), sim.clock());
    }
}

#[test]
fn delivered_payloads_are_destroyed_exactly_once() {
    let drops = Rc::new(Cell::new(0));
    let trace = new_trace();
    let mut sim = Simulation::new();
    let pid = sim.create_process(Rc::new(RefCell::new(Sink { trace: trace.clone() })));
    sim.signal_event_with_delay(pid, Some(tag(7, &drops)), 1.0)
        .expect("the target is registered and the delay is non-negative");

    sim.run_simulation().expect("no callback in this simulation fails");

    assert_eq!(expected(&[("x=7", 1.0)]), entries(&trace));
    assert_eq!(1, drops.get(), "the delivered payload must be destroyed exactly once");
}

#[test]
fn one_payload_shared_by_two_actions_is_destroyed_once() {
    let drops = Rc::new(Cell::new(0));
    let trace = new_trace();
    let mut sim = Simulation::new();
    let pid = sim.create_process(Rc::new(RefCell::new(Sink { trace: trace.clone() })));
    let payload = tag(3, &drops);
    sim.signal_event_with_delay(pid, Some(Rc::clone(&payload)), 1.0)
        .expect("the target is registered and the delay is non-negative");
    sim.signal_event_with_delay(pid, Some(payload), 2.0)
        .expect("the target is registered and the delay is non-negative");

    sim.run_simulation().expect("no callback in this simulation fails");

    assert_eq!(expected(&[("x=3", 1.0), ("x=3", 2.0)]), entries(&trace));
    assert_eq!(1, drops.get(), "a shared payload must be destroyed only after its last delivery");
}

#[test]
fn remove_event_surgery_destroys_only_the_matching_payload() {
    let drops = Rc::new(Cell::new(0));
    let trace = new_trace();
    let mut sim = Simulation::new();
    let pid = sim.create_process(Rc::new(RefCell::new(Sink { trace: trace.clone() })));
    for x in 1..=3 {
        sim.signal_event_with_delay(pid, Some(tag(x, &drops)), f64::from(x))
            .expect("the target is registered and the delay is non-negative");
    }

    sim.remove_event(|event| event.downcast_ref::<Tag>().is_some_and(|tag| tag.x == 2));
    assert_eq!(1, drops.get(), "the removed payload must be destroyed at removal time");
    assert_eq!(3, sim.pending_actions(), "the init action and two events must remain");

    sim.run_simulation().expect("no callback in this simulation fails");

    assert_eq!(expected(&[("x=1", 1.0), ("x=3", 3.0)]), entries(&trace));
    assert_eq!(3, drops.get(), "every payload must be destroyed exactly once overall");
}

#[test]
fn remove_event_keeps_payload_less_events() {
    let trace = new_trace();
    let mut sim = Simulation::new();
    let pid = sim.create_process(Rc::new(RefCell::new(Single { trace: trace.clone() })));
    sim.signal_event_with_delay(pid, None, 1.0)
        .expect("the target is registered and the delay is non-negative");

    sim.remove_event(|_| true);

    sim.run_simulation().expect("no callback in this simulation fails");
    assert_eq!(
        expected(&[("event", 1.0)]),
        entries(&trace),
        "a predicate cannot match an event that carries no payload"
    );
}

/// Sink for payload-less events.
#[derive(Debug)]
struct Single {
    trace: Trace,
}

impl OkProcess for Single {
    fn process_event(&mut self, sim: &mut Simulation, event: Option<&EventRef>) {
        assert!(event.is_none());
        record(&self.trace, "event", sim.clock());
    }
}

#[test]
fn truncated_actions_release_their_payloads() {
    let drops = Rc::new(Cell::new(0));
    let trace = new_trace();
    let mut sim = Simulation::new();
    let pid = sim.create_process(Rc::new(RefCell::new(Sink { trace: trace.clone() })));
    sim.signal_event_with_delay(pid, Some(tag(9, &drops)), 10.0)
        .expect("the target is registered and the delay is non-negative");
    sim.set_stop_time(5.0);

    sim.run_simulation().expect("no callback in this simulation fails");

    assert!(entries(&trace).is_empty(), "the payload must not reach the process");
    assert_eq!(1, drops.get(), "a payload consumed by stop-time truncation must still be released");
}

#[test]
fn clear_releases_queued_payloads() {
    let drops = Rc::new(Cell::new(0));
    let trace = new_trace();
    let mut sim = Simulation::new();
    let pid = sim.create_process(Rc::new(RefCell::new(Sink { trace: trace.clone() })));
    sim.signal_event_with_delay(pid, Some(tag(1, &drops)), 1.0)
        .expect("the target is registered and the delay is non-negative");
    sim.signal_event_with_delay(pid, Some(tag(2, &drops)), 2.0)
        .expect("the target is registered and the delay is non-negative");

    sim.clear();

    assert_eq!(0, sim.pending_actions());
    assert_eq!(2, drops.get(), "both queued payloads must be released by clear");
}

/// Forwards every payload it receives to a peer, one unit later.
#[derive(Debug)]
struct Relay {
    peer: Option<ProcessId>,
}

impl Process for Relay {
    fn process_event(&mut self, sim: &mut Simulation, event: Option<&EventRef>) -> Result {
        let payload = event.expect("the relay only receives tagged payloads");
        sim.signal_event_with_delay(self.peer.expect("peer registered before the run"), Some(Rc::clone(payload)), 1.0)
    }
}

#[test]
fn resignaling_extends_a_payloads_lifetime() {
    let drops = Rc::new(Cell::new(0));
    let trace = new_trace();
    let mut sim = Simulation::new();
    let relay = Rc::new(RefCell::new(Relay { peer: None }));
    let relay_id = sim.create_process(relay.clone());
    let sink_id = sim.create_process(Rc::new(RefCell::new(Sink { trace: trace.clone() })));
    relay.borrow_mut().peer = Some(sink_id);
    sim.signal_event_with_delay(relay_id, Some(tag(5, &drops)), 1.0)
        .expect("the target is registered and the delay is non-negative");

    sim.run_simulation().expect("no callback in this simulation fails");

    assert_eq!(
        expected(&[("x=5", 2.0)]),
        entries(&trace),
        "the forwarded payload must arrive intact one unit later"
    );
    assert_eq!(1, drops.get(), "forwarding must extend the payload's lifetime, not duplicate it");
}
