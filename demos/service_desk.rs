//! A single-counter service desk that prints arrival and service
//! logs to stdout. Arrival spacings are drawn with a mean of a
//! quarter time unit, and service durations with a mean of half a
//! time unit, so the desk is oversubscribed and regularly caught
//! mid-service.
//!
//! An arrival process signals a `Customer` payload to the desk for
//! each arrival. The desk represents the work it does per customer
//! by consuming the service duration within the delivery, which
//! leaves it unavailable until the advanced clock; customers whose
//! delivery lands inside that window divert to the installed error
//! handler, which retries them a tenth of a unit later until the
//! desk is free again.

use procsim::*;
use rand::SeedableRng;
use rand_distr::{Distribution, Exp};
use rand_pcg::Pcg64;
use std::cell::RefCell;
use std::rc::Rc;

/// Payload carried by every signal to the desk.
#[derive(Debug)]
struct Customer {
    id: usize,
}

/// Generates a fixed number of exponentially spaced arrivals.
#[derive(Debug)]
struct Arrivals {
    desk: ProcessId,
    rng: Rc<RefCell<Pcg64>>,
    spacing: Exp<f64>,
    next_id: usize,
    remaining: usize,
}

impl Arrivals {
    fn schedule_next(&mut self, sim: &mut Simulation) {
        let delay = self.spacing.sample(&mut *self.rng.borrow_mut());
        sim.self_signal_event_with_delay(None, delay)
            .expect("arrival spacings are always non-negative");
    }
}

impl OkProcess for Arrivals {
    fn init(&mut self, sim: &mut Simulation) {
        self.schedule_next(sim);
    }

    fn process_event(&mut self, sim: &mut Simulation, _event: Option<&EventRef>) {
        let id = self.next_id;
        self.next_id += 1;
        println!("{:8.3}  customer {id} arrives", sim.clock());
        sim.signal_event(self.desk, Some(Rc::new(Customer { id })))
            .expect("the desk is registered before the run");

        self.remaining -= 1;
        if self.remaining > 0 {
            self.schedule_next(sim);
        }
    }
}

/// Serves one customer at a time, consuming the service duration
/// within the delivery.
#[derive(Debug)]
struct Desk {
    rng: Rc<RefCell<Pcg64>>,
    service: Exp<f64>,
    served: usize,
}

impl OkProcess for Desk {
    fn process_event(&mut self, sim: &mut Simulation, event: Option<&EventRef>) {
        let customer = event
            .expect("the desk only receives customer payloads")
            .downcast_ref::<Customer>()
            .expect("every payload at the desk is a customer");
        let duration = self.service.sample(&mut *self.rng.borrow_mut());
        sim.advance_delay(duration);
        self.served += 1;
        println!("{:8.3}  customer {} served after {:.3}", sim.clock(), customer.id, duration);
    }
}

/// Retries any customer whose delivery caught the desk mid-service.
#[derive(Debug, Default)]
struct Backlog {
    retries: usize,
}

impl ErrorHandler for Backlog {
    fn clear(&mut self) {
        self.retries = 0;
    }

    fn handle_busy(&mut self, sim: &mut Simulation, _pid: ProcessId, event: Option<&EventRef>) -> Result {
        self.retries += 1;
        let customer = event.expect("only customer deliveries can find the desk busy");
        sim.self_signal_event_with_delay(Some(Rc::clone(customer)), 0.1)
    }
}

fn main() {
    let rng = Rc::new(RefCell::new(Pcg64::seed_from_u64(20260802)));
    let mut sim = Simulation::new();

    let backlog = Rc::new(RefCell::new(Backlog::default()));
    sim.set_error_handler(Some(backlog.clone()));

    let desk = Rc::new(RefCell::new(Desk {
        rng: rng.clone(),
        service: Exp::new(2.0).expect("the service rate is positive"),
        served: 0,
    }));
    let desk_id = sim.create_process(desk.clone());

    sim.create_process(Rc::new(RefCell::new(Arrivals {
        desk: desk_id,
        rng,
        spacing: Exp::new(4.0).expect("the arrival rate is positive"),
        next_id: 0,
        remaining: 20,
    })));

    sim.run_simulation().expect("no callback in this demo fails");

    println!(
        "served {} customers by time {:.3}, with {} busy retries",
        desk.borrow().served,
        sim.clock(),
        backlog.borrow().retries
    );
}
