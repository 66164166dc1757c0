use crate::events::{Event, EventRef};
use crate::process::ProcessId;
use crate::simulation::Time;

use ordered_float::OrderedFloat;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// What the dispatch loop should do with a popped action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ActionKind {
    /// Deliver the payload to the target's event callback.
    Event,
    /// Run the target's one-time initialization callback.
    Init,
    /// Run the target's stop callback and mark it terminated.
    Stop,
}

/// A scheduled unit of work: when, what, and for whom. The payload is
/// present only for [`ActionKind::Event`].
///
/// The implementation of [`Ord`] cares first about the execution time,
/// comparing the insertion sequences only to break ties, so that
/// equal-time actions pop in the order they were scheduled.
#[derive(Debug)]
pub(crate) struct Action {
    pub time: Time,
    pub kind: ActionKind,
    pub pid: ProcessId,
    pub payload: Option<EventRef>,
    insertion_sequence: u64,
}

impl PartialEq<Self> for Action {
    fn eq(&self, other: &Self) -> bool {
        self.insertion_sequence == other.insertion_sequence
            && OrderedFloat(self.time) == OrderedFloat(other.time)
    }
}

impl Eq for Action {}

impl PartialOrd<Self> for Action {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Action {
    fn cmp(&self, other: &Self) -> Ordering {
        let comparison = OrderedFloat(self.time).cmp(&OrderedFloat(other.time));
        match comparison {
            Ordering::Equal => self.insertion_sequence.cmp(&other.insertion_sequence),
            _ => comparison,
        }
    }
}

/// Priority queue of scheduled actions.
///
/// Actions pop in ascending order of execution time, with ties broken by
/// the order in which they were pushed onto the queue. Callers must not
/// rely on more than the non-decreasing time guarantee.
#[derive(Debug, Default)]
pub(crate) struct ActionQueue {
    actions: BinaryHeap<Reverse<Action>>,
    actions_added: u64,
}

impl ActionQueue {
    /// Place an action. Duplicates are permitted; payload handles carried
    /// by queue entries are released when the entry is popped, removed,
    /// or cleared.
    pub fn insert(&mut self, time: Time, kind: ActionKind, pid: ProcessId, payload: Option<EventRef>) {
        let insertion_sequence = self.actions_added;
        self.actions_added += 1;
        self.actions.push(Reverse(Action {
            time,
            kind,
            pid,
            payload,
            insertion_sequence,
        }));
    }

    /// Remove and return the action with the smallest execution time.
    pub fn pop_earliest(&mut self) -> Option<Action> {
        self.actions.pop().map(|action| action.0)
    }

    /// Remove every [`ActionKind::Event`] action whose payload satisfies
    /// `pred`. [`Init`] and [`Stop`] actions are untouched, as are event
    /// actions carrying no payload. Returns how many actions were
    /// dropped.
    ///
    /// [`Init`]: ActionKind::Init
    /// [`Stop`]: ActionKind::Stop
    pub fn remove_matching<F>(&mut self, pred: F) -> usize
    where
        F: Fn(&dyn Event) -> bool,
    {
        let before = self.actions.len();
        self.actions = std::mem::take(&mut self.actions)
            .into_iter()
            .filter(|Reverse(action)| {
                action.kind != ActionKind::Event
                    || !action.payload.as_ref().is_some_and(|payload| pred(payload.as_ref()))
            })
            .collect();
        before - self.actions.len()
    }

    /// Drop every scheduled action and restart the insertion sequence.
    pub fn clear(&mut self) {
        self.actions.clear();
        self.actions_added = 0;
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
