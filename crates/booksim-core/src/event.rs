//! Simulation events.

use std::cmp::Ordering;

use serde::Serialize;

/// Identifier of an event, assigned sequentially in the order of scheduling.
pub type EventId = u64;

/// An event scheduled for delivery at some simulation time.
///
/// The payload type `T` is usually a closed enum describing all events of a model,
/// so that handlers match on it exhaustively.
#[derive(Clone, Debug, Serialize)]
pub struct Event<T> {
    /// Unique event identifier.
    pub id: EventId,
    /// Time of event delivery.
    pub time: f64,
    /// Event payload.
    pub data: T,
}

impl<T> Eq for Event<T> {}

impl<T> PartialEq for Event<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

// Reversed so that BinaryHeap pops the earliest event, ties go to the earliest scheduled one.
impl<T> Ord for Event<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        other.time.total_cmp(&self.time).then_with(|| other.id.cmp(&self.id))
    }
}

impl<T> PartialOrd for Event<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
