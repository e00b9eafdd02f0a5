//! Engine errors.

use thiserror::Error;

/// Errors raised by the simulation engine.
///
/// Both variants signal a defect in model logic rather than a runtime condition,
/// so they abort the simulation step in which they occur.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    /// An event was scheduled before the current simulation time (or at a non-finite time).
    #[error("cannot schedule event at time {time} (current time is {now})")]
    InvalidSchedule {
        /// Requested delivery time.
        time: f64,
        /// Simulation time at the moment of scheduling.
        now: f64,
    },
    /// Event handler reported a failure.
    #[error("event handler failed: {0}")]
    Handler(String),
}
