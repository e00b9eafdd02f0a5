//! Event handling.

use crate::context::SimulationContext;
use crate::error::SimError;
use crate::event::Event;

/// Trait for consuming events in a simulation model.
///
/// The handler receives the context of the run explicitly, which is the only way to read
/// the clock and to schedule further events.
pub trait EventHandler<T> {
    /// Processes event.
    ///
    /// Returned errors abort the current simulation step and are passed to the caller of
    /// [`Simulation::step()`](crate::Simulation::step()).
    fn on(&mut self, event: Event<T>, ctx: &mut SimulationContext<T>) -> Result<(), SimError>;
}
