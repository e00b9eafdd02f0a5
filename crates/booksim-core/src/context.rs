//! Accessing simulation from event handlers.

use rand::distributions::uniform::{SampleRange, SampleUniform};
use rand::prelude::Distribution;

use crate::error::SimError;
use crate::event::{Event, EventId};
use crate::state::SimulationState;

/// A facade for accessing the simulation state and producing events from event handlers.
///
/// The context owns the clock, the pending event set and the random number generator of a single run,
/// so independent simulations never share any state.
pub struct SimulationContext<T> {
    name: String,
    state: SimulationState<T>,
}

impl<T> SimulationContext<T> {
    pub(crate) fn new(name: &str, seed: u64) -> Self {
        Self {
            name: name.to_owned(),
            state: SimulationState::new(seed),
        }
    }

    pub(crate) fn state_mut(&mut self) -> &mut SimulationState<T> {
        &mut self.state
    }

    /// Returns the name of the simulated component, used as the log target.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the current simulation time.
    pub fn time(&self) -> f64 {
        self.state.time()
    }

    /// Returns a random float in the range _[0, 1)_
    /// using the simulation-wide random number generator.
    pub fn rand(&mut self) -> f64 {
        self.state.rand()
    }

    /// Returns a random number in the specified range
    /// using the simulation-wide random number generator.
    pub fn gen_range<R, S>(&mut self, range: S) -> R
    where
        R: SampleUniform,
        S: SampleRange<R>,
    {
        self.state.gen_range(range)
    }

    /// Returns a random value from the specified distribution
    /// using the simulation-wide random number generator.
    pub fn sample_from_distribution<R, Dist: Distribution<R>>(&mut self, dist: &Dist) -> R {
        self.state.sample_from_distribution(dist)
    }

    /// Schedules a new event with specified payload and delay.
    ///
    /// Fails with [`SimError::InvalidSchedule`] if the delay is negative.
    pub fn emit(&mut self, data: T, delay: f64) -> Result<EventId, SimError> {
        self.state.add_event(data, delay)
    }

    /// Schedules a new immediate (zero-delay) event.
    pub fn emit_now(&mut self, data: T) -> Result<EventId, SimError> {
        self.state.add_event(data, 0.)
    }

    /// Schedules a new event at the specified absolute time.
    ///
    /// Fails with [`SimError::InvalidSchedule`] if the time is in the past.
    pub fn emit_at(&mut self, data: T, time: f64) -> Result<EventId, SimError> {
        self.state.add_event_at(data, time)
    }

    /// Cancels the specified event.
    ///
    /// The event stays in the pending set but is skipped when its time comes.
    pub fn cancel_event(&mut self, id: EventId) {
        self.state.cancel_event(id);
    }

    /// Cancels pending events that satisfy the given predicate.
    pub fn cancel_events<F>(&mut self, pred: F)
    where
        F: Fn(&Event<T>) -> bool,
    {
        self.state.cancel_events(pred);
    }

    /// Returns the number of pending (not cancelled) events.
    pub fn pending_events(&self) -> usize {
        self.state.pending_count()
    }

    /// Returns the total number of created events, including cancelled ones.
    pub fn event_count(&self) -> u64 {
        self.state.event_count()
    }
}

impl<T: Clone> SimulationContext<T> {
    /// Returns a copy of pending events in the order of their delivery.
    pub fn dump_events(&self) -> Vec<Event<T>> {
        self.state.dump_events()
    }
}
