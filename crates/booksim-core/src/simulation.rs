//! Simulation configuration and execution.

use log::Level::Trace;
use log::{debug, log_enabled, trace};
use rand::distributions::uniform::{SampleRange, SampleUniform};
use rand::prelude::Distribution;
use serde::Serialize;
use serde_json::json;

use crate::context::SimulationContext;
use crate::error::SimError;
use crate::handler::EventHandler;
use crate::state::EPSILON;

/// Represents a simulation run: the clock with its pending events and the model handling them.
pub struct Simulation<T, H> {
    ctx: SimulationContext<T>,
    handler: H,
}

impl<T, H> Simulation<T, H>
where
    T: Serialize,
    H: EventHandler<T>,
{
    /// Creates a new simulation with specified random seed, name and event handler.
    ///
    /// Identical seeds produce identical event traces.
    pub fn new(seed: u64, name: &str, handler: H) -> Self {
        let ctx = SimulationContext::new(name, seed);
        debug!(
            target: "simulation",
            "[{:.3} {} simulation] Created simulation: {}",
            ctx.time(),
            crate::log::get_colored("DEBUG", colored::Color::Blue),
            json!({"name": name, "seed": seed})
        );
        Self { ctx, handler }
    }

    /// Returns the current simulation time.
    pub fn time(&self) -> f64 {
        self.ctx.time()
    }

    /// Returns the event handler.
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Returns the mutable event handler.
    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    /// Returns the simulation context.
    pub fn context(&self) -> &SimulationContext<T> {
        &self.ctx
    }

    /// Returns the mutable simulation context, e.g. to schedule initial events.
    pub fn context_mut(&mut self) -> &mut SimulationContext<T> {
        &mut self.ctx
    }

    /// Returns mutable references to both the handler and the context.
    pub fn parts_mut(&mut self) -> (&mut H, &mut SimulationContext<T>) {
        (&mut self.handler, &mut self.ctx)
    }

    /// Performs a single step through the simulation.
    ///
    /// Takes the next event from the pending set, advances the simulation time to event time
    /// and passes the event to the handler.
    ///
    /// Returns `true` if some pending event was processed and `false` if there are no pending events.
    pub fn step(&mut self) -> Result<bool, SimError> {
        let next = self.ctx.state_mut().next_event();
        if let Some(event) = next {
            if log_enabled!(Trace) {
                trace!(
                    target: self.ctx.name(),
                    "[{:.3} {} {}] {}",
                    event.time,
                    crate::log::get_colored("EVENT", colored::Color::BrightBlack),
                    self.ctx.name(),
                    json!({"id": event.id, "data": &event.data})
                );
            }
            self.handler.on(event, &mut self.ctx)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Performs the specified number of steps through the simulation.
    ///
    /// Returns `true` if there could be more pending events and `false` otherwise.
    pub fn steps(&mut self, step_count: u64) -> Result<bool, SimError> {
        for _ in 0..step_count {
            if !self.step()? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Steps through the simulation until there are no pending events left.
    pub fn step_until_no_events(&mut self) -> Result<(), SimError> {
        while self.step()? {}
        Ok(())
    }

    /// Steps through the simulation with duration limit.
    ///
    /// Processes events until the next event time is above `current_time + duration`
    /// or there are no pending events left. The clock stays at the last processed event.
    ///
    /// Returns `true` if there could be more pending events and `false` otherwise.
    pub fn step_for_duration(&mut self, duration: f64) -> Result<bool, SimError> {
        let end_time = self.time() + duration;
        loop {
            match self.ctx.state_mut().peek_event().map(|e| e.time) {
                Some(time) if time <= end_time => {}
                Some(_) => return Ok(true),
                None => return Ok(false),
            }
            self.step()?;
        }
    }

    /// Processes every event with time not greater than `end_time`, then moves the clock to `end_time`.
    ///
    /// The clock ends exactly at `end_time` even if the pending set empties earlier.
    /// Fails with [`SimError::InvalidSchedule`] if `end_time` is in the past.
    ///
    /// Returns `true` if there are pending events beyond `end_time` and `false` otherwise.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde::Serialize;
    /// use booksim_core::{Event, EventHandler, SimError, Simulation, SimulationContext};
    ///
    /// #[derive(Clone, Serialize)]
    /// enum Tick {
    ///     Tick,
    /// }
    ///
    /// struct Counter {
    ///     ticks: u32,
    /// }
    ///
    /// impl EventHandler<Tick> for Counter {
    ///     fn on(&mut self, _: Event<Tick>, ctx: &mut SimulationContext<Tick>) -> Result<(), SimError> {
    ///         self.ticks += 1;
    ///         ctx.emit(Tick::Tick, 1.0)?;
    ///         Ok(())
    ///     }
    /// }
    ///
    /// let mut sim = Simulation::new(123, "clock", Counter { ticks: 0 });
    /// sim.context_mut().emit(Tick::Tick, 0.5).unwrap();
    /// let more = sim.run_until(3.0).unwrap();
    /// assert!(more);
    /// assert_eq!(sim.handler().ticks, 3);
    /// assert_eq!(sim.time(), 3.0);
    /// assert!(sim.run_until(1.0).is_err());
    /// ```
    pub fn run_until(&mut self, end_time: f64) -> Result<bool, SimError> {
        if !end_time.is_finite() || end_time < self.time() - EPSILON {
            return Err(SimError::InvalidSchedule {
                time: end_time,
                now: self.time(),
            });
        }
        let more = loop {
            match self.ctx.state_mut().peek_event().map(|e| e.time) {
                Some(time) if time <= end_time => {}
                Some(_) => break true,
                None => break false,
            }
            self.step()?;
        };
        self.ctx.state_mut().advance_to(end_time);
        Ok(more)
    }

    /// Returns a random float in the range _[0, 1)_
    /// using the simulation-wide random number generator.
    pub fn rand(&mut self) -> f64 {
        self.ctx.rand()
    }

    /// Returns a random number in the specified range
    /// using the simulation-wide random number generator.
    pub fn gen_range<R, S>(&mut self, range: S) -> R
    where
        R: SampleUniform,
        S: SampleRange<R>,
    {
        self.ctx.gen_range(range)
    }

    /// Returns a random value from the specified distribution
    /// using the simulation-wide random number generator.
    pub fn sample_from_distribution<R, Dist: Distribution<R>>(&mut self, dist: &Dist) -> R {
        self.ctx.sample_from_distribution(dist)
    }

    /// Returns the total number of created events.
    ///
    /// Note that cancelled events are also counted here.
    pub fn event_count(&self) -> u64 {
        self.ctx.event_count()
    }
}
