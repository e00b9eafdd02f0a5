//! A discrete-event simulation engine with typed events.
//!
//! A [`Simulation`] owns a [`SimulationContext`] (clock, pending events, seeded random number generator)
//! and a model implementing [`EventHandler`]. Events are delivered in non-decreasing time order,
//! ties are broken by the order of scheduling, so a fixed seed always yields the same event trace.
//! Pending events can be cancelled, in which case they are skipped on delivery.

#![warn(missing_docs)]

pub mod context;
pub mod error;
pub mod event;
pub mod handler;
pub mod log;
pub mod simulation;
mod state;

pub use colored;
pub use context::SimulationContext;
pub use error::SimError;
pub use event::{Event, EventId};
pub use handler::EventHandler;
pub use simulation::Simulation;
pub use state::EPSILON;
