//! Simulation of the request tier of a ticket booking site.
//!
//! Users arrive as a Poisson process and are served by a pool of servers with a bounded FIFO queue.
//! Requests that find the queue full are dropped, waiting requests may abandon the queue after a timeout.
//! The pool has either a fixed number of servers or is resized by an autoscaler with cooldown.
//! A run produces a [`Summary`] with response time percentiles, drop rate and time-averaged utilization.
//!
//! ```rust
//! use booksim::config::{AutoscalePolicy, CapacityStrategy};
//! use booksim::experiment::compare_strategies;
//! use booksim::Config;
//!
//! let config = Config {
//!     horizon: 20.,
//!     ..Default::default()
//! };
//! let cmp = compare_strategies(&config, 2, AutoscalePolicy::default()).unwrap();
//! assert_eq!(cmp.fixed.arrived, cmp.autoscaled.arrived);
//! assert!(cmp.autoscaled.peak_capacity > 1);
//! ```

pub mod admission;
pub mod arrival;
pub mod autoscaler;
pub mod config;
pub mod error;
pub mod event;
pub mod experiment;
pub mod metrics;
pub mod pool;
pub mod request;
pub mod service;
pub mod simulation;

pub use config::{CapacityStrategy, Config};
pub use error::Error;
pub use event::BookingEvent;
pub use metrics::Summary;
pub use simulation::{BookingSimulation, BookingSystem};
