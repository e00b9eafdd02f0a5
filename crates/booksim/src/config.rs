//! Simulation configuration.
//!
//! [`RawConfig`] mirrors the YAML file layout and is validated into [`Config`].
//! [`Config`] implements `Default`, so you can start from the default booking scenario
//! and change only the fields you need:
//!
//! ```rust
//! use booksim::config::{CapacityStrategy, Config};
//!
//! let config = Config {
//!     queue_capacity: 0,
//!     capacity: CapacityStrategy::Fixed { servers: 4 },
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{invalid, Error};

/// Time interval with its own arrival rate, used to model load bursts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LoadPhase {
    pub start: f64,
    pub end: f64,
    pub rate: f64,
}

/// Poisson arrival stream with base rate λ and optional piecewise-constant bursts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArrivalConfig {
    pub rate: f64,
    #[serde(default)]
    pub phases: Vec<LoadPhase>,
}

/// Service duration distribution.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServiceTime {
    Constant {
        value: f64,
    },
    Exponential {
        mean: f64,
    },
    Uniform {
        min: f64,
        max: f64,
    },
    #[serde(rename = "lognormal")]
    LogNormal {
        mean: f64,
        std_dev: f64,
    },
}

impl ServiceTime {
    pub fn mean(&self) -> f64 {
        match *self {
            ServiceTime::Constant { value } => value,
            ServiceTime::Exponential { mean } => mean,
            ServiceTime::Uniform { min, max } => (min + max) / 2.,
            ServiceTime::LogNormal { mean, .. } => mean,
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        match *self {
            ServiceTime::Constant { value } => {
                check(value.is_finite() && value >= 0., "service.value must be non-negative")
            }
            ServiceTime::Exponential { mean } => check(mean.is_finite() && mean > 0., "service.mean must be positive"),
            ServiceTime::Uniform { min, max } => check(
                min.is_finite() && max.is_finite() && min >= 0. && min <= max,
                "service bounds must satisfy 0 <= min <= max",
            ),
            ServiceTime::LogNormal { mean, std_dev } => {
                check(mean.is_finite() && mean > 0., "service.mean must be positive")?;
                check(std_dev.is_finite() && std_dev >= 0., "service.std_dev must be non-negative")
            }
        }
    }
}

/// Parameters of the autoscaling control loop.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AutoscalePolicy {
    pub min: u32,
    pub max: u32,
    /// Servers provisioned at time zero.
    pub initial: u32,
    /// Servers added or removed by a single decision.
    pub step: u32,
    pub sampling_period: f64,
    /// Minimum time between two capacity changes.
    pub cooldown: f64,
    pub scale_up_utilization: f64,
    pub scale_down_utilization: f64,
    /// Treat a non-empty queue as overload regardless of utilization.
    pub scale_up_on_queue: bool,
}

impl Default for AutoscalePolicy {
    fn default() -> Self {
        Self {
            min: 1,
            max: 10,
            initial: 1,
            step: 1,
            sampling_period: 0.5,
            cooldown: 1.0,
            scale_up_utilization: 0.8,
            scale_down_utilization: 0.3,
            scale_up_on_queue: true,
        }
    }
}

impl AutoscalePolicy {
    pub fn validate(&self) -> Result<(), Error> {
        check(self.min >= 1, "autoscale.min must be at least 1")?;
        check(self.min <= self.max, "autoscale.min must not exceed autoscale.max")?;
        check(
            self.min <= self.initial && self.initial <= self.max,
            "autoscale.initial must be within [min, max]",
        )?;
        check(self.step >= 1, "autoscale.step must be at least 1")?;
        check(
            self.sampling_period.is_finite() && self.sampling_period > 0.,
            "autoscale.sampling_period must be positive",
        )?;
        check(
            self.cooldown.is_finite() && self.cooldown >= 0.,
            "autoscale.cooldown must be non-negative",
        )?;
        check(
            self.scale_up_utilization > 0. && self.scale_up_utilization <= 1.,
            "autoscale.scale_up_utilization must be within (0, 1]",
        )?;
        check(
            self.scale_down_utilization >= 0. && self.scale_down_utilization < self.scale_up_utilization,
            "autoscale.scale_down_utilization must be within [0, scale_up_utilization)",
        )
    }
}

/// How the number of servers is managed during the run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum CapacityStrategy {
    Fixed { servers: u32 },
    Autoscale(AutoscalePolicy),
}

impl CapacityStrategy {
    pub fn initial_servers(&self) -> u32 {
        match self {
            CapacityStrategy::Fixed { servers } => *servers,
            CapacityStrategy::Autoscale(policy) => policy.initial,
        }
    }

    /// Short human-readable name, e.g. `fixed(4)` or `autoscale(1..5)`.
    pub fn label(&self) -> String {
        match self {
            CapacityStrategy::Fixed { servers } => format!("fixed({})", servers),
            CapacityStrategy::Autoscale(policy) => format!("autoscale({}..{})", policy.min, policy.max),
        }
    }
}

/// Validated simulation config.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Config {
    pub seed: u64,
    /// Arrivals stop at this time.
    pub horizon: f64,
    pub arrival: ArrivalConfig,
    pub service: ServiceTime,
    /// Maximum number of waiting requests (Q_max), zero disables waiting.
    pub queue_capacity: usize,
    /// Waiting requests leave the queue after this time.
    pub abandon_timeout: Option<f64>,
    /// Process requests still in the system after the horizon.
    pub drain: bool,
    pub capacity: CapacityStrategy,
}

/// Peak hour of the booking site: 500 users within 10 time units, 0.2 per request,
/// at most 100 waiting requests, users give up after waiting for 1 time unit.
impl Default for Config {
    fn default() -> Self {
        Self {
            seed: 1,
            horizon: 10.,
            arrival: ArrivalConfig {
                rate: 50.,
                phases: Vec::new(),
            },
            service: ServiceTime::Constant { value: 0.2 },
            queue_capacity: 100,
            abandon_timeout: Some(1.),
            drain: true,
            capacity: CapacityStrategy::Fixed { servers: 1 },
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), Error> {
        check(
            self.horizon.is_finite() && self.horizon > 0.,
            "horizon must be positive",
        )?;
        check(
            self.arrival.rate.is_finite() && self.arrival.rate > 0.,
            "arrival.rate must be positive",
        )?;
        for phase in &self.arrival.phases {
            check(
                phase.start.is_finite() && phase.end.is_finite() && phase.start >= 0. && phase.start < phase.end,
                "arrival phase must satisfy 0 <= start < end",
            )?;
            check(
                phase.rate.is_finite() && phase.rate > 0.,
                "arrival phase rate must be positive",
            )?;
        }
        self.service.validate()?;
        if let Some(timeout) = self.abandon_timeout {
            check(
                timeout.is_finite() && timeout > 0.,
                "abandon_timeout must be positive",
            )?;
        }
        match &self.capacity {
            CapacityStrategy::Fixed { servers } => check(*servers >= 1, "capacity.servers must be at least 1"),
            CapacityStrategy::Autoscale(policy) => policy.validate(),
        }
    }

    pub fn from_raw(raw: RawConfig) -> Result<Self, Error> {
        let capacity = match raw.capacity {
            RawCapacity::Fixed { servers } => CapacityStrategy::Fixed {
                servers: to_u32(servers, "capacity.servers")?,
            },
            RawCapacity::Autoscale(p) => {
                let min = to_u32(p.min, "autoscale.min")?;
                CapacityStrategy::Autoscale(AutoscalePolicy {
                    min,
                    max: to_u32(p.max, "autoscale.max")?,
                    initial: match p.initial {
                        Some(initial) => to_u32(initial, "autoscale.initial")?,
                        None => min,
                    },
                    step: to_u32(p.step, "autoscale.step")?,
                    sampling_period: p.sampling_period,
                    cooldown: p.cooldown,
                    scale_up_utilization: p.scale_up_utilization,
                    scale_down_utilization: p.scale_down_utilization,
                    scale_up_on_queue: p.scale_up_on_queue,
                })
            }
        };
        let queue_capacity = usize::try_from(raw.queue_capacity)
            .map_err(|_| invalid(format!("queue_capacity must be non-negative, got {}", raw.queue_capacity)))?;
        let config = Self {
            seed: raw.seed,
            horizon: raw.horizon,
            arrival: raw.arrival,
            service: raw.service,
            queue_capacity,
            abandon_timeout: raw.abandon_timeout,
            drain: raw.drain,
            capacity,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_str(s: &str) -> Result<Self, Error> {
        Self::from_raw(serde_yaml::from_str(s)?)
    }

    pub fn from_yaml(path: &Path) -> Result<Self, Error> {
        let f = File::open(path)?;
        Self::from_raw(serde_yaml::from_reader(f)?)
    }
}

/// YAML-serializable autoscaling parameters, counts are signed to report negative values properly.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RawAutoscalePolicy {
    pub min: i64,
    pub max: i64,
    pub initial: Option<i64>,
    pub step: i64,
    pub sampling_period: f64,
    pub cooldown: f64,
    pub scale_up_utilization: f64,
    pub scale_down_utilization: f64,
    pub scale_up_on_queue: bool,
}

impl Default for RawAutoscalePolicy {
    fn default() -> Self {
        let policy = AutoscalePolicy::default();
        Self {
            min: policy.min as i64,
            max: policy.max as i64,
            initial: None,
            step: policy.step as i64,
            sampling_period: policy.sampling_period,
            cooldown: policy.cooldown,
            scale_up_utilization: policy.scale_up_utilization,
            scale_down_utilization: policy.scale_down_utilization,
            scale_up_on_queue: policy.scale_up_on_queue,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum RawCapacity {
    Fixed { servers: i64 },
    Autoscale(RawAutoscalePolicy),
}

/// YAML-serializable config
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RawConfig {
    pub seed: u64,
    pub horizon: f64,
    pub arrival: ArrivalConfig,
    pub service: ServiceTime,
    pub queue_capacity: i64,
    pub abandon_timeout: Option<f64>,
    pub drain: bool,
    pub capacity: RawCapacity,
}

impl Default for RawConfig {
    fn default() -> Self {
        let config = Config::default();
        Self {
            seed: config.seed,
            horizon: config.horizon,
            arrival: config.arrival,
            service: config.service,
            queue_capacity: config.queue_capacity as i64,
            abandon_timeout: config.abandon_timeout,
            drain: config.drain,
            capacity: RawCapacity::Fixed {
                servers: config.capacity.initial_servers() as i64,
            },
        }
    }
}

fn check(cond: bool, msg: &str) -> Result<(), Error> {
    if cond {
        Ok(())
    } else {
        Err(invalid(msg))
    }
}

fn to_u32(value: i64, field: &str) -> Result<u32, Error> {
    u32::try_from(value).map_err(|_| invalid(format!("{} must be a non-negative integer, got {}", field, value)))
}
