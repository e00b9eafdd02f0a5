//! Sampling of service durations.

use rand::distributions::{Distribution, Uniform};
use rand::Rng;
use rand_distr::{Exp, LogNormal};

use crate::config::ServiceTime;
use crate::error::{invalid, Error};

/// Ready-to-sample form of [`ServiceTime`].
#[derive(Clone, Debug)]
pub enum ServiceSampler {
    Constant(f64),
    Exponential(Exp<f64>),
    Uniform(Uniform<f64>),
    LogNormal(LogNormal<f64>),
}

impl TryFrom<&ServiceTime> for ServiceSampler {
    type Error = Error;

    fn try_from(service: &ServiceTime) -> Result<Self, Error> {
        service.validate()?;
        let sampler = match *service {
            ServiceTime::Constant { value } => ServiceSampler::Constant(value),
            ServiceTime::Exponential { mean } => {
                ServiceSampler::Exponential(Exp::new(1. / mean).map_err(|e| invalid(e.to_string()))?)
            }
            ServiceTime::Uniform { min, max } => ServiceSampler::Uniform(Uniform::new_inclusive(min, max)),
            ServiceTime::LogNormal { mean, std_dev } => {
                // parameters of the underlying normal distribution giving the requested mean and deviation
                let sigma2 = (1. + (std_dev / mean).powi(2)).ln();
                let mu = mean.ln() - sigma2 / 2.;
                ServiceSampler::LogNormal(LogNormal::new(mu, sigma2.sqrt()).map_err(|e| invalid(e.to_string()))?)
            }
        };
        Ok(sampler)
    }
}

impl Distribution<f64> for ServiceSampler {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match self {
            ServiceSampler::Constant(value) => *value,
            ServiceSampler::Exponential(d) => d.sample(rng),
            ServiceSampler::Uniform(d) => d.sample(rng),
            ServiceSampler::LogNormal(d) => d.sample(rng),
        }
    }
}
