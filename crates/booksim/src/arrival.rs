//! Generation of request arrivals.

use rand::SeedableRng;
use rand_distr::{Distribution, Exp};
use rand_pcg::Pcg64;

use booksim_core::{EventId, SimError, SimulationContext};

use crate::config::{ArrivalConfig, LoadPhase};
use crate::error::{invalid, Error};
use crate::event::BookingEvent;

// Keeps the arrival stream apart from the simulation generator seeded with the same value.
const STREAM_SALT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Poisson arrival process with piecewise-constant rate.
///
/// Inter-arrival gaps are exponential with the rate in force at the current time. When a gap crosses
/// a phase boundary, sampling restarts from the boundary with the new rate, which is exact for
/// exponential gaps since they are memoryless.
///
/// Gaps are drawn from a generator owned by the process, so the arrival stream depends only on the
/// seed and not on how much randomness the rest of the model consumes.
pub struct ArrivalProcess {
    rand: Pcg64,
    base_rate: f64,
    base: Exp<f64>,
    phases: Vec<(LoadPhase, Exp<f64>)>,
}

impl ArrivalProcess {
    pub fn new(config: &ArrivalConfig, seed: u64) -> Result<Self, Error> {
        let exp = |rate: f64| Exp::new(rate).map_err(|e| invalid(format!("arrival rate {}: {}", rate, e)));
        let mut phases = Vec::with_capacity(config.phases.len());
        for phase in &config.phases {
            phases.push((phase.clone(), exp(phase.rate)?));
        }
        Ok(Self {
            rand: Pcg64::seed_from_u64(seed ^ STREAM_SALT),
            base_rate: config.rate,
            base: exp(config.rate)?,
            phases,
        })
    }

    /// Returns the arrival rate at the given time, the first matching phase wins.
    pub fn rate_at(&self, time: f64) -> f64 {
        self.phase_at(time).map_or(self.base_rate, |(phase, _)| phase.rate)
    }

    fn phase_at(&self, time: f64) -> Option<&(LoadPhase, Exp<f64>)> {
        self.phases.iter().find(|(p, _)| p.start <= time && time < p.end)
    }

    fn next_boundary(&self, time: f64) -> f64 {
        self.phases
            .iter()
            .flat_map(|(p, _)| [p.start, p.end])
            .filter(|&t| t > time)
            .fold(f64::INFINITY, f64::min)
    }

    /// Draws the time of the next arrival after `now`.
    pub fn next_arrival_time(&mut self, now: f64) -> f64 {
        let mut time = now;
        loop {
            let dist = *self.phase_at(time).map_or(&self.base, |(_, d)| d);
            let gap = dist.sample(&mut self.rand);
            let boundary = self.next_boundary(time);
            if time + gap <= boundary {
                return time + gap;
            }
            time = boundary;
        }
    }

    /// Draws the gap between the current time and the next arrival.
    pub fn next_gap(&mut self, now: f64) -> f64 {
        self.next_arrival_time(now) - now
    }

    /// Schedules exactly one future arrival.
    pub fn schedule_next(&mut self, ctx: &mut SimulationContext<BookingEvent>) -> Result<EventId, SimError> {
        let time = self.next_arrival_time(ctx.time());
        ctx.emit_at(BookingEvent::Arrival, time)
    }
}

#[cfg(test)]
mod tests {
    use booksim_core::{Event, EventHandler, Simulation};

    use super::*;

    struct Counter {
        arrivals: ArrivalProcess,
        times: Vec<f64>,
        // draws from the simulation generator per event
        noise: u32,
    }

    impl EventHandler<BookingEvent> for Counter {
        fn on(&mut self, event: Event<BookingEvent>, ctx: &mut SimulationContext<BookingEvent>) -> Result<(), SimError> {
            self.times.push(event.time);
            for _ in 0..self.noise {
                ctx.rand();
            }
            self.arrivals.schedule_next(ctx)?;
            Ok(())
        }
    }

    fn arrival_times(config: ArrivalConfig, horizon: f64) -> Vec<f64> {
        arrival_times_with_noise(config, horizon, 0)
    }

    fn arrival_times_with_noise(config: ArrivalConfig, horizon: f64, noise: u32) -> Vec<f64> {
        let arrivals = ArrivalProcess::new(&config, 5).unwrap();
        let mut sim = Simulation::new(
            5,
            "arrivals",
            Counter {
                arrivals,
                times: Vec::new(),
                noise,
            },
        );
        let (counter, ctx) = sim.parts_mut();
        counter.arrivals.schedule_next(ctx).unwrap();
        sim.run_until(horizon).unwrap();
        sim.handler().times.clone()
    }

    #[test]
    fn test_rate_at() {
        let config = ArrivalConfig {
            rate: 1.,
            phases: vec![LoadPhase {
                start: 10.,
                end: 20.,
                rate: 5.,
            }],
        };
        let process = ArrivalProcess::new(&config, 5).unwrap();
        assert_eq!(process.rate_at(0.), 1.);
        assert_eq!(process.rate_at(10.), 5.);
        assert_eq!(process.rate_at(19.9), 5.);
        assert_eq!(process.rate_at(20.), 1.);
        assert_eq!(process.next_boundary(0.), 10.);
        assert_eq!(process.next_boundary(15.), 20.);
        assert_eq!(process.next_boundary(25.), f64::INFINITY);
    }

    #[test]
    fn test_poisson_count() {
        let times = arrival_times(ArrivalConfig { rate: 50., phases: Vec::new() }, 200.);
        // 10000 expected, standard deviation is 100
        assert!((times.len() as f64 - 10000.).abs() < 500., "{}", times.len());
        assert!(times.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_burst_rate() {
        let config = ArrivalConfig {
            rate: 1.,
            phases: vec![LoadPhase {
                start: 100.,
                end: 200.,
                rate: 20.,
            }],
        };
        let times = arrival_times(config, 300.);
        let in_burst = times.iter().filter(|&&t| (100.0..200.0).contains(&t)).count() as f64;
        let outside = times.len() as f64 - in_burst;
        assert!((in_burst - 2000.).abs() < 250., "{}", in_burst);
        assert!((outside - 200.).abs() < 70., "{}", outside);
    }

    #[test]
    fn test_stream_ignores_other_randomness() {
        let config = ArrivalConfig { rate: 10., phases: Vec::new() };
        let quiet = arrival_times_with_noise(config.clone(), 50., 0);
        let noisy = arrival_times_with_noise(config, 50., 3);
        assert!(!quiet.is_empty());
        assert_eq!(quiet, noisy);
    }

    #[test]
    fn test_next_gap() {
        let mut process = ArrivalProcess::new(&ArrivalConfig { rate: 4., phases: Vec::new() }, 11).unwrap();
        let n = 100_000;
        let mut sum = 0.;
        for _ in 0..n {
            let gap = process.next_gap(3.);
            assert!(gap > 0.);
            sum += gap;
        }
        assert!((sum / n as f64 - 0.25).abs() < 0.005);
    }

    #[test]
    fn test_invalid_rate() {
        assert!(ArrivalProcess::new(&ArrivalConfig { rate: -1., phases: Vec::new() }, 5).is_err());
    }
}
