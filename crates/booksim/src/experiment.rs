//! Experiments over several runs: strategy comparison, server count sweeps and parallel execution.

use std::sync::mpsc::channel;
use std::thread;

use serde::Serialize;
use threadpool::ThreadPool;

use crate::config::{AutoscalePolicy, CapacityStrategy, Config};
use crate::error::{invalid, Error};
use crate::metrics::Summary;
use crate::simulation::BookingSimulation;

/// Results of the same workload served with fixed and autoscaled capacity.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Comparison {
    pub fixed: Summary,
    pub autoscaled: Summary,
}

/// Runs a single simulation to completion.
pub fn run(config: Config) -> Result<Summary, Error> {
    BookingSimulation::new(config)?.run()
}

fn with_capacity(config: &Config, capacity: CapacityStrategy) -> Config {
    Config {
        capacity,
        ..config.clone()
    }
}

/// Runs the workload of `config` twice with the same seed: with `fixed_servers` servers and with autoscaling.
pub fn compare_strategies(config: &Config, fixed_servers: u32, policy: AutoscalePolicy) -> Result<Comparison, Error> {
    let fixed = with_capacity(config, CapacityStrategy::Fixed { servers: fixed_servers });
    let autoscaled = with_capacity(config, CapacityStrategy::Autoscale(policy));
    let mut results = parallel_runs(vec![fixed, autoscaled], 2).into_iter();
    match (results.next(), results.next()) {
        (Some(fixed), Some(autoscaled)) => Ok(Comparison {
            fixed: fixed?,
            autoscaled: autoscaled?,
        }),
        _ => Err(Error::Worker("missing comparison results".to_string())),
    }
}

/// Runs the workload with each of the given fixed server counts, results follow the input order.
pub fn sweep_fixed(config: &Config, servers: &[u32]) -> Result<Vec<Summary>, Error> {
    let configs = servers
        .iter()
        .map(|&n| with_capacity(config, CapacityStrategy::Fixed { servers: n }))
        .collect::<Vec<_>>();
    let n_workers = thread::available_parallelism().map_or(1, |n| n.get());
    parallel_runs(configs, n_workers).into_iter().collect()
}

fn check_target(target: f64) -> Result<(), Error> {
    if target.is_finite() && target > 0. {
        Ok(())
    } else {
        Err(invalid(format!("target response time must be positive, got {}", target)))
    }
}

fn meets_target(summary: &Summary, target: f64) -> bool {
    summary.mean_response_time.map_or(false, |t| t <= target)
}

/// Returns the smallest fixed server count up to `max_servers` whose mean response time does not exceed `target`.
pub fn min_servers_for(config: &Config, max_servers: u32, target: f64) -> Result<Option<u32>, Error> {
    check_target(target)?;
    for servers in 1..=max_servers {
        let summary = run(with_capacity(config, CapacityStrategy::Fixed { servers }))?;
        if meets_target(&summary, target) {
            return Ok(Some(servers));
        }
    }
    Ok(None)
}

/// Same as [`min_servers_for`], but picks from the results of a finished [`sweep_fixed`] over `servers`.
pub fn min_servers_in_sweep(servers: &[u32], summaries: &[Summary], target: f64) -> Result<Option<u32>, Error> {
    check_target(target)?;
    Ok(servers
        .iter()
        .zip(summaries)
        .filter(|(_, summary)| meets_target(summary, target))
        .map(|(&n, _)| n)
        .min())
}

/// Runs independent simulations in a thread pool with `n_workers` worker threads.
///
/// Results follow the order of `configs`.
pub fn parallel_runs(configs: Vec<Config>, n_workers: usize) -> Vec<Result<Summary, Error>> {
    let len = configs.len();
    if len == 0 {
        return Vec::new();
    }
    let pool = ThreadPool::new(n_workers.clamp(1, len));
    let (tx, rx) = channel();
    for (id, config) in configs.into_iter().enumerate() {
        let tx = tx.clone();
        pool.execute(move || {
            // the receiver outlives all workers
            let _ = tx.send((id, run(config)));
        });
    }
    drop(tx);
    let mut results: Vec<Option<Result<Summary, Error>>> = (0..len).map(|_| None).collect();
    for (id, result) in rx.iter() {
        results[id] = Some(result);
    }
    results
        .into_iter()
        .enumerate()
        .map(|(id, r)| r.unwrap_or_else(|| Err(Error::Worker(format!("run {} did not finish", id)))))
        .collect()
}
