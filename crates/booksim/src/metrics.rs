//! Collection of run metrics and the final summary.

use indexmap::IndexMap;
use serde::Serialize;

use crate::request::Request;

/// A sample of observed values.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SampleMetric {
    data: Vec<f64>,
}

impl SampleMetric {
    pub fn add(&mut self, x: f64) {
        self.data.push(x);
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.data
    }

    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }

    /// Returns NaN for an empty sample.
    pub fn mean(&self) -> f64 {
        self.sum() / (self.data.len() as f64)
    }

    pub fn min(&self) -> Option<f64> {
        self.data.iter().copied().reduce(f64::min)
    }

    pub fn max(&self) -> Option<f64> {
        self.data.iter().copied().reduce(f64::max)
    }

    pub fn biased_variance(&self) -> f64 {
        let mean = self.mean();
        self.data.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / (self.data.len() as f64)
    }

    pub fn unbiased_variance(&self) -> f64 {
        let n = self.data.len() as f64;
        self.biased_variance() * n / (n - 1.)
    }

    /// Returns the q-th quantile using linear interpolation between order statistics, NaN for an empty sample.
    pub fn quantile(&self, q: f64) -> f64 {
        let mut sorted = self.data.clone();
        sorted.sort_by(f64::total_cmp);
        quantile_sorted(&sorted, q)
    }
}

fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = q.clamp(0., 1.) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Integral over time of a piecewise-constant signal.
#[derive(Clone, Debug, Default)]
pub struct TimeWeighted {
    last_time: f64,
    last_value: f64,
    area: f64,
}

impl TimeWeighted {
    pub fn new(time: f64, value: f64) -> Self {
        Self {
            last_time: time,
            last_value: value,
            area: 0.,
        }
    }

    /// Records that the signal has the given value starting from `time`.
    pub fn update(&mut self, time: f64, value: f64) {
        if time > self.last_time {
            self.area += self.last_value * (time - self.last_time);
            self.last_time = time;
        }
        self.last_value = value;
    }

    pub fn integral(&self, end_time: f64) -> f64 {
        self.area + self.last_value * (end_time - self.last_time).max(0.)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct CapacitySample {
    pub time: f64,
    pub capacity: u32,
    pub target: u32,
}

/// Immutable result of a simulation run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Summary {
    pub strategy: String,
    pub end_time: f64,
    pub arrived: u64,
    pub completed: u64,
    pub dropped: u64,
    pub abandoned: u64,
    /// Requests still waiting or in service when the run stopped.
    pub in_flight: u64,
    pub drop_rate: f64,
    pub abandon_rate: f64,
    pub mean_response_time: Option<f64>,
    pub p50_response_time: Option<f64>,
    pub p90_response_time: Option<f64>,
    pub p95_response_time: Option<f64>,
    pub p99_response_time: Option<f64>,
    pub max_response_time: Option<f64>,
    pub mean_waiting_time: Option<f64>,
    /// Time average of busy / capacity.
    pub utilization: f64,
    /// Busy server-time divided by provisioned server-time.
    pub server_time_utilization: f64,
    pub mean_capacity: f64,
    pub peak_capacity: u32,
    pub scaling_actions: u64,
    pub capacity_trace: Vec<CapacitySample>,
}

impl Summary {
    /// Scalar metrics as an ordered flat mapping, missing values are reported as NaN.
    pub fn scalars(&self) -> IndexMap<&'static str, f64> {
        let opt = |x: Option<f64>| x.unwrap_or(f64::NAN);
        let mut map = IndexMap::new();
        map.insert("end_time", self.end_time);
        map.insert("arrived", self.arrived as f64);
        map.insert("completed", self.completed as f64);
        map.insert("dropped", self.dropped as f64);
        map.insert("abandoned", self.abandoned as f64);
        map.insert("in_flight", self.in_flight as f64);
        map.insert("drop_rate", self.drop_rate);
        map.insert("abandon_rate", self.abandon_rate);
        map.insert("mean_response_time", opt(self.mean_response_time));
        map.insert("p50_response_time", opt(self.p50_response_time));
        map.insert("p90_response_time", opt(self.p90_response_time));
        map.insert("p95_response_time", opt(self.p95_response_time));
        map.insert("p99_response_time", opt(self.p99_response_time));
        map.insert("max_response_time", opt(self.max_response_time));
        map.insert("mean_waiting_time", opt(self.mean_waiting_time));
        map.insert("utilization", self.utilization);
        map.insert("server_time_utilization", self.server_time_utilization);
        map.insert("mean_capacity", self.mean_capacity);
        map.insert("peak_capacity", self.peak_capacity as f64);
        map.insert("scaling_actions", self.scaling_actions as f64);
        map
    }
}

/// Observes request outcomes and pool state, never schedules anything.
pub struct MetricsCollector {
    strategy: String,
    start_time: f64,
    arrived: u64,
    completed: u64,
    dropped: u64,
    abandoned: u64,
    response_time: SampleMetric,
    waiting_time: SampleMetric,
    busy: TimeWeighted,
    capacity: TimeWeighted,
    load: TimeWeighted,
    capacity_trace: Vec<CapacitySample>,
    peak_capacity: u32,
    scaling_actions: u64,
}

impl MetricsCollector {
    pub fn new(strategy: &str, start_time: f64, capacity: u32) -> Self {
        Self {
            strategy: strategy.to_owned(),
            start_time,
            arrived: 0,
            completed: 0,
            dropped: 0,
            abandoned: 0,
            response_time: SampleMetric::default(),
            waiting_time: SampleMetric::default(),
            busy: TimeWeighted::new(start_time, 0.),
            capacity: TimeWeighted::new(start_time, capacity as f64),
            load: TimeWeighted::new(start_time, 0.),
            capacity_trace: vec![CapacitySample {
                time: start_time,
                capacity,
                target: capacity,
            }],
            peak_capacity: capacity,
            scaling_actions: 0,
        }
    }

    pub fn on_arrival(&mut self, _request: &Request) {
        self.arrived += 1;
    }

    pub fn on_start(&mut self, request: &Request) {
        if let Some(wait) = request.waiting_time() {
            self.waiting_time.add(wait);
        }
    }

    pub fn on_complete(&mut self, request: &Request) {
        self.completed += 1;
        if let Some(response) = request.response_time() {
            self.response_time.add(response);
        }
    }

    pub fn on_drop(&mut self, _request: &Request) {
        self.dropped += 1;
    }

    pub fn on_abandon(&mut self, _request: &Request) {
        self.abandoned += 1;
    }

    pub fn on_capacity_change(&mut self) {
        self.scaling_actions += 1;
    }

    /// Records pool state in force from `time` on, must be called after every state change.
    pub fn observe_pool(&mut self, time: f64, busy: u32, capacity: u32, target: u32) {
        self.busy.update(time, busy as f64);
        self.capacity.update(time, capacity as f64);
        let load = if capacity == 0 { 0. } else { busy as f64 / capacity as f64 };
        self.load.update(time, load);
        if let Some(last) = self.capacity_trace.last_mut() {
            if last.capacity == capacity && last.target == target {
                return;
            }
            if last.time == time {
                last.capacity = capacity;
                last.target = target;
                self.peak_capacity = self.peak_capacity.max(capacity);
                return;
            }
        }
        self.capacity_trace.push(CapacitySample { time, capacity, target });
        self.peak_capacity = self.peak_capacity.max(capacity);
    }

    pub fn arrived(&self) -> u64 {
        self.arrived
    }

    pub fn completed(&self) -> u64 {
        self.completed
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn abandoned(&self) -> u64 {
        self.abandoned
    }

    pub fn response_time(&self) -> &SampleMetric {
        &self.response_time
    }

    pub fn waiting_time(&self) -> &SampleMetric {
        &self.waiting_time
    }

    pub fn capacity_trace(&self) -> &[CapacitySample] {
        &self.capacity_trace
    }

    /// Computes the summary of the run observed until `end_time`.
    ///
    /// Does not modify the collector, so repeated calls give the same result.
    pub fn finalize(&self, end_time: f64) -> Summary {
        let elapsed = end_time - self.start_time;
        let per_arrival = |x: u64| {
            if self.arrived == 0 {
                0.
            } else {
                x as f64 / self.arrived as f64
            }
        };
        let per_time = |x: f64| if elapsed > 0. { x / elapsed } else { 0. };
        let mut sorted = self.response_time.values().to_vec();
        sorted.sort_by(f64::total_cmp);
        let quantile = |q: f64| {
            if sorted.is_empty() {
                None
            } else {
                Some(quantile_sorted(&sorted, q))
            }
        };
        let mean = |m: &SampleMetric| if m.is_empty() { None } else { Some(m.mean()) };
        let capacity_area = self.capacity.integral(end_time);
        Summary {
            strategy: self.strategy.clone(),
            end_time,
            arrived: self.arrived,
            completed: self.completed,
            dropped: self.dropped,
            abandoned: self.abandoned,
            in_flight: self.arrived - self.completed - self.dropped - self.abandoned,
            drop_rate: per_arrival(self.dropped),
            abandon_rate: per_arrival(self.abandoned),
            mean_response_time: mean(&self.response_time),
            p50_response_time: quantile(0.5),
            p90_response_time: quantile(0.9),
            p95_response_time: quantile(0.95),
            p99_response_time: quantile(0.99),
            max_response_time: sorted.last().copied(),
            mean_waiting_time: mean(&self.waiting_time),
            utilization: per_time(self.load.integral(end_time)),
            server_time_utilization: if capacity_area > 0. {
                self.busy.integral(end_time) / capacity_area
            } else {
                0.
            },
            mean_capacity: per_time(capacity_area),
            peak_capacity: self.peak_capacity,
            scaling_actions: self.scaling_actions,
            capacity_trace: self.capacity_trace.clone(),
        }
    }
}
