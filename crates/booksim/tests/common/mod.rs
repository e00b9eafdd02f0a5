use booksim::config::{ArrivalConfig, CapacityStrategy, Config, ServiceTime};

#[allow(dead_code)]
pub fn assert_float_eq(x: f64, y: f64, eps: f64) {
    assert!(x > y - eps && x < y + eps, "{} != {} (eps {})", x, y, eps);
}

/// Single-server system without abandonment.
#[allow(dead_code)]
pub fn single_server(rate: f64, service: ServiceTime, queue_capacity: usize, horizon: f64) -> Config {
    Config {
        seed: 7,
        horizon,
        arrival: ArrivalConfig {
            rate,
            phases: Vec::new(),
        },
        service,
        queue_capacity,
        abandon_timeout: None,
        drain: true,
        capacity: CapacityStrategy::Fixed { servers: 1 },
    }
}
