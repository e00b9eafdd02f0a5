use booksim::config::{AutoscalePolicy, CapacityStrategy, Config, LoadPhase, ServiceTime};
use booksim::{BookingSimulation, Error};

fn assert_invalid(yaml: &str) {
    match Config::from_yaml_str(yaml) {
        Err(Error::InvalidConfiguration(_)) => {}
        other => panic!("expected invalid configuration, got {:?}", other),
    }
}

#[test]
fn test_defaults() {
    let config = Config::from_yaml_str("seed: 5").unwrap();
    assert_eq!(config, Config { seed: 5, ..Default::default() });
    assert!(config.validate().is_ok());
}

#[test]
fn test_full_config() {
    let yaml = r#"
seed: 11
horizon: 3600
arrival:
  rate: 2.5
  phases:
    - start: 600
      end: 900
      rate: 12
service:
  type: lognormal
  mean: 0.3
  std_dev: 0.1
queue_capacity: 20
abandon_timeout: 5
drain: false
capacity:
  strategy: autoscale
  min: 2
  max: 8
  step: 2
  cooldown: 30
"#;
    let config = Config::from_yaml_str(yaml).unwrap();
    assert_eq!(config.seed, 11);
    assert_eq!(config.horizon, 3600.);
    assert_eq!(
        config.arrival.phases,
        vec![LoadPhase {
            start: 600.,
            end: 900.,
            rate: 12.
        }]
    );
    assert_eq!(config.service, ServiceTime::LogNormal { mean: 0.3, std_dev: 0.1 });
    assert_eq!(config.queue_capacity, 20);
    assert_eq!(config.abandon_timeout, Some(5.));
    assert!(!config.drain);
    assert_eq!(
        config.capacity,
        CapacityStrategy::Autoscale(AutoscalePolicy {
            min: 2,
            max: 8,
            initial: 2,
            step: 2,
            cooldown: 30.,
            ..Default::default()
        })
    );
    assert_eq!(config.capacity.label(), "autoscale(2..8)");
}

#[test]
fn test_fixed_capacity_without_abandonment() {
    let yaml = r#"
service:
  type: exponential
  mean: 0.1
abandon_timeout: ~
capacity:
  strategy: fixed
  servers: 6
"#;
    let config = Config::from_yaml_str(yaml).unwrap();
    assert_eq!(config.abandon_timeout, None);
    assert_eq!(config.capacity.initial_servers(), 6);
    assert_eq!(config.capacity.label(), "fixed(6)");
    assert_eq!(config.service.mean(), 0.1);
}

#[test]
fn test_invalid_configs() {
    assert_invalid("queue_capacity: -1");
    assert_invalid("arrival:\n  rate: 0");
    assert_invalid("arrival:\n  rate: -3");
    assert_invalid("horizon: 0");
    assert_invalid("abandon_timeout: -1");
    assert_invalid("service:\n  type: exponential\n  mean: 0");
    assert_invalid("service:\n  type: uniform\n  min: 2\n  max: 1");
    assert_invalid("capacity:\n  strategy: fixed\n  servers: 0");
    assert_invalid("capacity:\n  strategy: fixed\n  servers: -2");
    assert_invalid("capacity:\n  strategy: autoscale\n  min: 5\n  max: 2");
    assert_invalid("capacity:\n  strategy: autoscale\n  min: 1\n  max: 4\n  initial: 6");
    assert_invalid("capacity:\n  strategy: autoscale\n  scale_up_utilization: 0.2\n  scale_down_utilization: 0.5");
    assert_invalid("arrival:\n  rate: 1\n  phases:\n    - start: 5\n      end: 2\n      rate: 1");
}

#[test]
fn test_malformed_yaml() {
    assert!(matches!(Config::from_yaml_str("service:\n  type: gamma"), Err(Error::Yaml(_))));
    assert!(matches!(Config::from_yaml_str("horizon: [1, 2]"), Err(Error::Yaml(_))));
}

#[test]
fn test_sample_scenario() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../configs/flash-sale.yaml");
    let config = Config::from_yaml(&path).unwrap();
    assert_eq!(config.seed, 42);
    assert_eq!(config.arrival.phases.len(), 1);
    assert_eq!(config.capacity.label(), "autoscale(2..16)");
    let summary = BookingSimulation::new(config).unwrap().run().unwrap();
    assert!(summary.arrived > 0);
    assert_eq!(summary.completed + summary.dropped + summary.abandoned, summary.arrived);
    assert!(summary.peak_capacity > 2 && summary.peak_capacity <= 16);
    assert!(summary.scaling_actions > 0);
}

#[test]
fn test_missing_file() {
    let result = Config::from_yaml(std::path::Path::new("does/not/exist.yaml"));
    assert!(matches!(result, Err(Error::Io(_))));
}

#[test]
fn test_simulation_rejects_invalid_config() {
    let config = Config {
        queue_capacity: 10,
        capacity: CapacityStrategy::Autoscale(AutoscalePolicy {
            min: 3,
            max: 2,
            ..Default::default()
        }),
        ..Default::default()
    };
    assert!(matches!(
        BookingSimulation::new(config),
        Err(Error::InvalidConfiguration(_))
    ));
}
