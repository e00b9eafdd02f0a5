use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use env_logger::Builder;
use log::info;

use booksim::config::{AutoscalePolicy, CapacityStrategy};
use booksim::experiment::{compare_strategies, min_servers_in_sweep, run, sweep_fixed};
use booksim::{Config, Error, Summary};

#[derive(Parser, Debug)]
#[command(about, long_about = None)]
/// Simulates the request tier of a ticket booking site
struct Args {
    /// Path to YAML file with simulation configuration (default - built-in peak hour scenario)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Use fixed capacity with this number of servers
    #[arg(long)]
    servers: Option<u32>,

    /// Use autoscaling (policy from config or default one)
    #[arg(long, conflicts_with = "servers")]
    autoscale: bool,

    /// Compare fixed capacity with autoscaling on the same workload
    #[arg(long)]
    compare: bool,

    /// Run fixed capacity with 1..=MAX servers
    #[arg(long, value_name = "MAX")]
    sweep: Option<u32>,

    /// Report the minimal server count with mean response time not exceeding this value (requires --sweep)
    #[arg(long, requires = "sweep")]
    target: Option<f64>,

    /// Random seed, overrides the config
    #[arg(long)]
    seed: Option<u64>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,
}

fn print_summary(summary: &Summary) {
    println!("{} (until {:.3})", summary.strategy, summary.end_time);
    for (name, value) in summary.scalars() {
        println!("  {:<24} {:.4}", name, value);
    }
}

fn policy_of(config: &Config) -> AutoscalePolicy {
    match &config.capacity {
        CapacityStrategy::Autoscale(policy) => policy.clone(),
        CapacityStrategy::Fixed { .. } => AutoscalePolicy::default(),
    }
}

fn main() -> Result<(), Error> {
    let args = Args::parse();

    Builder::from_default_env()
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .init();

    let mut config = match &args.config {
        Some(path) => Config::from_yaml(path)?,
        None => Config::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(servers) = args.servers {
        config.capacity = CapacityStrategy::Fixed { servers };
    } else if args.autoscale {
        config.capacity = CapacityStrategy::Autoscale(policy_of(&config));
    }
    info!("running with config {:?}", config);

    if args.compare {
        let servers = match &config.capacity {
            CapacityStrategy::Fixed { servers } => *servers,
            CapacityStrategy::Autoscale(policy) => policy.max,
        };
        let cmp = compare_strategies(&config, servers, policy_of(&config))?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&cmp).unwrap_or_default());
        } else {
            print_summary(&cmp.fixed);
            print_summary(&cmp.autoscaled);
        }
    } else if let Some(max) = args.sweep {
        let servers: Vec<u32> = (1..=max).collect();
        let summaries = sweep_fixed(&config, &servers)?;
        let best = match args.target {
            Some(target) => min_servers_in_sweep(&servers, &summaries, target)?,
            None => None,
        };
        if args.json {
            let out = serde_json::json!({"runs": summaries, "min_servers": best});
            println!("{}", serde_json::to_string_pretty(&out).unwrap_or_default());
        } else {
            for summary in &summaries {
                print_summary(summary);
            }
            if let Some(target) = args.target {
                match best {
                    Some(n) => println!("{} servers keep mean response time within {}", n, target),
                    None => println!("{} servers are not enough for mean response time {}", max, target),
                }
            }
        }
    } else {
        let summary = run(config)?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&summary).unwrap_or_default());
        } else {
            print_summary(&summary);
        }
    }
    Ok(())
}
