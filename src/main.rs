use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use hvac_planner::{config, controller, domain, optimizer, repo, simulation, telemetry};
use config::Config;
use controller::BatchDriver;
use domain::{BatchReport, ParameterSet, Room};
use optimizer::{MilpScheduler, SchedulingStrategy};
use repo::{CsvResultSink, CsvScenarioSource};
use simulation::ReplayVerifier;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "hvac-planner")]
#[command(about = "Cost-optimal day-ahead heating and ventilation schedules", long_about = None)]
struct Cli {
    /// Configuration file (TOML), overridden by HVAC__* environment variables
    #[arg(short, long, default_value = config::DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(flatten)]
    data: DataArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct DataArgs {
    /// Hourly price per day (one row per day)
    #[arg(long, global = true)]
    prices: Option<PathBuf>,

    /// Occupants of room 1 per hour (one row per day)
    #[arg(long, global = true)]
    occupancy_room1: Option<PathBuf>,

    /// Occupants of room 2 per hour (one row per day)
    #[arg(long, global = true)]
    occupancy_room2: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Solve every day of the scenario files and write hourly.csv / daily.csv
    Batch {
        /// Directory receiving the result files
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Days solved concurrently
        #[arg(short, long)]
        workers: Option<usize>,

        /// Print the batch summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Solve a single day and print its schedule
    Day {
        /// Zero-based row of the scenario files
        #[arg(short, long)]
        day: usize,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let mut cfg = Config::load_from(&cli.config)?;
    apply_overrides(&mut cfg, &cli);
    telemetry::init_tracing(&cfg.logging);

    let params = Arc::new(cfg.parameter_set().context("Invalid building parameters")?);
    let settings = cfg.model_settings().context("Invalid solver settings")?;
    let scheduler = MilpScheduler::new(settings, cfg.time_limit());
    let source = CsvScenarioSource::new(
        &cfg.data.prices,
        &cfg.data.occupancy_room1,
        &cfg.data.occupancy_room2,
    )
    .with_index_columns(cfg.data.index_columns);

    match cli.command {
        Command::Batch { json, .. } => run_batch(&cfg, params, scheduler, &source, json).await,
        Command::Day { day, json } => run_day(&cfg, params, scheduler, &source, day, json).await,
    }
}

fn apply_overrides(cfg: &mut Config, cli: &Cli) {
    if let Some(p) = &cli.data.prices {
        cfg.data.prices = p.clone();
    }
    if let Some(p) = &cli.data.occupancy_room1 {
        cfg.data.occupancy_room1 = p.clone();
    }
    if let Some(p) = &cli.data.occupancy_room2 {
        cfg.data.occupancy_room2 = p.clone();
    }
    if let Command::Batch { output_dir, workers, .. } = &cli.command {
        if let Some(dir) = output_dir {
            cfg.data.output_dir = dir.clone();
        }
        if workers.is_some() {
            cfg.batch.workers = *workers;
        }
    }
}

async fn run_batch(
    cfg: &Config,
    params: Arc<ParameterSet>,
    scheduler: MilpScheduler,
    source: &CsvScenarioSource,
    json: bool,
) -> Result<()> {
    let scenarios = source.load_all()?;
    info!(days = scenarios.len(), strategy = scheduler.name(), "loaded scenarios");

    let mut driver = BatchDriver::new(Arc::new(scheduler), params);
    if let Some(workers) = cfg.batch.workers {
        driver = driver.with_workers(workers);
    }
    if cfg.batch.verify {
        driver = driver.with_verifier(ReplayVerifier::new(
            cfg.solver.epsilon,
            cfg.batch.verify_tolerance,
        ));
    }

    let cancel = CancellationToken::new();
    let watcher = cancel.clone();
    tokio::spawn(async move {
        telemetry::shutdown_signal().await;
        warn!("cancelling batch");
        watcher.cancel();
    });

    let report: BatchReport = driver.run(scenarios, cancel).await;
    CsvResultSink::new(&cfg.data.output_dir).write_report(&report)?;

    let summary = report.summary();
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("days solved:  {}/{}", summary.solved, summary.days);
        for failed in &summary.failed {
            println!("  failed:     {}", failed.error);
        }
        println!("total cost:   {:.4}", summary.total_cost);
        match summary.average_cost {
            Some(avg) => println!("average cost: {avg:.4}"),
            None => println!("average cost: n/a"),
        }
        println!("results in    {}", cfg.data.output_dir.display());
    }
    Ok(())
}

async fn run_day(
    cfg: &Config,
    params: Arc<ParameterSet>,
    scheduler: MilpScheduler,
    source: &CsvScenarioSource,
    day: usize,
    json: bool,
) -> Result<()> {
    let scenario = source.load_day(day)?;
    let result = scheduler.schedule_day(params.clone(), scenario.clone()).await?;

    if cfg.batch.verify {
        let verifier = ReplayVerifier::new(cfg.solver.epsilon, cfg.batch.verify_tolerance);
        for violation in verifier.verify(&params, &scenario, &result) {
            warn!(%violation, "replay disagrees with solver");
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("day {} total cost {:.4} (big-M {:.2})", result.day, result.total_cost, result.big_m);
    println!(" hour   price  temp1  temp2  heat1  heat2  vent    hum  overrules");
    for h in &result.hours {
        let mut flags = Vec::new();
        for room in Room::ALL {
            if h.overrule.low_temperature[room] {
                flags.push(format!("low:{room}"));
            }
            if h.overrule.high_temperature[room] {
                flags.push(format!("high:{room}"));
            }
        }
        if h.overrule.humidity {
            flags.push("humidity".to_string());
        }
        println!(
            "{:>5} {:>7.3} {:>6.2} {:>6.2} {:>6.2} {:>6.2} {:>5} {:>6.2}  {}",
            h.hour,
            h.price,
            h.temperature[Room::One],
            h.temperature[Room::Two],
            h.heater_power[Room::One],
            h.heater_power[Room::Two],
            if h.ventilation_on() { "on" } else { "off" },
            h.humidity,
            flags.join(","),
        );
    }
    Ok(())
}
