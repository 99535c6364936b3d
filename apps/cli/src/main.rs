#![deny(warnings)]

//! Headless host: loads a data directory, replays a command script and runs
//! the economy on a simulated clock.

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use persistence::FileStore;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tycoon_econ::format_money;
use tycoon_runtime::{load_config, Clock, Command, Economy, ManualClock, SystemClock};

struct Args {
    data_dir: PathBuf,
    config: PathBuf,
    hours: u32,
    step_secs: i64,
    seed: Option<u64>,
    commands: Option<PathBuf>,
}

fn parse_args() -> Args {
    let mut args = Args {
        data_dir: PathBuf::from("assets/data"),
        config: PathBuf::from("assets/config.yaml"),
        hours: 0,
        step_secs: 10,
        seed: None,
        commands: None,
    };
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--data-dir" => {
                if let Some(dir) = it.next() {
                    args.data_dir = dir.into();
                }
            }
            "--config" => {
                if let Some(path) = it.next() {
                    args.config = path.into();
                }
            }
            "--hours" => args.hours = it.next().and_then(|s| s.parse().ok()).unwrap_or(0),
            "--step-secs" => {
                args.step_secs = it
                    .next()
                    .and_then(|s| s.parse().ok())
                    .filter(|s| *s > 0)
                    .unwrap_or(10)
            }
            "--seed" => args.seed = it.next().and_then(|s| s.parse().ok()),
            "--commands" => args.commands = it.next().map(PathBuf::from),
            other => warn!(arg = other, "ignoring unknown argument"),
        }
    }
    args
}

fn read_script(path: &PathBuf) -> Result<Vec<Command>> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    text.lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty() && !l.trim_start().starts_with('#'))
        .map(|(n, l)| {
            serde_json::from_str(l).with_context(|| format!("{}:{}", path.display(), n + 1))
        })
        .collect()
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = parse_args();
    info!(
        git_sha = env!("GIT_SHA"),
        built = env!("BUILD_DATE"),
        data_dir = %args.data_dir.display(),
        hours = args.hours,
        "starting tycoon"
    );

    let mut config = load_config(&args.config)?;
    if args.seed.is_some() {
        config.rng_seed = args.seed;
    }
    let mut clock = ManualClock::new(SystemClock.now());
    let store = FileStore::new(&args.data_dir);
    let mut economy = Economy::open(store, config, clock.now())
        .with_context(|| format!("loading {}", args.data_dir.display()))?;

    if let Some(path) = &args.commands {
        for command in read_script(path)? {
            match economy.execute(command.clone(), clock.now()) {
                Ok(outcome) => info!(?command, ?outcome, "command applied"),
                Err(e) => warn!(?command, error = %e, "command rejected"),
            }
        }
    }

    let steps = i64::from(args.hours) * 3600 / args.step_secs;
    let (mut price_ticks, mut events, mut sales, mut idle) = (0u32, 0u32, 0usize, 0i64);
    for _ in 0..steps {
        let report = economy.tick(clock.advance_secs(args.step_secs));
        idle += i64::from(report.is_idle());
        price_ticks += u32::from(report.prices.is_some());
        events += u32::from(report.event.is_some());
        sales += report.sales.len();
        for note in economy.take_notifications() {
            println!("[{}] {}", clock.now().format("%H:%M:%S"), note);
        }
    }
    for note in economy.take_notifications() {
        println!("{note}");
    }

    let player = economy.player();
    let owned: Vec<&str> = economy
        .businesses()
        .iter()
        .filter(|b| b.purchased)
        .map(|b| b.name.as_str())
        .collect();
    let pending: rust_decimal::Decimal = economy.businesses().iter().map(|b| b.revenue).sum();
    println!(
        "Ledger | money: ${} | owned: {} ({}) | pending revenue: ${} | vehicles: {} | carried: {}/{}",
        format_money(player.money),
        owned.len(),
        owned.join(", "),
        format_money(pending),
        player.stored_vehicles.len(),
        player.inventory.weight(),
        player.inventory.capacity()
    );
    println!(
        "Market | steps: {} ({} idle) | price ticks: {} | events: {} | sales: {} | active tier: {}",
        steps,
        idle,
        price_ticks,
        events,
        sales,
        economy
            .active_tier()
            .map(|t| t.to_string())
            .unwrap_or_else(|| "-".to_string())
    );
    for item in economy.catalog().items() {
        println!("  {:<16} ${:>10}", item.name, format_money(item.price));
    }
    Ok(())
}
