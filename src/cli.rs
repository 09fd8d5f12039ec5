//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_intent_writer::CsvIntentWriter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config::TurtleConfig;
use crate::domain::config_validation::{build_turtle_config, build_universe};
use crate::domain::engine::Engine;
use crate::domain::error::TurtleError;
use crate::domain::market_data::{build_unified_timeline, load_market_data};
use crate::domain::replay::{run_replay, ReplaySummary};
use crate::domain::universe::{catalogue, Universe};
use crate::ports::data_port::DataPort;

#[derive(Parser, Debug)]
#[command(name = "turtlecore", about = "Multi-market turtle trend-following decision engine")]
pub struct Cli {
    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay a directory of per-market CSV files through the engine
    Run {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        data: PathBuf,
        /// Intent journal (CSV)
        #[arg(short, long, default_value = "intents.csv")]
        output: PathBuf,
        /// Write the final engine state as JSON
        #[arg(long)]
        state: Option<PathBuf>,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
    },
    /// Validate a configuration file and its universe
    Validate {
        #[arg(short, long)]
        config: PathBuf,
        /// Also check that every market has a data file here
        #[arg(short, long)]
        data: Option<PathBuf>,
    },
    /// Print the built-in market catalogue
    Markets,
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Run {
            config,
            data,
            output,
            state,
            start,
            end,
        } => run_engine(&config, &data, &output, state.as_deref(), start, end),
        Command::Validate { config, data } => run_validate(&config, data.as_deref()),
        Command::Markets => {
            run_markets();
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<(TurtleConfig, Universe), TurtleError> {
    info!(path = %path.display(), "loading config");
    let adapter = FileConfigAdapter::from_file(path)?;
    let config = build_turtle_config(&adapter)?;
    let universe = build_universe(&adapter)?;
    Ok((config, universe))
}

fn run_engine(
    config_path: &Path,
    data_dir: &Path,
    output: &Path,
    state_path: Option<&Path>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<(), TurtleError> {
    let (config, universe) = load_config(config_path)?;
    let engine = Engine::new(config, universe)?;

    let data_port = CsvAdapter::new(data_dir.to_path_buf());
    let markets = load_market_data(
        &data_port,
        engine.universe(),
        start.unwrap_or(NaiveDate::MIN),
        end.unwrap_or(NaiveDate::MAX),
    )?;
    let timeline = build_unified_timeline(&markets);
    info!(
        markets = markets.len(),
        sessions = timeline.len(),
        "starting replay"
    );

    let mut sink = CsvIntentWriter::create(output)?;
    let summary = run_replay(&engine, engine.initial_state(), &markets, &timeline, &mut sink)?;

    print_summary(&engine, &summary);
    println!("\nIntents written to: {}", output.display());

    if let Some(path) = state_path {
        let json = serde_json::to_string_pretty(&summary.final_state)?;
        fs::write(path, json)?;
        println!("State written to:   {}", path.display());
    }
    Ok(())
}

fn print_summary(engine: &Engine, summary: &ReplaySummary) {
    let trades = summary.closed_trades.len();
    let win_rate = if trades == 0 {
        0.0
    } else {
        summary.win_count() as f64 / trades as f64
    };

    println!("=== Replay Summary ===");
    println!("Sessions:         {}", summary.sessions);
    println!("Intents:          {}", summary.intents);
    println!("Closed trades:    {}", trades);
    println!("Win rate:         {:.1}%", win_rate * 100.0);
    println!("Realized profit:  {:.2}", summary.realized_profit());

    let budget = summary.final_state.budget(engine.config());
    println!(
        "Units in use:     long {}/{}, short {}/{}",
        budget.long_units_used,
        engine.config().direction_risk_limit,
        budget.short_units_used,
        engine.config().direction_risk_limit,
    );

    let stops = summary.final_state.desired_stops();
    if !stops.is_empty() {
        println!("\n=== Open Positions ===");
        for stop in &stops {
            println!(
                "  {:<3} {:?} x{} stop @{:.4}",
                stop.symbol, stop.position_direction, stop.quantity, stop.stop_price
            );
        }
    }
}

fn run_validate(config_path: &Path, data_dir: Option<&Path>) -> Result<(), TurtleError> {
    let (config, universe) = load_config(config_path)?;
    Engine::new(config.clone(), universe.clone())?;

    println!("Configuration is valid.");
    println!(
        "  breakouts: {}/{} bars, exits: {}/{} bars, ATR {} bars",
        config.strat1_breakout,
        config.strat2_breakout,
        config.strat1_exit,
        config.strat2_exit,
        config.atr_period
    );
    println!(
        "  limits: {} units per market, {} per direction",
        config.market_risk_limit, config.direction_risk_limit
    );
    println!("  window: {} bars", config.min_window_len());
    println!(
        "  universe: {}",
        universe.symbols().collect::<Vec<_>>().join(", ")
    );

    if let Some(dir) = data_dir {
        let available = CsvAdapter::new(dir.to_path_buf()).list_symbols()?;
        let missing: Vec<&str> = universe
            .symbols()
            .filter(|s| !available.iter().any(|a| a.as_str() == *s))
            .collect();
        if missing.is_empty() {
            println!("  data: all {} markets present", universe.count());
        } else {
            warn!(?missing, "markets without data files");
            println!("  data: missing {}", missing.join(", "));
        }
    }
    Ok(())
}

fn run_markets() {
    println!("{:<6} {:<28} {:>14}", "symbol", "feed", "multiplier");
    for market in catalogue() {
        println!(
            "{:<6} {:<28} {:>14}",
            market.symbol, market.feed, market.contract_multiplier
        );
    }
}
