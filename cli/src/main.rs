//! Cambio demo CLI
//!
//! Drives the conversion engine from a terminal the way the mobile shell
//! would: select currencies, type an amount, read the converted result.
//! Engine state that must survive a restart is persisted to a JSON file.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cambio_common::format::{format_amount, format_currency, format_rate, format_timestamp};
use cambio_engine::{
    ConverterEngine, EngineConfig, HttpClientConfig, HttpRatesClient, RatesClient, Snapshot,
};

mod fixture;

/// Cambio demo CLI
#[derive(Parser, Debug)]
#[command(name = "cambio")]
#[command(about = "Currency conversion engine demo")]
struct Args {
    /// Catalog endpoint URL
    #[arg(long)]
    catalog_url: Option<String>,

    /// Rate endpoint URL
    #[arg(long)]
    rates_url: Option<String>,

    /// Snapshot file for state that survives restarts
    #[arg(long, default_value = "cambio-state.json")]
    state_file: PathBuf,

    /// Use built-in fixture data instead of the network
    #[arg(long)]
    demo: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let client: Arc<dyn RatesClient> = if args.demo {
        Arc::new(fixture::FixtureRatesClient::new())
    } else {
        let mut config = HttpClientConfig::default();
        if let Some(url) = args.catalog_url {
            config.catalog_url = url;
        }
        if let Some(url) = args.rates_url {
            config.rates_url = url;
        }
        Arc::new(HttpRatesClient::new(config))
    };

    let snapshot = load_snapshot(&args.state_file);
    let engine = ConverterEngine::with_snapshot(client, EngineConfig::default(), snapshot);

    if let Err(err) = engine.load_pairs().await {
        eprintln!("warning: {err}");
    }
    if let Err(err) = engine.resolve_rate().await {
        eprintln!("warning: {err}");
    }
    print_status(&engine);
    println!("Type 'help' for commands.");

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        if !run_command(&engine, line.trim()).await {
            break;
        }
    }

    save_snapshot(&args.state_file, &engine.snapshot())?;
    info!(state_file = %args.state_file.display(), "State saved");
    Ok(())
}

fn load_snapshot(path: &Path) -> Option<Snapshot> {
    let raw = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str(&raw) {
        Ok(snapshot) => Some(snapshot),
        Err(err) => {
            debug!(error = %err, "Ignoring unreadable snapshot file");
            None
        }
    }
}

fn save_snapshot(path: &Path, snapshot: &Snapshot) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(snapshot)?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write snapshot to {}", path.display()))
}

/// Execute one command line. Returns false when the loop should exit.
async fn run_command(engine: &ConverterEngine, line: &str) -> bool {
    let mut parts = line.split_whitespace();
    let command = parts.next().unwrap_or("");
    let argument = parts.next();

    match (command, argument) {
        ("", _) => {}
        ("help", _) => print_help(),
        ("pairs", _) => {
            for pair in engine.catalog().pairs {
                println!("  {pair}");
            }
        }
        ("sources", _) => {
            for currency in engine.catalog().source_currencies {
                println!("  {}  {}", currency.code, currency.name);
            }
        }
        ("destinations", _) => {
            for currency in engine.catalog().destination_currencies {
                println!("  {}  {}", currency.code, currency.name);
            }
        }
        ("source", Some(code)) => {
            engine.select_source(&code.to_uppercase());
            refresh(engine).await;
        }
        ("dest", Some(code)) => {
            engine.select_destination(&code.to_uppercase());
            refresh(engine).await;
        }
        ("swap", _) => {
            engine.swap();
            refresh(engine).await;
        }
        ("amount", Some(raw)) => {
            engine.set_amount(raw);
            print_status(engine);
        }
        ("rate", _) => refresh(engine).await,
        ("record", _) => record(engine),
        ("history", _) => {
            for entry in engine.history() {
                println!(
                    "  {}  {} {} -> {} {}  @ {}",
                    format_timestamp(entry.timestamp),
                    format_amount(entry.amount),
                    entry.source_code,
                    format_amount(entry.result),
                    entry.destination_code,
                    format_rate(entry.rate),
                );
            }
        }
        ("clear-history", _) => engine.clear_history(),
        ("online", Some(flag)) => engine.set_online(flag == "on"),
        ("quit" | "exit", _) => return false,
        _ => println!("Unknown command; type 'help'."),
    }
    true
}

async fn refresh(engine: &ConverterEngine) {
    if let Err(err) = engine.resolve_rate().await {
        eprintln!("warning: {err}");
    }
    print_status(engine);
}

fn record(engine: &ConverterEngine) {
    let conversion = engine.conversion();
    let (Some(rate), Some(result)) = (conversion.exchange_rate, conversion.converted_amount)
    else {
        println!("Nothing to record: no completed conversion.");
        return;
    };
    let Ok(amount) = conversion.amount.trim().parse::<f64>() else {
        println!("Nothing to record: no completed conversion.");
        return;
    };
    if engine
        .record_conversion(&rate.source_code, &rate.destination_code, amount, result, rate.rate)
        .is_some()
    {
        println!("Recorded.");
    }
}

fn print_status(engine: &ConverterEngine) {
    let catalog = engine.catalog();
    let conversion = engine.conversion();

    let source = catalog
        .selected_source
        .map(|currency| currency.code)
        .unwrap_or_else(|| "?".to_string());
    let destination = catalog
        .selected_destination
        .map(|currency| currency.code)
        .unwrap_or_else(|| "?".to_string());

    if !engine.is_online() {
        println!("[offline]");
    }
    match (&conversion.exchange_rate, conversion.converted_amount) {
        (Some(rate), Some(result)) => println!(
            "{} {} = {}  (rate {})",
            conversion.amount,
            source,
            format_currency(result, &destination),
            format_rate(rate.rate),
        ),
        (Some(rate), None) => println!(
            "{} -> {}  (rate {}, enter a positive amount)",
            source,
            destination,
            format_rate(rate.rate),
        ),
        _ => println!("{source} -> {destination}  (no rate yet)"),
    }
    if let Some(error) = conversion.error.or(catalog.error) {
        println!("error: {error}");
    }
}

fn print_help() {
    println!(
        "\
  pairs            list supported conversion directions
  sources          list source currencies
  destinations     list destinations for the selected source
  source CODE      select the source currency
  dest CODE        select the destination currency
  swap             exchange source and destination
  amount N         set the amount to convert
  rate             refresh the exchange rate
  record           save the current conversion to history
  history          show recent conversions
  clear-history    forget all recorded conversions
  online on|off    simulate the connectivity signal
  quit             save state and exit"
    );
}
