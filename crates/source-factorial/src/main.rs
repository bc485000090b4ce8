//! source-factorial - command-line entrypoint
//!
//! Protocol messages go to stdout, one JSON document per line. Logs go to
//! stderr.
//!
//! ```bash
//! export FACTORIAL_API_KEY=...
//! source-factorial check --config config.yaml
//! source-factorial read --config config.yaml --state state.json > out.jsonl
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use futures::StreamExt;
use serde_json::Value;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use source_factorial::{
    ConfiguredCatalog, FactorialConfig, FactorialSource, LogLevel, Message, Source, State,
};

#[derive(Parser)]
#[command(name = "source-factorial")]
#[command(version, about = "Factorial HR API source connector")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the connector specification
    Spec,
    /// Validate the config and, if configured, fetch the check stream
    Check {
        /// Path to the config file (JSON or YAML)
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Print the catalog of available streams
    Discover {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Read records and state
    Read {
        #[arg(short, long)]
        config: PathBuf,
        /// Configured catalog; every stream is read when omitted
        #[arg(long)]
        catalog: Option<PathBuf>,
        /// State persisted from a previous read
        #[arg(long)]
        state: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Spec => emit(&Message::spec(FactorialSource::spec())),
        Commands::Check { config } => check(&config).await,
        Commands::Discover { config } => discover(&config).await,
        Commands::Read {
            config,
            catalog,
            state,
        } => read(&config, catalog.as_deref(), state.as_deref()).await,
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn emit(message: &Message) -> Result<()> {
    let line = message.to_json_line()?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{line}").context("Failed to write to stdout")?;
    Ok(())
}

fn load_config(path: &Path) -> Result<FactorialConfig> {
    FactorialConfig::from_file(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))
}

async fn check(path: &Path) -> Result<()> {
    let source = FactorialSource::new();
    let result = match FactorialConfig::from_file(path) {
        Ok(config) => source.check(&config).await?,
        Err(e) => source_factorial::CheckResult::failure(e.to_string()),
    };
    info!("{}", result);
    emit(&Message::from(&result))
}

async fn discover(path: &Path) -> Result<()> {
    let config = load_config(path)?;
    let catalog = FactorialSource::new().discover(&config).await?;
    emit(&Message::catalog(catalog))
}

async fn read(path: &Path, catalog: Option<&Path>, state: Option<&Path>) -> Result<()> {
    let config = load_config(path)?;
    let source = FactorialSource::new();

    let catalog = match catalog {
        Some(path) => read_document::<ConfiguredCatalog>(path)
            .with_context(|| format!("Failed to load catalog from {}", path.display()))?,
        None => ConfiguredCatalog::from_catalog(&source.discover(&config).await?),
    };
    let state = state
        .map(|path| {
            load_state(path)
                .with_context(|| format!("Failed to load state from {}", path.display()))
        })
        .transpose()?;

    let mut events = source.read(&config, &catalog, state).await?;
    let mut records = 0u64;
    while let Some(event) = events.next().await {
        match event {
            Ok(event) => {
                if event.is_record() {
                    records += 1;
                }
                emit(&Message::from(event))?;
            }
            Err(e) => {
                error!("Read failed after {} records: {}", records, e);
                emit(&Message::log(LogLevel::Error, e.to_string()))?;
                return Err(e).context("Read failed");
            }
        }
    }
    info!("Read complete: {} records", records);
    Ok(())
}

/// JSON or YAML document
fn read_document<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&content)?)
}

/// Accepts a bare state document, `{"data": <state>}`, or a whole STATE message
fn load_state(path: &Path) -> Result<State> {
    let mut value: Value = read_document(path)?;
    if value.get("type").and_then(Value::as_str) == Some("STATE") {
        value = value["state"].take();
    }
    if let Some(data) = value.get_mut("data") {
        value = data.take();
    }
    Ok(serde_json::from_value(value)?)
}
