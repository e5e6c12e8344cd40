//! drip: replay reward ledger scenarios and inspect configuration.

mod scenario;

use anyhow::Context;
use clap::Parser;
use drip_accrual::LedgerConfig;
use drip_utils::{format_duration, LogFormat};
use std::path::PathBuf;

use scenario::Scenario;

#[derive(Parser)]
#[command(name = "drip", about = "Time-based reward accrual ledger")]
struct Cli {
    /// Path to a TOML ledger configuration. File settings are the base;
    /// flags and env vars override them.
    #[arg(long, env = "DRIP_CONFIG")]
    config: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "DRIP_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "DRIP_LOG_FORMAT")]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Replay a scenario script and print a JSON report.
    Simulate {
        /// TOML file of `[[step]]` tables.
        #[arg(long)]
        script: PathBuf,

        /// Pretty-print the report.
        #[arg(long)]
        pretty: bool,
    },
    /// Print the effective configuration as TOML.
    DefaultConfig,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match cli.config {
        Some(ref path) => LedgerConfig::from_toml_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => LedgerConfig::default(),
    };
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    let format: LogFormat = config.log_format.parse()?;
    drip_utils::init_logging(format, &config.log_level);

    match cli.command {
        Command::Simulate { script, pretty } => {
            let contents = std::fs::read_to_string(&script)
                .with_context(|| format!("reading {}", script.display()))?;
            let scenario = Scenario::from_toml_str(&contents)?;
            let span = match (scenario.steps.first(), scenario.steps.last()) {
                (Some(first), Some(last)) => last.at.saturating_sub(first.at),
                _ => 0,
            };
            tracing::info!(
                script = %script.display(),
                steps = scenario.steps.len(),
                "replaying scenario"
            );

            let report = scenario::run(config, &scenario)?;
            let rejected = report.steps.iter().filter(|s| !s.ok).count();
            tracing::info!(
                span = %format_duration(span),
                rejected,
                paid = %report.total_paid,
                "scenario finished"
            );

            let json = if pretty {
                serde_json::to_string_pretty(&report)?
            } else {
                serde_json::to_string(&report)?
            };
            println!("{json}");
        }
        Command::DefaultConfig => {
            print!("{}", config.to_toml_string()?);
        }
    }

    Ok(())
}
