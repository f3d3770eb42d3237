//! Rollcall - Discord roll calls mirrored into a Google Sheet

mod bot;
mod events;
mod logging;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use rollcall_core::{Config, default_config_path};
use rollcall_engine::engine::parse_range;

#[derive(Debug, Parser)]
#[command(name = "rollcall", version)]
#[command(about = "Discord roll call bot that colours reacting members' names in a Google Sheet.")]
struct Cli {
    /// Config file (default: ./config.toml if present, else the per-user config directory).
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `rollcall_core=trace`. Overrides RUST_LOG.
    #[arg(long, global = true, value_name = "LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the bot until the event stream ends or Ctrl-C.
    Run {
        /// Read chat events (JSON lines) from this file instead of stdin.
        #[arg(long, value_name = "PATH")]
        events: Option<PathBuf>,
    },
    /// Parse an A1 range and print it as JSON.
    ParseRange { range: String },
    /// Write a config template.
    InitConfig {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
    /// Print the config path in use.
    ConfigPath,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli.config.unwrap_or_else(resolve_config_path);

    match cli.command {
        Command::Run { events } => {
            logging::init(cli.log_level.as_deref())?;
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("failed to start async runtime")?;
            runtime.block_on(bot::run(&config_path, events.as_deref()))
        }
        Command::ParseRange { range } => {
            let parsed = parse_range(&range)?;
            println!("{}", serde_json::to_string(&parsed)?);
            Ok(())
        }
        Command::InitConfig { force } => init_config(&config_path, force),
        Command::ConfigPath => {
            println!("{}", config_path.display());
            Ok(())
        }
    }
}

/// `./config.toml` when present, else the per-user config directory.
fn resolve_config_path() -> PathBuf {
    let local = PathBuf::from("config.toml");
    if local.exists() {
        return local;
    }
    default_config_path().unwrap_or(local)
}

fn init_config(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }
    Config::default()
        .save(path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!("Wrote config template to {}", path.display());
    Ok(())
}
