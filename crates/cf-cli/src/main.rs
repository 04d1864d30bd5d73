//! cf3 - command line driver for the component runtime
//!
//! Starts a [`Core`], runs one command against its tree, and terminates.
//!
//! # Configuration
//!
//! Configuration is loaded from multiple sources with priority:
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`CF_*`)
//! 3. Project config (`.cf3/config.toml` in the project root)
//! 4. Global config (`~/.cf3/config.toml`)
//! 5. Default values (lowest priority)
//!
//! # Environment Variables
//!
//! - `CF_PLUGINS`: `:`-separated libraries to load
//! - `CF_LOG_LEVEL`: default log level
//! - `CF_REGIST_SIGNAL_HANDLERS`: log panics through the logger
//! - `CF_LOG`: full `tracing` filter directive, overrides the level
//!
//! # Examples
//!
//! ```text
//! cf3 --plugins cf3.world tree /World
//! cf3 --plugins cf3.world call /World create_component name=Asia atype=cf3.common.Group
//! cf3 options /Environment
//! ```

mod commands;
mod world;

use anyhow::{Context as _, Result};
use cf_runtime::config::{ConfigLoader, CoreConfig};
use cf_runtime::{logging, Core, PluginCatalog};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use world::WorldLibrary;

/// cf3 - inspect and drive a component tree
#[derive(Parser, Debug)]
#[command(name = "cf3")]
#[command(version, about, long_about = None)]
struct Args {
    /// Libraries to load, `:`-separated (also: CF_PLUGINS)
    #[arg(long, global = true, value_name = "LIBS")]
    plugins: Option<String>,

    /// Log level: error, warn, info, debug or trace (also: CF_LOG_LEVEL)
    #[arg(long, global = true, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Project root directory (defaults to current directory)
    #[arg(short = 'C', long, global = true)]
    project: Option<PathBuf>,

    /// Environment settings, `name:type=value`
    #[arg(short = 'E', long = "env", global = true, value_name = "ASSIGN")]
    environment: Vec<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the component tree
    Tree {
        /// Start of the listing
        #[arg(default_value = "/")]
        path: String,
    },
    /// List factories, builders and known types
    Types,
    /// Print the options of a component
    Options {
        /// Component path
        path: String,
    },
    /// List the signals a component answers
    Signals {
        /// Component path
        path: String,
    },
    /// Call a signal and print its reply as JSON
    Call {
        /// Component path
        path: String,
        /// Signal name
        signal: String,
        /// Arguments, `name[:type]=value`
        args: Vec<String>,
    },
    /// Print the effective configuration as TOML
    Config,
}

/// Merges file/env config via [`ConfigLoader`] and applies CLI argument
/// overrides as the highest-priority layer.
fn resolve_config(args: &Args) -> Result<CoreConfig> {
    let project_root = args.project.clone().unwrap_or_else(|| {
        std::env::current_dir().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to get current directory, using '.'");
            PathBuf::from(".")
        })
    });

    let mut config = ConfigLoader::new()
        .with_project_root(&project_root)
        .load()
        .context("Config error")?;

    if let Some(ref plugins) = args.plugins {
        for plugin in plugins.split(':').map(str::trim).filter(|p| !p.is_empty()) {
            if !config.plugins.iter().any(|p| p == plugin) {
                config.plugins.push(plugin.to_string());
            }
        }
    }
    if let Some(ref level) = args.log_level {
        config.log_level.clone_from(level);
    }
    Ok(config)
}

/// Libraries this binary can load by name.
fn catalog() -> Result<PluginCatalog> {
    Ok(PluginCatalog::new().with(WorldLibrary::NAME, || Box::new(WorldLibrary))?)
}

fn run(args: Args) -> Result<()> {
    let config = resolve_config(&args)?;

    if matches!(args.command, Command::Config) {
        print!("{}", config.to_toml().context("Config error")?);
        return Ok(());
    }

    let mut core = Core::with_catalog(config, catalog()?)?;
    core.initiate(args.environment.as_slice())?;
    info!(command = ?args.command, "running command");

    let result = execute(&mut core, &args.command);
    let terminated = core.terminate();
    let output = result?;
    terminated?;

    if let Some(text) = output {
        print!("{text}");
        if !text.ends_with('\n') {
            println!();
        }
    }
    Ok(())
}

fn execute(core: &mut Core, command: &Command) -> Result<Option<String>> {
    let ctx = core.context_mut();
    let output = match command {
        Command::Tree { path } => Some(commands::tree(ctx, path)?),
        Command::Types => Some(commands::types(ctx)),
        Command::Options { path } => Some(commands::options(ctx, path)?),
        Command::Signals { path } => Some(commands::signals(ctx, path)?),
        Command::Call { path, signal, args } => {
            commands::call(ctx, path, signal, args.as_slice())
                .with_context(|| format!("signal '{signal}' on '{path}' failed"))?
        }
        Command::Config => None,
    };
    Ok(output)
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // No-op when the core already brought logging up.
            logging::init("error");
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
