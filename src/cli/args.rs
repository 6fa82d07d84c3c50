//! CLI argument types - shared between binary and tests

use crate::config::{HostConfig, LogFormat};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormatCli {
    /// Human-readable lines
    Pretty,
    /// One JSON object per line
    Json,
}

impl From<LogFormatCli> for LogFormat {
    fn from(val: LogFormatCli) -> Self {
        match val {
            LogFormatCli::Pretty => LogFormat::Pretty,
            LogFormatCli::Json => LogFormat::Json,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "nshost")]
#[command(about = "nshost - Host for an embedded native scripting runtime")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
    #[command(flatten)]
    pub global: GlobalArgs,
}

#[derive(clap::Args, Debug, Clone, Default, PartialEq)]
pub struct GlobalArgs {
    /// Configuration file path
    #[arg(short, long, global = true, env = "NSHOST_CONFIG")]
    pub config: Option<String>,
    /// Base directory handed to the runtime (default: executable directory)
    #[arg(short, long, global = true)]
    pub base_dir: Option<PathBuf>,
    /// Runtime library path
    #[arg(short = 'L', long, global = true)]
    pub library: Option<PathBuf>,
    /// Log level / filter directive
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,
    /// Log output format
    #[arg(long, value_enum, global = true)]
    pub log_format: Option<LogFormatCli>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Run the entry script (default)
    Run(RunArgs),
    /// Call the runtime's `hello` diagnostic probe
    Probe,
    /// Print the effective configuration
    Config,
}

#[derive(clap::Args, Debug, Clone, Default, PartialEq)]
pub struct RunArgs {
    /// Entry script, relative to the base directory
    #[arg(short, long)]
    pub entry: Option<PathBuf>,
    /// Number of full init/run/deinit cycles
    #[arg(short, long)]
    pub repeat: Option<u32>,
}

impl Cli {
    /// Subcommand to execute; bare `nshost` runs the entry script
    pub fn command(&self) -> Command {
        self.command
            .clone()
            .unwrap_or_else(|| Command::Run(RunArgs::default()))
    }

    /// Apply flag overrides on top of the loaded configuration
    pub fn apply_overrides(&self, config: &mut HostConfig) {
        let global = &self.global;
        if let Some(base_dir) = &global.base_dir {
            config.runtime.base_dir = Some(base_dir.clone());
        }
        if let Some(library) = &global.library {
            config.runtime.library = Some(library.clone());
        }
        if let Some(level) = &global.log_level {
            config.logging.level = level.clone();
        }
        if let Some(format) = global.log_format {
            config.logging.format = format.into();
        }
        if let Some(Command::Run(run)) = &self.command {
            if let Some(entry) = &run.entry {
                config.runtime.entry_script = entry.clone();
            }
            if let Some(repeat) = run.repeat {
                config.runtime.repeat = repeat;
            }
        }
    }
}
