use anyhow::Context;
use clap::Parser;
use nshost::cli::{self, args::Cli, args::Command};
use nshost::utils::tracing::init_tracing;
use nshost::HostError;
use std::process::ExitCode;
use tracing::{error, info};

fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = cli::load_config(cli)?;
    init_tracing(&config.logging);

    match cli.command() {
        Command::Run(_) => {
            let reports = cli::run::execute(&config).context("script run aborted")?;
            info!("Completed {} cycle(s)", reports.len());
        }
        Command::Probe => cli::probe::execute(&config).context("runtime probe failed")?,
        Command::Config => cli::show_config(&config)?,
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => match e.downcast_ref::<HostError>() {
            Some(host_error) => {
                error!(stage = %host_error.stage(), code = host_error.error_code(), "{:#}", e);
                eprintln!("{}", host_error.diagnostic());
                ExitCode::from(host_error.exit_code() as u8)
            }
            None => {
                eprintln!("error: {:#}", e);
                ExitCode::FAILURE
            }
        },
    }
}
