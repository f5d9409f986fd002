// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

//! `tasktonic` — bootstraps a [`Runtime`] and runs one of the bundled demo
//! tonics to completion (spec.md §8 scenarios 1 and 2).

mod exit_error;

use anyhow::Result;
use clap::{Parser, Subcommand};
use exit_error::ExitError;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tasktonic_demos::{hello_chain, traffic_light};
use tasktonic_ledger::Ledger;
use tasktonic_runtime::{init_stderr_logging, Runtime, RuntimeConfig};

#[derive(Parser)]
#[command(name = "tasktonic", version, about = "Runs a TaskTonic demo tonic to completion.")]
struct Cli {
    /// TOML file of RuntimeConfig overrides (project_name, log_to, log_default).
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Number of non-main catalyst worker threads to start.
    #[arg(long, default_value_t = 1)]
    workers: usize,

    #[command(subcommand)]
    demo: Demo,
}

#[derive(Subcommand)]
enum Demo {
    /// spec.md §8 scenario 1: tts__a/b/c tick chain that finishes itself.
    HelloChain,
    /// spec.md §8 scenario 2: red/green/yellow state machine.
    TrafficLight,
}

fn main() -> ExitCode {
    init_stderr_logging();
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            match err.downcast_ref::<ExitError>() {
                Some(exit) => ExitCode::from(exit.code),
                None => ExitCode::FAILURE,
            }
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<RuntimeConfig> {
    let Some(path) = path else {
        return Ok(RuntimeConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .map_err(|err| ExitError::new(2, format!("reading {}: {err}", path.display())))?;
    Ok(RuntimeConfig::from_toml_str(&text)?)
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_ref())?;
    let ledger: &'static Ledger = Box::leak(Box::new(Ledger::new()));

    let runtime = match cli.demo {
        Demo::HelloChain => Runtime::bootstrap(ledger, &config, cli.workers, |ledger, catalyst, _logger| {
            hello_chain::spawn(ledger, Arc::clone(catalyst))?;
            Ok(())
        })?,
        Demo::TrafficLight => Runtime::bootstrap(ledger, &config, cli.workers, |ledger, catalyst, _logger| {
            traffic_light::spawn(ledger, Arc::clone(catalyst))?;
            Ok(())
        })?,
    };

    runtime.run();
    Ok(())
}
