//! isocheck CLI: runs the anomaly suite against the in-memory graph store.
//!
//! The report goes to stdout, logs to stderr. Exit status:
//! - **0**: every selected test passed
//! - **1**: at least one oracle failed
//! - **2**: bad configuration, store open failure, or fixture setup failure

mod commands;

use std::process;

use clap::ArgMatches;
use isocheck_core::OpenOptions;
use isocheck_engine::MemGraph;
use isocheck_harness::{run_suite, HarnessError, OutputMode};
use tracing::error;
use tracing_subscriber::EnvFilter;

use commands::{build_cli, suite_config, test_listing, validation_policy, write_config};

fn main() {
    let matches = build_cli().get_matches();
    init_logging(matches.get_count("verbose"));

    if matches.get_flag("list") {
        println!("{}", test_listing());
        return;
    }

    match write_config(&matches) {
        Ok(Some(path)) => {
            println!("Wrote {}", path.display());
            return;
        }
        Ok(None) => {}
        Err(e) => {
            error!(target: "isocheck::cli", error = %e, "Config write failed");
            eprintln!("(error) {}", e);
            process::exit(2);
        }
    }

    let output_mode = if matches.get_flag("json") {
        OutputMode::Json
    } else {
        OutputMode::Human
    };

    let exit_code = match run(&matches, output_mode) {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(e) => {
            error!(target: "isocheck::cli", error = %e, "Run aborted");
            eprintln!("(error) {}", e);
            2
        }
    };
    process::exit(exit_code);
}

/// Returns whether every test passed.
fn run(matches: &ArgMatches, output_mode: OutputMode) -> Result<bool, HarnessError> {
    let config = suite_config(matches)?;
    let graph = open_store(matches)?;
    let report = run_suite(&graph, &config)?;
    println!("{}", report.render(output_mode)?);
    Ok(report.all_passed())
}

fn open_store(matches: &ArgMatches) -> Result<MemGraph, HarnessError> {
    let path = matches
        .get_one::<String>("db")
        .map(|s| s.as_str())
        .unwrap_or("./testdb");
    let mut options = OpenOptions::new(path);
    if let Some(user) = matches.get_one::<String>("user") {
        options.user = user.clone();
    }
    if let Some(password) = matches.get_one::<String>("password") {
        options.password = password.clone();
    }

    Ok(MemGraph::builder()
        .options(&options)
        .validation(validation_policy(matches)?)
        .open()?)
}

fn init_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
