//! Clap command definition and flag handling.
//!
//! Flags override values read from the config file.

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use isocheck_core::ConcurrencyMode;
use isocheck_engine::ValidationPolicy;
use isocheck_harness::{HarnessError, HarnessResult, SuiteConfig, TestName, CONFIG_FILE_NAME};
use std::path::{Path, PathBuf};

/// Build the CLI command.
pub fn build_cli() -> Command {
    Command::new("isocheck")
        .about("Transactional isolation anomaly checker for graph stores")
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("Suite config file (TOML)"),
        )
        .arg(
            Arg::new("mode")
                .long("mode")
                .help("Concurrency mode of write transactions: strict or optimistic"),
        )
        .arg(
            Arg::new("delay-ms")
                .long("delay-ms")
                .help("Race window in milliseconds (default: 250)")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("parallelism")
                .long("parallelism")
                .short('j')
                .help("Worker threads per population (default: available cores)")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .help("Base seed of the per-task random sources")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("only")
                .long("only")
                .help("Run only this test (repeatable)")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("validation")
                .long("validation")
                .help("Commit validation of the in-memory store: serializable or snapshot")
                .default_value("serializable"),
        )
        .arg(
            Arg::new("db")
                .long("db")
                .help("Store path (default: ./testdb)"),
        )
        .arg(
            Arg::new("user")
                .long("user")
                .help("Store user (default: admin)"),
        )
        .arg(
            Arg::new("password")
                .long("password")
                .help("Store password"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("JSON output mode")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("list")
                .long("list")
                .help("List the available tests and exit")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("init")
                .long("init")
                .help("Write a default config file (at --config or ./isocheck.toml) unless one exists, then exit")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("write-config")
                .long("write-config")
                .value_name("PATH")
                .help("Write the effective config (file plus flags) to PATH, then exit"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Increase log verbosity (-v debug, -vv trace)")
                .action(ArgAction::Count),
        )
}

/// Load the config file named by `--config` (if any) and apply flag overrides.
pub fn suite_config(matches: &ArgMatches) -> HarnessResult<SuiteConfig> {
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => SuiteConfig::from_file(Path::new(path))?,
        None => SuiteConfig::default(),
    };

    if let Some(mode) = matches.get_one::<String>("mode") {
        config.mode = mode
            .parse::<ConcurrencyMode>()
            .map_err(HarnessError::config)?;
    }
    if let Some(delay) = matches.get_one::<u64>("delay-ms") {
        config.delay_ms = *delay;
    }
    if let Some(parallelism) = matches.get_one::<usize>("parallelism") {
        config.parallelism = *parallelism;
    }
    if let Some(seed) = matches.get_one::<u64>("seed") {
        config.seed = *seed;
    }
    if let Some(only) = matches.get_many::<String>("only") {
        config.only = only.cloned().collect();
    }
    config.validate()?;
    Ok(config)
}

/// Handle `--init` and `--write-config`.
///
/// Returns the path written, or `None` when neither flag was given.
pub fn write_config(matches: &ArgMatches) -> HarnessResult<Option<PathBuf>> {
    if let Some(path) = matches.get_one::<String>("write-config") {
        let path = PathBuf::from(path);
        suite_config(matches)?.write_to_file(&path)?;
        return Ok(Some(path));
    }
    if matches.get_flag("init") {
        let path = matches
            .get_one::<String>("config")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
        SuiteConfig::write_default_if_missing(&path)?;
        return Ok(Some(path));
    }
    Ok(None)
}

/// Parse `--validation`.
pub fn validation_policy(matches: &ArgMatches) -> HarnessResult<ValidationPolicy> {
    match matches.get_one::<String>("validation").map(String::as_str) {
        None | Some("serializable") => Ok(ValidationPolicy::Serializable),
        Some("snapshot") => Ok(ValidationPolicy::SnapshotOnly),
        Some(other) => Err(HarnessError::config(format!(
            "unknown validation policy '{}', expected \"serializable\" or \"snapshot\"",
            other
        ))),
    }
}

/// One line per test for `--list`.
pub fn test_listing() -> String {
    TestName::ALL
        .iter()
        .map(|t| format!("{:<14} {}", t.as_str(), t.description()))
        .collect::<Vec<_>>()
        .join("\n")
}
