//! kvbench: run the benchmark described by a config file.
//!
//! - `kvbench` loads `./kvbench.toml` if it exists, otherwise uses defaults
//! - `kvbench --config <path>` loads the given file
//! - `kvbench --init-config` writes a commented default file and exits
//!
//! Exit status is 0 when every stage passes and 1 on any error.

mod commands;

use std::path::{Path, PathBuf};
use std::process;

use kvbench_harness::{
    format_statistics, stage_heading, BackendKind, BenchConfig, BenchError, Harness, RunReport,
    StageReport, CONFIG_FILE_NAME,
};
use kvbench_storage::{MemoryStore, RedbStore};
use tracing::Level;

use commands::build_cli;

fn main() {
    let matches = build_cli().get_matches();

    let level = if matches.get_flag("verbose") {
        Level::DEBUG
    } else if matches.get_flag("quiet") {
        Level::WARN
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let explicit = matches.get_one::<PathBuf>("config").cloned();
    let config_path = explicit
        .clone()
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));

    if matches.get_flag("init-config") {
        match BenchConfig::write_default_if_missing(&config_path) {
            Ok(true) => println!("Wrote default config to {}", config_path.display()),
            Ok(false) => println!("{} already exists; left unchanged", config_path.display()),
            Err(e) => {
                eprintln!("{}", e);
                process::exit(1);
            }
        }
        return;
    }

    let config = match load_config(&config_path, explicit.is_some()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };

    match run(config) {
        Ok(report) => print_report(&report),
        Err(e) => {
            eprintln!("Benchmark aborted: {}", e);
            process::exit(1);
        }
    }
}

/// An explicit path must exist; the default path is optional
fn load_config(path: &Path, explicit: bool) -> Result<BenchConfig, BenchError> {
    if explicit || path.exists() {
        BenchConfig::from_file(path)
    } else {
        Ok(BenchConfig::default())
    }
}

fn run(config: BenchConfig) -> Result<RunReport, BenchError> {
    let backend = config.backend;
    let mut harness = Harness::new(config)?.with_stage_observer(print_stage);
    match backend {
        BackendKind::Memory => harness.run::<MemoryStore>(),
        BackendKind::Redb => harness.run::<RedbStore>(),
    }
}

/// Print a stage's block as soon as the stage completes
fn print_stage(report: &StageReport) {
    println!("{}", stage_heading(report.stage, report.count));
    println!("{}", format_statistics(&report.recorder));
}

fn print_report(report: &RunReport) {
    println!("seed: {}", report.seed);
    println!("summary: {}", report.json_summary.display());
}
