//! Clap command definition.

use std::path::PathBuf;

use clap::{Arg, ArgAction, Command};

/// Build the `kvbench` command.
pub fn build_cli() -> Command {
    Command::new("kvbench")
        .about("Correctness-checked key-value storage micro-benchmark")
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .value_name("PATH")
                .value_parser(clap::value_parser!(PathBuf))
                .help("Config file (default: ./kvbench.toml if present, else built-in defaults)"),
        )
        .arg(
            Arg::new("init-config")
                .long("init-config")
                .help("Write a commented default config file and exit")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Log debug events")
                .action(ArgAction::SetTrue)
                .conflicts_with("quiet"),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .short('q')
                .help("Log warnings and errors only")
                .action(ArgAction::SetTrue),
        )
}
