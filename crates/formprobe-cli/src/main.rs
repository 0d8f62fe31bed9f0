//! formprobe CLI: cross-engine acceptance checks for a registration form
//!
//! ## Usage
//!
//! ```bash
//! formprobe test                          # All scenarios on all engines
//! formprobe test -p firefox -f password   # Password scenarios on Gecko
//! BASE_URL=https://staging.example.com formprobe test
//! formprobe list                          # Show the catalog
//! formprobe config                        # Effective configuration as JSON
//! ```

use clap::Parser;
use formprobe_cli::{
    handlers, logging, Cli, CliConfig, CliError, CliResult, ColorChoice, Commands, LogFormat,
    Verbosity,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::TestFailures { failed, total }) => {
            eprintln!("{failed} of {total} scenario(s) failed");
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();

    // Build configuration from CLI args
    let config = build_config(&cli);
    logging::init(&config)?;

    match cli.command {
        Commands::Test(args) => handlers::test::execute_test(&config, &args),
        Commands::List(args) => handlers::list::execute_list(&args),
        Commands::Config(args) => handlers::config::execute_config(&args),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let verbosity = Verbosity::from_flags(cli.quiet, cli.verbose);
    let color: ColorChoice = cli.color.clone().into();
    let log_format: LogFormat = cli.log_format.into();

    CliConfig::new()
        .with_verbosity(verbosity)
        .with_color(color)
        .with_log_format(log_format)
}
