//! formprobe CLI Library
//!
//! Command-line interface for the formprobe acceptance suite.

#![warn(missing_docs)]

mod commands;
mod config;
mod error;
pub mod handlers;
pub mod logging;
mod output;
mod runner;

pub use commands::{
    Cli, ColorArg, Commands, ConfigArgs, EngineArg, ListArgs, LogFormatArg, SuiteArgs, TestArgs,
};
pub use config::{CliConfig, ColorChoice, LogFormat, Verbosity};
pub use error::{CliError, CliResult};
pub use output::ProgressReporter;
pub use runner::TestRunner;
