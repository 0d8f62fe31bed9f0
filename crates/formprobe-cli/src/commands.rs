//! CLI command definitions using clap

use clap::{Args, Parser, Subcommand, ValueEnum};
use formprobe::config::{
    DEFAULT_ACTION_TIMEOUT_MS, DEFAULT_BASE_URL, DEFAULT_GECKO_WEBDRIVER,
    DEFAULT_NAVIGATION_TIMEOUT_MS, DEFAULT_POLL_INTERVAL_MS, DEFAULT_SCENARIO_TIMEOUT_MS,
    DEFAULT_WEBKIT_WEBDRIVER,
};
use formprobe::{Engine, SuiteConfig, Timeouts};
use std::path::PathBuf;

/// formprobe: cross-engine acceptance checks for a web registration form
#[derive(Parser, Debug)]
#[command(name = "formprobe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (only failures and errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Log line format on stderr
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormatArg,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the scenario catalog against the registration form
    Test(TestArgs),

    /// List the scenario catalog
    List(ListArgs),

    /// Show the effective suite configuration as JSON
    Config(ConfigArgs),
}

/// Arguments for the test command
#[derive(Args, Debug)]
pub struct TestArgs {
    /// Engine profile to run (repeatable; default: all)
    #[arg(short, long = "project", value_name = "ENGINE")]
    pub projects: Vec<EngineArg>,

    /// Only run scenarios whose name contains this text
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Suite settings
    #[command(flatten)]
    pub suite: SuiteArgs,
}

impl TestArgs {
    /// Selected engine profiles, in run order
    #[must_use]
    pub fn engines(&self) -> Vec<Engine> {
        if self.projects.is_empty() {
            return Engine::ALL.to_vec();
        }
        let mut engines: Vec<Engine> = self.projects.iter().map(|p| Engine::from(*p)).collect();
        engines.sort();
        engines.dedup();
        engines
    }
}

/// Arguments for the list command
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only list scenarios whose name contains this text
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Print the catalog as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the config command
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Suite settings
    #[command(flatten)]
    pub suite: SuiteArgs,
}

/// Suite settings shared by `test` and `config`. Each falls back to an
/// environment variable.
#[derive(Args, Debug, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct SuiteArgs {
    /// Base URL of the registration page
    #[arg(long, env = "BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Element readiness and assertion timeout (ms)
    #[arg(
        long,
        env = "FORMPROBE_ACTION_TIMEOUT_MS",
        default_value_t = DEFAULT_ACTION_TIMEOUT_MS
    )]
    pub action_timeout: u64,

    /// Page load timeout (ms)
    #[arg(
        long,
        env = "FORMPROBE_NAVIGATION_TIMEOUT_MS",
        default_value_t = DEFAULT_NAVIGATION_TIMEOUT_MS
    )]
    pub navigation_timeout: u64,

    /// Whole-scenario timeout (ms)
    #[arg(
        long,
        env = "FORMPROBE_SCENARIO_TIMEOUT_MS",
        default_value_t = DEFAULT_SCENARIO_TIMEOUT_MS
    )]
    pub scenario_timeout: u64,

    /// Retries after a failed attempt
    #[arg(long, env = "FORMPROBE_RETRIES", default_value_t = 1)]
    pub retries: u32,

    /// Parallel workers per engine (0 = min(4, CPUs))
    #[arg(short = 'j', long, env = "FORMPROBE_WORKERS", default_value_t = 0)]
    pub workers: usize,

    /// Output directory for reports and failure artifacts
    #[arg(short, long, env = "FORMPROBE_OUTPUT", default_value = "target/formprobe")]
    pub output: PathBuf,

    /// Show browser windows
    #[arg(long, env = "FORMPROBE_HEADED")]
    pub headed: bool,

    /// Record a GIF of each failing attempt
    #[arg(long, env = "FORMPROBE_VIDEO", default_value_t = true, action = clap::ArgAction::Set)]
    pub video: bool,

    /// Chromium executable (auto-detected when unset)
    #[arg(long, env = "CHROME")]
    pub chrome: Option<PathBuf>,

    /// Launch Chromium without its sandbox (containers)
    #[arg(long, env = "FORMPROBE_NO_SANDBOX")]
    pub no_sandbox: bool,

    /// Gecko WebDriver server URL
    #[arg(long, env = "FORMPROBE_GECKO_WEBDRIVER", default_value = DEFAULT_GECKO_WEBDRIVER)]
    pub gecko_webdriver: String,

    /// WebKit WebDriver server URL
    #[arg(long, env = "FORMPROBE_WEBKIT_WEBDRIVER", default_value = DEFAULT_WEBKIT_WEBDRIVER)]
    pub webkit_webdriver: String,

    /// WebKit browser binary passed to WebKitWebDriver
    #[arg(long, env = "FORMPROBE_WEBKIT_BINARY")]
    pub webkit_binary: Option<PathBuf>,
}

impl SuiteArgs {
    /// Build the suite configuration these arguments describe
    #[must_use]
    pub fn to_config(&self) -> SuiteConfig {
        let mut config = SuiteConfig::new()
            .with_base_url(self.base_url.clone())
            .with_timeouts(Timeouts {
                action_ms: self.action_timeout,
                navigation_ms: self.navigation_timeout,
                scenario_ms: self.scenario_timeout,
                poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            })
            .with_retries(self.retries)
            .with_workers(self.workers)
            .with_output_dir(self.output.clone())
            .with_headless(!self.headed)
            .with_video(self.video)
            .with_no_sandbox(self.no_sandbox)
            .with_gecko_webdriver(self.gecko_webdriver.clone())
            .with_webkit_webdriver(self.webkit_webdriver.clone());

        if let Some(ref path) = self.chrome {
            config = config.with_chrome_executable(path.clone());
        }
        if let Some(ref path) = self.webkit_binary {
            config = config.with_webkit_binary(path.clone());
        }
        config
    }
}

/// Engine profile argument
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineArg {
    /// Chromium over CDP
    Chromium,
    /// Gecko over WebDriver
    Firefox,
    /// WebKit over WebDriver
    Webkit,
}

impl From<EngineArg> for Engine {
    fn from(arg: EngineArg) -> Self {
        match arg {
            EngineArg::Chromium => Self::Chromium,
            EngineArg::Firefox => Self::Gecko,
            EngineArg::Webkit => Self::Webkit,
        }
    }
}

/// Color argument
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

/// Log format argument
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormatArg {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

impl From<LogFormatArg> for crate::config::LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Text => Self::Text,
            LogFormatArg::Json => Self::Json,
        }
    }
}
