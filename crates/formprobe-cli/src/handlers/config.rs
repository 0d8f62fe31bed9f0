//! Config command handler

use crate::commands::ConfigArgs;
use crate::error::CliResult;

/// Render the effective suite configuration as pretty JSON
pub fn render_config(args: &ConfigArgs) -> CliResult<String> {
    let config = args.suite.to_config();
    config.validate()?;
    Ok(serde_json::to_string_pretty(&config)?)
}

/// Execute the config command
pub fn execute_config(args: &ConfigArgs) -> CliResult<()> {
    println!("{}", render_config(args)?);
    Ok(())
}
