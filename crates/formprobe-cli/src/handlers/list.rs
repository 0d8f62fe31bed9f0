//! List command handler

use crate::commands::ListArgs;
use crate::error::{CliError, CliResult};
use formprobe::{catalog, filter, Scenario};

/// One line per scenario: name, expected outcome and title
#[must_use]
pub fn render_list(scenarios: &[Scenario]) -> String {
    let width = scenarios.iter().map(|s| s.name.len()).max().unwrap_or(0);
    let mut out = String::new();
    for scenario in scenarios {
        out.push_str(&format!(
            "{:<width$}  {}\n    expects {}\n",
            scenario.name,
            scenario.title,
            scenario.outcome.describe(),
        ));
    }
    out
}

/// Execute the list command
pub fn execute_list(args: &ListArgs) -> CliResult<()> {
    let scenarios = filter(catalog(), args.filter.as_deref());
    if scenarios.is_empty() {
        return Err(CliError::config(format!(
            "no scenario matches '{}'",
            args.filter.as_deref().unwrap_or_default()
        )));
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&scenarios)?);
    } else {
        print!("{}", render_list(&scenarios));
    }
    Ok(())
}
