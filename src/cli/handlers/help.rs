use anyhow::Result;
use clap::Parser;

use crate::cli::{dispatcher::AppContext, handlers::commons};

#[derive(Parser, Debug, Default)]
#[command(
    no_binary_name = true,
    about = "Prints the help text of every loaded action alias."
)]
struct HelpArgs {
    /// Only show entries containing this text (case-insensitive).
    filter: Option<String>,
}

/// The main handler for the `help` command.
pub fn handle(args: Vec<String>, context: &AppContext) -> Result<()> {
    let help_args = HelpArgs::try_parse_from(&args)?;
    let services = commons::build_services(&context.settings)?;
    let snapshot = commons::runtime()?.block_on(services.refresher.warm_start());

    if snapshot.patterns.is_empty() {
        println!("{}", snapshot.help);
        return Ok(());
    }

    let filter = help_args.filter.map(|f| f.to_lowercase());
    for line in snapshot.help.lines() {
        if filter
            .as_deref()
            .is_none_or(|f| line.to_lowercase().contains(f))
        {
            println!("{}", line);
        }
    }
    Ok(())
}
