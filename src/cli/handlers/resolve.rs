use anyhow::{Result, anyhow};
use clap::Parser;
use colored::*;

use crate::cli::{dispatcher::AppContext, handlers::commons};

#[derive(Parser, Debug, Default)]
#[command(
    no_binary_name = true,
    about = "Shows which action a chat line resolves to, without running it."
)]
struct MatchArgs {
    /// Print the match as JSON.
    #[arg(long)]
    json: bool,

    /// The chat line. The `<prefix>st2 ` lead-in may be omitted.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    line: Vec<String>,
}

/// The main handler for the `match` command.
pub fn handle(args: Vec<String>, context: &AppContext) -> Result<()> {
    let match_args = MatchArgs::try_parse_from(&args)?;
    let prefix = &context.settings.bot.prefix;
    let line = commons::command_line(prefix, &match_args.line)
        .ok_or_else(|| anyhow!(t!("cli.error.missing_line"), command = "match"))?;

    let services = commons::build_services(&context.settings)?;
    commons::runtime()?.block_on(services.refresher.warm_start());

    let Some(candidate) = services.registry.resolve(&line) else {
        println!("{}", format!(t!("match.none"), line = line).yellow());
        return Ok(());
    };

    if match_args.json {
        println!("{}", serde_json::to_string_pretty(&candidate)?);
        return Ok(());
    }

    println!(
        "{}",
        format!(t!("match.header"), action = candidate.action_ref.green()).bold()
    );
    for (name, value) in &candidate.kwargs {
        match value {
            Some(v) => println!("  {:<15} {}", name.blue(), v),
            None => println!("  {:<15} {}", name.blue(), "(unset)".dimmed()),
        }
    }
    Ok(())
}
