use anyhow::{Result, anyhow};
use clap::Parser;

use crate::cli::{dispatcher::AppContext, handlers::commons};

#[derive(Parser, Debug, Default)]
#[command(
    no_binary_name = true,
    about = "Resolves a chat line and runs the matching action through the st2 CLI."
)]
struct ExecArgs {
    /// The chat line. The `<prefix>st2 ` lead-in may be omitted.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    line: Vec<String>,
}

/// The main handler for the `exec` command. Prints exactly what the bot would reply.
pub fn handle(args: Vec<String>, context: &AppContext) -> Result<()> {
    let exec_args = ExecArgs::try_parse_from(&args)?;
    let prefix = &context.settings.bot.prefix;
    let line = commons::command_line(prefix, &exec_args.line)
        .ok_or_else(|| anyhow!(t!("cli.error.missing_line"), command = "exec"))?;

    let services = commons::build_services(&context.settings)?;
    let reply = commons::runtime()?.block_on(async {
        services.refresher.warm_start().await;
        services.chatops.handle_line(&line).await
    });

    match reply {
        Some(text) => {
            println!("{}", text);
            Ok(())
        }
        None => Err(anyhow!(t!("match.none"), line = line)),
    }
}
