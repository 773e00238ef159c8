use anyhow::{Result, anyhow};
use clap::Parser;
use colored::*;

use crate::{
    cli::{dispatcher::AppContext, handlers::commons},
    core::refresh::Authenticator,
};

#[derive(Parser, Debug, Default)]
#[command(
    no_binary_name = true,
    about = "Checks the StackStorm API token and renews it if it was rejected."
)]
struct TokenArgs {
    /// Renew the token even if the current one is still accepted.
    #[arg(long)]
    force: bool,
}

/// The main handler for the `token` command.
pub fn handle(args: Vec<String>, context: &AppContext) -> Result<()> {
    let token_args = TokenArgs::try_parse_from(&args)?;
    let services = commons::build_services(&context.settings)?;
    let runtime = commons::runtime()?;

    if !token_args.force && runtime.block_on(services.client.probe())? {
        println!("{}", t!("token.valid").green());
        return Ok(());
    }

    runtime
        .block_on(services.client.renew())
        .map_err(|e| anyhow!("{} ({})", t!("token.rejected"), e))?;
    println!("{}", t!("token.renewed").green());
    Ok(())
}
