use clap::Parser;
use std::path::PathBuf;

pub mod dispatcher;
pub mod handlers;

/// Builds the color-aware help string at runtime from the `cli.help.template` message.
fn build_help_string() -> &'static str {
    let use_colors = colored::control::SHOULD_COLORIZE.should_colorize();

    let title = if use_colors { "\x1b[1;33m" } else { "" }; // Bold Yellow
    let hl = if use_colors { "\x1b[1;36m" } else { "" }; // Bold Cyan
    let cmd = if use_colors { "\x1b[36m" } else { "" }; // Cyan
    let group = if use_colors { "\x1b[1;32m" } else { "" }; // Bold Green
    let dim = if use_colors { "\x1b[2m" } else { "" };
    let reset = if use_colors { "\x1b[0m" } else { "" };

    let formatted_string = t!("cli.help.template")
        .replace("<title>", title)
        .replace("</title>", reset)
        .replace("<hl>", hl)
        .replace("</hl>", reset)
        .replace("<cmd>", cmd)
        .replace("</cmd>", reset)
        .replace("<group>", group)
        .replace("</group>", reset)
        .replace("<dim>", dim)
        .replace("</dim>", reset);

    Box::leak(formatted_string.into_boxed_str())
}

/// st2chat: StackStorm action aliases as chat commands.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,
    help_template = { build_help_string() },
)]
#[command(disable_help_subcommand = true)]
#[command(trailing_var_arg = true)]
pub struct Cli {
    /// Path to `st2chat.toml`. Defaults to `<config dir>/st2chat/st2chat.toml`.
    #[arg(long, short, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// The command followed by its arguments.
    #[arg(allow_hyphen_values = true)]
    pub args: Vec<String>,
}
