use anyhow::{Result, anyhow};

use crate::{CancellationToken, cli::handlers, models::Settings};

/// Everything a handler needs besides its own arguments.
#[derive(Debug)]
pub struct AppContext {
    pub settings: Settings,
    pub cancellation_token: CancellationToken,
}

/// Defines a system command, its aliases, and its handler.
struct CommandDefinition {
    name: &'static str,
    aliases: &'static [&'static str],
    handler: fn(Vec<String>, &AppContext) -> Result<()>,
}

/// The single source of truth for all system commands.
static COMMAND_REGISTRY: &[CommandDefinition] = &[
    CommandDefinition {
        name: "serve",
        aliases: &["start"],
        handler: handlers::serve::handle,
    },
    CommandDefinition {
        name: "help",
        aliases: &["aliases", "ls"],
        handler: handlers::help::handle,
    },
    CommandDefinition {
        name: "match",
        aliases: &["check"],
        handler: handlers::resolve::handle,
    },
    CommandDefinition {
        name: "exec",
        aliases: &["run"],
        handler: handlers::exec::handle,
    },
    CommandDefinition {
        name: "token",
        aliases: &[],
        handler: handlers::token::handle,
    },
];

/// Finds a command definition in the registry by its name or alias.
fn find_command(name: &str) -> Option<&'static CommandDefinition> {
    COMMAND_REGISTRY
        .iter()
        .find(|cmd| cmd.name == name || cmd.aliases.contains(&name))
}

/// Routes `st2chat <command> [args...]` to its handler.
pub fn dispatch(all_args: Vec<String>, context: &AppContext) -> Result<()> {
    log::debug!("Dispatching args: {:?}", all_args);

    let mut args = all_args.into_iter();
    let Some(name) = args.next() else {
        println!("{}", t!("cli.welcome"));
        return Ok(());
    };

    let command = find_command(&name).ok_or_else(|| {
        let names: Vec<&str> = COMMAND_REGISTRY.iter().map(|c| c.name).collect();
        anyhow!(
            t!("cli.error.unknown_command"),
            name = name,
            commands = names.join(", ")
        )
    })?;

    (command.handler)(args.collect(), context)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_command_by_name_and_alias() {
        assert_eq!(find_command("serve").map(|c| c.name), Some("serve"));
        assert_eq!(find_command("ls").map(|c| c.name), Some("help"));
        assert_eq!(find_command("check").map(|c| c.name), Some("match"));
        assert_eq!(find_command("run").map(|c| c.name), Some("exec"));
        assert!(find_command("deploy").is_none());
    }

    #[test]
    fn test_names_and_aliases_are_unique() {
        let mut all: Vec<&str> = COMMAND_REGISTRY
            .iter()
            .flat_map(|c| std::iter::once(c.name).chain(c.aliases.iter().copied()))
            .collect();
        let total = all.len();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), total);
    }

    #[test]
    fn test_unknown_command_lists_available_ones() {
        let context = AppContext {
            settings: Settings::default(),
            cancellation_token: Default::default(),
        };
        let err = dispatch(vec!["deploy".to_string()], &context).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("deploy"));
        assert!(message.contains("serve, help, match, exec, token"));
    }
}
