// src/cli/handlers/commons.rs

// Shared wiring used by every handler.

use anyhow::{Context, Result};
use std::{sync::Arc, time::Duration};

use crate::{
    core::{
        chatops::ChatOps,
        compiler,
        refresh::Refresher,
        registry::PatternRegistry,
        settings,
    },
    models::Settings,
    state,
    system::{executor::St2CliExecutor, st2_api::St2Client},
};

/// The long-lived components of a running bot.
#[derive(Debug)]
pub struct Services {
    pub registry: Arc<PatternRegistry>,
    pub client: Arc<St2Client>,
    pub refresher: Arc<Refresher>,
    pub chatops: ChatOps,
}

/// Builds the async runtime the handlers block on.
pub fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start the async runtime")
}

/// Wires the registry, API client, executor and refresher together from `settings`.
pub fn build_services(settings: &Settings) -> Result<Services> {
    let registry = state::init_registry(&settings.bot.prefix);

    let client = Arc::new(
        St2Client::new(&settings.stackstorm).context("Failed to create the StackStorm API client")?,
    );
    let executor = Arc::new(St2CliExecutor::new(
        &settings.stackstorm,
        client.token_handle(),
    )?);

    let mut refresher = Refresher::new(
        Arc::clone(&registry),
        client.clone(),
        client.clone(),
        Duration::from_secs(settings.stackstorm.request_timeout_secs),
    );
    if settings.cache.enabled {
        let path = settings::cache_path(settings)?;
        log::debug!("Using alias cache at '{}'", path.display());
        refresher = refresher.with_cache(path);
    }

    Ok(Services {
        chatops: ChatOps::new(Arc::clone(&registry), executor),
        registry,
        client,
        refresher: Arc::new(refresher),
    })
}

/// Joins command-line words into a chat line. Text that does not already start with the
/// bot prefix is treated as an alias command and gets the full command prefix.
pub fn command_line(bot_prefix: &str, words: &[String]) -> Option<String> {
    let joined = words.join(" ");
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.starts_with(bot_prefix) {
        Some(trimmed.to_string())
    } else {
        Some(format!("{}{}", compiler::command_prefix(bot_prefix), trimmed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_command_line_adds_prefix_when_missing() {
        assert_eq!(
            command_line("!", &words(&["restart", "db"])).as_deref(),
            Some("!st2 restart db")
        );
        assert_eq!(
            command_line("!", &words(&["!st2 restart db"])).as_deref(),
            Some("!st2 restart db")
        );
        assert_eq!(
            command_line("!", &words(&["!st2help"])).as_deref(),
            Some("!st2help")
        );
        assert!(command_line("!", &words(&["  "])).is_none());
        assert!(command_line("!", &[]).is_none());
    }
}
