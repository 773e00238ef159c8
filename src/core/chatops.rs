// src/core/chatops.rs

//! Chat-facing command handling.
//!
//! Every inbound chat line goes through [`ChatOps::handle_line`], which decides whether
//! the line is addressed to the bot at all and, if so, produces the reply text.

use crate::{
    constants::{HELP_COMMAND, ST2_KEYWORD},
    core::registry::PatternRegistry,
    models::{ExecutionResult, MatchCandidate},
    system::executor::{self, ExecutionError},
};
use async_trait::async_trait;
use std::sync::Arc;

/// Runs a resolved action.
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    async fn execute(&self, candidate: &MatchCandidate) -> Result<ExecutionResult, ExecutionError>;
}

/// What a chat line is asking for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand<'a> {
    Help,
    Run(&'a str),
    Ignored,
}

/// Classifies a chat line by its prefix.
pub fn classify<'a>(bot_prefix: &str, line: &'a str) -> ChatCommand<'a> {
    let Some(rest) = line.strip_prefix(bot_prefix) else {
        return ChatCommand::Ignored;
    };
    if rest.trim_end() == HELP_COMMAND {
        return ChatCommand::Help;
    }
    match rest.strip_prefix(ST2_KEYWORD) {
        Some(after) if after.starts_with(char::is_whitespace) => ChatCommand::Run(line),
        _ => ChatCommand::Ignored,
    }
}

pub struct ChatOps {
    registry: Arc<PatternRegistry>,
    executor: Arc<dyn ActionExecutor>,
}

impl std::fmt::Debug for ChatOps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatOps")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl ChatOps {
    pub fn new(registry: Arc<PatternRegistry>, executor: Arc<dyn ActionExecutor>) -> Self {
        Self { registry, executor }
    }

    /// Handles one chat line.
    ///
    /// # Returns
    ///
    /// The reply to post, or `None` when the line is not meant for the bot.
    pub async fn handle_line(&self, line: &str) -> Option<String> {
        let prefix = self.registry.bot_prefix();
        match classify(prefix, line) {
            ChatCommand::Ignored => None,
            ChatCommand::Help => Some(self.registry.help()),
            ChatCommand::Run(command) => Some(self.run(prefix, command).await),
        }
    }

    async fn run(&self, prefix: &str, line: &str) -> String {
        let Some(candidate) = self.registry.resolve(line) else {
            log::info!("No action alias matched '{}'", line);
            return format!(t!("chat.not_found"), line = line, prefix = prefix);
        };

        log::info!("st2 matched {} with {:?}", candidate.action_ref, candidate.kwargs);
        match self.executor.execute(&candidate).await {
            Ok(result) => {
                log::info!("st2 run response: {} {}", result.id, result.status);
                executor::format_result(&result)
            }
            Err(e) => {
                log::error!("Failed to run '{}': {}", candidate.action_ref, e);
                format!(
                    t!("chat.execution_failed"),
                    action = candidate.action_ref,
                    error = e
                )
            }
        }
    }
}
