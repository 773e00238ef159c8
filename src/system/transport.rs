// src/system/transport.rs

//! Outbound side of the chat connection.

use async_trait::async_trait;
use colored::Colorize;
use std::io;
use tokio::io::AsyncWriteExt;

/// Posts messages into the chat backend.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send(&self, channel: &str, message: &str) -> io::Result<()>;
}

/// A transport that prints every message on the terminal, tagged with its channel.
#[derive(Debug, Default)]
pub struct ConsoleTransport;

impl ConsoleTransport {
    pub fn render(channel: &str, message: &str) -> String {
        if channel.is_empty() {
            format!("{}\n", message)
        } else {
            format!("{} {}\n", format!("[{}]", channel).cyan(), message)
        }
    }
}

#[async_trait]
impl ChatTransport for ConsoleTransport {
    async fn send(&self, channel: &str, message: &str) -> io::Result<()> {
        let mut stdout = tokio::io::stdout();
        stdout
            .write_all(Self::render(channel, message).as_bytes())
            .await?;
        stdout.flush().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_tags_channel() {
        colored::control::set_override(false);
        assert_eq!(ConsoleTransport::render("#ops", "deployed"), "[#ops] deployed\n");
        assert_eq!(ConsoleTransport::render("", "hi"), "hi\n");
    }
}
