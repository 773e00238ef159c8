// src/system/relay.rs

//! Relay webhook.
//!
//! StackStorm posts notifications to `POST /chatops/message`; each one is forwarded
//! verbatim to the named channel through the configured [`ChatTransport`].

use crate::{
    constants::RELAY_LOG_TRUNCATE, models::RelayMessage, system::transport::ChatTransport,
};
use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;

pub const RELAY_PATH: &str = "/chatops/message";

/// Shared state of the relay routes.
#[derive(Clone)]
pub struct RelayState {
    pub transport: Arc<dyn ChatTransport>,
}

pub fn router(transport: Arc<dyn ChatTransport>) -> Router {
    Router::new()
        .route(RELAY_PATH, post(relay_message))
        .with_state(RelayState { transport })
}

/// Forwards one message and acknowledges it.
pub async fn relay_message(
    State(state): State<RelayState>,
    Json(payload): Json<RelayMessage>,
) -> (StatusCode, &'static str) {
    log::debug!(
        "Relay request for channel '{}' (user: {:?}, whisper: {:?})",
        payload.channel,
        payload.user,
        payload.whisper
    );

    if let Err(e) = state
        .transport
        .send(&payload.channel, &payload.message)
        .await
    {
        log::error!("Failed to relay message to '{}': {}", payload.channel, e);
        return (StatusCode::BAD_GATEWAY, "Message could not be delivered.");
    }

    log::info!("'{}'", truncate_for_log(&payload.message));
    (StatusCode::OK, t!("relay.received"))
}

/// Cuts long messages for logging, marking the cut with ` ...`.
pub fn truncate_for_log(message: &str) -> String {
    if message.chars().count() > RELAY_LOG_TRUNCATE {
        let head: String = message.chars().take(RELAY_LOG_TRUNCATE).collect();
        format!("{} ...", head)
    } else {
        message.to_string()
    }
}

/// Binds the relay listener and returns it with its local address.
pub async fn bind(addr: &str) -> std::io::Result<(TcpListener, SocketAddr)> {
    let listener = TcpListener::bind(addr).await?;
    let local = listener.local_addr()?;
    Ok((listener, local))
}

/// Serves the relay on an already bound listener until the future is dropped.
pub async fn serve(listener: TcpListener, transport: Arc<dyn ChatTransport>) -> std::io::Result<()> {
    axum::serve(listener, router(transport)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::{io, sync::Mutex};

    #[derive(Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl ChatTransport for RecordingTransport {
        async fn send(&self, channel: &str, message: &str) -> io::Result<()> {
            self.sent
                .lock()
                .unwrap()
                .push((channel.to_string(), message.to_string()));
            Ok(())
        }
    }

    struct BrokenTransport;

    #[async_trait]
    impl ChatTransport for BrokenTransport {
        async fn send(&self, _channel: &str, _message: &str) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "chat backend gone"))
        }
    }

    fn message(text: &str) -> RelayMessage {
        RelayMessage {
            channel: "#ops".to_string(),
            message: text.to_string(),
            user: Some("st2".to_string()),
            whisper: None,
        }
    }

    #[tokio::test]
    async fn test_relay_forwards_and_acknowledges() {
        let transport = Arc::new(RecordingTransport::default());
        let state = RelayState {
            transport: transport.clone(),
        };

        let (status, body) = relay_message(State(state), Json(message("deploy finished"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, t!("relay.received"));
        assert_eq!(
            transport.sent.lock().unwrap().as_slice(),
            [("#ops".to_string(), "deploy finished".to_string())]
        );
    }

    #[tokio::test]
    async fn test_relay_reports_delivery_failure() {
        let state = RelayState {
            transport: Arc::new(BrokenTransport),
        };
        let (status, _) = relay_message(State(state), Json(message("x"))).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_relay_over_http() {
        let transport = Arc::new(RecordingTransport::default());
        let (listener, addr) = bind("127.0.0.1:0").await.unwrap();
        let server_transport: Arc<dyn ChatTransport> = transport.clone();
        tokio::spawn(serve(listener, server_transport));

        let response = reqwest::Client::new()
            .post(format!("http://{}{}", addr, RELAY_PATH))
            .json(&serde_json::json!({"channel": "#ops", "message": "hello"}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.text().await.unwrap(), t!("relay.received"));
        assert_eq!(transport.sent.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_truncate_for_log() {
        assert_eq!(truncate_for_log("short"), "short");
        let long = "a".repeat(RELAY_LOG_TRUNCATE + 10);
        let cut = truncate_for_log(&long);
        assert!(cut.ends_with(" ..."));
        assert_eq!(cut.chars().count(), RELAY_LOG_TRUNCATE + 4);
    }
}
