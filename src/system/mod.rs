//! # System Interaction Layer
//!
//! Everything that talks to the world outside the process: the StackStorm API, the st2
//! command line client, the chat backend and the relay webhook.
//!
//! ## Modules
//!
//! - **`st2_api`**: HTTP client for listing action aliases and keeping the user token
//!   fresh. It implements the alias source and authenticator used by the refresh cycle.
//! - **`executor`**: Runs a resolved action through the st2 CLI and renders its result.
//! - **`transport`**: The outbound chat connection. `ConsoleTransport` prints to the terminal.
//! - **`relay`**: The `POST /chatops/message` webhook that forwards StackStorm
//!   notifications into chat.

pub mod executor;
pub mod relay;
pub mod st2_api;
pub mod transport;
