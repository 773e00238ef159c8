// src/models.rs

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Arguments resolved for one action invocation. `None` means "declared but no value".
pub type Kwargs = BTreeMap<String, Option<String>>;

// --- ALIAS SOURCE MODELS ---
// These mirror the subset of the StackStorm `actionalias` resource that the bot needs.

/// One action alias as returned by the alias source.
///
/// `formats` stays untyped so that a single malformed entry can be skipped without
/// losing the rest of the alias.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AliasDefinition {
    pub action_ref: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub formats: Vec<serde_json::Value>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// The two shapes an alias format can take.
///
/// Structured representations stay untyped so one non-string entry only costs itself.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum FormatSpec {
    Plain(String),
    Structured {
        display: String,
        #[serde(rename = "representation", alias = "representations")]
        representations: Vec<serde_json::Value>,
    },
}

/// A format reduced to one help label and at least one representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedFormat {
    pub display: String,
    pub representations: Vec<String>,
}

// --- COMPILED MODELS ---

/// A single representation compiled into an anchored matcher.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pub matcher: Regex,
    /// Declared arguments and their defaults, seeded into every match.
    pub defaults: Kwargs,
    pub action_ref: String,
    /// The representation this pattern was compiled from.
    pub representation: String,
    /// Character length of the command prefix the matcher starts with.
    pub prefix_len: usize,
    /// Capture index of the trailing `key=value` segment.
    pub extra_group: usize,
}

/// The outcome of matching one line against the registry.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct MatchCandidate {
    pub action_ref: String,
    pub kwargs: Kwargs,
}

/// What the st2 CLI reports after running an action.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ExecutionResult {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub result: serde_json::Value,
}

/// Payload accepted by the relay webhook.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct RelayMessage {
    pub channel: String,
    pub message: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub whisper: Option<bool>,
}

// --- `st2chat.toml` MODELS ---

/// Represents the deserialized structure of an `st2chat.toml` file.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub bot: BotSettings,
    pub stackstorm: StackstormSettings,
    pub relay: RelaySettings,
    pub cache: CacheSettings,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct BotSettings {
    /// The chat prefix that precedes every bot command, e.g. `!`.
    pub prefix: String,
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            prefix: crate::constants::DEFAULT_BOT_PREFIX.to_string(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct StackstormSettings {
    pub base_url: String,
    /// Defaults to `<base_url>/auth/<api_version>`.
    pub auth_url: Option<String>,
    /// Defaults to `<base_url>/api/<api_version>`.
    pub api_url: Option<String>,
    pub api_version: String,
    /// Seconds between alias refreshes.
    pub timer_update: u64,
    pub request_timeout_secs: u64,
    pub verify_tls: bool,
    /// Command used to run actions, split with shell quoting rules.
    pub st2_cli: String,
    pub api_auth: ApiAuthSettings,
}

impl Default for StackstormSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost".to_string(),
            auth_url: None,
            api_url: None,
            api_version: "v1".to_string(),
            timer_update: crate::constants::DEFAULT_TIMER_UPDATE_SECS,
            request_timeout_secs: crate::constants::DEFAULT_REQUEST_TIMEOUT_SECS,
            verify_tls: true,
            st2_cli: crate::constants::DEFAULT_ST2_CLI.to_string(),
            api_auth: ApiAuthSettings::default(),
        }
    }
}

impl StackstormSettings {
    pub fn auth_url(&self) -> String {
        self.auth_url.clone().unwrap_or_else(|| {
            format!("{}/auth/{}", self.base_url.trim_end_matches('/'), self.api_version)
        })
    }

    pub fn api_url(&self) -> String {
        self.api_url.clone().unwrap_or_else(|| {
            format!("{}/api/{}", self.base_url.trim_end_matches('/'), self.api_version)
        })
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ApiAuthSettings {
    pub key: Option<String>,
    pub user: Option<ApiUser>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ApiUser {
    pub name: Option<String>,
    pub password: Option<String>,
    pub token: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RelaySettings {
    pub enabled: bool,
    pub bind: String,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            enabled: true,
            bind: crate::constants::DEFAULT_RELAY_BIND.to_string(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CacheSettings {
    pub enabled: bool,
    /// Overrides the default cache location; `~` and `$VARS` are expanded.
    pub path: Option<String>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
        }
    }
}
