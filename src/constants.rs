// src/constants.rs

/// The name of the directory holding st2chat configuration and cache files.
pub const APP_DIR: &str = "st2chat";

/// The name of the main configuration file (inside the config directory).
pub const CONFIG_FILENAME: &str = "st2chat.toml";

/// The name of the last-good alias cache file (inside the cache directory).
pub const ALIAS_CACHE_FILENAME: &str = "aliases.bin";

/// Keyword appended to the bot prefix so alias commands never collide with native bot commands.
pub const ST2_KEYWORD: &str = "st2";

/// Command that prints the alias help text, appended directly to the bot prefix.
pub const HELP_COMMAND: &str = "st2help";

pub const DEFAULT_BOT_PREFIX: &str = "!";
pub const DEFAULT_TIMER_UPDATE_SECS: u64 = 60;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_ST2_CLI: &str = "/opt/stackstorm/st2/bin/st2";
pub const DEFAULT_RELAY_BIND: &str = "127.0.0.1:8888";

/// Relay log lines are cut after this many characters.
pub const RELAY_LOG_TRUNCATE: usize = 96;
