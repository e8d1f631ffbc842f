pub const BOT_SERVER_URL: &str = "BOT_SERVER_URL";
pub const BOT_APP_KEY: &str = "BOT_APP_KEY";
pub const BOT_TOKEN: &str = "BOT_TOKEN";

pub const DEFAULT_SERVER_URL: &str = "wss://localhost:8080/socket/";
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

pub const AUTHORIZATION_HEADER: &str = "Authorization";

/// Interval between keep-alive pings while a session id is assigned.
pub const KEEP_ALIVE_INTERVAL_SECS: u64 = 10;

/// Delay before the microphone is reopened after the bot finished responding.
pub const CAPTURE_REOPEN_DEBOUNCE_MS: u64 = 300;

/// Command that keeps the queue waiting until the embedder calls `add_record`.
pub const WALK_COMMAND: &str = "walk";
