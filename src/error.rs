/// Errors surfaced by the bot session.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BotError {
    #[error("transport is not open")]
    TransportNotReady,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("speech engine error: {0}")]
    SpeechEngine(String),
    #[error("server error: {0}")]
    Server(String),
    #[error("playback error: {0}")]
    Playback(String),
    #[error("failed to encode event: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for BotError {
    fn from(e: serde_json::Error) -> Self {
        BotError::Serialization(e.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for BotError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        BotError::Transport(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BotError>;
