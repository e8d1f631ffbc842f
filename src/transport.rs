use crate::error::Result;
use crate::types::events::client::{InitEvent, Input};
use crate::types::{LogEntry, ServerEvent};
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

mod utils;
mod ws;

pub use ws::WsTransport;

/// Everything the transport delivers to its owner.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// A JSON envelope decoded from a text frame.
    Envelope(ServerEvent),
    /// A binary frame carrying playable audio.
    Audio(Vec<u8>),
    /// The server closed the channel.
    Closed(Option<String>),
    /// The channel failed.
    Error(String),
}

pub type TransportRx = tokio::sync::broadcast::Receiver<TransportEvent>;

/// The single persistent channel between the session and the bot backend.
///
/// Sends other than `send_text` are fire-and-forget: they silently do nothing
/// when the channel is not open. `close` may be called any number of times.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Connects and performs the `Init` handshake.
    async fn open(&self, init: InitEvent) -> Result<()>;

    /// Sends an `Input` turn; fails with `TransportNotReady` when not open.
    async fn send_text(&self, input: Input) -> Result<()>;

    async fn send_logs(&self, entries: Vec<LogEntry>);

    /// Announces a raw audio stream, stamped with the handshake identity and current session id.
    async fn send_audio_open(&self);

    async fn send_audio_close(&self);

    async fn send_audio_frame(&self, frame: Vec<u8>);

    async fn close(&self);

    /// Records the server session id; keep-alive pings run only while one is set.
    fn set_session_id(&self, session_id: Option<String>);

    fn is_open(&self) -> bool;

    fn subscribe(&self) -> TransportRx;
}
