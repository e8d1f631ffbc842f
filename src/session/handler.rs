use tokio::sync::mpsc;

use super::Input;
use crate::error::BotError;
use crate::types::{LogEntry, SessionStatus};

/// Who a chat message comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Sent,
    Received,
}

/// How a message entered the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageSignal {
    Typed,
    Spoken,
    Bot { node_id: i64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct BotMessage {
    pub kind: MessageKind,
    pub text: String,
    pub image: Option<String>,
    pub background: Option<String>,
    pub signal: MessageSignal,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AudioSource {
    Uri(String),
    /// Encoded audio received as a binary frame; decoding is up to the player.
    Frame(Vec<u8>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sound {
    BotReady,
    BotSleep,
    BotError,
}

impl Sound {
    pub fn name(&self) -> &'static str {
        match self {
            Sound::BotReady => "bot_ready",
            Sound::BotSleep => "bot_sleep",
            Sound::BotError => "bot_error",
        }
    }

    pub fn all() -> Vec<Sound> {
        vec![Sound::BotReady, Sound::BotSleep, Sound::BotError]
    }
}

/// Signals that a media element handed to the UI finished (or failed).
///
/// Completions of items that were skipped or interrupted in the meantime are ignored.
#[derive(Debug)]
pub struct Completion {
    generation: u64,
    tx: mpsc::UnboundedSender<Input>,
}

impl Completion {
    pub(crate) fn new(generation: u64, tx: mpsc::UnboundedSender<Input>) -> Self {
        Self { generation, tx }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn done(self) {
        let _ = self.tx.send(Input::PlaybackDone {
            generation: self.generation,
        });
    }

    pub fn failed(self, reason: &str) {
        let _ = self.tx.send(Input::PlaybackFailed {
            generation: self.generation,
            reason: reason.to_string(),
        });
    }
}

/// Callback surface of the UI layer.
///
/// Every method has a default, so embedders implement only what they render.
/// Media defaults complete immediately, which makes a handler without a player
/// behave like a text-only client.
pub trait SessionHandler: Send + Sync {
    fn set_status(&self, _status: SessionStatus) {}

    fn add_message(&self, _message: BotMessage) {}

    fn add_video(&self, _url: &str, done: Completion) {
        done.done();
    }

    fn play_audio(&self, _audio: AudioSource, done: Completion) {
        done.done();
    }

    fn pause_playback(&self) {}

    fn resume_playback(&self) {}

    fn stop_playback(&self) {}

    fn play_sound(&self, _sound: Sound) {}

    fn handle_command(&self, _command: &str, _payload: Option<&serde_json::Value>) {}

    fn interim_transcript(&self, _text: &str) {}

    fn on_error(&self, _error: &BotError) {}

    fn on_end(&self) {}

    fn add_logs(&self, _entries: &[LogEntry]) {}

    /// Attributes sent along with every input.
    fn attributes(&self) -> serde_json::Map<String, serde_json::Value> {
        serde_json::Map::new()
    }

    /// Identifier of this client, sent as `sender`.
    fn uuid(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }

    fn voice(&self) -> Option<String> {
        None
    }
}

/// Handler that renders nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHandler;

impl SessionHandler for NoopHandler {}
