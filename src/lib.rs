mod client;
pub mod config;
pub mod consts;
pub mod error;
pub mod queue;
pub mod session;
pub mod speech;
pub mod transport;

pub use bot_session_types as types;
pub use bot_session_utils as utils;

pub use client::{CommandTx, SessionClient};
pub use config::{Config, ConfigBuilder, ConfigError};
pub use error::{BotError, Result};
pub use session::{
    AudioSource, BotMessage, CaptureOrigin, Completion, MessageKind, MessageSignal, NoopHandler, SessionHandler,
    SessionOptions, SessionStateMachine, Sound, TextInputOptions,
};
pub use speech::{Microphone, NativeRecognizer, SpeechEvent, SpeechInputEngine, SpeechSetup};
pub use transport::{Transport, TransportEvent, WsTransport};
