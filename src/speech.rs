use std::sync::Arc;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use tokio::sync::mpsc;

use crate::error::Result;
use crate::transport::Transport;

mod on_device;
mod server_relay;

pub use on_device::{NativeRecognizer, OnDeviceEngine, RecognizerEvent};
pub use server_relay::{Microphone, ServerRelayEngine};

/// Uniform event stream produced by either speech input variant.
#[derive(Debug, Clone, PartialEq)]
pub enum SpeechEvent {
    Transcript {
        text: String,
        confidence: f32,
        is_final: bool,
    },
    /// Capture ended without a request from the session (e.g. silence timeout).
    AudioInputEnded,
    Error(String),
}

pub type SpeechTx = mpsc::UnboundedSender<SpeechEvent>;
pub type SpeechRx = mpsc::UnboundedReceiver<SpeechEvent>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechVariant {
    OnDevice,
    ServerRelay,
}

/// Speech-to-text input, either recognized locally or relayed to the server.
///
/// `start` while already capturing and `stop` while idle both succeed without
/// doing anything.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SpeechInputEngine: Send {
    fn variant(&self) -> SpeechVariant;

    /// Attaches the event sink. Must be called before `start`.
    async fn open(&mut self, events: SpeechTx) -> Result<()>;

    async fn start(&mut self) -> Result<()>;

    /// Stops capturing. `send_event` marks an explicit stop rather than a silent truncation.
    async fn stop(&mut self, send_event: bool) -> Result<()>;

    async fn close(&mut self) -> Result<()>;

    fn set_language(&mut self, locale: &str);

    fn is_capturing(&self) -> bool;
}

/// Speech collaborators available on this platform.
#[derive(Default)]
pub struct SpeechSetup {
    pub recognizer: Option<Box<dyn NativeRecognizer>>,
    pub microphone: Option<Box<dyn Microphone>>,
    pub stt_sample_rate: u32,
    pub interim_results: bool,
}

impl SpeechSetup {
    pub fn text_only() -> Self {
        Self::default()
    }

    pub fn with_recognizer(mut self, recognizer: Box<dyn NativeRecognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    pub fn with_microphone(mut self, microphone: Box<dyn Microphone>) -> Self {
        self.microphone = Some(microphone);
        self
    }

    pub fn with_stt_sample_rate(mut self, rate: u32) -> Self {
        self.stt_sample_rate = rate;
        self
    }

    pub fn with_interim_results(mut self, interim_results: bool) -> Self {
        self.interim_results = interim_results;
        self
    }
}

/// Picks the on-device variant when the native recognizer reports itself
/// available, and falls back to relaying microphone audio otherwise.
pub fn select_engine(
    setup: SpeechSetup,
    transport: Arc<dyn Transport>,
) -> Option<Box<dyn SpeechInputEngine>> {
    let SpeechSetup {
        recognizer,
        microphone,
        stt_sample_rate,
        interim_results,
    } = setup;

    if let Some(recognizer) = recognizer {
        match recognizer.is_available() {
            Ok(true) => {
                tracing::info!("using on-device speech recognition");
                return Some(Box::new(OnDeviceEngine::new(recognizer, interim_results)));
            }
            Ok(false) => tracing::info!("on-device speech recognition not available"),
            Err(e) => tracing::warn!("speech recognition detection failed: {}", e),
        }
    }

    match microphone {
        Some(microphone) => {
            tracing::info!("relaying microphone audio to the server");
            let rate = if stt_sample_rate == 0 {
                bot_session_utils::audio::DEFAULT_STT_SAMPLE_RATE
            } else {
                stt_sample_rate
            };
            Some(Box::new(ServerRelayEngine::new(transport, microphone, rate)))
        }
        None => {
            tracing::info!("no speech input available, text only");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BotError;
    use crate::transport::MockTransport;
    use on_device::MockNativeRecognizer;
    use server_relay::MockMicrophone;

    fn transport() -> Arc<dyn Transport> {
        Arc::new(MockTransport::new())
    }

    #[test]
    fn prefers_available_recognizer() {
        let mut recognizer = MockNativeRecognizer::new();
        recognizer.expect_is_available().returning(|| Ok(true));
        let setup = SpeechSetup::text_only()
            .with_recognizer(Box::new(recognizer))
            .with_microphone(Box::new(MockMicrophone::new()));

        let engine = select_engine(setup, transport()).unwrap();
        assert_eq!(engine.variant(), SpeechVariant::OnDevice);
    }

    #[test]
    fn detection_failure_falls_back_to_relay() {
        let mut recognizer = MockNativeRecognizer::new();
        recognizer
            .expect_is_available()
            .returning(|| Err(BotError::SpeechEngine("detection failed".to_string())));
        let setup = SpeechSetup::text_only()
            .with_recognizer(Box::new(recognizer))
            .with_microphone(Box::new(MockMicrophone::new()));

        let engine = select_engine(setup, transport()).unwrap();
        assert_eq!(engine.variant(), SpeechVariant::ServerRelay);
    }

    #[test]
    fn unavailable_recognizer_without_microphone_is_text_only() {
        let mut recognizer = MockNativeRecognizer::new();
        recognizer.expect_is_available().returning(|| Ok(false));
        let setup = SpeechSetup::text_only().with_recognizer(Box::new(recognizer));

        assert!(select_engine(setup, transport()).is_none());
    }
}
