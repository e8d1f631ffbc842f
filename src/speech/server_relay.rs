use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bot_session_utils::audio::{downmix, Pcm16Framer};
#[cfg(test)]
use mockall::automock;
use tokio::sync::mpsc;

use super::{SpeechEvent, SpeechInputEngine, SpeechTx, SpeechVariant};
use crate::error::{BotError, Result};
use crate::transport::Transport;

/// Source of interleaved f32 microphone samples.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Microphone: Send {
    fn sample_rate(&self) -> u32;

    fn channels(&self) -> usize;

    /// Starts capturing; the channel closes when capture ends.
    async fn start(&mut self) -> Result<mpsc::Receiver<Vec<f32>>>;

    async fn stop(&mut self) -> Result<()>;
}

/// Streams microphone audio to the server, which answers with `Recognized` events.
pub struct ServerRelayEngine {
    transport: Arc<dyn Transport>,
    microphone: Box<dyn Microphone>,
    stt_sample_rate: u32,
    locale: String,
    capturing: Arc<AtomicBool>,
    events: Option<SpeechTx>,
    forward: Option<tokio::task::JoinHandle<()>>,
}

impl ServerRelayEngine {
    pub fn new(transport: Arc<dyn Transport>, microphone: Box<dyn Microphone>, stt_sample_rate: u32) -> Self {
        Self {
            transport,
            microphone,
            stt_sample_rate,
            locale: "en".to_string(),
            capturing: Arc::new(AtomicBool::new(false)),
            events: None,
            forward: None,
        }
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }
}

#[async_trait]
impl SpeechInputEngine for ServerRelayEngine {
    fn variant(&self) -> SpeechVariant {
        SpeechVariant::ServerRelay
    }

    async fn open(&mut self, events: SpeechTx) -> Result<()> {
        self.events = Some(events);
        Ok(())
    }

    async fn start(&mut self) -> Result<()> {
        if self.is_capturing() {
            return Ok(());
        }
        if let Some(finished) = self.forward.take() {
            finished.abort();
        }
        let events = self
            .events
            .clone()
            .ok_or_else(|| BotError::SpeechEngine("engine not open".to_string()))?;
        let mut framer = Pcm16Framer::new(self.microphone.sample_rate(), self.stt_sample_rate)
            .map_err(|e| BotError::SpeechEngine(e.to_string()))?;

        let channels = self.microphone.channels();
        let mut frames = self.microphone.start().await?;
        self.transport.send_audio_open().await;

        self.capturing.store(true, Ordering::SeqCst);
        let capturing = self.capturing.clone();
        let transport = self.transport.clone();
        self.forward = Some(tokio::spawn(async move {
            while let Some(samples) = frames.recv().await {
                let frame = framer.push(&downmix(&samples, channels));
                if !frame.is_empty() {
                    transport.send_audio_frame(frame).await;
                }
            }
            tracing::debug!("microphone stream ended");
            // Only an end the session did not ask for is reported.
            if capturing.swap(false, Ordering::SeqCst) {
                let _ = events.send(SpeechEvent::AudioInputEnded);
            }
        }));
        tracing::debug!("relaying microphone at {} Hz", self.stt_sample_rate);
        Ok(())
    }

    async fn stop(&mut self, send_event: bool) -> Result<()> {
        if let Some(forward) = self.forward.take() {
            forward.abort();
        }
        if !self.capturing.swap(false, Ordering::SeqCst) {
            return Ok(());
        }
        let stopped = self.microphone.stop().await;
        if send_event {
            self.transport.send_audio_close().await;
        }
        stopped
    }

    async fn close(&mut self) -> Result<()> {
        self.stop(false).await?;
        self.events = None;
        Ok(())
    }

    fn set_language(&mut self, locale: &str) {
        self.locale = locale.to_string();
    }

    fn is_capturing(&self) -> bool {
        self.capturing.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;
    use bot_session_utils::audio::FRAME_CHUNK_SIZE;

    #[tokio::test]
    async fn streams_frames_and_closes_with_event() {
        let (frames_tx, frames_rx) = mpsc::channel(4);
        let mut microphone = MockMicrophone::new();
        microphone.expect_sample_rate().return_const(16000u32);
        microphone.expect_channels().return_const(1usize);
        microphone.expect_start().times(1).return_once(move || Ok(frames_rx));
        microphone.expect_stop().times(1).returning(|| Ok(()));

        let (sent_tx, mut sent_rx) = mpsc::unbounded_channel();
        let mut transport = MockTransport::new();
        transport.expect_send_audio_open().times(1).returning(|| ());
        transport
            .expect_send_audio_frame()
            .returning(move |frame| sent_tx.send(frame.len()).unwrap());
        transport.expect_send_audio_close().times(1).returning(|| ());

        let mut engine = ServerRelayEngine::new(Arc::new(transport), Box::new(microphone), 16000);
        let (events_tx, _events_rx) = mpsc::unbounded_channel();
        engine.open(events_tx).await.unwrap();
        engine.start().await.unwrap();
        assert!(engine.is_capturing());

        frames_tx.send(vec![0.1; FRAME_CHUNK_SIZE]).await.unwrap();
        assert_eq!(sent_rx.recv().await, Some(FRAME_CHUNK_SIZE * 2));

        engine.stop(true).await.unwrap();
        assert!(!engine.is_capturing());
    }

    #[tokio::test]
    async fn silent_stop_does_not_close_stream() {
        let (_frames_tx, frames_rx) = mpsc::channel(1);
        let mut microphone = MockMicrophone::new();
        microphone.expect_sample_rate().return_const(16000u32);
        microphone.expect_channels().return_const(2usize);
        microphone.expect_start().return_once(move || Ok(frames_rx));
        microphone.expect_stop().returning(|| Ok(()));

        let mut transport = MockTransport::new();
        transport.expect_send_audio_open().times(1).returning(|| ());
        transport.expect_send_audio_close().never();

        let mut engine = ServerRelayEngine::new(Arc::new(transport), Box::new(microphone), 16000);
        let (events_tx, _events_rx) = mpsc::unbounded_channel();
        engine.open(events_tx).await.unwrap();
        engine.start().await.unwrap();
        engine.start().await.unwrap();
        engine.stop(false).await.unwrap();
        engine.stop(false).await.unwrap();
    }

    #[tokio::test]
    async fn microphone_end_reports_audio_input_ended() {
        let (frames_tx, frames_rx) = mpsc::channel(1);
        let mut microphone = MockMicrophone::new();
        microphone.expect_sample_rate().return_const(48000u32);
        microphone.expect_channels().return_const(1usize);
        microphone.expect_start().return_once(move || Ok(frames_rx));

        let mut transport = MockTransport::new();
        transport.expect_send_audio_open().returning(|| ());

        let mut engine = ServerRelayEngine::new(Arc::new(transport), Box::new(microphone), 16000);
        let (events_tx, mut events_rx) = mpsc::unbounded_channel();
        engine.open(events_tx).await.unwrap();
        engine.start().await.unwrap();
        drop(frames_tx);

        assert_eq!(events_rx.recv().await, Some(SpeechEvent::AudioInputEnded));
    }

    #[tokio::test]
    async fn restarts_after_microphone_ends_on_its_own() {
        let (first_tx, first_rx) = mpsc::channel(1);
        let (_second_tx, second_rx) = mpsc::channel(1);
        let mut receivers = vec![second_rx, first_rx];
        let mut microphone = MockMicrophone::new();
        microphone.expect_sample_rate().return_const(16000u32);
        microphone.expect_channels().return_const(1usize);
        microphone
            .expect_start()
            .times(2)
            .returning(move || Ok(receivers.pop().unwrap()));

        let mut transport = MockTransport::new();
        transport.expect_send_audio_open().times(2).returning(|| ());

        let mut engine = ServerRelayEngine::new(Arc::new(transport), Box::new(microphone), 16000);
        let (events_tx, mut events_rx) = mpsc::unbounded_channel();
        engine.open(events_tx).await.unwrap();
        engine.start().await.unwrap();
        drop(first_tx);

        assert_eq!(events_rx.recv().await, Some(SpeechEvent::AudioInputEnded));
        assert!(!engine.is_capturing());

        engine.start().await.unwrap();
        assert!(engine.is_capturing());
    }
}
