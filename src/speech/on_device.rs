use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use tokio::sync::mpsc;

use super::{SpeechEvent, SpeechInputEngine, SpeechTx, SpeechVariant};
use crate::error::{BotError, Result};

/// Raw callbacks of a platform speech recognizer.
#[derive(Debug, Clone, PartialEq)]
pub enum RecognizerEvent {
    Result {
        text: String,
        confidence: f32,
        is_final: bool,
    },
    /// The recognizer stopped listening on its own or after `stop`/`abort`.
    End,
    Error(String),
}

/// A platform speech recognizer, e.g. the OS dictation service.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait NativeRecognizer: Send {
    /// Feature detection; an error is treated like "not available".
    fn is_available(&self) -> Result<bool>;

    fn supports_interim_results(&self) -> bool;

    async fn start(
        &mut self,
        locale: &str,
        interim_results: bool,
        events: mpsc::UnboundedSender<RecognizerEvent>,
    ) -> Result<()>;

    /// Stops listening and delivers any pending final result.
    async fn stop(&mut self) -> Result<()>;

    /// Stops listening and discards pending results.
    async fn abort(&mut self) -> Result<()>;
}

pub struct OnDeviceEngine {
    recognizer: Box<dyn NativeRecognizer>,
    locale: String,
    interim_results: bool,
    capturing: Arc<AtomicBool>,
    events: Option<SpeechTx>,
    forward: Option<tokio::task::JoinHandle<()>>,
}

impl OnDeviceEngine {
    pub fn new(recognizer: Box<dyn NativeRecognizer>, interim_results: bool) -> Self {
        Self {
            recognizer,
            locale: "en".to_string(),
            interim_results,
            capturing: Arc::new(AtomicBool::new(false)),
            events: None,
            forward: None,
        }
    }

    fn forward(
        mut rx: mpsc::UnboundedReceiver<RecognizerEvent>,
        events: SpeechTx,
        capturing: Arc<AtomicBool>,
        interim_results: bool,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                let event = match event {
                    RecognizerEvent::Result {
                        text,
                        confidence,
                        is_final,
                    } => {
                        if !is_final && !interim_results {
                            continue;
                        }
                        SpeechEvent::Transcript {
                            text,
                            confidence,
                            is_final,
                        }
                    }
                    RecognizerEvent::End => {
                        // Only a stop the session did not ask for is reported.
                        if !capturing.swap(false, Ordering::SeqCst) {
                            continue;
                        }
                        SpeechEvent::AudioInputEnded
                    }
                    RecognizerEvent::Error(e) => SpeechEvent::Error(e),
                };
                if events.send(event).is_err() {
                    break;
                }
            }
        })
    }
}

#[async_trait]
impl SpeechInputEngine for OnDeviceEngine {
    fn variant(&self) -> SpeechVariant {
        SpeechVariant::OnDevice
    }

    async fn open(&mut self, events: SpeechTx) -> Result<()> {
        self.events = Some(events);
        Ok(())
    }

    async fn start(&mut self) -> Result<()> {
        if self.is_capturing() {
            return Ok(());
        }
        let events = self
            .events
            .clone()
            .ok_or_else(|| BotError::SpeechEngine("engine not open".to_string()))?;

        let interim = self.interim_results && self.recognizer.supports_interim_results();
        let (tx, rx) = mpsc::unbounded_channel();
        self.recognizer.start(&self.locale, interim, tx).await?;

        if let Some(previous) = self.forward.take() {
            previous.abort();
        }
        self.capturing.store(true, Ordering::SeqCst);
        self.forward = Some(Self::forward(rx, events, self.capturing.clone(), interim));
        tracing::debug!("on-device recognition started ({})", self.locale);
        Ok(())
    }

    async fn stop(&mut self, send_event: bool) -> Result<()> {
        if !self.capturing.swap(false, Ordering::SeqCst) {
            return Ok(());
        }
        if send_event {
            // Keep forwarding so the final result still reaches the session.
            self.recognizer.stop().await
        } else {
            if let Some(forward) = self.forward.take() {
                forward.abort();
            }
            self.recognizer.abort().await
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.stop(false).await?;
        if let Some(forward) = self.forward.take() {
            forward.abort();
        }
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
