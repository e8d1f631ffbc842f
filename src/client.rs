use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, watch};

use crate::config::Config;
use crate::error::{BotError, Result};
use crate::session::{CaptureOrigin, Input, SessionHandler, SessionOptions, SessionStateMachine, TextInputOptions};
use crate::speech::{select_engine, SpeechRx, SpeechSetup};
use crate::transport::{Transport, TransportRx, WsTransport};
use crate::types::SessionStatus;

pub type CommandTx = mpsc::UnboundedSender<Input>;
type CommandRx = mpsc::UnboundedReceiver<Input>;

/// Handle to a running bot session.
///
/// All calls are forwarded to a single driver task that owns the session
/// state, so the handle is cheap to share and never blocks.
pub struct SessionClient {
    c_tx: CommandTx,
    status: watch::Receiver<SessionStatus>,
    driver: tokio::task::JoinHandle<()>,
}

impl SessionClient {
    /// Connects to the bot backend over WebSocket and starts the session.
    pub async fn init(
        config: Config,
        options: SessionOptions,
        handler: Arc<dyn SessionHandler>,
        speech: SpeechSetup,
    ) -> Result<Self> {
        let transport = Arc::new(WsTransport::new(config));
        Self::with_transport(transport, options, handler, speech).await
    }

    pub async fn with_transport(
        transport: Arc<dyn Transport>,
        options: SessionOptions,
        handler: Arc<dyn SessionHandler>,
        mut speech: SpeechSetup,
    ) -> Result<Self> {
        if speech.stt_sample_rate == 0 {
            speech.stt_sample_rate = options.stt_sample_rate();
        }
        speech.interim_results |= options.stt_interim_results();

        let (speech_tx, speech_rx) = mpsc::unbounded_channel();
        let mut engine = select_engine(speech, transport.clone());
        if let Some(engine) = engine.as_mut() {
            engine.set_language(options.language());
            engine.open(speech_tx).await?;
        }

        // Subscribe before the handshake so `Ready` cannot be missed.
        let server_rx = transport.subscribe();
        let (c_tx, c_rx) = mpsc::unbounded_channel();
        let mut machine = SessionStateMachine::new(transport, engine, handler, options, c_tx.clone());
        let status = machine.subscribe_status();
        machine.start().await?;

        let driver = tokio::spawn(drive(machine, c_rx, server_rx, speech_rx));
        Ok(Self { c_tx, status, driver })
    }

    fn send(&self, input: Input) -> Result<()> {
        self.c_tx
            .send(input)
            .map_err(|_| BotError::Transport("session is shut down".to_string()))
    }

    pub fn handle_on_text_input(&self, text: &str, audio_on: bool, options: TextInputOptions) -> Result<()> {
        self.send(Input::Text {
            text: text.to_string(),
            audio_on,
            options,
        })
    }

    pub fn pause(&self) -> Result<()> {
        self.send(Input::Pause)
    }

    pub fn resume(&self) -> Result<()> {
        self.send(Input::Resume)
    }

    /// Main button press; `status` is what the UI currently shows.
    pub fn click(&self, status: SessionStatus) -> Result<()> {
        self.send(Input::Click(status))
    }

    pub fn set_in_audio(&self, enabled: bool) -> Result<()> {
        self.send(Input::SetInAudio(enabled))
    }

    pub fn set_out_audio(&self, enabled: bool) -> Result<()> {
        self.send(Input::SetOutAudio(enabled))
    }

    pub fn on_stop_click(&self) -> Result<()> {
        self.send(Input::Stop)
    }

    pub fn close_audio_stream(&self, origin: CaptureOrigin, send_event: bool) -> Result<()> {
        self.send(Input::CloseAudioStream { origin, send_event })
    }

    /// Lets the queue continue after a `walk` command.
    pub fn add_record(&self) -> Result<()> {
        self.send(Input::AddRecord)
    }

    pub fn status(&self) -> SessionStatus {
        *self.status.borrow()
    }

    pub fn status_changes(&self) -> watch::Receiver<SessionStatus> {
        self.status.clone()
    }

    /// Stops the session and waits for the driver to finish.
    pub async fn shutdown(self) -> Result<()> {
        self.send(Input::Shutdown)?;
        self.driver
            .await
            .map_err(|e| BotError::Transport(format!("session driver failed: {}", e)))
    }
}

async fn drive(mut machine: SessionStateMachine, mut c_rx: CommandRx, mut server_rx: TransportRx, mut speech_rx: SpeechRx) {
    let mut server_open = true;
    let mut speech_open = true;

    loop {
        let wakeup = machine.next_wakeup();

        let input = tokio::select! {
            input = c_rx.recv() => match input {
                Some(input) => input,
                None => break,
            },
            event = server_rx.recv(), if server_open => match event {
                Ok(event) => Input::from(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("session lagged behind transport, {} events dropped", skipped);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => {
                    server_open = false;
                    continue;
                }
            },
            event = speech_rx.recv(), if speech_open => match event {
                Some(event) => Input::Speech(event),
                None => {
                    speech_open = false;
                    continue;
                }
            },
            _ = tokio::time::sleep_until(wakeup.unwrap_or_else(tokio::time::Instant::now)), if wakeup.is_some() => {
                machine.on_wakeup().await;
                continue;
            }
        };

        let shutdown = matches!(input, Input::Shutdown);
        machine.handle(input).await;
        if shutdown {
            break;
        }
    }
    tracing::debug!("session driver stopped");
}
