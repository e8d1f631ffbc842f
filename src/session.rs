use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::Instant;

use crate::consts::{CAPTURE_REOPEN_DEBOUNCE_MS, WALK_COMMAND};
use crate::error::{BotError, Result};
use crate::queue::{DrainStep, QueuedEntry, ResponseQueue, SkipOutcome};
use crate::speech::{SpeechEvent, SpeechInputEngine};
use crate::transport::{Transport, TransportEvent};
use crate::types::events::client::{self, InitConfig, InitEvent};
use crate::types::{LogLevel, ResponseItem, ServerEvent, SessionStatus};

mod handler;
mod options;
mod turn_log;

pub use handler::{AudioSource, BotMessage, Completion, MessageKind, MessageSignal, NoopHandler, SessionHandler, Sound};
pub use options::{CaptureOrigin, SessionIdentity, SessionOptions, TextInputOptions};
pub use turn_log::TurnLog;

/// Everything that can happen to a session, in the order the driver receives it.
#[derive(Debug)]
pub enum Input {
    Server(ServerEvent),
    AudioFrame(Vec<u8>),
    TransportClosed(Option<String>),
    TransportError(String),
    Speech(SpeechEvent),
    PlaybackDone {
        generation: u64,
    },
    PlaybackFailed {
        generation: u64,
        reason: String,
    },
    Text {
        text: String,
        audio_on: bool,
        options: TextInputOptions,
    },
    Pause,
    Resume,
    Click(SessionStatus),
    SetInAudio(bool),
    SetOutAudio(bool),
    Stop,
    CloseAudioStream {
        origin: CaptureOrigin,
        send_event: bool,
    },
    AddRecord,
    Shutdown,
}

impl From<TransportEvent> for Input {
    fn from(event: TransportEvent) -> Self {
        match event {
            TransportEvent::Envelope(event) => Input::Server(event),
            TransportEvent::Audio(frame) => Input::AudioFrame(frame),
            TransportEvent::Closed(reason) => Input::TransportClosed(reason),
            TransportEvent::Error(error) => Input::TransportError(error),
        }
    }
}

/// Speech capture as seen by the session. The driver awaits every engine
/// start and stop before taking the next input, so a start never overlaps a stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CaptureState {
    Closed,
    Opening,
    Open,
}

/// Turn-taking core of one bot session.
///
/// Owned by a single driver task: every transport envelope, speech event,
/// playback completion and UI command goes through [`SessionStateMachine::handle`],
/// so no state here is ever shared.
pub struct SessionStateMachine {
    transport: Arc<dyn Transport>,
    speech: Option<Box<dyn SpeechInputEngine>>,
    handler: Arc<dyn SessionHandler>,
    inputs: mpsc::UnboundedSender<Input>,
    options: SessionOptions,
    identity: SessionIdentity,
    sender: String,
    status: SessionStatus,
    status_tx: watch::Sender<SessionStatus>,
    queue: ResponseQueue,
    sleep_deadline: Option<Instant>,
    reopen_at: Option<Instant>,
    turn_log: TurnLog,
    capture: CaptureState,
    /// The last turn was spoken; capture reopens once the bot is done.
    voice_turn: bool,
    awaiting_response: bool,
    session_ended: bool,
    /// Bumped whenever something is presented or interrupted; older completions are stale.
    generation: u64,
    completed_while_paused: bool,
    waiting_for_record: bool,
    stopped: bool,
}

impl SessionStateMachine {
    pub fn new(
        transport: Arc<dyn Transport>,
        speech: Option<Box<dyn SpeechInputEngine>>,
        handler: Arc<dyn SessionHandler>,
        options: SessionOptions,
        inputs: mpsc::UnboundedSender<Input>,
    ) -> Self {
        let (status_tx, _) = watch::channel(SessionStatus::Unstarted);
        let sender = handler.uuid();
        Self {
            transport,
            speech,
            handler,
            inputs,
            identity: SessionIdentity::from_options(&options),
            options,
            sender,
            status: SessionStatus::Unstarted,
            status_tx,
            queue: ResponseQueue::new(),
            sleep_deadline: None,
            reopen_at: None,
            turn_log: TurnLog::new(),
            capture: CaptureState::Closed,
            voice_turn: false,
            awaiting_response: false,
            session_ended: false,
            generation: 0,
            completed_while_paused: false,
            waiting_for_record: false,
            stopped: true,
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn subscribe_status(&self) -> watch::Receiver<SessionStatus> {
        self.status_tx.subscribe()
    }

    pub fn identity(&self) -> &SessionIdentity {
        &self.identity
    }

    pub fn queue(&self) -> &ResponseQueue {
        &self.queue
    }

    /// Connects the transport and sends the `Init` handshake.
    pub async fn start(&mut self) -> Result<()> {
        self.turn_log.add(LogLevel::Info, "session starting");
        self.connect().await
    }

    async fn connect(&mut self) -> Result<()> {
        let config = InitConfig {
            tts: self.options.tts,
            stt_sample_rate: self.options.stt_sample_rate,
            tts_file_type: self.options.tts_file_type.clone(),
            locale: self.identity.language.clone(),
            zone_id: self.options.zone_id.clone(),
            voice: self.handler.voice().or_else(|| self.options.voice.clone()),
            send_response_items: self.options.send_response_items,
            stt_interim_results: self.options.stt_interim_results,
        };
        let mut init = InitEvent::new(&self.identity.app_key, &self.identity.device_id, &self.sender, config);
        if let Some(token) = &self.identity.auth_token {
            init = init.with_token(token);
        }
        self.transport.open(init).await?;
        self.stopped = false;
        Ok(())
    }

    pub async fn handle(&mut self, input: Input) {
        match input {
            Input::Server(event) => self.on_server_event(event).await,
            Input::AudioFrame(frame) => self.on_audio_frame(frame).await,
            Input::TransportClosed(reason) => self.on_transport_closed(reason).await,
            Input::TransportError(error) => {
                if !self.stopped {
                    self.fail(BotError::Transport(error)).await;
                }
            }
            Input::Speech(event) => self.on_speech_event(event).await,
            Input::PlaybackDone { generation } => self.on_playback_finished(generation).await,
            Input::PlaybackFailed { generation, reason } => {
                self.turn_log.add(LogLevel::Warn, &BotError::Playback(reason).to_string());
                self.on_playback_finished(generation).await;
            }
            Input::Text {
                text,
                audio_on,
                options,
            } => self.handle_on_text_input(&text, audio_on, options).await,
            Input::Pause => self.pause(),
            Input::Resume => self.resume().await,
            Input::Click(status) => self.click(status).await,
            Input::SetInAudio(enabled) => self.set_in_audio(enabled).await,
            Input::SetOutAudio(enabled) => self.set_out_audio(enabled).await,
            Input::Stop => self.stop().await,
            Input::CloseAudioStream { origin, send_event } => self.close_audio_stream(origin, send_event).await,
            Input::AddRecord => self.add_record().await,
            Input::Shutdown => self.shutdown().await,
        }
    }

    async fn on_server_event(&mut self, event: ServerEvent) {
        if self.stopped {
            tracing::debug!("ignoring {} after stop", event.type_name());
            return;
        }
        tracing::debug!("received {}", event.type_name());

        match event {
            ServerEvent::Ready(_) => {
                self.assign_session_id(Some(uuid::Uuid::new_v4().to_string()));
                self.play_sound(Sound::BotReady);
                if self.awaiting_response {
                    return;
                }
                match self.options.start_message.clone() {
                    Some(message) if self.options.auto_start => {
                        let audio_on = self.options.input_audio;
                        self.submit_text(&message, audio_on, TextInputOptions::hidden(), MessageSignal::Typed)
                            .await;
                    }
                    _ => self.set_status(SessionStatus::Responding),
                }
            }
            ServerEvent::SessionStarted(event) => {
                self.assign_session_id(Some(event.session_id().to_string()));
                if self.status != SessionStatus::Paused {
                    self.set_status(SessionStatus::Responding);
                }
            }
            ServerEvent::ResponseItem(event) => {
                self.enqueue(std::iter::once(event.into_response_item()));
                self.drain().await;
            }
            ServerEvent::Response(event) => {
                self.awaiting_response = false;
                if !event.logs().is_empty() {
                    self.handler.add_logs(event.logs());
                }
                if let Some(locale) = event.locale() {
                    self.set_language(locale);
                }
                if event.sleep_timeout() > 0 {
                    self.sleep_deadline = Some(Instant::now() + Duration::from_secs(event.sleep_timeout()));
                }
                if event.session_ended() {
                    self.session_ended = true;
                }
                let items = if self.options.send_response_items {
                    // Already delivered one by one as `ResponseItem` events.
                    Vec::new()
                } else {
                    event.into_items()
                };
                self.enqueue(items);
                self.drain().await;
            }
            ServerEvent::InputAudioStreamOpen(_) => self.set_status(SessionStatus::Listening),
            ServerEvent::Recognized(event) => {
                let Some(item) = event.first() else {
                    return;
                };
                if item.is_final {
                    let text = item.text.clone();
                    self.on_final_transcript(&text).await;
                } else {
                    self.handler.interim_transcript(&item.text);
                }
            }
            ServerEvent::Error(event) => self.fail(BotError::Server(event.text().to_string())).await,
            ServerEvent::SessionEnded(_) => {
                self.turn_log.add(LogLevel::Info, "session ended by server");
                self.session_ended = true;
                self.assign_session_id(None);
                if self.queue.is_idle() && !self.awaiting_response {
                    self.go_sleep().await;
                }
            }
        }
    }

    async fn on_audio_frame(&mut self, frame: Vec<u8>) {
        if self.stopped {
            return;
        }
        self.queue.push_audio(frame);
        if self.status != SessionStatus::Paused {
            self.set_status(SessionStatus::Responding);
        }
        self.drain().await;
    }

    async fn on_transport_closed(&mut self, reason: Option<String>) {
        if self.stopped {
            return;
        }
        let reason = reason.unwrap_or_else(|| "connection closed".to_string());
        self.fail(BotError::Transport(reason)).await;
    }

    fn enqueue(&mut self, items: impl IntoIterator<Item = ResponseItem>) {
        self.queue.push(items);
        if self.status != SessionStatus::Paused {
            self.set_status(SessionStatus::Responding);
        }
    }

    fn set_language(&mut self, locale: &str) {
        if self.identity.language == locale {
            return;
        }
        tracing::info!("language changed to {}", locale);
        self.identity.language = locale.to_string();
        if let Some(engine) = self.speech.as_mut() {
            engine.set_language(locale);
        }
    }

    async fn drain(&mut self) {
        if self.status == SessionStatus::Paused {
            return;
        }
        let step = self.queue.start_drain();
        self.run(step).await;
    }

    async fn run(&mut self, mut step: DrainStep) {
        loop {
            match step {
                DrainStep::Busy => return,
                DrainStep::Drained => {
                    self.on_drained().await;
                    return;
                }
                DrainStep::Deliver(entry) => {
                    if self.present(entry) {
                        return;
                    }
                    step = self.queue.complete_current();
                }
            }
        }
    }

    /// Hands one entry to the UI. Returns true when the queue has to wait for a completion.
    fn present(&mut self, entry: QueuedEntry) -> bool {
        self.generation += 1;
        match entry {
            QueuedEntry::Audio(frame) => {
                if !self.options.output_audio {
                    return false;
                }
                self.handler.play_audio(AudioSource::Frame(frame), self.completion());
                true
            }
            QueuedEntry::Item(item) => self.present_item(item),
        }
    }

    fn present_item(&mut self, item: ResponseItem) -> bool {
        if let Some(command) = item.command() {
            self.turn_log.add(LogLevel::Info, &format!("command: {}", command));
            self.handler.handle_command(command, item.payload());
            if command == WALK_COMMAND {
                self.waiting_for_record = true;
                return true;
            }
            return false;
        }

        let plays_audio = self.options.output_audio && item.audio().is_some();
        let text = if self.options.mask && plays_audio {
            ""
        } else {
            item.text()
        };
        if !text.is_empty() || item.image().is_some() || item.background().is_some() {
            self.handler.add_message(BotMessage {
                kind: MessageKind::Received,
                text: text.to_string(),
                image: item.image().map(str::to_string),
                background: item.background().map(str::to_string),
                signal: MessageSignal::Bot {
                    node_id: item.node_id(),
                },
            });
        }

        if let Some(video) = item.video() {
            self.handler.add_video(video, self.completion());
            return true;
        }
        match item.audio() {
            Some(audio) if plays_audio => {
                self.handler
                    .play_audio(AudioSource::Uri(audio.to_string()), self.completion());
                true
            }
            _ => false,
        }
    }

    fn completion(&self) -> Completion {
        Completion::new(self.generation, self.inputs.clone())
    }

    async fn on_playback_finished(&mut self, generation: u64) {
        if generation != self.generation || !self.queue.is_running() || self.waiting_for_record {
            tracing::debug!("ignoring stale playback completion {}", generation);
            return;
        }
        if self.status == SessionStatus::Paused {
            self.completed_while_paused = true;
            return;
        }
        self.advance().await;
    }

    async fn advance(&mut self) {
        self.completed_while_paused = false;
        let step = self.queue.complete_current();
        self.run(step).await;
    }

    /// Advances past a `walk` command once the embedder recorded it.
    pub async fn add_record(&mut self) {
        if !self.waiting_for_record {
            tracing::debug!("add_record without a pending walk command");
            return;
        }
        self.waiting_for_record = false;
        if self.status == SessionStatus::Paused {
            self.completed_while_paused = true;
            return;
        }
        self.advance().await;
    }

    async fn on_drained(&mut self) {
        if self.awaiting_response || self.stopped {
            return;
        }
        if self.session_ended || self.identity.session_id.is_none() || self.deadline_passed() {
            self.go_sleep().await;
            return;
        }
        self.set_status(SessionStatus::Listening);
        if self.voice_turn && self.options.input_audio && self.speech.is_some() && self.capture == CaptureState::Closed {
            self.reopen_at = Some(Instant::now() + Duration::from_millis(CAPTURE_REOPEN_DEBOUNCE_MS));
        }
    }

    fn deadline_passed(&self) -> bool {
        self.sleep_deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    async fn go_sleep(&mut self) {
        if self.status == SessionStatus::Sleeping {
            return;
        }
        self.clear_timers();
        self.stop_capture(false).await;
        self.flush_logs().await;
        self.assign_session_id(None);
        self.play_sound(Sound::BotSleep);
        self.set_status(SessionStatus::Sleeping);
        self.handler.on_end();
    }

    /// Tears the session down; safe to call any number of times.
    pub async fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        self.skip_playback();
        self.clear_timers();
        self.awaiting_response = false;
        self.session_ended = false;
        self.voice_turn = false;
        self.stop_capture(false).await;
        self.flush_logs().await;
        self.transport.close().await;
        self.assign_session_id(None);

        let was_sleeping = self.status == SessionStatus::Sleeping;
        self.set_status(SessionStatus::Sleeping);
        if !was_sleeping {
            self.handler.on_end();
        }
    }

    /// Stops the session and releases the speech engine.
    pub async fn shutdown(&mut self) {
        self.stop().await;
        if let Some(engine) = self.speech.as_mut() {
            if let Err(e) = engine.close().await {
                tracing::warn!("failed to close speech input: {}", e);
            }
        }
    }

    async fn fail(&mut self, error: BotError) {
        self.turn_log.add(LogLevel::Error, &error.to_string());
        self.flush_logs().await;
        self.handler.on_error(&error);
        if matches!(error, BotError::Server(_)) {
            self.play_sound(Sound::BotError);
        }
        self.stop().await;
    }

    fn clear_timers(&mut self) {
        self.sleep_deadline = None;
        self.reopen_at = None;
    }

    async fn flush_logs(&mut self) {
        if self.turn_log.is_empty() {
            return;
        }
        let entries = self.turn_log.take();
        self.transport.send_logs(entries).await;
    }

    fn assign_session_id(&mut self, session_id: Option<String>) {
        if let Some(id) = &session_id {
            tracing::info!("session id {}", id);
        }
        self.identity.session_id = session_id.clone();
        self.transport.set_session_id(session_id);
    }

    fn set_status(&mut self, status: SessionStatus) {
        if self.status == status {
            return;
        }
        tracing::info!("status {} -> {}", self.status, status);
        self.status = status;
        self.handler.set_status(status);
        self.status_tx.send_replace(status);
    }

    fn play_sound(&self, sound: Sound) {
        if self.options.allowed_sounds.contains(&sound) {
            self.handler.play_sound(sound);
        }
    }

    async fn start_capture(&mut self) {
        if self.speech.is_none() {
            tracing::debug!("no speech input to start");
            return;
        }
        if self.capture != CaptureState::Closed {
            return;
        }

        self.reopen_at = None;
        self.capture = CaptureState::Opening;
        self.flush_logs().await;
        let started = match self.speech.as_mut() {
            Some(engine) => engine.start().await,
            None => return,
        };
        match started {
            Ok(()) => {
                self.capture = CaptureState::Open;
                self.voice_turn = true;
                self.turn_log.add(LogLevel::Info, "audio capture started");
                self.set_status(SessionStatus::Listening);
            }
            Err(e) => {
                self.capture = CaptureState::Closed;
                self.on_capture_failure(e).await;
            }
        }
    }

    async fn on_capture_failure(&mut self, error: BotError) {
        let error = match error {
            BotError::SpeechEngine(_) => error,
            other => BotError::SpeechEngine(other.to_string()),
        };
        if self.options.save_session {
            self.turn_log
                .add(LogLevel::Warn, &format!("continuing without speech input: {}", error));
            self.options.input_audio = false;
            self.voice_turn = false;
            self.set_status(SessionStatus::Listening);
        } else {
            self.fail(error).await;
        }
    }

    async fn stop_capture(&mut self, send_event: bool) {
        if !matches!(self.capture, CaptureState::Open | CaptureState::Opening) {
            return;
        }
        let stopped = match self.speech.as_mut() {
            Some(engine) => engine.stop(send_event).await,
            None => Ok(()),
        };
        self.capture = CaptureState::Closed;
        if let Err(e) = stopped {
            tracing::warn!("failed to stop speech input: {}", e);
        }
    }

    async fn on_speech_event(&mut self, event: SpeechEvent) {
        if self.stopped {
            return;
        }
        match event {
            SpeechEvent::Transcript {
                text, is_final: true, ..
            } => self.on_final_transcript(&text).await,
            SpeechEvent::Transcript { text, .. } => self.handler.interim_transcript(&text),
            SpeechEvent::AudioInputEnded => {
                if self.capture == CaptureState::Closed {
                    return;
                }
                self.capture = CaptureState::Closed;
                self.turn_log.add(LogLevel::Info, "audio input ended");
                if self.deadline_passed() || self.identity.session_id.is_none() {
                    self.go_sleep().await;
                } else {
                    self.voice_turn = false;
                }
            }
            SpeechEvent::Error(error) => {
                self.capture = CaptureState::Closed;
                self.on_capture_failure(BotError::SpeechEngine(error)).await;
            }
        }
    }

    async fn on_final_transcript(&mut self, text: &str) {
        self.stop_capture(false).await;
        self.submit_text(text, true, TextInputOptions::default(), MessageSignal::Spoken)
            .await;
    }

    /// Submits a typed turn.
    pub async fn handle_on_text_input(&mut self, text: &str, audio_on: bool, options: TextInputOptions) {
        self.submit_text(text, audio_on, options, MessageSignal::Typed).await;
    }

    async fn submit_text(&mut self, text: &str, audio_on: bool, options: TextInputOptions, signal: MessageSignal) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }

        let skipped = self.skip_playback();
        if skipped.command_consumed {
            self.turn_log
                .add(LogLevel::Info, &format!("input dropped after pending action: {}", text));
            self.on_drained().await;
            return;
        }

        if !self.transport.is_open() {
            if let Err(e) = self.connect().await {
                self.fail(e).await;
                return;
            }
        }

        self.clear_timers();
        self.session_ended = false;
        self.voice_turn = audio_on && self.options.input_audio;
        self.turn_log.add(LogLevel::Info, &format!("input: {}", text));
        self.flush_logs().await;

        if !options.hidden {
            self.handler.add_message(BotMessage {
                kind: MessageKind::Sent,
                text: text.to_string(),
                image: None,
                background: None,
                signal,
            });
        }
        self.set_status(SessionStatus::Processing);
        self.awaiting_response = true;

        let mut attributes = self.handler.attributes();
        attributes.extend(options.attributes);
        let input = client::Input::new(text, &self.identity.language, &self.options.zone_id).with_attributes(attributes);
        if let Err(e) = self.transport.send_text(input).await {
            self.fail(e).await;
        }
    }

    /// Drops whatever is playing or queued (barge-in).
    fn skip_playback(&mut self) -> SkipOutcome {
        let interrupted = self.queue.in_flight().is_some();
        let outcome = self.queue.skip();
        self.generation += 1;
        self.completed_while_paused = false;
        self.waiting_for_record = false;
        if interrupted {
            self.handler.stop_playback();
        }
        if outcome.skipped > 0 {
            tracing::debug!("skipped {} queued entries", outcome.skipped);
        }
        outcome
    }

    pub fn pause(&mut self) {
        if self.status != SessionStatus::Responding {
            return;
        }
        self.set_status(SessionStatus::Paused);
        self.handler.pause_playback();
    }

    pub async fn resume(&mut self) {
        if self.status != SessionStatus::Paused {
            return;
        }
        if self.options.output_audio {
            self.set_status(SessionStatus::Responding);
            self.handler.resume_playback();
            if self.completed_while_paused {
                self.advance().await;
            } else if !self.queue.is_running() {
                self.drain().await;
            }
        } else {
            self.set_status(SessionStatus::Listening);
            self.handler.stop_playback();
            self.generation += 1;
            if !self.queue.is_running() {
                self.drain().await;
            } else if !self.waiting_for_record {
                self.advance().await;
            }
        }
    }

    /// Reacts to the main button, given the status the UI shows.
    pub async fn click(&mut self, status: SessionStatus) {
        match status {
            SessionStatus::Sleeping | SessionStatus::Unstarted => {
                if let Some(message) = self.options.start_message.clone() {
                    let audio_on = self.options.input_audio;
                    self.submit_text(&message, audio_on, TextInputOptions::hidden(), MessageSignal::Typed)
                        .await;
                    return;
                }
                if !self.transport.is_open() {
                    if let Err(e) = self.connect().await {
                        self.fail(e).await;
                        return;
                    }
                }
                if self.options.input_audio && self.speech.is_some() {
                    self.start_capture().await;
                } else {
                    self.set_status(SessionStatus::Listening);
                }
            }
            SessionStatus::Listening => {
                if self.capture == CaptureState::Open {
                    self.close_audio_stream(CaptureOrigin::User, true).await;
                } else {
                    self.start_capture().await;
                }
            }
            SessionStatus::Responding => {
                self.skip_playback();
                if self.options.input_audio && self.speech.is_some() {
                    self.start_capture().await;
                } else {
                    self.on_drained().await;
                }
            }
            SessionStatus::Paused => self.resume().await,
            SessionStatus::Processing => tracing::debug!("click ignored while processing"),
        }
    }

    pub async fn set_in_audio(&mut self, enabled: bool) {
        self.options.input_audio = enabled;
        if enabled {
            if self.status == SessionStatus::Listening {
                self.start_capture().await;
            }
        } else {
            self.close_audio_stream(CaptureOrigin::User, true).await;
        }
    }

    pub async fn set_out_audio(&mut self, enabled: bool) {
        self.options.output_audio = enabled;
        if enabled {
            return;
        }
        let playing_audio = match self.queue.in_flight() {
            Some(QueuedEntry::Audio(_)) => true,
            Some(QueuedEntry::Item(item)) => item.audio().is_some() && item.video().is_none() && !item.is_command(),
            None => false,
        };
        if !playing_audio {
            return;
        }
        self.handler.stop_playback();
        self.generation += 1;
        if self.status == SessionStatus::Paused {
            self.completed_while_paused = true;
        } else {
            self.advance().await;
        }
    }

    pub async fn on_stop_click(&mut self) {
        self.stop().await;
    }

    pub async fn close_audio_stream(&mut self, origin: CaptureOrigin, send_event: bool) {
        self.turn_log
            .add(LogLevel::Info, &format!("audio stream closed by {}", origin));
        self.reopen_at = None;
        self.stop_capture(send_event).await;
        if origin == CaptureOrigin::User {
            self.voice_turn = false;
        }
    }

    /// When the driver should call [`SessionStateMachine::on_wakeup`] next.
    pub fn next_wakeup(&self) -> Option<Instant> {
        let deadline = self.sleep_deadline.filter(|_| self.is_idle_listening());
        match (self.reopen_at, deadline) {
            (Some(reopen), Some(deadline)) => Some(reopen.min(deadline)),
            (reopen, deadline) => reopen.or(deadline),
        }
    }

    pub async fn on_wakeup(&mut self) {
        if self.is_idle_listening() && self.deadline_passed() {
            self.go_sleep().await;
            return;
        }
        if self.reopen_at.is_some_and(|at| at <= Instant::now()) {
            self.reopen_at = None;
            if self.status == SessionStatus::Listening && self.options.input_audio {
                self.start_capture().await;
            }
        }
    }

    /// Listening with nothing queued, nothing awaited and no open microphone.
    fn is_idle_listening(&self) -> bool {
        self.status == SessionStatus::Listening
            && self.queue.is_idle()
            && !self.awaiting_response
            && self.capture == CaptureState::Closed
    }
}
