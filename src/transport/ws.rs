use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc};
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use super::{Transport, TransportEvent, TransportRx};
use crate::config::Config;
use crate::consts::KEEP_ALIVE_INTERVAL_SECS;
use crate::error::{BotError, Result};
use crate::types::events::client::{
    AudioStreamMessage, InitEvent, Input, InputAudioStreamCloseEvent, InputAudioStreamOpenEvent,
    InputEvent, LogEvent,
};
use crate::types::{ClientEvent, LogEntry};

type ClientTx = mpsc::Sender<Outgoing>;
type ServerTx = broadcast::Sender<TransportEvent>;

enum Outgoing {
    Event(ClientEvent),
    Audio(Vec<u8>),
    Ping,
    Close,
}

struct Connection {
    c_tx: ClientTx,
    send_handle: tokio::task::JoinHandle<()>,
    recv_handle: tokio::task::JoinHandle<()>,
}

#[derive(Default)]
struct State {
    connection: Option<Connection>,
    init: Option<InitEvent>,
    session_id: Option<String>,
    keep_alive: Option<CancellationToken>,
}

/// `Transport` over a WebSocket.
pub struct WsTransport {
    config: Config,
    s_tx: ServerTx,
    open: Arc<AtomicBool>,
    state: Mutex<State>,
}

impl WsTransport {
    pub fn new(config: Config) -> Self {
        let (s_tx, _) = broadcast::channel(config.channel_capacity());
        Self {
            config,
            s_tx,
            open: Arc::new(AtomicBool::new(false)),
            state: Mutex::new(State::default()),
        }
    }

    fn sender(&self) -> Option<ClientTx> {
        let state = self.state.lock().ok()?;
        state.connection.as_ref().map(|c| c.c_tx.clone())
    }

    async fn send_event(&self, event: ClientEvent) {
        let Some(tx) = self.sender() else {
            tracing::debug!("transport closed, dropping {}", event.type_name());
            return;
        };
        if let Err(e) = tx.send(Outgoing::Event(event)).await {
            tracing::warn!("failed to queue outgoing event: {}", e);
        }
    }

    fn start_keep_alive(state: &mut State) {
        if state.keep_alive.is_some() {
            return;
        }
        let Some(tx) = state.connection.as_ref().map(|c| c.c_tx.clone()) else {
            return;
        };
        let token = CancellationToken::new();
        let cancelled = token.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(KEEP_ALIVE_INTERVAL_SECS));
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                tokio::select! {
                    biased;
                    _ = cancelled.cancelled() => break,
                    _ = interval.tick() => {
                        if tx.send(Outgoing::Ping).await.is_err() {
                            break;
                        }
                        tracing::trace!("keep-alive ping sent");
                    }
                }
            }
        });
        state.keep_alive = Some(token);
    }

    fn stop_keep_alive(state: &mut State) {
        if let Some(token) = state.keep_alive.take() {
            token.cancel();
        }
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn open(&self, init: InitEvent) -> Result<()> {
        if self.is_open() {
            tracing::debug!("transport already open");
            return Ok(());
        }

        let request = super::utils::build_request(&self.config)?;
        let (ws_stream, _) = tokio_tungstenite::connect_async(request).await?;
        let (mut write, mut read) = ws_stream.split();

        let (c_tx, mut c_rx) = mpsc::channel::<Outgoing>(self.config.channel_capacity());

        let send_handle = tokio::spawn(async move {
            while let Some(outgoing) = c_rx.recv().await {
                let message = match outgoing {
                    Outgoing::Event(event) => match serde_json::to_string(&event) {
                        Ok(text) => {
                            tracing::debug!("sending message: {}", event.type_name());
                            Message::Text(text)
                        }
                        Err(e) => {
                            tracing::error!("failed to serialize event: {}", e);
                            continue;
                        }
                    },
                    Outgoing::Audio(frame) => Message::Binary(frame),
                    Outgoing::Ping => Message::Ping(Vec::new()),
                    Outgoing::Close => {
                        if let Err(e) = write.close().await {
                            tracing::debug!("failed to close socket: {}", e);
                        }
                        break;
                    }
                };
                if let Err(e) = write.send(message).await {
                    tracing::error!("failed to send message: {}", e);
                }
            }
        });

        let s_tx = self.s_tx.clone();
        let open = self.open.clone();
        let recv_handle = tokio::spawn(async move {
            while let Some(message) = read.next().await {
                let message = match message {
                    Err(e) => {
                        tracing::error!("failed to read message: {}", e);
                        open.store(false, Ordering::SeqCst);
                        let _ = s_tx.send(TransportEvent::Error(e.to_string()));
                        return;
                    }
                    Ok(message) => message,
                };
                match message {
                    Message::Text(text) => match serde_json::from_str::<crate::types::ServerEvent>(&text) {
                        Ok(event) => {
                            tracing::debug!("received message: {}", event.type_name());
                            if let Err(e) = s_tx.send(TransportEvent::Envelope(event)) {
                                tracing::error!("failed to send event: {}", e);
                            }
                        }
                        Err(e) => {
                            tracing::error!("failed to deserialize event: {}, text=> {:?}", e, text);
                        }
                    },
                    Message::Binary(bin) => {
                        tracing::debug!("received audio frame: {} bytes", bin.len());
                        if let Err(e) = s_tx.send(TransportEvent::Audio(bin)) {
                            tracing::error!("failed to send audio frame: {}", e);
                        }
                    }
                    Message::Close(reason) => {
                        tracing::info!("connection closed: {:?}", reason);
                        open.store(false, Ordering::SeqCst);
                        let _ = s_tx.send(TransportEvent::Closed(reason.map(|r| r.reason.to_string())));
                        return;
                    }
                    _ => {}
                }
            }
            open.store(false, Ordering::SeqCst);
            let _ = s_tx.send(TransportEvent::Closed(None));
        });

        {
            let mut state = self
                .state
                .lock()
                .map_err(|_| BotError::Transport("transport state poisoned".to_string()))?;
            // Pings of a previous connection must not outlive it.
            Self::stop_keep_alive(&mut state);
            let previous = state.connection.replace(Connection {
                c_tx: c_tx.clone(),
                send_handle,
                recv_handle,
            });
            if let Some(previous) = previous {
                previous.recv_handle.abort();
            }
            state.init = Some(init.clone());
            if state.session_id.is_some() {
                Self::start_keep_alive(&mut state);
            }
        }
        self.open.store(true, Ordering::SeqCst);

        tracing::info!("connected to {}", self.config.url());
        c_tx.send(Outgoing::Event(ClientEvent::Init(init)))
            .await
            .map_err(|e| BotError::Transport(e.to_string()))
    }

    async fn send_text(&self, input: Input) -> Result<()> {
        if !self.is_open() {
            return Err(BotError::TransportNotReady);
        }
        let tx = self.sender().ok_or(BotError::TransportNotReady)?;
        tx.send(Outgoing::Event(ClientEvent::Input(InputEvent::new(input))))
            .await
            .map_err(|e| BotError::Transport(e.to_string()))
    }

    async fn send_logs(&self, entries: Vec<LogEntry>) {
        if entries.is_empty() {
            return;
        }
        self.send_event(ClientEvent::Log(LogEvent::new(entries))).await;
    }

    async fn send_audio_open(&self) {
        let message = {
            let Ok(state) = self.state.lock() else {
                return;
            };
            let Some(init) = state.init.as_ref() else {
                return;
            };
            AudioStreamMessage {
                app_key: init.app_key().to_string(),
                device_id: init.device_id().to_string(),
                sender: init.sender().to_string(),
                token: init.token().map(str::to_string),
                session_id: state.session_id.clone(),
            }
        };
        self.send_event(ClientEvent::InputAudioStreamOpen(InputAudioStreamOpenEvent::new(message)))
            .await;
    }

    async fn send_audio_close(&self) {
        let app_key = self.config.app_key().to_string();
        self.send_event(ClientEvent::InputAudioStreamClose(InputAudioStreamCloseEvent::new(&app_key)))
            .await;
    }

    async fn send_audio_frame(&self, frame: Vec<u8>) {
        if let Some(tx) = self.sender() {
            if let Err(e) = tx.send(Outgoing::Audio(frame)).await {
                tracing::warn!("failed to queue audio frame: {}", e);
            }
        }
    }

    async fn close(&self) {
        let connection = match self.state.lock() {
            Ok(mut state) => {
                Self::stop_keep_alive(&mut state);
                state.connection.take()
            }
            Err(_) => None,
        };
        self.open.store(false, Ordering::SeqCst);

        if let Some(connection) = connection {
            let _ = connection.c_tx.send(Outgoing::Close).await;
            drop(connection.c_tx);
            if let Err(e) = connection.send_handle.await {
                tracing::debug!("send task ended abnormally: {}", e);
            }
            connection.recv_handle.abort();
            tracing::info!("transport closed");
        }
    }

    fn set_session_id(&self, session_id: Option<String>) {
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        match session_id {
            Some(id) => {
                state.session_id = Some(id);
                Self::start_keep_alive(&mut state);
            }
            None => {
                state.session_id = None;
                Self::stop_keep_alive(&mut state);
            }
        }
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    fn subscribe(&self) -> TransportRx {
        self.s_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::events::client::InitConfig;
    use crate::types::LogLevel;

    fn transport() -> WsTransport {
        WsTransport::new(Config::builder().with_url("ws://127.0.0.1:9/socket/").build())
    }

    #[tokio::test]
    async fn send_text_requires_open_channel() {
        let transport = transport();
        let result = transport.send_text(Input::new("hello", "en", "UTC")).await;
        assert_eq!(result, Err(BotError::TransportNotReady));
    }

    #[tokio::test]
    async fn fire_and_forget_sends_are_noops_when_closed() {
        let transport = transport();
        transport.send_audio_open().await;
        transport.send_audio_close().await;
        transport.send_audio_frame(vec![0, 1]).await;
        transport.send_logs(Vec::new()).await;
        transport.close().await;
        transport.close().await;
        assert!(!transport.is_open());
    }

    #[tokio::test]
    async fn session_id_without_connection_starts_no_keep_alive() {
        let transport = transport();
        transport.set_session_id(Some("s-1".to_string()));
        assert!(transport.state.lock().unwrap().keep_alive.is_none());
        transport.set_session_id(None);
        assert!(transport.state.lock().unwrap().session_id.is_none());
    }

    async fn loopback_server() -> (String, mpsc::UnboundedReceiver<Message>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}/socket/", listener.local_addr().unwrap());
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            while let Some(Ok(message)) = ws.next().await {
                let closed = message.is_close();
                if tx.send(message).is_err() || closed {
                    break;
                }
            }
        });
        (url, rx)
    }

    #[tokio::test(start_paused = true)]
    async fn init_first_then_pings_while_session_id_is_set() {
        let (url, mut frames) = loopback_server().await;
        let transport = WsTransport::new(Config::builder().with_url(&url).with_app_key("app").build());
        transport
            .open(InitEvent::new("app", "device", "sender", InitConfig::default()))
            .await
            .unwrap();
        assert!(transport.is_open());

        let Some(Message::Text(first)) = frames.recv().await else {
            panic!("expected Init as the first frame");
        };
        let init: serde_json::Value = serde_json::from_str(&first).unwrap();
        assert_eq!(init["type"], "Init");
        assert_eq!(init["appKey"], "app");

        let started = tokio::time::Instant::now();
        transport.set_session_id(Some("s-1".to_string()));
        assert!(matches!(frames.recv().await, Some(Message::Ping(_))));
        assert!(started.elapsed() >= Duration::from_secs(KEEP_ALIVE_INTERVAL_SECS));

        // Everything queued after the log entry was sent with no session id.
        transport.set_session_id(None);
        transport
            .send_logs(vec![LogEntry::new(chrono::Utc::now(), 0.0, LogLevel::Info, "marker")])
            .await;
        tokio::time::sleep(Duration::from_secs(KEEP_ALIVE_INTERVAL_SECS * 3)).await;
        transport.close().await;

        let mut seen_marker = false;
        let mut after_marker = Vec::new();
        while let Some(message) = frames.recv().await {
            match message {
                Message::Text(text) if text.contains("marker") => seen_marker = true,
                other if seen_marker => after_marker.push(other),
                _ => {}
            }
        }
        assert!(seen_marker);
        assert!(!after_marker.iter().any(|m| matches!(m, Message::Ping(_))));
        assert!(after_marker.iter().any(|m| m.is_close()));
    }
}
