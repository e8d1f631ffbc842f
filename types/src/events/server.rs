use crate::{LogEntry, ResponseItem};

/// `Ready` event: the server accepted `Init`.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct ReadyEvent {}

/// `SessionStarted` event
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStartedEvent {
    session_id: String,
}

impl SessionStartedEvent {
    pub fn new(session_id: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

/// `Response` event: the final answer of a turn.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEvent {
    #[serde(default)]
    items: Vec<ResponseItem>,

    locale: Option<String>,

    /// Seconds of inactivity after which the session goes to sleep; 0 disables it.
    #[serde(default)]
    sleep_timeout: u64,

    #[serde(default)]
    logs: Vec<LogEntry>,

    #[serde(default)]
    session_ended: bool,
}

impl ResponseEvent {
    pub fn new(items: Vec<ResponseItem>) -> Self {
        Self {
            items,
            ..Default::default()
        }
    }

    pub fn with_locale(mut self, locale: &str) -> Self {
        self.locale = Some(locale.to_string());
        self
    }

    pub fn with_sleep_timeout(mut self, seconds: u64) -> Self {
        self.sleep_timeout = seconds;
        self
    }

    pub fn with_logs(mut self, logs: Vec<LogEntry>) -> Self {
        self.logs = logs;
        self
    }

    pub fn with_session_ended(mut self, session_ended: bool) -> Self {
        self.session_ended = session_ended;
        self
    }

    pub fn items(&self) -> &[ResponseItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<ResponseItem> {
        self.items
    }

    pub fn locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }

    pub fn sleep_timeout(&self) -> u64 {
        self.sleep_timeout
    }

    pub fn logs(&self) -> &[LogEntry] {
        &self.logs
    }

    pub fn session_ended(&self) -> bool {
        self.session_ended
    }
}

/// `ResponseItem` event: one item streamed ahead of the final `Response`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseItemEvent {
    response_item: ResponseItem,
    tts_config: Option<serde_json::Value>,
}

impl ResponseItemEvent {
    pub fn new(response_item: ResponseItem) -> Self {
        Self {
            response_item,
            tts_config: None,
        }
    }

    pub fn response_item(&self) -> &ResponseItem {
        &self.response_item
    }

    pub fn into_response_item(self) -> ResponseItem {
        self.response_item
    }

    pub fn tts_config(&self) -> Option<&serde_json::Value> {
        self.tts_config.as_ref()
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognizedItem {
    pub text: String,
    #[serde(default)]
    pub is_final: bool,
}

#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct RecognizedMessage {
    #[serde(default)]
    pub items: Vec<RecognizedItem>,
}

/// `Recognized` event: speech recognized from the relayed audio stream.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RecognizedEvent {
    message: RecognizedMessage,
}

impl RecognizedEvent {
    pub fn new(text: &str, is_final: bool) -> Self {
        Self {
            message: RecognizedMessage {
                items: vec![RecognizedItem {
                    text: text.to_string(),
                    is_final,
                }],
            },
        }
    }

    /// The leading recognition hypothesis, if any.
    pub fn first(&self) -> Option<&RecognizedItem> {
        self.message.items.first()
    }

    pub fn message(&self) -> &RecognizedMessage {
        &self.message
    }
}

/// `InputAudioStreamOpen` acknowledgement from the server.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct InputAudioStreamOpenedEvent {}

/// `Error` event
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ErrorEvent {
    #[serde(default)]
    text: String,
}

impl ErrorEvent {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// `SessionEnded` event
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct SessionEndedEvent {}
