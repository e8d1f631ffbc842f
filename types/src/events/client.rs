use crate::LogEntry;

/// Client-side settings announced in the `Init` handshake.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitConfig {
    /// Whether the server should synthesize speech.
    pub tts: bool,
    pub stt_sample_rate: u32,
    /// Container of synthesized audio, e.g. "mp3".
    pub tts_file_type: String,
    pub locale: String,
    pub zone_id: String,
    pub voice: Option<String>,
    /// Stream each item as a `ResponseItem` event before the final `Response`.
    pub send_response_items: bool,
    pub stt_interim_results: bool,
}

impl Default for InitConfig {
    fn default() -> Self {
        Self {
            tts: true,
            stt_sample_rate: 16000,
            tts_file_type: "mp3".to_string(),
            locale: "en".to_string(),
            zone_id: "UTC".to_string(),
            voice: None,
            send_response_items: false,
            stt_interim_results: false,
        }
    }
}

/// `Init` event
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitEvent {
    key: String,
    app_key: String,
    device_id: String,
    sender: String,
    token: Option<String>,
    config: InitConfig,
}

impl InitEvent {
    pub fn new(app_key: &str, device_id: &str, sender: &str, config: InitConfig) -> Self {
        Self {
            key: app_key.to_string(),
            app_key: app_key.to_string(),
            device_id: device_id.to_string(),
            sender: sender.to_string(),
            token: None,
            config,
        }
    }

    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    pub fn app_key(&self) -> &str {
        &self.app_key
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn config(&self) -> &InitConfig {
        &self.config
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Transcript {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Input {
    pub zone_id: String,
    pub locale: String,
    pub attributes: serde_json::Map<String, serde_json::Value>,
    pub transcript: Transcript,
}

impl Input {
    pub fn new(text: &str, locale: &str, zone_id: &str) -> Self {
        Self {
            zone_id: zone_id.to_string(),
            locale: locale.to_string(),
            attributes: serde_json::Map::new(),
            transcript: Transcript {
                text: text.to_string(),
            },
        }
    }

    pub fn with_attributes(mut self, attributes: serde_json::Map<String, serde_json::Value>) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn text(&self) -> &str {
        &self.transcript.text
    }
}

/// `Input` event
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct InputEvent {
    input: Input,
}

impl InputEvent {
    pub fn new(input: Input) -> Self {
        Self { input }
    }

    pub fn input(&self) -> &Input {
        &self.input
    }
}

/// `Log` event
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LogEvent {
    entries: Vec<LogEntry>,
}

impl LogEvent {
    pub fn new(entries: Vec<LogEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioStreamMessage {
    pub app_key: String,
    pub device_id: String,
    pub sender: String,
    pub token: Option<String>,
    pub session_id: Option<String>,
}

/// `InputAudioStreamOpen` event, sent before raw microphone frames.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct InputAudioStreamOpenEvent {
    message: AudioStreamMessage,
}

impl InputAudioStreamOpenEvent {
    pub fn new(message: AudioStreamMessage) -> Self {
        Self { message }
    }

    pub fn message(&self) -> &AudioStreamMessage {
        &self.message
    }
}

/// `InputAudioStreamClose` event
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputAudioStreamCloseEvent {
    app_key: String,
}

impl InputAudioStreamCloseEvent {
    pub fn new(app_key: &str) -> Self {
        Self {
            app_key: app_key.to_string(),
        }
    }

    pub fn app_key(&self) -> &str {
        &self.app_key
    }
}
