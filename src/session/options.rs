use super::handler::Sound;

/// Settings of one bot session, as passed to `init`.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub(crate) app_key: String,
    pub(crate) language: String,
    pub(crate) device_id: String,
    pub(crate) token: Option<String>,
    pub(crate) input_audio: bool,
    pub(crate) output_audio: bool,
    pub(crate) start_message: Option<String>,
    pub(crate) auto_start: bool,
    /// Hide bot text while its audio is played.
    pub(crate) mask: bool,
    pub(crate) allowed_sounds: Vec<Sound>,
    /// Keep the session alive in text-only mode when the microphone fails.
    pub(crate) save_session: bool,
    pub(crate) zone_id: String,
    pub(crate) voice: Option<String>,
    pub(crate) tts: bool,
    pub(crate) tts_file_type: String,
    pub(crate) stt_sample_rate: u32,
    pub(crate) stt_interim_results: bool,
    pub(crate) send_response_items: bool,
}

impl SessionOptions {
    pub fn new(app_key: &str) -> Self {
        Self {
            app_key: app_key.to_string(),
            language: "en".to_string(),
            device_id: uuid::Uuid::new_v4().to_string(),
            token: None,
            input_audio: true,
            output_audio: true,
            start_message: None,
            auto_start: false,
            mask: false,
            allowed_sounds: Sound::all(),
            save_session: false,
            zone_id: "UTC".to_string(),
            voice: None,
            tts: true,
            tts_file_type: "mp3".to_string(),
            stt_sample_rate: bot_session_utils::audio::DEFAULT_STT_SAMPLE_RATE,
            stt_interim_results: false,
            send_response_items: false,
        }
    }

    pub fn with_language(mut self, language: &str) -> Self {
        self.language = language.to_string();
        self
    }

    /// Device identifier persisted by the embedder; a random one is used otherwise.
    pub fn with_device_id(mut self, device_id: &str) -> Self {
        self.device_id = device_id.to_string();
        self
    }

    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    pub fn with_input_audio(mut self, enabled: bool) -> Self {
        self.input_audio = enabled;
        self
    }

    pub fn with_output_audio(mut self, enabled: bool) -> Self {
        self.output_audio = enabled;
        self
    }

    pub fn with_start_message(mut self, message: &str) -> Self {
        self.start_message = Some(message.to_string());
        self
    }

    /// Send the start message as soon as the server is ready.
    pub fn with_auto_start(mut self, auto_start: bool) -> Self {
        self.auto_start = auto_start;
        self
    }

    pub fn with_mask(mut self, mask: bool) -> Self {
        self.mask = mask;
        self
    }

    pub fn with_allowed_sounds(mut self, sounds: Vec<Sound>) -> Self {
        self.allowed_sounds = sounds;
        self
    }

    pub fn with_save_session(mut self, save_session: bool) -> Self {
        self.save_session = save_session;
        self
    }

    pub fn with_zone_id(mut self, zone_id: &str) -> Self {
        self.zone_id = zone_id.to_string();
        self
    }

    pub fn with_voice(mut self, voice: &str) -> Self {
        self.voice = Some(voice.to_string());
        self
    }

    pub fn with_tts(mut self, tts: bool) -> Self {
        self.tts = tts;
        self
    }

    pub fn with_tts_file_type(mut self, file_type: &str) -> Self {
        self.tts_file_type = file_type.to_string();
        self
    }

    pub fn with_stt_sample_rate(mut self, rate: u32) -> Self {
        self.stt_sample_rate = rate;
        self
    }

    pub fn with_stt_interim_results(mut self, enabled: bool) -> Self {
        self.stt_interim_results = enabled;
        self
    }

    /// Ask the server to stream items as `ResponseItem` events; `Response` items are then not queued again.
    pub fn with_send_response_items(mut self, enabled: bool) -> Self {
        self.send_response_items = enabled;
        self
    }

    pub fn app_key(&self) -> &str {
        &self.app_key
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn input_audio(&self) -> bool {
        self.input_audio
    }

    pub fn output_audio(&self) -> bool {
        self.output_audio
    }

    pub fn stt_sample_rate(&self) -> u32 {
        self.stt_sample_rate
    }

    pub fn stt_interim_results(&self) -> bool {
        self.stt_interim_results
    }
}

/// Per-call options of a text submission.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextInputOptions {
    /// Do not echo the text as a sent message.
    pub hidden: bool,
    /// Merged over the handler's attributes.
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

impl TextInputOptions {
    pub fn hidden() -> Self {
        Self {
            hidden: true,
            ..Default::default()
        }
    }
}

/// Who asked for the audio stream to close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureOrigin {
    User,
    Bot,
    Silence,
    Error,
}

impl std::fmt::Display for CaptureOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CaptureOrigin::User => "user",
            CaptureOrigin::Bot => "bot",
            CaptureOrigin::Silence => "silence",
            CaptureOrigin::Error => "error",
        };
        f.write_str(name)
    }
}

/// Who this client is and which server session it belongs to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionIdentity {
    pub device_id: String,
    pub session_id: Option<String>,
    pub app_key: String,
    pub language: String,
    pub auth_token: Option<String>,
}

impl SessionIdentity {
    pub fn from_options(options: &SessionOptions) -> Self {
        Self {
            device_id: options.device_id.clone(),
            session_id: None,
            app_key: options.app_key.clone(),
            language: options.language.clone(),
            auth_token: options.token.clone(),
        }
    }
}
