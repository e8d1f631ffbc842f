/// One playable/displayable unit of a bot response.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseItem {
    /// Text to show (or a `#command` addressed to the embedder).
    #[serde(default)]
    text: String,

    /// URI of the synthesized audio for this item.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    audio: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    image: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    video: Option<String>,

    /// Background (color, image URI or scene name) to apply while the item is shown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    background: Option<String>,

    /// Free-form JSON passed along with command items.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    payload: Option<serde_json::Value>,

    #[serde(default)]
    node_id: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    dialogue_node_id: Option<i64>,
}

impl ResponseItem {
    pub fn builder() -> ResponseItemBuilder {
        ResponseItemBuilder::new()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn audio(&self) -> Option<&str> {
        self.audio.as_deref()
    }

    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    pub fn video(&self) -> Option<&str> {
        self.video.as_deref()
    }

    pub fn background(&self) -> Option<&str> {
        self.background.as_deref()
    }

    pub fn payload(&self) -> Option<&serde_json::Value> {
        self.payload.as_ref()
    }

    pub fn node_id(&self) -> i64 {
        self.node_id
    }

    pub fn dialogue_node_id(&self) -> Option<i64> {
        self.dialogue_node_id
    }

    /// Returns the command name when the text addresses a command (`#name`, no space after `#`).
    pub fn command(&self) -> Option<&str> {
        let rest = self.text.strip_prefix('#')?;
        match rest.chars().next() {
            Some(c) if !c.is_whitespace() => Some(rest),
            _ => None,
        }
    }

    pub fn is_command(&self) -> bool {
        self.command().is_some()
    }
}

pub struct ResponseItemBuilder {
    item: ResponseItem,
}

impl Default for ResponseItemBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseItemBuilder {
    pub fn new() -> Self {
        Self {
            item: ResponseItem::default(),
        }
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.item.text = text.to_string();
        self
    }

    pub fn with_audio(mut self, audio: &str) -> Self {
        self.item.audio = Some(audio.to_string());
        self
    }

    pub fn with_image(mut self, image: &str) -> Self {
        self.item.image = Some(image.to_string());
        self
    }

    pub fn with_video(mut self, video: &str) -> Self {
        self.item.video = Some(video.to_string());
        self
    }

    pub fn with_background(mut self, background: &str) -> Self {
        self.item.background = Some(background.to_string());
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.item.payload = Some(payload);
        self
    }

    pub fn with_node_id(mut self, node_id: i64) -> Self {
        self.item.node_id = node_id;
        self
    }

    pub fn with_dialogue_node_id(mut self, dialogue_node_id: i64) -> Self {
        self.item.dialogue_node_id = Some(dialogue_node_id);
        self
    }

    pub fn build(self) -> ResponseItem {
        self.item
    }
}
