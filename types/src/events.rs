pub mod client;
pub mod server;

use client::*;
use server::*;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    #[serde(rename = "Init")]
    Init(InitEvent),
    #[serde(rename = "Input")]
    Input(InputEvent),
    #[serde(rename = "Log")]
    Log(LogEvent),
    #[serde(rename = "InputAudioStreamOpen")]
    InputAudioStreamOpen(InputAudioStreamOpenEvent),
    #[serde(rename = "InputAudioStreamClose")]
    InputAudioStreamClose(InputAudioStreamCloseEvent),
}

impl ClientEvent {
    pub fn type_name(&self) -> &'static str {
        match self {
            ClientEvent::Init(_) => "Init",
            ClientEvent::Input(_) => "Input",
            ClientEvent::Log(_) => "Log",
            ClientEvent::InputAudioStreamOpen(_) => "InputAudioStreamOpen",
            ClientEvent::InputAudioStreamClose(_) => "InputAudioStreamClose",
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    #[serde(rename = "Ready")]
    Ready(ReadyEvent),
    #[serde(rename = "SessionStarted")]
    SessionStarted(SessionStartedEvent),
    #[serde(rename = "Response")]
    Response(ResponseEvent),
    #[serde(rename = "ResponseItem")]
    ResponseItem(ResponseItemEvent),
    #[serde(rename = "Recognized")]
    Recognized(RecognizedEvent),
    #[serde(rename = "InputAudioStreamOpen")]
    InputAudioStreamOpen(InputAudioStreamOpenedEvent),
    #[serde(rename = "Error")]
    Error(ErrorEvent),
    #[serde(rename = "SessionEnded")]
    SessionEnded(SessionEndedEvent),
}

impl ServerEvent {
    pub fn type_name(&self) -> &'static str {
        match self {
            ServerEvent::Ready(_) => "Ready",
            ServerEvent::SessionStarted(_) => "SessionStarted",
            ServerEvent::Response(_) => "Response",
            ServerEvent::ResponseItem(_) => "ResponseItem",
            ServerEvent::Recognized(_) => "Recognized",
            ServerEvent::InputAudioStreamOpen(_) => "InputAudioStreamOpen",
            ServerEvent::Error(_) => "Error",
            ServerEvent::SessionEnded(_) => "SessionEnded",
        }
    }
}
