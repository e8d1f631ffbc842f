use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// One entry of a turn log, sent to the server in a `Log` event.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Wall-clock time the entry was recorded.
    timestamp: DateTime<Utc>,

    /// Seconds since the turn started.
    relative_time: f64,

    level: LogLevel,

    text: String,
}

impl LogEntry {
    pub fn new(timestamp: DateTime<Utc>, relative_time: f64, level: LogLevel, text: &str) -> Self {
        Self {
            timestamp,
            relative_time,
            level,
            text: text.to_string(),
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn relative_time(&self) -> f64 {
        self.relative_time
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}
