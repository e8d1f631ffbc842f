use chrono::Utc;
use tokio::time::Instant;

use crate::types::{LogEntry, LogLevel};

/// Log of the current turn, flushed to the server at checkpoints.
#[derive(Debug)]
pub struct TurnLog {
    started: Instant,
    entries: Vec<LogEntry>,
}

impl Default for TurnLog {
    fn default() -> Self {
        Self::new()
    }
}

impl TurnLog {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            entries: Vec::new(),
        }
    }

    pub fn add(&mut self, level: LogLevel, text: &str) {
        match level {
            LogLevel::Debug => tracing::debug!("{}", text),
            LogLevel::Info => tracing::info!("{}", text),
            LogLevel::Warn => tracing::warn!("{}", text),
            LogLevel::Error => tracing::error!("{}", text),
        }
        let relative = self.started.elapsed().as_secs_f64();
        self.entries.push(LogEntry::new(Utc::now(), relative, level, text));
    }

    /// Hands out the accumulated entries and starts a new turn.
    pub fn take(&mut self) -> Vec<LogEntry> {
        self.started = Instant::now();
        std::mem::take(&mut self.entries)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn relative_time_counts_from_turn_start() {
        let mut log = TurnLog::new();
        tokio::time::advance(Duration::from_secs(2)).await;
        log.add(LogLevel::Info, "first");

        let entries = log.take();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].text(), "first");
        assert!((entries[0].relative_time() - 2.0).abs() < 0.01);
        assert!(log.is_empty());

        log.add(LogLevel::Warn, "second");
        assert!(log.take()[0].relative_time() < 0.01);
    }
}
