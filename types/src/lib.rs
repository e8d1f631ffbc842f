//re-export types for easier access
pub mod events;
pub mod log;
pub mod status;
mod content;

pub use content::items::{ResponseItem, ResponseItemBuilder};
pub use events::{ClientEvent, ServerEvent};
pub use log::{LogEntry, LogLevel};
pub use status::SessionStatus;
