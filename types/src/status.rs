/// Turn-taking status of a bot session, as reported to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SessionStatus {
    #[default]
    Unstarted,
    Listening,
    Responding,
    Processing,
    Paused,
    Sleeping,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Unstarted => "UNSTARTED",
            SessionStatus::Listening => "LISTENING",
            SessionStatus::Responding => "RESPONDING",
            SessionStatus::Processing => "PROCESSING",
            SessionStatus::Paused => "PAUSED",
            SessionStatus::Sleeping => "SLEEPING",
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
