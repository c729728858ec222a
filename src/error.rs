//! Errors raised by the race controller and configuration loading
//!
//! The physics core itself never fails.

#[derive(Debug)]
pub enum RaceError {
    /// A race needs at least two entrants
    NotEnoughParticipants { count: usize },
    /// `start` called while a race is already running
    AlreadyRunning,
    /// Configuration could not be parsed or is out of range
    InvalidConfig(String),
}

impl std::fmt::Display for RaceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotEnoughParticipants { count } => {
                write!(f, "need at least 2 participants, got {count}")
            }
            Self::AlreadyRunning => write!(f, "race is already running"),
            Self::InvalidConfig(m) => write!(f, "invalid config: {m}"),
        }
    }
}

impl std::error::Error for RaceError {}

impl From<serde_json::Error> for RaceError {
    fn from(e: serde_json::Error) -> Self {
        Self::InvalidConfig(e.to_string())
    }
}
