use crate::agc_settings::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque handle for one client connection
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Allocate a fresh random id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for ConnectionId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Chat relay settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    /// Number of formatted messages kept for replay to new connections
    pub history_capacity: usize,
    /// Also deliver a message back to the connection that posted it
    pub echo_to_sender: bool,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            history_capacity: 100,
            echo_to_sender: false,
        }
    }
}

impl ChatSettings {
    /// Largest history the relay will keep
    pub const MAX_HISTORY_CAPACITY: usize = 10_000;

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_capacity > Self::MAX_HISTORY_CAPACITY {
            return Err(ConfigError::OutOfRange {
                field: "history_capacity",
                value: self.history_capacity as f32,
                min: 0.0,
                max: Self::MAX_HISTORY_CAPACITY as f32,
            });
        }
        Ok(())
    }
}

/// A chat message after formatting
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Local time, `%Y-%m-%d %H:%M:%S`
    pub timestamp: String,
    pub username: String,
    pub text: String,
}

impl ChatMessage {
    /// Wire/history form: `<timestamp> <username>: <text>`
    pub fn formatted(&self) -> String {
        format!("{} {}: {}", self.timestamp, self.username, self.text)
    }
}
