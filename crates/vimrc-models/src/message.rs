//! Chat message envelope.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A text message seen in the session room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Identifier assigned by the chat platform.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Login name of the sender. May be empty for anonymous senders.
    pub user: String,

    pub text: String,

    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    /// Creates a message stamped with the current time.
    pub fn new(user: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: None,
            user: user.into(),
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    /// Sets the platform identifier.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}
