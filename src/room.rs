//! Room data model
//!
//! A snapshot is the complete ordered view of a room at one poll instant.
//! It is never a diff.

mod client;

pub use client::{RoomApiClient, RoomApiError, DEFAULT_API_URL};

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Participant names: usable both in the room and as a chat `name` field
static PARTICIPANT_NAME: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,64}$"));

/// Whether `name` is 1 to 64 ASCII letters, digits, underscores or hyphens
pub fn is_valid_name(name: &str) -> bool {
    match &*PARTICIPANT_NAME {
        Ok(re) => re.is_match(name),
        Err(e) => {
            tracing::error!(error = %e, "Participant name pattern failed to compile");
            false
        }
    }
}

/// Who a participant is and which room it lives in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub room_id: String,
}

impl Identity {
    pub fn new(name: impl Into<String>, room_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            room_id: room_id.into(),
        }
    }

    pub fn is_author_of(&self, message: &RoomMessage) -> bool {
        message.name == self.name
    }

    pub fn is_in_room(&self, message: &RoomMessage) -> bool {
        message.room_id == self.room_id
    }
}

/// One message as returned by the room API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomMessage {
    pub room_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl RoomMessage {
    pub fn new(
        room_id: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            room_id: room_id.into(),
            name: name.into(),
            email: None,
            content: content.into(),
            timestamp: None,
        }
    }

    #[must_use]
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Length used for read/write pacing, in characters
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}

/// Full ordered room view, in arrival order
pub type Snapshot = Vec<RoomMessage>;

/// Message submitted to the room's send endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingMessage {
    pub room_id: String,
    pub name: String,
    pub email: String,
    pub content: String,
}

impl OutgoingMessage {
    pub fn new(identity: &Identity, email: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            room_id: identity.room_id.clone(),
            name: identity.name.clone(),
            email: email.into(),
            content: content.into(),
        }
    }
}

/// Newest timestamp in a snapshot
pub fn latest_timestamp(snapshot: &[RoomMessage]) -> Option<DateTime<Utc>> {
    snapshot.iter().filter_map(|m| m.timestamp).max()
}
