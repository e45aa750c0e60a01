//! HTTP client for the chatroom message API

use super::{OutgoingMessage, Snapshot};
use chrono::Utc;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "http://localhost:3000/api/messages";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum RoomApiError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

/// Client for `GET {base}?roomId=..` and `POST {base}`
#[derive(Debug, Clone)]
pub struct RoomApiClient {
    client: Client,
    base_url: String,
}

#[derive(Serialize)]
struct TimestampedMessage<'a> {
    #[serde(flatten)]
    message: &'a OutgoingMessage,
    timestamp: String,
}

impl RoomApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, RoomApiError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(RoomApiError::Client)?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the full current view of a room
    pub async fn fetch_snapshot(&self, room_id: &str) -> Result<Snapshot, RoomApiError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("roomId", room_id)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RoomApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json::<Snapshot>().await?)
    }

    /// Submit a message. The returned payload is informational only;
    /// delivery is confirmed by the message showing up in a later snapshot.
    pub async fn send_message(&self, message: &OutgoingMessage) -> Result<Value, RoomApiError> {
        let body = TimestampedMessage {
            message,
            timestamp: Utc::now().to_rfc3339(),
        };

        let response = self.client.post(&self.base_url).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RoomApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json::<Value>().await.unwrap_or(Value::Null))
    }
}
