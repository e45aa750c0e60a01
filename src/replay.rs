//! Timed replay of a recorded transcript into a room
//!
//! Each message is re-sent at its original offset from the first message,
//! divided by the speedup factor.

use crate::room::{OutgoingMessage, RoomApiError};
use crate::runtime::MessageSink;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("Failed to read transcript {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid transcript: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Speedup must be a finite number > 0, got {0}")]
    InvalidSpeedup(f64),
    #[error("Failed to send message: {0}")]
    Send(#[from] RoomApiError),
}

/// One recorded message
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TranscriptEntry {
    #[serde(flatten)]
    pub message: OutgoingMessage,
    pub timestamp: DateTime<Utc>,
}

/// Parse a transcript, ordered by timestamp. Ties keep file order.
pub fn parse_transcript(json: &str) -> Result<Vec<TranscriptEntry>, ReplayError> {
    let mut entries: Vec<TranscriptEntry> = serde_json::from_str(json)?;
    entries.sort_by_key(|e| e.timestamp);
    Ok(entries)
}

pub fn load_transcript(path: &Path) -> Result<Vec<TranscriptEntry>, ReplayError> {
    let json = std::fs::read_to_string(path).map_err(|source| ReplayError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_transcript(&json)
}

/// Wall-clock offset of every entry from the start of the replay
pub fn schedule(entries: &[TranscriptEntry], speedup: f64) -> Result<Vec<Duration>, ReplayError> {
    if !speedup.is_finite() || speedup <= 0.0 {
        return Err(ReplayError::InvalidSpeedup(speedup));
    }
    let Some(first) = entries.first() else {
        return Ok(Vec::new());
    };

    Ok(entries
        .iter()
        .map(|entry| {
            let offset = (entry.timestamp - first.timestamp)
                .to_std()
                .unwrap_or(Duration::ZERO);
            Duration::try_from_secs_f64(offset.as_secs_f64() / speedup).unwrap_or(Duration::MAX)
        })
        .collect())
}

/// Send every entry at its scheduled time. Returns how many were sent.
///
/// Stops at the first send failure.
pub async fn replay<K: MessageSink>(
    entries: &[TranscriptEntry],
    speedup: f64,
    sink: &K,
) -> Result<usize, ReplayError> {
    let offsets = schedule(entries, speedup)?;
    if entries.is_empty() {
        tracing::warn!("No messages to send");
        return Ok(0);
    }

    let start = Instant::now();
    for (entry, offset) in entries.iter().zip(offsets) {
        tokio::time::sleep_until(start + offset).await;
        let response = sink.send_message(&entry.message).await?;
        tracing::info!(
            author = %entry.message.name,
            offset_ms = offset.as_millis(),
            %response,
            "Replayed message"
        );
    }
    Ok(entries.len())
}
