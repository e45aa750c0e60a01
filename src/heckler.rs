//! Disruptive participant posting canned phrases on a fixed cadence
//!
//! Phrases are shuffled once and cycled forever under a small rotating set
//! of `HaterBot30NN` names.

use crate::room::{Identity, OutgoingMessage};
use crate::runtime::MessageSink;
use rand::seq::SliceRandom;
use rand::Rng;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const NAME_PREFIX: &str = "HaterBot";
const NAME_BASE: usize = 3000;

#[derive(Debug, Error)]
pub enum HecklerError {
    #[error("Failed to read phrases {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("No phrases to post")]
    NoPhrases,
    #[error("At least one name is required")]
    NoNames,
}

/// Non-empty lines that are not `#` comments, trimmed
pub fn parse_phrases(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

pub fn load_phrases(path: &Path) -> Result<Vec<String>, HecklerError> {
    let text = std::fs::read_to_string(path).map_err(|source| HecklerError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_phrases(&text))
}

#[derive(Debug, Clone)]
pub struct Heckler {
    room_id: String,
    phrases: Vec<String>,
    /// Name suffixes, in posting order
    numbers: Vec<usize>,
}

impl Heckler {
    pub fn new<R: Rng + ?Sized>(
        room_id: impl Into<String>,
        mut phrases: Vec<String>,
        names: usize,
        rng: &mut R,
    ) -> Result<Self, HecklerError> {
        if phrases.is_empty() {
            return Err(HecklerError::NoPhrases);
        }
        if names == 0 {
            return Err(HecklerError::NoNames);
        }

        phrases.shuffle(rng);
        let mut numbers: Vec<usize> = (1..=names).collect();
        numbers.shuffle(rng);

        Ok(Self {
            room_id: room_id.into(),
            phrases,
            numbers,
        })
    }

    /// The `index`-th message this heckler posts
    pub fn message(&self, index: usize) -> OutgoingMessage {
        let name = format!("{NAME_PREFIX}{}", NAME_BASE + self.numbers[index % self.numbers.len()]);
        let email = format!("{name}@bot.bot");
        let content = self.phrases[index % self.phrases.len()].clone();
        OutgoingMessage::new(&Identity::new(name, self.room_id.clone()), email, content)
    }

    /// Post every `interval`, forever or until `limit` messages went out.
    /// Send failures are logged and do not stop the loop.
    pub async fn run<K: MessageSink>(&self, sink: &K, interval: Duration, limit: Option<usize>) {
        let mut index = 0;
        while limit.map_or(true, |limit| index < limit) {
            let message = self.message(index);
            match sink.send_message(&message).await {
                Ok(_) => tracing::info!(name = %message.name, content = %message.content, "Posted"),
                Err(e) => tracing::warn!(name = %message.name, error = %e, "Failed to post"),
            }
            index += 1;
            tokio::time::sleep(interval).await;
        }
    }
}
