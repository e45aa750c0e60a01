//! Experiment description: which participants to run and how

use crate::prompt::PromptStyle;
use crate::room::{is_valid_name, Identity};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExperimentError {
    #[error("Failed to read experiment {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid experiment description: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(
        "Invalid username {0:?}: use 1 to 64 letters, numbers, underscores and hyphens"
    )]
    InvalidUsername(String),
}

/// One participant entry
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ParticipantSpec {
    pub username: String,
    pub email: String,
    pub chatroom: String,
    pub role: PromptStyle,
    #[serde(rename = "bot-description")]
    pub bot_description: String,
    #[serde(default = "enabled_by_default")]
    pub enable: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl ParticipantSpec {
    pub fn identity(&self) -> Identity {
        Identity::new(self.username.clone(), self.chatroom.clone())
    }
}

/// Parse an experiment and keep the enabled participants
pub fn parse_experiment(json: &str) -> Result<Vec<ParticipantSpec>, ExperimentError> {
    let participants: Vec<ParticipantSpec> = serde_json::from_str(json)?;

    participants
        .into_iter()
        .filter(|p| p.enable)
        .map(|p| {
            if is_valid_name(&p.username) {
                Ok(p)
            } else {
                Err(ExperimentError::InvalidUsername(p.username))
            }
        })
        .collect()
}

pub fn load_experiment(path: &Path) -> Result<Vec<ParticipantSpec>, ExperimentError> {
    let json = std::fs::read_to_string(path).map_err(|source| ExperimentError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_experiment(&json)
}
