//! System prompt construction from persisted participant descriptions
//!
//! Each description lives in `<assets>/bot-descriptions/<name>/` and holds a
//! shared `behavior-prompt.txt` plus the files for its prompt style:
//!
//! - `simple`: `simple-prompt.txt`
//! - `elaborated`: `elaborated-prompt.txt`, whose self-reflection answer from
//!   the model is spliced in before `elaborated-prompt-completion.txt`

use crate::llm::{LlmError, LlmRequest, LlmService};
use chrono::Local;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

const BEHAVIOR_PROMPT: &str = "behavior-prompt.txt";
const SIMPLE_PROMPT: &str = "simple-prompt.txt";
const ELABORATED_PROMPT: &str = "elaborated-prompt.txt";
const ELABORATED_COMPLETION: &str = "elaborated-prompt-completion.txt";

/// Attribution labels the model sometimes echoes back at the start of a
/// reply, possibly repeated
static ATTRIBUTION_LABEL: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^\s*(Message from [^:]+:\s*)+"));

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Self-reflection failed: {0}")]
    SelfReflection(#[from] LlmError),
}

/// How a participant's system prompt is assembled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptStyle {
    Simple,
    Elaborated,
}

impl PromptStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            PromptStyle::Simple => "simple",
            PromptStyle::Elaborated => "elaborated",
        }
    }
}

/// Join prompt paragraphs with a blank line between them
pub fn join_paragraphs<I, S>(paragraphs: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    paragraphs
        .into_iter()
        .map(|p| p.as_ref().to_owned())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Strip leaked "Message from X:" labels from the start of a reply, and
/// surrounding whitespace. Labels further in are part of the reply.
pub fn clean_reply(text: &str) -> String {
    match &*ATTRIBUTION_LABEL {
        Ok(re) => re.replace(text, "").trim().to_string(),
        Err(e) => {
            tracing::error!(error = %e, "Attribution label pattern failed to compile");
            text.trim().to_string()
        }
    }
}

/// A participant description directory
#[derive(Debug, Clone)]
pub struct PromptAssets {
    dir: PathBuf,
}

impl PromptAssets {
    pub fn new(assets_dir: &Path, description: &str) -> Self {
        Self {
            dir: assets_dir.join("bot-descriptions").join(description),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read(&self, file: &str) -> Result<String, PromptError> {
        let path = self.dir.join(file);
        std::fs::read_to_string(&path).map_err(|source| PromptError::Read { path, source })
    }

    /// Assemble the system prompt for `style`.
    ///
    /// The elaborated style asks `llm` for a self-reflection on the
    /// elaborated prompt first.
    pub async fn build(&self, style: PromptStyle, llm: &dyn LlmService) -> Result<String, PromptError> {
        let behavior = self.read(BEHAVIOR_PROMPT)?;
        match style {
            PromptStyle::Simple => {
                let simple = self.read(SIMPLE_PROMPT)?;
                Ok(join_paragraphs([behavior, simple]))
            }
            PromptStyle::Elaborated => {
                let elaborated = self.read(ELABORATED_PROMPT)?;
                let completion = self.read(ELABORATED_COMPLETION)?;
                let reflection = llm
                    .complete(&LlmRequest::from_message(elaborated.clone(), None))
                    .await?
                    .text;
                tracing::info!(dir = %self.dir.display(), "Generated self-reflection");
                Ok(join_paragraphs([behavior, elaborated, reflection, completion]))
            }
        }
    }
}

/// Keep a copy of a generated prompt under
/// `<output>/<style>_prompts/<model>-<timestamp>.txt`
pub fn save_prompt(
    output_dir: &Path,
    style: PromptStyle,
    model: &str,
    prompt: &str,
) -> Result<PathBuf, PromptError> {
    let dir = output_dir.join(format!("{}_prompts", style.as_str()));
    std::fs::create_dir_all(&dir).map_err(|source| PromptError::Write {
        path: dir.clone(),
        source,
    })?;

    let timestamp = Local::now().format("%Y-%m-%d-%H-%M-%S");
    let path = dir.join(format!("{}-{timestamp}.txt", model.replace('/', "_")));
    std::fs::write(&path, prompt).map_err(|source| PromptError::Write {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::OfflineService;
    use tempfile::TempDir;

    fn write_description(root: &Path, name: &str, files: &[(&str, &str)]) {
        let dir = root.join("bot-descriptions").join(name);
        std::fs::create_dir_all(&dir).unwrap();
        for (file, content) in files {
            std::fs::write(dir.join(file), content).unwrap();
        }
    }

    #[test]
    fn test_clean_reply_strips_labels() {
        assert_eq!(clean_reply("Message from Bob: hi there"), "hi there");
        assert_eq!(
            clean_reply("Message from Bob:Message from Alice: hey"),
            "hey"
        );
        assert_eq!(clean_reply("  plain reply  "), "plain reply");
        assert_eq!(clean_reply("Message from Bob:"), "");
        assert_eq!(clean_reply("  Message from Bob: Message from Eve: yo"), "yo");
    }

    #[test]
    fn test_clean_reply_keeps_labels_inside_text() {
        assert_eq!(
            clean_reply("I think the Message from Bob: was rude"),
            "I think the Message from Bob: was rude"
        );
        assert_eq!(
            clean_reply("Message from Bob: he said Message from Eve: ok"),
            "he said Message from Eve: ok"
        );
    }

    #[test]
    fn test_join_paragraphs() {
        assert_eq!(join_paragraphs(["a", "b", "c"]), "a\n\nb\n\nc");
        assert_eq!(join_paragraphs(Vec::<String>::new()), "");
    }

    #[test]
    fn test_style_deserializes_lowercase() {
        let style: PromptStyle = serde_json::from_str("\"elaborated\"").unwrap();
        assert_eq!(style, PromptStyle::Elaborated);
        assert!(serde_json::from_str::<PromptStyle>("\"fancy\"").is_err());
    }

    #[tokio::test]
    async fn test_simple_prompt() {
        let tmp = TempDir::new().unwrap();
        write_description(
            tmp.path(),
            "friendly",
            &[(BEHAVIOR_PROMPT, "Be brief."), (SIMPLE_PROMPT, "You like cats.")],
        );

        let assets = PromptAssets::new(tmp.path(), "friendly");
        let llm = OfflineService::new("test");
        let prompt = assets.build(PromptStyle::Simple, &llm).await.unwrap();
        assert_eq!(prompt, "Be brief.\n\nYou like cats.");
    }

    #[tokio::test]
    async fn test_elaborated_prompt_splices_reflection() {
        let tmp = TempDir::new().unwrap();
        write_description(
            tmp.path(),
            "thoughtful",
            &[
                (BEHAVIOR_PROMPT, "Be brief."),
                (ELABORATED_PROMPT, "Who are you?"),
                (ELABORATED_COMPLETION, "Stay in character."),
            ],
        );

        let assets = PromptAssets::new(tmp.path(), "thoughtful");
        let llm = OfflineService::new("test");
        let prompt = assets.build(PromptStyle::Elaborated, &llm).await.unwrap();
        assert_eq!(
            prompt,
            "Be brief.\n\nWho are you?\n\nLorem ipsum\n\nStay in character."
        );
    }

    #[tokio::test]
    async fn test_missing_file_names_path() {
        let tmp = TempDir::new().unwrap();
        write_description(tmp.path(), "partial", &[(BEHAVIOR_PROMPT, "Be brief.")]);

        let assets = PromptAssets::new(tmp.path(), "partial");
        let err = assets
            .build(PromptStyle::Simple, &OfflineService::new("test"))
            .await
            .unwrap_err();
        match err {
            PromptError::Read { path, .. } => assert!(path.ends_with(SIMPLE_PROMPT)),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_save_prompt_layout() {
        let tmp = TempDir::new().unwrap();
        let path = save_prompt(tmp.path(), PromptStyle::Elaborated, "llama3-8b-8192", "hello").unwrap();
        assert!(path.starts_with(tmp.path().join("elaborated_prompts")));
        let file_name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(file_name.starts_with("llama3-8b-8192-"));
        assert!(file_name.ends_with(".txt"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "hello");
    }
}
