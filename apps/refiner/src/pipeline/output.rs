use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::models::RefinedPrompt;
use crate::refinement::render::{to_json, to_markdown};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputFiles {
    pub json: PathBuf,
    pub markdown: PathBuf,
}

/// Writes `{name}.json` and `{name}.md` side by side under one directory.
#[derive(Debug, Clone)]
pub struct OutputWriter {
    dir: PathBuf,
}

impl OutputWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The basename defaults to the prompt id. Existing files are overwritten.
    pub async fn write(
        &self,
        prompt: &RefinedPrompt,
        name: Option<&str>,
    ) -> Result<OutputFiles, AppError> {
        let base = name
            .map(sanitize_name)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| prompt.prompt_id.clone());

        tokio::fs::create_dir_all(&self.dir).await?;

        let files = OutputFiles {
            json: self.dir.join(format!("{base}.json")),
            markdown: self.dir.join(format!("{base}.md")),
        };
        tokio::fs::write(&files.json, to_json(prompt)?).await?;
        tokio::fs::write(&files.markdown, to_markdown(prompt)).await?;

        info!(
            prompt_id = %prompt.prompt_id,
            json = %files.json.display(),
            markdown = %files.markdown.display(),
            "Refined prompt saved"
        );
        Ok(files)
    }
}

/// Keeps `[A-Za-z0-9_-]`; everything else becomes `_`.
pub fn sanitize_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::models::{InputMetadata, InputType};
    use crate::refinement::engine::RuleBasedRefiner;
    use crate::refinement::render::from_json;
    use crate::refinement::rules::RuleSet;

    fn sample_prompt() -> RefinedPrompt {
        let text = "Build a recipe sharing web app with user accounts and comments.";
        RuleBasedRefiner::new(Arc::new(RuleSet::default()))
            .extract(text, &InputMetadata::single(InputType::Text, None, text.len()))
            .unwrap()
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("my project v2"), "my_project_v2");
        assert_eq!(sanitize_name("../../etc/passwd"), "______etc_passwd");
        assert_eq!(sanitize_name("ok-name_1"), "ok-name_1");
    }

    #[tokio::test]
    async fn test_write_defaults_to_prompt_id() {
        let dir = tempfile::tempdir().unwrap();
        let writer = OutputWriter::new(dir.path().join("nested"));
        let prompt = sample_prompt();

        let files = writer.write(&prompt, None).await.unwrap();
        assert_eq!(
            files.json.file_name().unwrap().to_str().unwrap(),
            format!("{}.json", prompt.prompt_id)
        );

        let saved = tokio::fs::read_to_string(&files.json).await.unwrap();
        let parsed = from_json(&saved).unwrap();
        assert_eq!(parsed.prompt_id, prompt.prompt_id);
        assert_eq!(parsed.core_intent, prompt.core_intent);

        let md = tokio::fs::read_to_string(&files.markdown).await.unwrap();
        assert!(md.starts_with(&format!("# Refined Prompt: {}", prompt.prompt_id)));
    }

    #[tokio::test]
    async fn test_write_uses_sanitized_name() {
        let dir = tempfile::tempdir().unwrap();
        let writer = OutputWriter::new(dir.path());

        let files = writer
            .write(&sample_prompt(), Some("recipes/app"))
            .await
            .unwrap();
        assert_eq!(files.json, dir.path().join("recipes_app.json"));
        assert_eq!(files.markdown, dir.path().join("recipes_app.md"));
        assert!(files.markdown.exists());
    }
}
