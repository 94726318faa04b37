// Input adapters: turn CLI arguments, uploads and literal strings into
// `ProcessedInput` records the pipeline can validate and refine.

pub mod decoders;

use std::path::Path;
use std::time::Duration;

use tracing::{debug, info};

use crate::config::Config;
use crate::errors::AppError;
use crate::models::{InputType, ProcessedInput};

#[derive(Debug, Clone)]
pub struct InputProcessor {
    tesseract_cmd: String,
    ocr_timeout: Duration,
}

impl InputProcessor {
    pub fn new(tesseract_cmd: impl Into<String>, ocr_timeout: Duration) -> Self {
        Self {
            tesseract_cmd: tesseract_cmd.into(),
            ocr_timeout,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.tesseract_cmd.clone(), config.ocr_timeout())
    }

    /// An existing file is decoded by extension; a path-like string that does
    /// not exist is an adapter error; anything else is literal text.
    pub async fn process_input(&self, input: &str) -> Result<ProcessedInput, AppError> {
        let path = Path::new(input.trim());

        if path.is_file() {
            let filename = display_name(path);
            let bytes = tokio::fs::read(path)
                .await
                .map_err(|e| AppError::adapter(&filename, format!("could not read file: {e}")))?;
            return self.decode_bytes(&filename, bytes).await;
        }

        if looks_like_path(input) {
            return Err(AppError::adapter(input.trim(), "file not found"));
        }

        debug!(chars = input.chars().count(), "Treating input as literal text");
        Ok(ProcessedInput::new(input.to_string(), InputType::Text, None))
    }

    /// Processes every input in order and merges them into one record.
    /// The first adapter failure aborts the run.
    pub async fn process_inputs(&self, inputs: &[String]) -> Result<ProcessedInput, AppError> {
        if inputs.is_empty() {
            return Err(AppError::Validation("no inputs provided".to_string()));
        }

        let mut processed = Vec::with_capacity(inputs.len());
        for input in inputs {
            processed.push(self.process_input(input).await?);
        }

        let merged = ProcessedInput::merge(processed);
        info!(
            source_type = %merged.metadata.source_type,
            sources = merged.metadata.sources.len(),
            chars = merged.metadata.length,
            "Inputs processed"
        );
        Ok(merged)
    }

    /// Decodes an in-memory file (CLI read or HTTP upload) by its extension.
    pub async fn decode_bytes(
        &self,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<ProcessedInput, AppError> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        let input_type = match InputType::from_extension(&extension) {
            Some(t) => t,
            None if extension.is_empty() => InputType::Text,
            None => {
                return Err(AppError::adapter(
                    filename,
                    format!("unsupported file type '.{extension}'"),
                ))
            }
        };

        let content = match input_type {
            InputType::Text => decoders::decode_text(filename, bytes)?,
            InputType::Pdf => decoders::decode_pdf(filename, bytes).await?,
            InputType::Docx => decoders::decode_docx(filename, bytes).await?,
            InputType::Image => {
                decoders::ocr_image(
                    filename,
                    bytes,
                    &extension,
                    &self.tesseract_cmd,
                    self.ocr_timeout,
                )
                .await?
            }
            InputType::Mixed => {
                return Err(AppError::Extraction(
                    "mixed is not a decodable file type".to_string(),
                ))
            }
        };

        debug!(filename, %input_type, chars = content.chars().count(), "Decoded file");
        Ok(ProcessedInput::new(
            content,
            input_type,
            Some(filename.to_string()),
        ))
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| path.display().to_string())
}

/// A single token with a path separator or a known file extension.
fn looks_like_path(input: &str) -> bool {
    let trimmed = input.trim();
    if trimmed.is_empty() || trimmed.contains(char::is_whitespace) {
        return false;
    }
    if trimmed.contains('/') || trimmed.contains('\\') {
        return true;
    }
    Path::new(trimmed)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| InputType::from_extension(&e.to_lowercase()).is_some())
        .unwrap_or(false)
}
