use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::prompt::InputType;

/// Prefix of the marker line written before each block of a merged input.
pub const SOURCE_MARKER_PREFIX: &str = "--- Source: ";
const SOURCE_MARKER_SUFFIX: &str = " ---";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceInfo {
    pub input_type: InputType,
    pub filename: Option<String>,
    pub length: usize,
}

/// Provenance handed to the engine alongside the decoded text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputMetadata {
    pub source_type: InputType,
    pub filename: Option<String>,
    pub length: usize,
    #[serde(default)]
    pub sources: Vec<SourceInfo>,
}

/// Decoded text plus its provenance. One per input, or one merged record per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedInput {
    pub content: String,
    pub metadata: InputMetadata,
}

impl InputMetadata {
    pub fn single(input_type: InputType, filename: Option<String>, length: usize) -> Self {
        Self {
            source_type: input_type,
            filename: filename.clone(),
            length,
            sources: vec![SourceInfo {
                input_type,
                filename,
                length,
            }],
        }
    }

    /// Distinct contributing types in first-seen order. Never empty.
    pub fn input_types(&self) -> Vec<InputType> {
        let mut types = Vec::new();
        for source in &self.sources {
            if !types.contains(&source.input_type) {
                types.push(source.input_type);
            }
        }
        if types.is_empty() {
            types.push(self.source_type);
        }
        types
    }

    /// Rejects metadata the engine cannot interpret.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.sources.iter().any(|s| s.input_type == InputType::Mixed) {
            return Err(AppError::Extraction(
                "a contributing source cannot itself be mixed".to_string(),
            ));
        }
        if self.source_type == InputType::Mixed && self.input_types().len() < 2 {
            return Err(AppError::Extraction(
                "mixed input requires at least two distinct source types".to_string(),
            ));
        }
        Ok(())
    }
}

impl ProcessedInput {
    pub fn new(content: String, input_type: InputType, filename: Option<String>) -> Self {
        let length = content.chars().count();
        Self {
            metadata: InputMetadata::single(input_type, filename, length),
            content,
        }
    }

    /// Concatenates several inputs with a marker line noting each source boundary.
    pub fn merge(mut inputs: Vec<ProcessedInput>) -> ProcessedInput {
        if inputs.len() == 1 {
            if let Some(only) = inputs.pop() {
                return only;
            }
        }

        let mut blocks = Vec::with_capacity(inputs.len() * 2);
        let mut sources = Vec::new();
        for input in inputs {
            let label = input
                .metadata
                .filename
                .clone()
                .unwrap_or_else(|| "text input".to_string());
            blocks.push(format!("{SOURCE_MARKER_PREFIX}{label}{SOURCE_MARKER_SUFFIX}"));
            blocks.push(input.content);
            sources.extend(input.metadata.sources);
        }

        let content = blocks.join("\n\n");
        let mut metadata = InputMetadata {
            source_type: InputType::Text,
            filename: None,
            length: content.chars().count(),
            sources,
        };
        let types = metadata.input_types();
        metadata.source_type = if types.len() > 1 {
            InputType::Mixed
        } else {
            types[0]
        };

        ProcessedInput { content, metadata }
    }
}

pub fn is_source_marker(line: &str) -> bool {
    let line = line.trim();
    line.starts_with(SOURCE_MARKER_PREFIX) && line.ends_with(SOURCE_MARKER_SUFFIX)
}

/// Removes merge marker lines so they never count as task text.
pub fn strip_source_markers(content: &str) -> String {
    if !content.contains(SOURCE_MARKER_PREFIX) {
        return content.to_string();
    }
    content
        .lines()
        .filter(|line| !is_source_marker(line))
        .collect::<Vec<_>>()
        .join("\n")
}
