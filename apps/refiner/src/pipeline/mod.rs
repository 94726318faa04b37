//! Refinement pipeline: ingest → relevance gate → refiner → persisted files.
//!
//! Every run ends in exactly one `RunOutcome`. Errors never escape
//! `process_and_refine`; they are reported as a `failed` outcome naming the stage.

pub mod batch;
pub mod output;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::ingest::InputProcessor;
use crate::models::{InputMetadata, RefinedPrompt};
use crate::refinement::engine::Refiner;
use crate::refinement::relevance;
use crate::refinement::rules::RuleSet;

use self::output::{OutputFiles, OutputWriter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    InputProcessing,
    RelevanceCheck,
    Refinement,
    Output,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::InputProcessing => "input_processing",
            Stage::RelevanceCheck => "relevance_check",
            Stage::Refinement => "refinement",
            Stage::Output => "output",
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    Success {
        prompt: RefinedPrompt,
        files: Option<OutputFiles>,
    },
    Rejected {
        stage: Stage,
        reason: String,
    },
    Failed {
        stage: Stage,
        error: String,
    },
}

impl RunOutcome {
    pub fn prompt(&self) -> Option<&RefinedPrompt> {
        match self {
            RunOutcome::Success { prompt, .. } => Some(prompt),
            _ => None,
        }
    }

    fn failed(stage: Stage, error: &AppError) -> Self {
        warn!(%stage, error = %error, "Pipeline stage failed");
        RunOutcome::Failed {
            stage,
            error: error.to_string(),
        }
    }
}

pub struct RefinementPipeline {
    processor: InputProcessor,
    refiner: Arc<dyn Refiner>,
    rules: Arc<RuleSet>,
    writer: OutputWriter,
}

impl RefinementPipeline {
    pub fn new(
        processor: InputProcessor,
        refiner: Arc<dyn Refiner>,
        rules: Arc<RuleSet>,
        writer: OutputWriter,
    ) -> Self {
        Self {
            processor,
            refiner,
            rules,
            writer,
        }
    }

    pub fn processor(&self) -> &InputProcessor {
        &self.processor
    }

    /// Full run over CLI-style inputs (file paths or literal text). Always writes files.
    pub async fn process_and_refine(
        &self,
        inputs: &[String],
        output_name: Option<&str>,
    ) -> RunOutcome {
        info!(inputs = inputs.len(), backend = self.refiner.backend(), "Starting refinement run");

        let processed = match self.processor.process_inputs(inputs).await {
            Ok(p) => p,
            Err(e) => return RunOutcome::failed(Stage::InputProcessing, &e),
        };

        self.refine_content(&processed.content, &processed.metadata, output_name, true)
            .await
    }

    /// Gate, refine and optionally persist already-decoded content.
    pub async fn refine_content(
        &self,
        content: &str,
        metadata: &InputMetadata,
        output_name: Option<&str>,
        persist: bool,
    ) -> RunOutcome {
        let verdict = relevance::validate(content, metadata.source_type, &self.rules);
        if !verdict.is_relevant {
            info!(reason = %verdict.reason, words = verdict.word_count, "Input rejected");
            return RunOutcome::Rejected {
                stage: Stage::RelevanceCheck,
                reason: verdict.reason,
            };
        }

        let prompt = match self.refiner.refine(content, metadata).await {
            Ok(p) => p,
            Err(e) => return RunOutcome::failed(Stage::Refinement, &e),
        };
        info!(
            prompt_id = %prompt.prompt_id,
            domain = %prompt.domain,
            confidence = prompt.confidence_score,
            requirements = prompt.functional_requirements.len(),
            "Refinement complete"
        );

        if !persist {
            return RunOutcome::Success {
                prompt,
                files: None,
            };
        }

        match self.writer.write(&prompt, output_name).await {
            Ok(files) => RunOutcome::Success {
                prompt,
                files: Some(files),
            },
            Err(e) => RunOutcome::failed(Stage::Output, &e),
        }
    }
}
