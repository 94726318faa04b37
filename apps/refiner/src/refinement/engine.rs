//! Refinement engine: pluggable, trait-based extraction of a `RefinedPrompt`
//! from validated text.
//!
//! Default: `RuleBasedRefiner` (keyword tables, deterministic, no network).
//! Optional: `LlmRefiner` (remote model, falls back to the rule tables on failure).
//!
//! `AppState` and the pipeline hold an `Arc<dyn Refiner>`, chosen at startup via config.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::errors::AppError;
use crate::llm_client::{LlmClient, MODEL};
use crate::models::input::strip_source_markers;
use crate::models::{Domain, InputMetadata, RefinedPrompt, Requirement, TechnicalConstraint};
use crate::refinement::deliverables::{deliverable_format, expected_outputs, success_criteria};
use crate::refinement::domain::classify_domain;
use crate::refinement::prompts::{build_refine_prompt, refine_system};
use crate::refinement::requirements::{extract_constraints, extract_requirements};
use crate::refinement::rules::RuleSet;
use crate::refinement::scoring::{compute_confidence, ConfidenceSignals};
use crate::refinement::summary::{background_context, core_intent, detailed_description};
use crate::refinement::text::{word_count, TextIndex};

pub const AMBIGUITY_NO_FORMAT: &str = "Technology stack not specified";
pub const AMBIGUITY_NO_CONSTRAINTS: &str = "No technical constraints specified";
pub const AMBIGUITY_NO_REQUIREMENTS: &str = "No functional requirements identified";
pub const AMBIGUITY_NO_DOMAIN: &str = "Project domain could not be determined";

pub const ASSUMPTION_RULE_BASED: &str =
    "Extraction performed via rule-based keyword matching; no external model was consulted.";
pub const ASSUMPTION_FALLBACK: &str =
    "Remote model unavailable: fell back to rule-based extraction";

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// Swap backends without touching the pipeline, handlers or CLI.
#[async_trait]
pub trait Refiner: Send + Sync {
    async fn refine(
        &self,
        content: &str,
        metadata: &InputMetadata,
    ) -> Result<RefinedPrompt, AppError>;

    /// "rule_based" | "llm", surfaced in logs.
    fn backend(&self) -> &'static str;
}

// ────────────────────────────────────────────────────────────────────────────
// RuleBasedRefiner
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct RuleBasedRefiner {
    rules: Arc<RuleSet>,
}

impl RuleBasedRefiner {
    pub fn new(rules: Arc<RuleSet>) -> Self {
        Self { rules }
    }

    /// Synchronous extraction. Same content and metadata give the same record
    /// apart from `prompt_id` and `timestamp`.
    pub fn extract(
        &self,
        content: &str,
        metadata: &InputMetadata,
    ) -> Result<RefinedPrompt, AppError> {
        metadata.validate()?;
        let rules = self.rules.as_ref();

        let body = strip_source_markers(content);
        let index = TextIndex::new(&body);

        let domain = classify_domain(&index, rules);
        let functional_requirements = extract_requirements(&index, rules);
        let technical_constraints = extract_constraints(&body, rules);
        let expected = expected_outputs(&index, domain, rules);
        let format = deliverable_format(&index, rules);
        let criteria = success_criteria(&functional_requirements, &technical_constraints);

        let signals = ConfidenceSignals {
            has_action_keyword: index.contains_any(&rules.action_keywords),
            requirement_count: functional_requirements.len(),
            constraint_count: technical_constraints.len(),
            word_count: word_count(&body),
            min_words: rules.min_words_for(metadata.source_type),
            domain,
        };
        let confidence_score = compute_confidence(&signals, &rules.scoring);
        debug!(?signals, confidence_score, "Rule-based extraction scored");

        let ambiguities = ambiguities_for(
            format.as_deref(),
            &functional_requirements,
            &technical_constraints,
            domain,
        );

        let mut assumptions_made = vec![ASSUMPTION_RULE_BASED.to_string()];
        if domain != Domain::Other && !rules.default_outputs(domain).is_empty() {
            assumptions_made.push(format!(
                "Expected outputs inferred from the {domain} domain defaults"
            ));
        }

        Ok(RefinedPrompt {
            prompt_id: RefinedPrompt::generate_id(),
            timestamp: Utc::now(),
            input_types: metadata.input_types(),
            core_intent: core_intent(&body, rules),
            detailed_description: detailed_description(&body, rules),
            domain,
            functional_requirements,
            technical_constraints,
            expected_outputs: expected,
            deliverable_format: format,
            background_context: background_context(&body, rules),
            success_criteria: criteria,
            confidence_score,
            ambiguities,
            assumptions_made,
        })
    }
}

#[async_trait]
impl Refiner for RuleBasedRefiner {
    async fn refine(
        &self,
        content: &str,
        metadata: &InputMetadata,
    ) -> Result<RefinedPrompt, AppError> {
        self.extract(content, metadata)
    }

    fn backend(&self) -> &'static str {
        "rule_based"
    }
}

fn ambiguities_for(
    format: Option<&str>,
    requirements: &[Requirement],
    constraints: &[TechnicalConstraint],
    domain: Domain,
) -> Vec<String> {
    let mut out = Vec::new();
    if format.is_none() {
        out.push(AMBIGUITY_NO_FORMAT.to_string());
    }
    if constraints.is_empty() {
        out.push(AMBIGUITY_NO_CONSTRAINTS.to_string());
    }
    if requirements.is_empty() {
        out.push(AMBIGUITY_NO_REQUIREMENTS.to_string());
    }
    if domain == Domain::Other {
        out.push(AMBIGUITY_NO_DOMAIN.to_string());
    }
    out
}

// ────────────────────────────────────────────────────────────────────────────
// LlmRefiner
// ────────────────────────────────────────────────────────────────────────────

/// Remote-model extraction. Any model or transport failure degrades to the
/// rule-based result with an assumption noting the fallback.
pub struct LlmRefiner {
    llm: LlmClient,
    fallback: RuleBasedRefiner,
}

impl LlmRefiner {
    pub fn new(llm: LlmClient, rules: Arc<RuleSet>) -> Self {
        Self {
            llm,
            fallback: RuleBasedRefiner::new(rules),
        }
    }
}

#[async_trait]
impl Refiner for LlmRefiner {
    async fn refine(
        &self,
        content: &str,
        metadata: &InputMetadata,
    ) -> Result<RefinedPrompt, AppError> {
        metadata.validate()?;

        let metadata_json =
            serde_json::to_string_pretty(metadata).map_err(|e| AppError::Internal(e.into()))?;
        let prompt = build_refine_prompt(content, &metadata_json);

        match self
            .llm
            .call_json::<ModelExtraction>(&prompt, &refine_system())
            .await
        {
            Ok(extraction) => Ok(extraction.into_prompt(content, metadata, &self.fallback.rules)),
            Err(e) => {
                warn!(error = %e, "Remote refinement failed, using rule-based extraction");
                let mut prompt = self.fallback.extract(content, metadata)?;
                prompt.assumptions_made.push(ASSUMPTION_FALLBACK.to_string());
                Ok(prompt)
            }
        }
    }

    fn backend(&self) -> &'static str {
        "llm"
    }
}

/// Shape the model is asked to return. Everything is optional so a sparse
/// reply still converts; gaps are filled from the rule tables.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ModelExtraction {
    pub core_intent: String,
    pub detailed_description: String,
    pub domain: String,
    pub functional_requirements: Vec<Requirement>,
    pub technical_constraints: Vec<TechnicalConstraint>,
    pub expected_outputs: Vec<String>,
    pub deliverable_format: Option<String>,
    pub background_context: Option<String>,
    pub success_criteria: Vec<String>,
    pub confidence_score: Option<f64>,
    pub ambiguities: Vec<String>,
    pub assumptions_made: Vec<String>,
}

impl ModelExtraction {
    pub fn into_prompt(
        self,
        content: &str,
        metadata: &InputMetadata,
        rules: &RuleSet,
    ) -> RefinedPrompt {
        let body = strip_source_markers(content);

        let mut seen = HashSet::new();
        let functional_requirements: Vec<Requirement> = self
            .functional_requirements
            .into_iter()
            .filter(|r| seen.insert(r.category.clone()))
            .collect();
        let mut seen = HashSet::new();
        let technical_constraints: Vec<TechnicalConstraint> = self
            .technical_constraints
            .into_iter()
            .filter(|c| seen.insert(c.constraint_type.clone()))
            .collect();

        let core = if self.core_intent.trim().is_empty() {
            core_intent(&body, rules)
        } else {
            self.core_intent.trim().to_string()
        };
        let description = if self.detailed_description.trim().is_empty() {
            detailed_description(&body, rules)
        } else {
            self.detailed_description.trim().to_string()
        };

        let confidence_score = self
            .confidence_score
            .filter(|c| c.is_finite())
            .map(|c| (c.clamp(0.0, 1.0) * 100.0).round() / 100.0)
            .unwrap_or(rules.scoring.base);

        let mut assumptions_made = self.assumptions_made;
        assumptions_made.push(format!("Extraction performed by remote model {MODEL}"));

        RefinedPrompt {
            prompt_id: RefinedPrompt::generate_id(),
            timestamp: Utc::now(),
            input_types: metadata.input_types(),
            core_intent: core,
            detailed_description: description,
            domain: Domain::from_label(&self.domain),
            functional_requirements,
            technical_constraints,
            expected_outputs: self.expected_outputs,
            deliverable_format: self.deliverable_format.filter(|f| !f.trim().is_empty()),
            background_context: self.background_context.filter(|b| !b.trim().is_empty()),
            success_criteria: self.success_criteria,
            confidence_score,
            ambiguities: self.ambiguities,
            assumptions_made,
        }
    }
}
