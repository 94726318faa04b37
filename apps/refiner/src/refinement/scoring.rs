use serde::{Deserialize, Serialize};

use crate::models::Domain;
use crate::refinement::rules::ScoringWeights;

/// Everything the confidence score depends on. Same signals, same score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfidenceSignals {
    pub has_action_keyword: bool,
    pub requirement_count: usize,
    pub constraint_count: usize,
    pub word_count: usize,
    pub min_words: usize,
    pub domain: Domain,
}

/// base + bonuses − penalties, clamped to [0, 1] and rounded to two decimals.
pub fn compute_confidence(signals: &ConfidenceSignals, weights: &ScoringWeights) -> f64 {
    let mut score = weights.base;

    if signals.has_action_keyword {
        score += weights.action_keyword;
    }
    score += (signals.requirement_count as f64 * weights.per_requirement)
        .min(weights.requirement_cap);
    if signals.constraint_count > 0 {
        score += weights.constraint_present;
    }
    if signals.word_count >= weights.detailed_word_threshold {
        score += weights.detailed_content;
    }

    if signals.word_count < signals.min_words * weights.short_multiplier {
        score -= weights.short_content_penalty;
    }
    if signals.domain == Domain::Other {
        score -= weights.other_domain_penalty;
    }
    if signals.requirement_count == 0 {
        score -= weights.no_requirements_penalty;
    }

    ((score.clamp(0.0, 1.0)) * 100.0).round() / 100.0
}
