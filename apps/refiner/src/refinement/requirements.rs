//! Requirement and constraint mining over surface text.
//!
//! Each requirement category and each constraint type is emitted at most once,
//! in rule declaration order, no matter how many of its triggers match.

use crate::models::{Requirement, TechnicalConstraint};
use crate::refinement::rules::{RequirementRule, RuleSet};
use crate::refinement::text::{split_sentences, tokenize, TextIndex};

// ────────────────────────────────────────────────────────────────────────────
// Requirements
// ────────────────────────────────────────────────────────────────────────────

pub fn extract_requirements(index: &TextIndex, rules: &RuleSet) -> Vec<Requirement> {
    rules
        .requirements
        .iter()
        .filter_map(|rule| {
            let first_hit = first_trigger_hit(index, &rule.triggers)?;
            Some(Requirement {
                description: describe_requirement(index, rule, first_hit, rules),
                priority: rule.priority,
                category: rule.category.clone(),
            })
        })
        .collect()
}

/// Earliest word position at which any trigger matches.
fn first_trigger_hit(index: &TextIndex, triggers: &[String]) -> Option<usize> {
    triggers
        .iter()
        .filter_map(|t| index.exact_positions(t).first().copied())
        .min()
}

fn describe_requirement(
    index: &TextIndex,
    rule: &RequirementRule,
    hit: usize,
    rules: &RuleSet,
) -> String {
    if !rule.derive_from_context {
        return rule.description.clone();
    }
    match action_phrase(index.tokens(), hit, &rules.context_stop_words) {
        Some(phrase) => format!("Support {phrase}"),
        None => rule.description.clone(),
    }
}

/// Pairs an action word with its object: "task management" for nominal forms
/// (object precedes), "create invoices" for verbs (object follows).
fn action_phrase(tokens: &[String], hit: usize, stop_words: &[String]) -> Option<String> {
    let action = tokens.get(hit)?;
    let is_stop = |t: &String| stop_words.iter().any(|s| s == t);
    let is_nominal = ["ion", "ment", "ing"].iter().any(|s| action.ends_with(s));

    let object = if is_nominal {
        tokens[..hit].iter().rev().find(|t| !is_stop(t))
    } else {
        tokens[hit + 1..].iter().find(|t| !is_stop(t))
    }?;

    Some(if is_nominal {
        format!("{object} {action}")
    } else {
        format!("{action} {object}")
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Constraints
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Modality {
    Mandatory,
    Optional,
    Unstated,
}

struct ConstraintHits {
    matched: Vec<String>,
    mandatory: bool,
    optional: bool,
}

/// Per-sentence constraint detection. A type is mandatory if any sentence that
/// mentions it carries a mandatory marker ("must", "required", ...).
pub fn extract_constraints(content: &str, rules: &RuleSet) -> Vec<TechnicalConstraint> {
    let sentences: Vec<TextIndex> = split_sentences(content)
        .iter()
        .map(|(s, _)| TextIndex::new(s))
        .collect();

    rules
        .constraints
        .iter()
        .filter_map(|rule| {
            let mut hits = ConstraintHits {
                matched: Vec::new(),
                mandatory: false,
                optional: false,
            };

            for sentence in &sentences {
                let mut found: Vec<(usize, String)> = Vec::new();
                for trigger in &rule.triggers {
                    let width = tokenize(trigger).len();
                    for pos in sentence.exact_positions(trigger) {
                        found.push((pos, sentence.tokens()[pos..pos + width].join(" ")));
                    }
                }
                if found.is_empty() {
                    continue;
                }
                found.sort_by_key(|(pos, _)| *pos);
                for (_, word) in found {
                    if !hits.matched.contains(&word) {
                        hits.matched.push(word);
                    }
                }
                match modality(sentence, rules) {
                    Modality::Mandatory => hits.mandatory = true,
                    Modality::Optional => hits.optional = true,
                    Modality::Unstated => {}
                }
            }

            if hits.matched.is_empty() {
                return None;
            }

            let mut description = format!("{}: {}", rule.label, hits.matched.join(", "));
            if !hits.mandatory && hits.optional {
                description.push_str(" (preferred)");
            }

            Some(TechnicalConstraint {
                constraint_type: rule.constraint_type.clone(),
                description,
                is_mandatory: hits.mandatory,
            })
        })
        .collect()
}

/// Markers match whole words only ("mustard" is not "must").
fn modality(sentence: &TextIndex, rules: &RuleSet) -> Modality {
    if sentence.contains_exact_any(&rules.mandatory_markers) {
        Modality::Mandatory
    } else if sentence.contains_exact_any(&rules.optional_markers) {
        Modality::Optional
    } else {
        Modality::Unstated
    }
}
