//! JSON and Markdown renderings of a `RefinedPrompt`.

use std::fmt::Write as _;

use crate::errors::AppError;
use crate::models::RefinedPrompt;

const NONE_IDENTIFIED: &str = "_None identified._";

pub fn to_json(prompt: &RefinedPrompt) -> Result<String, AppError> {
    serde_json::to_string_pretty(prompt).map_err(|e| AppError::Internal(e.into()))
}

pub fn from_json(raw: &str) -> Result<RefinedPrompt, AppError> {
    serde_json::from_str(raw)
        .map_err(|e| AppError::Validation(format!("invalid refined prompt JSON: {e}")))
}

/// Human-readable report. Section order is fixed; empty sections still appear.
pub fn to_markdown(prompt: &RefinedPrompt) -> String {
    let mut md = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(md, "# Refined Prompt: {}\n", prompt.prompt_id);
    let types: Vec<&str> = prompt.input_types.iter().map(|t| t.as_str()).collect();
    let _ = writeln!(md, "**Input types:** {}\n", types.join(", "));

    md.push_str("## Core Intent\n\n");
    let _ = writeln!(md, "**Domain:** {}\n", prompt.domain);
    let _ = writeln!(md, "**Summary:** {}\n", prompt.core_intent);
    let _ = writeln!(md, "**Description:** {}\n", prompt.detailed_description);
    if let Some(background) = &prompt.background_context {
        let _ = writeln!(md, "**Background:** {background}\n");
    }

    md.push_str("## Functional Requirements\n\n");
    let requirements = prompt.requirements_by_priority();
    if requirements.is_empty() {
        let _ = writeln!(md, "{NONE_IDENTIFIED}");
    }
    for r in requirements {
        let _ = writeln!(md, "- [{}] **{}**: {}", r.priority, r.category, r.description);
    }
    md.push('\n');

    md.push_str("## Technical Constraints\n\n");
    if prompt.technical_constraints.is_empty() {
        let _ = writeln!(md, "{NONE_IDENTIFIED}");
    }
    for c in &prompt.technical_constraints {
        let tag = if c.is_mandatory { "MANDATORY" } else { "PREFERRED" };
        let _ = writeln!(md, "- [{tag}] **{}**: {}", c.constraint_type, c.description);
    }
    md.push('\n');

    md.push_str("## Expected Outputs\n\n");
    let _ = writeln!(
        md,
        "**Deliverable format:** {}\n",
        prompt.deliverable_format.as_deref().unwrap_or("not specified")
    );
    bullet_list(&mut md, &prompt.expected_outputs);
    if !prompt.success_criteria.is_empty() {
        md.push_str("**Success criteria:**\n\n");
        bullet_list(&mut md, &prompt.success_criteria);
    }

    md.push_str("## Ambiguities\n\n");
    bullet_list(&mut md, &prompt.ambiguities);

    md.push_str("## Assumptions\n\n");
    bullet_list(&mut md, &prompt.assumptions_made);

    md.push_str("---\n\n");
    let _ = writeln!(
        md,
        "_Confidence: {:.2} | Generated: {}_",
        prompt.confidence_score,
        prompt.timestamp.to_rfc3339()
    );
    md
}

fn bullet_list(md: &mut String, items: &[String]) {
    if items.is_empty() {
        let _ = writeln!(md, "{NONE_IDENTIFIED}");
    }
    for item in items {
        let _ = writeln!(md, "- {item}");
    }
    md.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::models::{InputMetadata, InputType};
    use crate::refinement::engine::RuleBasedRefiner;
    use crate::refinement::rules::RuleSet;

    fn refine(text: &str) -> RefinedPrompt {
        RuleBasedRefiner::new(Arc::new(RuleSet::default()))
            .extract(text, &InputMetadata::single(InputType::Text, None, text.len()))
            .unwrap()
    }

    #[test]
    fn test_json_round_trip_is_equal() {
        let prompt = refine(
            "Build a shopping web app with login and Stripe checkout. \
             Additional context: we currently sell through Instagram.",
        );
        let json = to_json(&prompt).unwrap();
        assert!(json.contains(r#""domain": "software_development""#));
        assert!(json.contains(r#""priority": "critical""#));
        assert_eq!(from_json(&json).unwrap(), prompt);
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(matches!(from_json("{}"), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_markdown_sections_in_order() {
        let prompt = refine(
            "Create an invoicing app with payment reminders. Must be deployed on AWS.",
        );
        let md = to_markdown(&prompt);

        let headings = [
            "# Refined Prompt: PROMPT_",
            "## Core Intent",
            "## Functional Requirements",
            "## Technical Constraints",
            "## Expected Outputs",
            "## Ambiguities",
            "## Assumptions",
            "_Confidence: ",
        ];
        let positions: Vec<usize> = headings
            .iter()
            .map(|h| md.find(h).unwrap_or_else(|| panic!("missing {h}")))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_markdown_lists_critical_first_and_tags_constraints() {
        let prompt = refine(
            "Send an email notification when users log in. Add a login page. \
             It must run on iOS.",
        );
        let md = to_markdown(&prompt);

        let critical = md.find("[CRITICAL]").unwrap();
        let low = md.find("[LOW]").unwrap();
        assert!(critical < low);
        assert!(md.contains("- [MANDATORY] **platform**: Target platforms: ios"));
    }

    #[test]
    fn test_markdown_marks_empty_sections() {
        let prompt = refine("Plan a weekend hiking trip for six friends");
        let md = to_markdown(&prompt);
        assert!(md.contains("## Functional Requirements\n\n_None identified._"));
        assert!(md.contains("## Technical Constraints\n\n_None identified._"));
        assert!(md.contains("**Deliverable format:** not specified"));
    }
}
