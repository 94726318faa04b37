// LLM prompt constants for the remote extraction backend.
// Shared fragments live in llm_client::prompts.

use crate::llm_client::prompts::JSON_ONLY_SYSTEM;

/// System prompt for refinement. Enforces JSON-only output.
pub fn refine_system() -> String {
    format!(
        "You are a prompt refinement expert. \
        You turn loosely written task descriptions into structured project briefs. \
        {JSON_ONLY_SYSTEM}"
    )
}

/// Refinement prompt template. Replace `{content}` and `{metadata}` before sending.
pub const REFINE_PROMPT_TEMPLATE: &str = r#"Analyze the following input and extract structured information.

INPUT CONTENT:
{content}

INPUT METADATA:
{metadata}

Return a JSON object with this EXACT schema (no extra fields):
{
  "core_intent": "Single sentence summary",
  "detailed_description": "2-3 sentence explanation",
  "domain": "software_development",
  "functional_requirements": [
    {"description": "User authentication", "priority": "critical", "category": "authentication"}
  ],
  "technical_constraints": [
    {"constraint_type": "platform", "description": "Must run on mobile", "is_mandatory": true}
  ],
  "expected_outputs": ["Working application"],
  "deliverable_format": "web_application",
  "background_context": null,
  "success_criteria": ["Users can log in"],
  "confidence_score": 0.8,
  "ambiguities": ["Technology stack not specified"],
  "assumptions_made": []
}

Rules:
- "domain" is exactly one of: software_development, product_design, data_analysis,
  content_creation, automation, other.
- "priority" is exactly one of: critical, high, medium, low.
- "constraint_type" is one of: platform, technology, deployment, performance, security, timeline, other.
- "is_mandatory" is true only when the input says must / required; false for should / prefer.
- One requirement per category. Do not repeat a category.
- "deliverable_format" is web_application, mobile_application, api_service, cli_tool or null.
- "confidence_score" is between 0.0 and 1.0 and reflects how well-specified the input is.
- List anything you could not determine under "ambiguities". Do NOT invent details."#;

pub fn build_refine_prompt(content: &str, metadata_json: &str) -> String {
    REFINE_PROMPT_TEMPLATE
        .replace("{metadata}", metadata_json)
        .replace("{content}", content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_refine_prompt_substitutes_placeholders() {
        let prompt = build_refine_prompt("Build a CRM", r#"{"source_type":"text"}"#);
        assert!(prompt.contains("Build a CRM"));
        assert!(prompt.contains(r#"{"source_type":"text"}"#));
        assert!(!prompt.contains("{content}"));
        assert!(!prompt.contains("{metadata}"));
    }

    #[test]
    fn test_refine_system_requires_json() {
        assert!(refine_system().contains("valid JSON only"));
    }
}
