//! Deliverable inference: expected outputs, deliverable format, success criteria.

use crate::models::{Domain, PriorityLevel, Requirement, TechnicalConstraint};
use crate::refinement::rules::RuleSet;
use crate::refinement::text::TextIndex;

/// Domain defaults plus "Documentation" when the text asks for it.
pub fn expected_outputs(index: &TextIndex, domain: Domain, rules: &RuleSet) -> Vec<String> {
    let mut outputs: Vec<String> = rules.default_outputs(domain).to_vec();
    if index.contains_any(&rules.documentation_triggers)
        && !outputs.iter().any(|o| o == "Documentation")
    {
        outputs.push("Documentation".to_string());
    }
    outputs
}

/// First format rule whose phrase appears, in rule order.
pub fn deliverable_format(index: &TextIndex, rules: &RuleSet) -> Option<String> {
    rules
        .formats
        .iter()
        .find(|f| index.contains(&f.phrase))
        .map(|f| f.format.clone())
}

pub fn success_criteria(
    requirements: &[Requirement],
    constraints: &[TechnicalConstraint],
) -> Vec<String> {
    let from_requirements = requirements
        .iter()
        .filter(|r| r.priority == PriorityLevel::Critical)
        .map(|r| format!("{} is fully functional", r.description));

    let from_constraints = constraints
        .iter()
        .filter(|c| c.is_mandatory)
        .map(|c| format!("Meets mandatory {} constraint: {}", c.constraint_type, c.description));

    from_requirements.chain(from_constraints).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format_of(text: &str) -> Option<String> {
        deliverable_format(&TextIndex::new(text), &RuleSet::default())
    }

    #[test]
    fn test_software_defaults() {
        let outputs = expected_outputs(
            &TextIndex::new("build an app"),
            Domain::SoftwareDevelopment,
            &RuleSet::default(),
        );
        assert_eq!(outputs, vec!["Working application", "Source code"]);
    }

    #[test]
    fn test_documentation_added_once() {
        let rules = RuleSet::default();
        let index = TextIndex::new("include documentation and a readme");
        let software = expected_outputs(&index, Domain::SoftwareDevelopment, &rules);
        assert_eq!(software.last().map(String::as_str), Some("Documentation"));

        let analysis = expected_outputs(&index, Domain::DataAnalysis, &rules);
        assert_eq!(analysis.iter().filter(|o| *o == "Documentation").count(), 1);
    }

    #[test]
    fn test_design_domain_adds_design_assets() {
        let outputs = expected_outputs(
            &TextIndex::new("wireframes"),
            Domain::ProductDesign,
            &RuleSet::default(),
        );
        assert!(outputs.contains(&"Design assets".to_string()));
    }

    #[test]
    fn test_other_domain_has_no_outputs() {
        let outputs = expected_outputs(&TextIndex::new("trip"), Domain::Other, &RuleSet::default());
        assert!(outputs.is_empty());
    }

    #[test]
    fn test_formats() {
        assert_eq!(format_of("a web application for teams").as_deref(), Some("web_application"));
        assert_eq!(format_of("a mobile app for runners").as_deref(), Some("mobile_application"));
        assert_eq!(format_of("expose an API for partners").as_deref(), Some("api_service"));
        assert_eq!(format_of("a command line tool").as_deref(), Some("cli_tool"));
        assert_eq!(format_of("write a blog post"), None);
    }

    #[test]
    fn test_success_criteria_from_critical_and_mandatory() {
        let reqs = vec![
            Requirement {
                description: "User authentication".to_string(),
                priority: PriorityLevel::Critical,
                category: "authentication".to_string(),
            },
            Requirement {
                description: "Responsive layout".to_string(),
                priority: PriorityLevel::Medium,
                category: "ui_ux".to_string(),
            },
        ];
        let cons = vec![
            TechnicalConstraint {
                constraint_type: "platform".to_string(),
                description: "Target platforms: mobile".to_string(),
                is_mandatory: true,
            },
            TechnicalConstraint {
                constraint_type: "deployment".to_string(),
                description: "Deployment targets: aws".to_string(),
                is_mandatory: false,
            },
        ];
        let criteria = success_criteria(&reqs, &cons);
        assert_eq!(
            criteria,
            vec![
                "User authentication is fully functional",
                "Meets mandatory platform constraint: Target platforms: mobile",
            ]
        );
    }
}
