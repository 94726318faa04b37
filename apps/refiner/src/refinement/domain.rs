//! Domain classification by keyword counting.

use crate::models::Domain;
use crate::refinement::rules::RuleSet;
use crate::refinement::text::TextIndex;

/// Keyword occurrences per domain, in rule declaration order.
pub fn domain_scores(index: &TextIndex, rules: &RuleSet) -> Vec<(Domain, usize)> {
    rules
        .domains
        .iter()
        .map(|rule| {
            let matches = rule.keywords.iter().map(|kw| index.count(kw)).sum();
            (rule.domain, matches)
        })
        .collect()
}

/// Highest keyword count wins; ties go to the earlier-declared domain; no hits → `Other`.
pub fn classify_domain(index: &TextIndex, rules: &RuleSet) -> Domain {
    let mut best = (Domain::Other, 0usize);
    for (domain, matches) in domain_scores(index, rules) {
        if matches > best.1 {
            best = (domain, matches);
        }
    }
    best.0
}
