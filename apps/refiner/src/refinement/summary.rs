//! Intent, description and background extraction.

use crate::models::input::strip_source_markers;
use crate::refinement::rules::RuleSet;
use crate::refinement::text::{collapse_whitespace, first_words, split_sentences, truncate_at_word};

/// Upper bound on a terminated first sentence used as the intent.
const MAX_INTENT_WORDS: usize = 60;

/// First terminated sentence, or the first `intent_fallback_words` words when the
/// text has no sentence terminator at all.
pub fn core_intent(content: &str, rules: &RuleSet) -> String {
    let body = strip_source_markers(content);
    let sentences = split_sentences(&body);

    if sentences.iter().any(|(_, terminated)| *terminated) {
        if let Some((first, _)) = sentences.first() {
            return first_words(first, MAX_INTENT_WORDS);
        }
    }
    first_words(&collapse_whitespace(&body), rules.intent_fallback_words)
}

/// Whitespace-collapsed content bounded at `detail_max_chars`.
pub fn detailed_description(content: &str, rules: &RuleSet) -> String {
    let body = collapse_whitespace(&strip_source_markers(content));
    truncate_at_word(&body, rules.detail_max_chars)
}

/// Sentences carrying a background marker, joined. `None` when there are none.
pub fn background_context(content: &str, rules: &RuleSet) -> Option<String> {
    let body = strip_source_markers(content);
    let picked: Vec<String> = split_sentences(&body)
        .into_iter()
        .map(|(s, _)| s)
        .filter(|s| {
            let lowered = s.to_lowercase();
            rules
                .background_markers
                .iter()
                .any(|m| lowered.contains(&m.to_lowercase()))
        })
        .collect();

    if picked.is_empty() {
        None
    } else {
        Some(picked.join(" "))
    }
}
