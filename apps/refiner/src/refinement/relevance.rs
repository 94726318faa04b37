//! Relevance gate. Decides whether extracted text is worth refining at all.
//!
//! Checks run in order and the first failure decides the verdict:
//! 1. empty input
//! 2. greeting / small talk only
//! 3. below the minimum word count for the input type
//! 4. spam or placeholder text
//!
//! Action keywords are a soft signal only: they are reported, never required.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::models::input::strip_source_markers;
use crate::models::InputType;
use crate::refinement::rules::RuleSet;
use crate::refinement::text::{tokenize, word_count, TextIndex};

pub const REASON_EMPTY: &str = "empty input";
pub const REASON_GREETING: &str = "appears to be a greeting, not a task description";
pub const REASON_SPAM: &str = "appears to be spam or placeholder text";

/// Share of non-space characters a single character may take before the text counts as noise.
const DOMINANT_CHAR_RATIO: f64 = 0.5;
/// Minimum share of alphabetic characters among non-space characters.
const MIN_ALPHA_RATIO: f64 = 0.5;
/// Distinct/total word ratio at or below which text counts as repetition.
const MAX_REPEAT_RATIO: f64 = 0.25;
const REPEAT_MIN_WORDS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelevanceVerdict {
    pub is_relevant: bool,
    pub reason: String,
    pub word_count: usize,
    pub has_action_keyword: bool,
}

impl RelevanceVerdict {
    fn reject(reason: impl Into<String>, word_count: usize) -> Self {
        Self {
            is_relevant: false,
            reason: reason.into(),
            word_count,
            has_action_keyword: false,
        }
    }
}

/// Validates raw extracted text. Pure function of its inputs.
pub fn validate(content: &str, input_type: InputType, rules: &RuleSet) -> RelevanceVerdict {
    let body = strip_source_markers(content);
    let trimmed = body.trim();

    if trimmed.is_empty() {
        return RelevanceVerdict::reject(REASON_EMPTY, 0);
    }

    let words = word_count(trimmed);

    if is_greeting_only(trimmed, rules) {
        return RelevanceVerdict::reject(REASON_GREETING, words);
    }

    let min_words = rules.min_words_for(input_type);
    if words < min_words {
        return RelevanceVerdict::reject(
            format!(
                "too short / insufficient detail ({words} words, minimum {min_words} for {input_type} input)"
            ),
            words,
        );
    }

    if is_spam_or_placeholder(trimmed, rules) {
        return RelevanceVerdict::reject(REASON_SPAM, words);
    }

    let has_action_keyword = TextIndex::new(trimmed).contains_any(&rules.action_keywords);
    let reason = if has_action_keyword {
        "input appears relevant"
    } else {
        "input appears relevant (no explicit action keyword)"
    };

    RelevanceVerdict {
        is_relevant: true,
        reason: reason.to_string(),
        word_count: words,
        has_action_keyword,
    }
}

/// True when every word belongs to a greeting phrase or a filler word,
/// and at least one greeting phrase is present.
fn is_greeting_only(content: &str, rules: &RuleSet) -> bool {
    let index = TextIndex::new(content);
    let tokens = index.tokens();
    if tokens.is_empty() {
        return false;
    }

    let mut phrases: Vec<Vec<String>> = rules
        .greeting_phrases
        .iter()
        .map(|p| tokenize(p))
        .filter(|p| !p.is_empty())
        .collect();
    // Longest first so "thank you very much" wins over "thank you".
    phrases.sort_by_key(|p| std::cmp::Reverse(p.len()));

    let fillers: HashSet<String> = rules
        .greeting_fillers
        .iter()
        .map(|f| f.to_lowercase())
        .collect();

    let mut i = 0;
    let mut saw_greeting = false;
    while i < tokens.len() {
        if let Some(phrase) = phrases.iter().find(|p| index.exact_at(i, p)) {
            saw_greeting = true;
            i += phrase.len();
        } else if fillers.contains(&tokens[i]) {
            i += 1;
        } else {
            return false;
        }
    }
    saw_greeting
}

/// Spam phrases match whole words ("act now" is not inside "contact now").
/// Placeholder patterns may run on ("asdfasdf").
fn is_spam_or_placeholder(content: &str, rules: &RuleSet) -> bool {
    let index = TextIndex::new(content);
    if index.contains_exact_any(&rules.spam_phrases)
        || index.contains_any(&rules.placeholder_patterns)
    {
        return true;
    }

    let non_space: Vec<char> = content.chars().filter(|c| !c.is_whitespace()).collect();
    if !non_space.is_empty() {
        let alphabetic = non_space.iter().filter(|c| c.is_alphabetic()).count();
        if (alphabetic as f64 / non_space.len() as f64) < MIN_ALPHA_RATIO {
            return true;
        }

        let mut freq: HashMap<char, usize> = HashMap::new();
        for c in &non_space {
            *freq.entry(c.to_ascii_lowercase()).or_insert(0) += 1;
        }
        let dominant = freq.values().copied().max().unwrap_or(0);
        if (dominant as f64 / non_space.len() as f64) >= DOMINANT_CHAR_RATIO {
            return true;
        }
    }

    let tokens = tokenize(content);
    if tokens.len() >= REPEAT_MIN_WORDS {
        let distinct: HashSet<&String> = tokens.iter().collect();
        if (distinct.len() as f64 / tokens.len() as f64) <= MAX_REPEAT_RATIO {
            return true;
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(content: &str, input_type: InputType) -> RelevanceVerdict {
        validate(content, input_type, &RuleSet::default())
    }

    #[test]
    fn test_empty_input_rejected() {
        let v = check("", InputType::Text);
        assert!(!v.is_relevant);
        assert_eq!(v.reason, REASON_EMPTY);
    }

    #[test]
    fn test_whitespace_only_rejected_as_empty() {
        let v = check("  \n\t ", InputType::Pdf);
        assert_eq!(v.reason, REASON_EMPTY);
    }

    #[test]
    fn test_hi_rejected_as_greeting() {
        let v = check("hi", InputType::Text);
        assert!(!v.is_relevant);
        assert!(v.reason.contains("greeting"));
    }

    #[test]
    fn test_greeting_rejected_for_every_input_type() {
        for input_type in [
            InputType::Text,
            InputType::Image,
            InputType::Pdf,
            InputType::Docx,
            InputType::Mixed,
        ] {
            for greeting in ["Hello!", "hey there", "How are you?", "Thanks", "thank you so much"] {
                let v = check(greeting, input_type);
                assert!(!v.is_relevant, "{greeting:?} as {input_type}");
                assert_eq!(v.reason, REASON_GREETING, "{greeting:?} as {input_type}");
            }
        }
    }

    #[test]
    fn test_greeting_with_task_is_not_greeting_only() {
        let v = check("Hello, please build a small inventory tracking app", InputType::Text);
        assert!(v.is_relevant, "reason: {}", v.reason);
    }

    #[test]
    fn test_ok_rejected_as_too_short() {
        let v = check("ok", InputType::Text);
        assert!(!v.is_relevant);
        assert!(v.reason.contains("too short"));
        assert!(v.reason.contains("insufficient detail"));
    }

    #[test]
    fn test_below_threshold_rejected_for_each_type() {
        let rules = RuleSet::default();
        let samples = [
            "inventory",
            "inventory tracker",
            "inventory tracker with",
            "inventory tracker with barcode",
        ];
        for input_type in [InputType::Text, InputType::Pdf, InputType::Docx, InputType::Image] {
            let min = rules.min_words_for(input_type);
            for sample in samples.iter().filter(|s| word_count(s) < min) {
                let v = validate(sample, input_type, &rules);
                assert!(!v.is_relevant);
                assert!(v.reason.contains("too short"), "{sample:?} as {input_type}");
            }
        }
    }

    #[test]
    fn test_image_accepts_three_words() {
        assert!(check("invoice approval workflow", InputType::Image).is_relevant);
        assert!(!check("invoice approval workflow", InputType::Text).is_relevant);
    }

    #[test]
    fn test_lorem_ipsum_rejected_as_spam() {
        let v = check(
            "Lorem ipsum dolor sit amet, consectetur adipiscing elit",
            InputType::Text,
        );
        assert_eq!(v.reason, REASON_SPAM);
    }

    #[test]
    fn test_repeated_characters_rejected_as_spam() {
        let v = check("aaaaaaa aaaaaaa aaaaaa aaaaaaa aaaaa", InputType::Text);
        assert_eq!(v.reason, REASON_SPAM);
    }

    #[test]
    fn test_repeated_words_rejected_as_spam() {
        let v = check("test test test test test test test test", InputType::Text);
        assert_eq!(v.reason, REASON_SPAM);
    }

    #[test]
    fn test_symbol_noise_rejected_as_spam() {
        let v = check("#$% 1234 &&** 99!! @@@ 42 7 88 ### 5", InputType::Text);
        assert_eq!(v.reason, REASON_SPAM);
    }

    #[test]
    fn test_marketing_spam_rejected() {
        let v = check("Limited offer, click here to claim your prize today", InputType::Text);
        assert_eq!(v.reason, REASON_SPAM);
    }

    #[test]
    fn test_spam_phrase_inside_longer_words_is_accepted() {
        for text in [
            "Build a support portal so customers can contact now instead of waiting for email replies.",
            "Create a React Native app that helps communities react now to flood warnings.",
            "Report the impact now that the new pricing is live across all regions.",
        ] {
            let v = check(text, InputType::Text);
            assert!(v.is_relevant, "{text}: {}", v.reason);
        }
    }

    #[test]
    fn test_keyboard_mash_rejected_as_placeholder() {
        let v = check("asdfasdf jkl build thing for the team please", InputType::Text);
        assert_eq!(v.reason, REASON_SPAM);
    }

    #[test]
    fn test_keyword_free_description_still_accepted() {
        let v = check(
            "A place where our volunteers see upcoming shifts and swap them",
            InputType::Text,
        );
        assert!(v.is_relevant);
        assert!(!v.has_action_keyword);
    }

    #[test]
    fn test_action_keyword_reported() {
        let v = check("Build a task management web application", InputType::Text);
        assert!(v.is_relevant);
        assert!(v.has_action_keyword);
        assert_eq!(v.word_count, 6);
    }

    #[test]
    fn test_source_markers_do_not_count_as_words() {
        let v = check("--- Source: notes.txt ---\n\nhi", InputType::Text);
        assert_eq!(v.reason, REASON_GREETING);
    }
}
