//! Surface-text helpers shared by the validator and the extraction steps.
//!
//! Matching rules:
//! - text is lowercased and split into alphanumeric words (apostrophes are dropped,
//!   so "what's" becomes "whats");
//! - `contains`/`positions` are loose: a single-word keyword matches any word that
//!   starts with it (`app` ↔ `application`), and a multi-word keyword matches
//!   consecutive words, exact except the last, which matches by prefix;
//! - the `exact_*` variants require every word to match in full, so `auth` never
//!   matches `authors`. Requirement and constraint triggers use these.

/// Lowercased word sequence of a piece of text.
#[derive(Debug, Clone, Default)]
pub struct TextIndex {
    tokens: Vec<String>,
}

impl TextIndex {
    pub fn new(text: &str) -> Self {
        Self {
            tokens: tokenize(text),
        }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn word_count(&self) -> usize {
        self.tokens.len()
    }

    /// Start positions of every match of `phrase`.
    pub fn positions(&self, phrase: &str) -> Vec<usize> {
        let needle = tokenize(phrase);
        if needle.is_empty() || needle.len() > self.tokens.len() {
            return Vec::new();
        }
        (0..=self.tokens.len() - needle.len())
            .filter(|&i| self.matches_at(i, &needle))
            .collect()
    }

    pub fn count(&self, phrase: &str) -> usize {
        self.positions(phrase).len()
    }

    pub fn contains(&self, phrase: &str) -> bool {
        !self.positions(phrase).is_empty()
    }

    pub fn contains_any<S: AsRef<str>>(&self, phrases: &[S]) -> bool {
        phrases.iter().any(|p| self.contains(p.as_ref()))
    }

    /// Start positions of every whole-word match of `phrase`.
    pub fn exact_positions(&self, phrase: &str) -> Vec<usize> {
        let needle = tokenize(phrase);
        if needle.is_empty() || needle.len() > self.tokens.len() {
            return Vec::new();
        }
        (0..=self.tokens.len() - needle.len())
            .filter(|&i| self.exact_at(i, &needle))
            .collect()
    }

    pub fn contains_exact(&self, phrase: &str) -> bool {
        !self.exact_positions(phrase).is_empty()
    }

    pub fn contains_exact_any<S: AsRef<str>>(&self, phrases: &[S]) -> bool {
        phrases.iter().any(|p| self.contains_exact(p.as_ref()))
    }

    /// Exact token-sequence match at `i` (no prefix relaxation).
    pub fn exact_at(&self, i: usize, phrase: &[String]) -> bool {
        i + phrase.len() <= self.tokens.len()
            && phrase.iter().enumerate().all(|(j, p)| &self.tokens[i + j] == p)
    }

    fn matches_at(&self, i: usize, needle: &[String]) -> bool {
        let last = needle.len() - 1;
        needle.iter().enumerate().all(|(j, kw)| {
            let token = &self.tokens[i + j];
            if j == last {
                token.starts_with(kw.as_str())
            } else {
                token == kw
            }
        })
    }
}

pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for c in text.chars() {
        if c.is_alphanumeric() {
            current.extend(c.to_lowercase());
        } else if c == '\'' || c == '\u{2019}' {
            continue;
        } else if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Words that carry at least one letter or digit.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace()
        .filter(|w| w.chars().any(char::is_alphanumeric))
        .count()
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Splits on `.`, `!` or `?` followed by whitespace (or end of text) and on blank lines.
/// The terminator stays with its sentence. Returns `(sentence, terminated)` pairs.
pub fn split_sentences(text: &str) -> Vec<(String, bool)> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let chars: Vec<char> = text.chars().collect();

    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();

        if matches!(c, '.' | '!' | '?') && next.map_or(true, char::is_whitespace) {
            current.push(c);
            push_sentence(&mut sentences, &mut current, true);
        } else if c == '\n' && next == Some('\n') {
            push_sentence(&mut sentences, &mut current, false);
        } else {
            current.push(c);
        }
        i += 1;
    }
    push_sentence(&mut sentences, &mut current, false);
    sentences
}

fn push_sentence(out: &mut Vec<(String, bool)>, current: &mut String, terminated: bool) {
    let sentence = collapse_whitespace(current);
    current.clear();
    if !sentence.is_empty() {
        out.push((sentence, terminated));
    }
}

/// First `n` whitespace-separated words; `...` marks a cut.
pub fn first_words(text: &str, n: usize) -> String {
    let all: Vec<&str> = text.split_whitespace().collect();
    if all.len() <= n {
        all.join(" ")
    } else {
        format!("{}...", all[..n].join(" "))
    }
}

/// Bounds `text` to `max_chars` characters, cutting at the last word boundary and
/// appending `...`. The marker counts toward the bound.
pub fn truncate_at_word(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let budget = max_chars.saturating_sub(3);
    let head: String = text.chars().take(budget).collect();
    let cut = match head.rfind(char::is_whitespace) {
        Some(pos) if pos > 0 => head[..pos].trim_end().to_string(),
        _ => head,
    };
    format!("{cut}...")
}
