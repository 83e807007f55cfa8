//! Text normalization and tokenization
//!
//! Every extraction source runs through the same normalization pass so the
//! section detector and scoring engine see uniform text regardless of where
//! the bytes came from.

use regex::Regex;
use std::collections::HashSet;
use unicode_segmentation::UnicodeSegmentation;

/// Bullet glyphs that PDF extraction surfaces inconsistently; all collapse to
/// one marker.
const BULLET_GLYPHS: &[char] = &['\u{2022}', '\u{25CF}', '\u{25AA}', '\u{25E6}', '\u{2023}', '\u{2219}', '\u{00B7}', '\u{25CB}'];

/// Known mis-encoded sequences (UTF-8 read as Latin-1 upstream) and their
/// repairs.
const MOJIBAKE_REPAIRS: &[(&str, &str)] = &[
    ("â€™", "'"),
    ("â€˜", "'"),
    ("â€œ", "\""),
    ("â€\u{9d}", "\""),
    ("â€“", "-"),
    ("â€”", "-"),
    ("â€¢", "-"),
    ("Ã©", "é"),
    ("Ã¨", "è"),
    ("Ã¼", "ü"),
    ("Ã¶", "ö"),
    ("Â ", " "),
];

/// Function words ignored when matching resume tokens against job tokens.
/// Tokens of three characters or fewer are already dropped by length, so this
/// list only carries longer ones.
const STOP_WORDS: &[&str] = &[
    "with", "that", "this", "from", "your", "will", "have", "them", "then", "than",
    "what", "when", "where", "which", "while", "would", "should", "could", "their",
    "they", "been", "being", "were", "must", "also", "such", "some", "more", "most",
    "other", "over", "into", "about", "able", "each", "well", "work", "team",
];

pub struct TextProcessor {
    email_regex: Regex,
    phone_regex: Regex,
    url_regex: Regex,
    stop_words: HashSet<&'static str>,
}

impl Default for TextProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl TextProcessor {
    pub fn new() -> Self {
        let email_regex = Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}")
            .expect("Invalid email regex");

        let phone_regex = Regex::new(r"\b(?:\+?1[-. ]?)?\(?[0-9]{3}\)?[-. ]?[0-9]{3}[-. ]?[0-9]{4}\b")
            .expect("Invalid phone regex");

        let url_regex = Regex::new(r"https?://[^\s]+|www\.[^\s]+|linkedin\.com/[^\s]+|github\.com/[^\s]+")
            .expect("Invalid URL regex");

        Self {
            email_regex,
            phone_regex,
            url_regex,
            stop_words: STOP_WORDS.iter().copied().collect(),
        }
    }

    /// Uniform normalization applied to every extraction source.
    pub fn normalize(&self, text: &str) -> String {
        let mut repaired = text.to_string();
        for (broken, fixed) in MOJIBAKE_REPAIRS {
            if repaired.contains(broken) {
                repaired = repaired.replace(broken, fixed);
            }
        }

        let mut lines: Vec<String> = Vec::new();
        let mut last_blank = false;
        for raw_line in repaired.lines() {
            let line = self.normalize_line(raw_line);
            if line.is_empty() {
                // Cap runs of blank lines at one.
                if !last_blank && !lines.is_empty() {
                    lines.push(String::new());
                }
                last_blank = true;
            } else {
                lines.push(line);
                last_blank = false;
            }
        }
        while lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }

        lines.join("\n")
    }

    fn normalize_line(&self, line: &str) -> String {
        let mut out = String::with_capacity(line.len() + 8);
        let mut prev: Option<char> = None;

        for ch in line.chars() {
            let ch = if BULLET_GLYPHS.contains(&ch) { '-' } else { ch };

            if ch.is_whitespace() {
                if !out.is_empty() && !out.ends_with(' ') {
                    out.push(' ');
                }
                prev = Some(' ');
                continue;
            }

            // Multi-column flattening glues words together across case
            // boundaries ("EngineerAcme"); re-insert the lost space.
            if let Some(p) = prev {
                if p.is_lowercase() && ch.is_uppercase() {
                    out.push(' ');
                }
            }

            out.push(ch);
            prev = Some(ch);
        }

        out.trim().to_string()
    }

    /// Tokenize for job/resume keyword overlap: lowercase, punctuation
    /// stripped, tokens of length <= 3 and stop words dropped.
    pub fn match_tokens(&self, text: &str) -> Vec<String> {
        text.to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| t.len() > 3)
            .filter(|t| !self.stop_words.contains(t))
            .map(str::to_string)
            .collect()
    }

    /// Same tokens as a set, for overlap computation.
    pub fn match_token_set(&self, text: &str) -> HashSet<String> {
        self.match_tokens(text).into_iter().collect()
    }

    /// Split text into sentences (used to pull context snippets out of a job
    /// description).
    pub fn split_sentences(&self, text: &str) -> Vec<String> {
        text.unicode_sentences()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    pub fn find_email(&self, text: &str) -> Option<String> {
        self.email_regex.find(text).map(|m| m.as_str().to_string())
    }

    pub fn find_phone(&self, text: &str) -> Option<String> {
        self.phone_regex.find(text).map(|m| m.as_str().to_string())
    }

    pub fn find_urls(&self, text: &str) -> Vec<String> {
        self.url_regex
            .find_iter(text)
            .map(|m| m.as_str().trim_end_matches(&['.', ',', ')'][..]).to_string())
            .collect()
    }

    pub fn word_count(&self, text: &str) -> usize {
        text.unicode_words().count()
    }
}
