//! ATS compatibility scoring
//!
//! A deterministic, pure function of the extraction, the merged resume, and
//! an optional job text. Four sub-scores of up to 25 points each; the total
//! is their plain sum and is never re-clamped.

use crate::input::extractor::DocumentExtraction;
use crate::processing::resume::{Experience, StructuredResume};
use crate::processing::sections::SectionLabel;
use crate::processing::text_processor::TextProcessor;
use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionCategory {
    Formatting,
    Structure,
    Content,
    Readability,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub category: SuggestionCategory,
    pub severity: Severity,
    pub message: String,
    pub section: Option<SectionLabel>,
    pub example: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringResult {
    pub formatting: u8,
    pub structure: u8,
    pub readability: u8,
    pub keywords: u8,
    /// Sum of the four sub-scores; 0-100 by construction.
    pub total: u8,
    pub suggestions: Vec<Suggestion>,
    pub confidence: f32,
}

pub struct ScoringEngine {
    processor: TextProcessor,
    action_verb: Regex,
    quantified: Regex,
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoringEngine {
    pub fn new() -> Self {
        let action_verb = Regex::new(
            r"(?i)\b(led|managed|built|created|developed|designed|implemented|launched|delivered|improved|increased|reduced|optimized|architected|spearheaded|automated|migrated|mentored|shipped|drove)\b",
        )
        .expect("Invalid action verb regex");

        // A percentage anywhere, or "increased/decreased/reduced/improved ... by".
        let quantified = Regex::new(
            r"(?i)\d+(?:\.\d+)?\s*%|\b(?:increased|decreased|reduced|improved)\b[^.\n]{0,40}\bby\b",
        )
        .expect("Invalid quantified achievement regex");

        Self {
            processor: TextProcessor::new(),
            action_verb,
            quantified,
        }
    }

    pub fn score(
        &self,
        extraction: &DocumentExtraction,
        resume: &StructuredResume,
        job_text: Option<&str>,
        confidence: f32,
    ) -> ScoringResult {
        let formatting = self.formatting_score(extraction);
        let structure = self.structure_score(extraction);
        let readability = self.readability_score(resume);
        let keywords = self.keyword_score(extraction, resume, job_text);
        let suggestions = self.suggestions(extraction, resume);

        ScoringResult {
            formatting,
            structure,
            readability,
            keywords,
            total: formatting + structure + readability + keywords,
            suggestions,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    fn formatting_score(&self, extraction: &DocumentExtraction) -> u8 {
        let stats = &extraction.stats;
        let mut score = 0;
        if !stats.encrypted && stats.version.is_some() {
            score += 10;
        }
        if stats.page_count <= 2 {
            score += 5;
        }
        if (200..=800).contains(&stats.word_count) {
            score += 5;
        }
        if extraction.warnings.is_empty() {
            score += 5;
        }
        score
    }

    fn structure_score(&self, extraction: &DocumentExtraction) -> u8 {
        let score = SectionLabel::CANONICAL
            .iter()
            .filter(|label| extraction.sections.contains(label))
            .count() as u8
            * 5;
        score.min(25)
    }

    fn readability_score(&self, resume: &StructuredResume) -> u8 {
        let mut score = 0;
        if resume.contact.email.is_some() {
            score += 5;
        }
        if resume.contact.phone.is_some() {
            score += 5;
        }
        if !resume.experience.is_empty() {
            score += 5;
        }
        if !resume.education.is_empty() {
            score += 5;
        }
        if !resume.skill_keywords().is_empty() {
            score += 5;
        }
        score
    }

    fn keyword_score(
        &self,
        extraction: &DocumentExtraction,
        resume: &StructuredResume,
        job_text: Option<&str>,
    ) -> u8 {
        match job_text {
            Some(job) => {
                let job_tokens = self.processor.match_token_set(job);
                if job_tokens.is_empty() {
                    return 0;
                }
                let resume_tokens = self.processor.match_token_set(&extraction.text);
                let overlap = job_tokens.intersection(&resume_tokens).count();
                let score = (25.0 * overlap as f64 / job_tokens.len() as f64).round();
                score.clamp(0.0, 25.0) as u8
            }
            None => {
                let mut score = 0;
                if self.action_verb.is_match(&extraction.text) {
                    score += 10;
                }
                if self.quantified.is_match(&extraction.text) {
                    score += 10;
                }
                if resume.skill_keywords().len() > 5 {
                    score += 5;
                }
                score
            }
        }
    }

    /// Fixed, ordered rule list; every rule is independent and emits at most
    /// one suggestion (per entry, for the per-entry rules).
    fn suggestions(&self, extraction: &DocumentExtraction, resume: &StructuredResume) -> Vec<Suggestion> {
        let mut out = Vec::new();
        let stats = &extraction.stats;

        if stats.page_count > 2 {
            out.push(Suggestion {
                category: SuggestionCategory::Formatting,
                severity: Severity::High,
                message: format!(
                    "The document runs {} pages; trim it to two or fewer",
                    stats.page_count
                ),
                section: None,
                example: None,
            });
        }

        if stats.encrypted {
            out.push(Suggestion {
                category: SuggestionCategory::Formatting,
                severity: Severity::Critical,
                message: "The document is encrypted and many screeners cannot read it; re-export without a password".to_string(),
                section: None,
                example: None,
            });
        }

        if resume.summary.as_deref().map_or(true, |s| s.trim().is_empty()) {
            out.push(Suggestion {
                category: SuggestionCategory::Structure,
                severity: Severity::Medium,
                message: "Add a short professional summary near the top".to_string(),
                section: Some(SectionLabel::Summary),
                example: Some(
                    "Backend engineer with 6 years of experience building high-throughput data services".to_string(),
                ),
            });
        }

        if resume.skill_keywords().len() < 5 {
            out.push(Suggestion {
                category: SuggestionCategory::Content,
                severity: Severity::High,
                message: "List at least five concrete skills; screeners match on them directly".to_string(),
                section: Some(SectionLabel::Skills),
                example: None,
            });
        }

        for (index, entry) in resume.experience.iter().enumerate() {
            let lines = entry
                .description
                .as_deref()
                .map(|d| d.lines().filter(|l| !l.trim().is_empty()).count())
                .unwrap_or(0);
            if lines < 3 {
                out.push(Suggestion {
                    category: SuggestionCategory::Content,
                    severity: Severity::Medium,
                    message: format!(
                        "Expand the {} entry to at least three responsibility lines",
                        entry_label(entry, index)
                    ),
                    section: Some(SectionLabel::Experience),
                    example: None,
                });
            }
        }

        for (index, entry) in resume.experience.iter().enumerate() {
            let text = entry.description.as_deref().unwrap_or("");
            if !self.quantified.is_match(text) {
                out.push(Suggestion {
                    category: SuggestionCategory::Content,
                    severity: Severity::Medium,
                    message: format!(
                        "Quantify the impact in the {} entry",
                        entry_label(entry, index)
                    ),
                    section: Some(SectionLabel::Experience),
                    example: Some("Reduced deploy time by 35% by parallelizing the build".to_string()),
                });
            }
        }

        if resume.contact.email.is_none() || resume.contact.phone.is_none() {
            out.push(Suggestion {
                category: SuggestionCategory::Readability,
                severity: Severity::Critical,
                message: "Include both an email address and a phone number in the contact block".to_string(),
                section: Some(SectionLabel::Contact),
                example: None,
            });
        }

        out
    }
}

fn entry_label(entry: &Experience, index: usize) -> String {
    entry
        .company
        .as_deref()
        .or(entry.role.as_deref())
        .map(str::to_string)
        .unwrap_or_else(|| format!("#{}", index + 1))
}
