//! Resume section detection
//!
//! Runs a fixed, ordered list of heading patterns over each line of
//! normalized text. The first pattern matching a line contributes its label;
//! labels are reported once each, in first-seen order.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SectionLabel {
    Contact,
    Summary,
    Experience,
    Education,
    Skills,
    Projects,
    Involvement,
    Certifications,
    Awards,
    Publications,
    Languages,
    References,
}

impl SectionLabel {
    /// The five sections ATS structure scoring cares about.
    pub const CANONICAL: [SectionLabel; 5] = [
        SectionLabel::Contact,
        SectionLabel::Summary,
        SectionLabel::Experience,
        SectionLabel::Education,
        SectionLabel::Skills,
    ];
}

impl fmt::Display for SectionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SectionLabel::Contact => "Contact",
            SectionLabel::Summary => "Summary",
            SectionLabel::Experience => "Experience",
            SectionLabel::Education => "Education",
            SectionLabel::Skills => "Skills",
            SectionLabel::Projects => "Projects",
            SectionLabel::Involvement => "Involvement",
            SectionLabel::Certifications => "Certifications",
            SectionLabel::Awards => "Awards",
            SectionLabel::Publications => "Publications",
            SectionLabel::Languages => "Languages",
            SectionLabel::References => "References",
        };
        write!(f, "{}", name)
    }
}

pub struct SectionDetector {
    patterns: Vec<(SectionLabel, Regex)>,
}

impl Default for SectionDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl SectionDetector {
    pub fn new() -> Self {
        // Order matters: the first matching pattern wins for a given line.
        let table: &[(SectionLabel, &str)] = &[
            (SectionLabel::Contact, r"^(contact( (information|info|details))?|personal (details|information))$"),
            (SectionLabel::Summary, r"^((professional|executive|career) )?(summary|profile|objective|overview)$|^about( me)?$"),
            (SectionLabel::Experience, r"^((work|professional|relevant|employment) )?experience$|^(work|employment) history$|^career$"),
            (SectionLabel::Education, r"^education(( and| &) training)?$|^academic (background|history|qualifications)$"),
            (SectionLabel::Skills, r"^((technical|core|key) )?(skills|competencies|expertise)(( and| &) \w+)?$"),
            (SectionLabel::Projects, r"^((personal|notable|selected|key|side) )?projects$|^portfolio$"),
            (SectionLabel::Involvement, r"^(involvement|activities|leadership|volunteer(ing)?( (work|experience))?|community (involvement|service))$"),
            (SectionLabel::Certifications, r"^(certifications?|certificates|licenses(( and| &) certifications)?)$"),
            (SectionLabel::Awards, r"^(awards?(( and| &) honors)?|honors(( and| &) awards)?|achievements)$"),
            (SectionLabel::Publications, r"^(publications?|research(( and| &) publications)?)$"),
            (SectionLabel::Languages, r"^languages?$"),
            (SectionLabel::References, r"^references?( available upon request)?$"),
        ];

        let patterns = table
            .iter()
            .map(|(label, pattern)| {
                let regex = Regex::new(&format!("(?i){}", pattern)).expect("Invalid section pattern");
                (*label, regex)
            })
            .collect();

        Self { patterns }
    }

    /// Classify a single line as a section heading, if it is one.
    pub fn classify_line(&self, raw_line: &str) -> Option<SectionLabel> {
        let line = raw_line.trim().trim_end_matches(':').trim();
        if line.is_empty() || line.len() > 60 {
            return None;
        }

        self.patterns
            .iter()
            .find(|(_, regex)| regex.is_match(line))
            .map(|(label, _)| *label)
    }

    /// Detect which sections are present, in first-seen order.
    pub fn detect(&self, text: &str) -> Vec<SectionLabel> {
        let mut found: Vec<SectionLabel> = Vec::new();

        for raw_line in text.lines() {
            if let Some(label) = self.classify_line(raw_line) {
                if !found.contains(&label) {
                    found.push(label);
                }
            }
        }

        found
    }
}
