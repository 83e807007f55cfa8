//! Analysis report formatting with console, JSON, and markdown output

use crate::config::OutputFormat;
use crate::error::Result;
use crate::pipeline::record::ProcessingRecord;
use crate::processing::keyword_gap::{ImportanceTier, KeywordAnalysis};
use crate::processing::scoring::{ScoringResult, Severity};
use colored::{Color, Colorize};

/// Trait for formatting a processed record
pub trait OutputFormatter {
    fn format_report(&self, record: &ProcessingRecord) -> Result<String>;
}

pub struct ConsoleFormatter {
    use_colors: bool,
    detailed: bool,
}

pub struct JsonFormatter;

pub struct MarkdownFormatter;

/// Resolve a formatter for the requested output format.
pub fn formatter_for(format: &OutputFormat, use_colors: bool, detailed: bool) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::Console => Box::new(ConsoleFormatter::new(use_colors, detailed)),
        OutputFormat::Json => Box::new(JsonFormatter),
        OutputFormat::Markdown => Box::new(MarkdownFormatter),
    }
}

impl ConsoleFormatter {
    pub fn new(use_colors: bool, detailed: bool) -> Self {
        Self { use_colors, detailed }
    }

    fn colorize(&self, text: &str, color: Color) -> String {
        if self.use_colors {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn score_badge(&self, score: u8) -> String {
        let (badge, color) = match score {
            90..=100 => ("EXCELLENT", Color::Green),
            75..=89 => ("GOOD", Color::BrightGreen),
            60..=74 => ("FAIR", Color::Yellow),
            40..=59 => ("NEEDS WORK", Color::BrightRed),
            _ => ("POOR", Color::Red),
        };
        format!("[{}]", self.colorize(badge, color))
    }

    fn severity_icon(&self, severity: Severity) -> &'static str {
        match severity {
            Severity::Critical => "[!]",
            Severity::High => "[*]",
            Severity::Medium => "[-]",
            Severity::Low => "[+]",
        }
    }

    fn format_scoring(&self, out: &mut String, scoring: &ScoringResult) {
        out.push_str(&format!(
            "Overall Score: {}/100 {}\n",
            scoring.total,
            self.score_badge(scoring.total)
        ));
        out.push_str(&format!("Confidence: {:.0}%\n\n", scoring.confidence * 100.0));
        out.push_str(&format!("  Formatting:  {:>2}/25\n", scoring.formatting));
        out.push_str(&format!("  Structure:   {:>2}/25\n", scoring.structure));
        out.push_str(&format!("  Readability: {:>2}/25\n", scoring.readability));
        out.push_str(&format!("  Keywords:    {:>2}/25\n", scoring.keywords));

        if !scoring.suggestions.is_empty() {
            out.push_str(&format!("\n{}\n", self.colorize("Suggestions", Color::Yellow)));
            for suggestion in &scoring.suggestions {
                out.push_str(&format!(
                    "  {} {}\n",
                    self.severity_icon(suggestion.severity),
                    suggestion.message
                ));
                if self.detailed {
                    if let Some(example) = &suggestion.example {
                        out.push_str(&format!("      e.g. {}\n", self.colorize(example, Color::Cyan)));
                    }
                }
            }
        }
    }

    fn format_keywords(&self, out: &mut String, analysis: &KeywordAnalysis) {
        out.push_str(&format!(
            "\n{}\n",
            self.colorize("Job Keyword Match", Color::Blue)
        ));
        out.push_str(&format!("Match rate: {}%\n", analysis.ats_score));

        if !analysis.matched_keywords.is_empty() {
            let matched: Vec<&str> = analysis
                .matched_keywords
                .iter()
                .map(|k| k.term.as_str())
                .collect();
            out.push_str(&format!(
                "  Matched: {}\n",
                self.colorize(&matched.join(", "), Color::Green)
            ));
        }

        for keyword in &analysis.missing_keywords {
            let tier = match keyword.tier {
                ImportanceTier::MustHave => "must-have",
                ImportanceTier::StronglyPreferred => "preferred",
                ImportanceTier::NiceToHave => "nice-to-have",
            };
            out.push_str(&format!(
                "  Missing: {} ({})\n",
                self.colorize(&keyword.term, Color::Red),
                tier
            ));
            if self.detailed {
                if let Some(context) = &keyword.context {
                    out.push_str(&format!("      from posting: \"{}\"\n", context));
                }
                if !keyword.related_found.is_empty() {
                    out.push_str(&format!(
                        "      related on resume: {}\n",
                        keyword.related_found.join(", ")
                    ));
                }
            }
        }
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format_report(&self, record: &ProcessingRecord) -> Result<String> {
        let mut out = String::new();

        out.push_str(&format!(
            "\n{}\n",
            self.colorize(&format!("Resume Analysis: {}", record.title), Color::Blue)
        ));
        out.push_str(&format!("Status: {}\n", record.status));
        if let Some(strategy) = &record.strategy {
            out.push_str(&format!("Extraction strategy: {}\n", strategy));
        }
        if let Some(error) = &record.error {
            out.push_str(&format!("{} {}\n", self.colorize("Error:", Color::Red), error));
        }
        out.push('\n');

        if let Some(scoring) = &record.scoring {
            self.format_scoring(&mut out, scoring);
        }
        if let Some(analysis) = &record.keyword_analysis {
            self.format_keywords(&mut out, analysis);
        }

        Ok(out)
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_report(&self, record: &ProcessingRecord) -> Result<String> {
        Ok(serde_json::to_string_pretty(record)?)
    }
}

impl OutputFormatter for MarkdownFormatter {
    fn format_report(&self, record: &ProcessingRecord) -> Result<String> {
        let mut out = String::new();
        out.push_str(&format!("# Resume Analysis: {}\n\n", record.title));
        out.push_str(&format!("- Status: {}\n", record.status));
        if let Some(strategy) = &record.strategy {
            out.push_str(&format!("- Extraction strategy: {}\n", strategy));
        }

        if let Some(scoring) = &record.scoring {
            out.push_str(&format!("\n## Score: {}/100\n\n", scoring.total));
            out.push_str("| Sub-score | Points |\n|---|---|\n");
            out.push_str(&format!("| Formatting | {}/25 |\n", scoring.formatting));
            out.push_str(&format!("| Structure | {}/25 |\n", scoring.structure));
            out.push_str(&format!("| Readability | {}/25 |\n", scoring.readability));
            out.push_str(&format!("| Keywords | {}/25 |\n", scoring.keywords));

            if !scoring.suggestions.is_empty() {
                out.push_str("\n## Suggestions\n\n");
                for suggestion in &scoring.suggestions {
                    out.push_str(&format!("- {}\n", suggestion.message));
                }
            }
        }

        if let Some(analysis) = &record.keyword_analysis {
            out.push_str(&format!("\n## Keyword Match: {}%\n\n", analysis.ats_score));
            for keyword in &analysis.matched_keywords {
                out.push_str(&format!("- [x] {}\n", keyword.term));
            }
            for keyword in &analysis.missing_keywords {
                out.push_str(&format!("- [ ] {}\n", keyword.term));
            }
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::record::Status;
    use crate::processing::scoring::{ScoringResult, Suggestion, SuggestionCategory};

    fn processed_record() -> ProcessingRecord {
        let mut record = ProcessingRecord::new("user-1", "resume.pdf");
        record.transition(Status::Processing).unwrap();
        record.transition(Status::Processed).unwrap();
        record.strategy = Some("heuristic".to_string());
        record.scoring = Some(ScoringResult {
            formatting: 20,
            structure: 25,
            readability: 25,
            keywords: 15,
            total: 85,
            suggestions: vec![Suggestion {
                category: SuggestionCategory::Content,
                severity: Severity::High,
                message: "List at least five concrete skills".to_string(),
                section: None,
                example: None,
            }],
            confidence: 0.85,
        });
        record
    }

    #[test]
    fn test_console_output_contains_scores() {
        let formatter = ConsoleFormatter::new(false, false);
        let output = formatter.format_report(&processed_record()).unwrap();
        assert!(output.contains("85/100"));
        assert!(output.contains("Formatting:  20/25"));
        assert!(output.contains("concrete skills"));
    }

    #[test]
    fn test_json_output_parses_back() {
        let output = JsonFormatter.format_report(&processed_record()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["scoring"]["total"], 85);
        assert_eq!(parsed["status"], "processed");
    }

    #[test]
    fn test_markdown_output_has_table() {
        let output = MarkdownFormatter.format_report(&processed_record()).unwrap();
        assert!(output.contains("## Score: 85/100"));
        assert!(output.contains("| Structure | 25/25 |"));
    }
}
