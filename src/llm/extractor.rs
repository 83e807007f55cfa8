//! Structured extraction: the generative contract and a heuristic fallback
//!
//! `StructuredExtractor` is the narrow text-in/structured-data-out seam the
//! surrounding application plugs a generative model into. The pipeline never
//! depends on a model being present: `HeuristicExtractor` re-implements the
//! same stage from regexes and section harvesting and serves as the fallback
//! strategy when the generative step fails.

use crate::error::Result;
use crate::processing::resume::{
    Award, Certification, Education, Experience, HasContent, Involvement, LanguageSkill,
    Project, Publication, SkillGroup, StructuredResume,
};
use crate::processing::sections::{SectionDetector, SectionLabel};
use crate::processing::text_processor::TextProcessor;
use regex::Regex;

/// Context handed to an extractor alongside the raw text.
#[derive(Debug, Clone, Default)]
pub struct ExtractionHints {
    pub sections: Vec<SectionLabel>,
    pub title: Option<String>,
}

/// The generative-model call, treated as an opaque, potentially-failing
/// function with no side effects of its own.
pub trait StructuredExtractor: Send + Sync {
    fn extract(
        &self,
        text: &str,
        hints: &ExtractionHints,
    ) -> impl std::future::Future<Output = Result<StructuredResume>> + Send;
}

/// Regex- and heading-driven extraction from plain text. Less precise than a
/// generative pass, but it cannot hallucinate and it always succeeds.
pub struct HeuristicExtractor {
    processor: TextProcessor,
    detector: SectionDetector,
    date_range: Regex,
    degree: Regex,
}

impl Default for HeuristicExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl StructuredExtractor for HeuristicExtractor {
    async fn extract(&self, text: &str, _hints: &ExtractionHints) -> Result<StructuredResume> {
        Ok(self.parse(text))
    }
}

impl HeuristicExtractor {
    pub fn new() -> Self {
        let date_range = Regex::new(
            r"(?i)\b((?:19|20)\d{2})\s*(?:-|–|—|to)\s*((?:19|20)\d{2}|present|current)\b",
        )
        .expect("Invalid date range regex");

        let degree = Regex::new(
            r"(?i)\b(b\.?s\.?c?\.?|b\.?a\.?|m\.?s\.?c?\.?|m\.?a\.?|ph\.?d\.?|mba|bachelor(?:'s)?|master(?:'s)?|doctorate|associate(?:'s)?)\b",
        )
        .expect("Invalid degree regex");

        Self {
            processor: TextProcessor::new(),
            detector: SectionDetector::new(),
            date_range,
            degree,
        }
    }

    pub fn parse(&self, text: &str) -> StructuredResume {
        let mut resume = StructuredResume::default();

        resume.contact.email = self.processor.find_email(text);
        resume.contact.phone = self.processor.find_phone(text);
        for url in self.processor.find_urls(text) {
            let lower = url.to_lowercase();
            if lower.contains("linkedin.com") {
                resume.contact.linkedin.get_or_insert(url);
            } else if lower.contains("github.com") {
                resume.contact.github.get_or_insert(url);
            } else {
                resume.contact.website.get_or_insert(url);
            }
        }

        let (preamble, sections) = self.split_sections(text);
        resume.contact.name = self.guess_name(&preamble);

        for (label, lines) in &sections {
            match label {
                SectionLabel::Summary => {
                    let summary = join_nonempty(lines, " ");
                    if !summary.is_empty() {
                        resume.summary = Some(summary);
                    }
                }
                SectionLabel::Experience => resume.experience = self.parse_experience(lines),
                SectionLabel::Education => resume.education = self.parse_education(lines),
                SectionLabel::Skills => resume.skills = self.parse_skills(lines),
                SectionLabel::Projects => resume.projects = self.parse_projects(lines),
                SectionLabel::Certifications => {
                    resume.certifications = self.parse_certifications(lines)
                }
                SectionLabel::Involvement => resume.involvement = self.parse_involvement(lines),
                SectionLabel::Awards => resume.awards = self.parse_awards(lines),
                SectionLabel::Publications => resume.publications = self.parse_publications(lines),
                SectionLabel::Languages => resume.languages = self.parse_languages(lines),
                SectionLabel::Contact | SectionLabel::References => {}
            }
        }

        resume
    }

    /// Split normalized text into (preamble, per-heading line buckets).
    fn split_sections(&self, text: &str) -> (Vec<String>, Vec<(SectionLabel, Vec<String>)>) {
        let mut preamble = Vec::new();
        let mut sections: Vec<(SectionLabel, Vec<String>)> = Vec::new();

        for line in text.lines() {
            if let Some(label) = self.detector.classify_line(line) {
                sections.push((label, Vec::new()));
            } else if let Some((_, bucket)) = sections.last_mut() {
                bucket.push(line.to_string());
            } else {
                preamble.push(line.to_string());
            }
        }

        (preamble, sections)
    }

    fn guess_name(&self, preamble: &[String]) -> Option<String> {
        preamble
            .iter()
            .take(5)
            .map(|l| l.trim())
            .find(|l| {
                !l.is_empty()
                    && l.len() < 60
                    && !l.contains('@')
                    && !l.starts_with('-')
                    && l.chars().filter(|c| c.is_ascii_digit()).count() < 3
            })
            .map(str::to_string)
    }

    fn parse_experience(&self, lines: &[String]) -> Vec<Experience> {
        blocks(lines)
            .into_iter()
            .filter_map(|block| {
                let header = block.iter().find(|l| !l.trim_start().starts_with('-'))?;
                let mut entry = self.entry_from_header(header);

                let block_text = block.join("\n");
                if let Some(caps) = self.date_range.captures(&block_text) {
                    entry.start_date = Some(caps[1].to_string());
                    let end = caps[2].to_string();
                    if end.eq_ignore_ascii_case("present") || end.eq_ignore_ascii_case("current") {
                        entry.is_current = true;
                    } else {
                        entry.end_date = Some(end);
                    }
                }

                let description_lines: Vec<String> = block
                    .iter()
                    .filter(|l| *l != header)
                    .map(|l| l.trim().to_string())
                    .filter(|l| !l.is_empty() && !self.date_range.is_match(l))
                    .collect();
                if !description_lines.is_empty() {
                    entry.description = Some(description_lines.join("\n"));
                }

                entry.has_content().then_some(entry)
            })
            .collect()
    }

    /// Split a header line like "Acme Corp - Senior Engineer" or
    /// "Senior Engineer at Acme Corp" into company and role.
    fn entry_from_header(&self, header: &str) -> Experience {
        let clean = self
            .date_range
            .replace_all(header, "")
            .trim()
            .trim_end_matches(&[',', '|'][..])
            .trim()
            .to_string();
        let mut entry = Experience::default();

        if let Some((role, company)) = clean.split_once(" at ") {
            entry.role = Some(role.trim().to_string());
            entry.company = Some(company.trim().to_string());
        } else if let Some((company, role)) = split_on_delimiters(&clean, &[" - ", " – ", " | "]) {
            entry.company = Some(company);
            entry.role = Some(role);
        } else if !clean.is_empty() {
            entry.company = Some(clean);
        }

        entry
    }

    fn parse_education(&self, lines: &[String]) -> Vec<Education> {
        blocks(lines)
            .into_iter()
            .filter_map(|block| {
                let mut entry = Education::default();
                let block_text = block.join("\n");

                if let Some(caps) = self.date_range.captures(&block_text) {
                    entry.start_date = Some(caps[1].to_string());
                    let end = caps[2].to_string();
                    if end.eq_ignore_ascii_case("present") || end.eq_ignore_ascii_case("current") {
                        entry.is_current = true;
                    } else {
                        entry.end_date = Some(end);
                    }
                }

                for line in &block {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    if let Some(m) = self.degree.find(line) {
                        entry.degree = Some(m.as_str().to_string());
                        let after = line[m.end()..].trim_start_matches(&[' ', ',', '-'][..]);
                        let field = after.trim_start_matches("in ").trim();
                        let field = self.date_range.replace_all(field, "");
                        let field = field.trim().trim_end_matches(',');
                        if !field.is_empty() {
                            entry.field_of_study = Some(field.to_string());
                        }
                    } else if entry.institution.is_none() {
                        let inst = self.date_range.replace_all(line, "");
                        let inst = inst.trim().trim_end_matches(',');
                        if !inst.is_empty() {
                            entry.institution = Some(inst.to_string());
                        }
                    }
                }

                entry.has_content().then_some(entry)
            })
            .collect()
    }

    fn parse_skills(&self, lines: &[String]) -> Vec<SkillGroup> {
        let mut groups = Vec::new();
        for line in lines {
            let line = line.trim().trim_start_matches('-').trim();
            if line.is_empty() {
                continue;
            }

            let (category, keywords_text) = match line.split_once(':') {
                Some((category, rest)) if !category.trim().is_empty() && category.len() < 40 => {
                    (Some(category.trim().to_string()), rest)
                }
                _ => (None, line),
            };

            let keywords: Vec<String> = keywords_text
                .split(&[',', ';', '|'][..])
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string)
                .collect();

            let group = SkillGroup { category, keywords };
            if group.has_content() {
                groups.push(group);
            }
        }
        groups
    }

    fn parse_projects(&self, lines: &[String]) -> Vec<Project> {
        blocks(lines)
            .into_iter()
            .filter_map(|block| {
                let mut entry = Project::default();
                let header = block.iter().find(|l| !l.trim_start().starts_with('-'))?;
                entry.name = Some(
                    self.date_range
                        .replace_all(header, "")
                        .trim()
                        .trim_end_matches(&[',', '-'][..])
                        .trim()
                        .to_string(),
                )
                .filter(|n: &String| !n.is_empty());

                entry.url = self.processor.find_urls(&block.join(" ")).into_iter().next();

                let description: Vec<String> = block
                    .iter()
                    .filter(|l| *l != header)
                    .map(|l| l.trim().to_string())
                    .filter(|l| !l.is_empty())
                    .collect();
                if !description.is_empty() {
                    entry.description = Some(description.join("\n"));
                }

                entry.has_content().then_some(entry)
            })
            .collect()
    }

    fn parse_certifications(&self, lines: &[String]) -> Vec<Certification> {
        nonempty(lines)
            .into_iter()
            .filter_map(|line| {
                let mut entry = Certification::default();
                match split_on_delimiters(&line, &[" - ", " – ", ", "]) {
                    Some((name, issuer)) => {
                        entry.name = Some(name);
                        entry.issuer = Some(issuer);
                    }
                    None => entry.name = Some(line),
                }
                entry.has_content().then_some(entry)
            })
            .collect()
    }

    fn parse_involvement(&self, lines: &[String]) -> Vec<Involvement> {
        blocks(lines)
            .into_iter()
            .filter_map(|block| {
                let mut entry = Involvement::default();
                let header = block.iter().find(|l| !l.trim_start().starts_with('-'))?;
                match split_on_delimiters(header.trim(), &[" - ", " – ", " | "]) {
                    Some((organization, role)) => {
                        entry.organization = Some(organization);
                        entry.role = Some(role);
                    }
                    None => entry.organization = Some(header.trim().to_string()),
                }

                let description: Vec<String> = block
                    .iter()
                    .filter(|l| *l != header)
                    .map(|l| l.trim().to_string())
                    .filter(|l| !l.is_empty())
                    .collect();
                if !description.is_empty() {
                    entry.description = Some(description.join("\n"));
                }

                entry.has_content().then_some(entry)
            })
            .collect()
    }

    fn parse_awards(&self, lines: &[String]) -> Vec<Award> {
        nonempty(lines)
            .into_iter()
            .map(|line| Award { title: Some(line), ..Default::default() })
            .filter(HasContent::has_content)
            .collect()
    }

    fn parse_publications(&self, lines: &[String]) -> Vec<Publication> {
        nonempty(lines)
            .into_iter()
            .map(|line| Publication { title: Some(line), ..Default::default() })
            .filter(HasContent::has_content)
            .collect()
    }

    fn parse_languages(&self, lines: &[String]) -> Vec<LanguageSkill> {
        nonempty(lines)
            .into_iter()
            .flat_map(|line| {
                line.split(',')
                    .map(|part| {
                        let part = part.trim();
                        let mut entry = LanguageSkill::default();
                        if let Some((language, proficiency)) = part.split_once('(') {
                            entry.language = Some(language.trim().to_string());
                            entry.proficiency =
                                Some(proficiency.trim_end_matches(')').trim().to_string());
                        } else if let Some((language, proficiency)) =
                            split_on_delimiters(part, &[" - ", " – "])
                        {
                            entry.language = Some(language);
                            entry.proficiency = Some(proficiency);
                        } else if !part.is_empty() {
                            entry.language = Some(part.to_string());
                        }
                        entry
                    })
                    .collect::<Vec<_>>()
            })
            .filter(HasContent::has_content)
            .collect()
    }
}

/// Group section lines into blank-line-separated blocks.
fn blocks(lines: &[String]) -> Vec<Vec<String>> {
    let mut out: Vec<Vec<String>> = Vec::new();
    let mut current: Vec<String> = Vec::new();
    for line in lines {
        if line.trim().is_empty() {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line.clone());
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

fn nonempty(lines: &[String]) -> Vec<String> {
    lines
        .iter()
        .map(|l| l.trim().trim_start_matches('-').trim().to_string())
        .filter(|l| !l.is_empty())
        .collect()
}

fn join_nonempty(lines: &[String], separator: &str) -> String {
    lines
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(separator)
}

fn split_on_delimiters(text: &str, delimiters: &[&str]) -> Option<(String, String)> {
    for delimiter in delimiters {
        if let Some((left, right)) = text.split_once(delimiter) {
            let left = left.trim();
            let right = right.trim();
            if !left.is_empty() && !right.is_empty() {
                return Some((left.to_string(), right.to_string()));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Jane Doe\njane@example.com | (555) 123-4567\nlinkedin.com/in/janedoe\n\
        \n\
        Summary\n\
        Backend engineer with eight years of experience.\n\
        \n\
        Experience\n\
        Acme Corp - Senior Engineer 2020 - Present\n\
        - Reduced pipeline latency by 40%\n\
        - Led a team of 5 engineers\n\
        \n\
        Globex | Engineer 2017 - 2019\n\
        - Built billing services\n\
        \n\
        Education\n\
        State University 2013 - 2017\n\
        BS, Computer Science\n\
        \n\
        Skills\n\
        Languages: Rust, Python, Go\n\
        Infrastructure: Kubernetes, Docker\n\
        \n\
        Languages\n\
        English (Native), Spanish (Conversational)\n";

    fn parse(text: &str) -> StructuredResume {
        HeuristicExtractor::new().parse(text)
    }

    #[test]
    fn test_contact_extraction() {
        let resume = parse(SAMPLE);
        assert_eq!(resume.contact.name.as_deref(), Some("Jane Doe"));
        assert_eq!(resume.contact.email.as_deref(), Some("jane@example.com"));
        assert!(resume.contact.phone.is_some());
        assert!(resume.contact.linkedin.as_deref().unwrap_or("").contains("linkedin.com"));
    }

    #[test]
    fn test_experience_blocks() {
        let resume = parse(SAMPLE);
        assert_eq!(resume.experience.len(), 2);

        let first = &resume.experience[0];
        assert_eq!(first.company.as_deref(), Some("Acme Corp"));
        assert_eq!(first.role.as_deref(), Some("Senior Engineer"));
        assert_eq!(first.start_date.as_deref(), Some("2020"));
        assert!(first.is_current);
        assert!(first.description.as_deref().unwrap().contains("latency"));

        let second = &resume.experience[1];
        assert_eq!(second.company.as_deref(), Some("Globex"));
        assert_eq!(second.end_date.as_deref(), Some("2019"));
        assert!(!second.is_current);
    }

    #[test]
    fn test_education_parsing() {
        let resume = parse(SAMPLE);
        assert_eq!(resume.education.len(), 1);
        let edu = &resume.education[0];
        assert_eq!(edu.institution.as_deref(), Some("State University"));
        assert_eq!(edu.degree.as_deref(), Some("BS"));
        assert_eq!(edu.field_of_study.as_deref(), Some("Computer Science"));
    }

    #[test]
    fn test_skills_with_categories() {
        let resume = parse(SAMPLE);
        assert_eq!(resume.skills.len(), 2);
        assert_eq!(resume.skills[0].category.as_deref(), Some("Languages"));
        assert_eq!(resume.skills[0].keywords, vec!["Rust", "Python", "Go"]);
        assert_eq!(resume.skills[1].keywords, vec!["Kubernetes", "Docker"]);
    }

    #[test]
    fn test_language_proficiency() {
        let resume = parse(SAMPLE);
        assert_eq!(resume.languages.len(), 2);
        assert_eq!(resume.languages[0].language.as_deref(), Some("English"));
        assert_eq!(resume.languages[0].proficiency.as_deref(), Some("Native"));
    }

    #[test]
    fn test_empty_text_yields_empty_resume() {
        let resume = parse("");
        assert!(resume.is_empty());
    }

    #[tokio::test]
    async fn test_extractor_trait_never_fails() {
        let extractor = HeuristicExtractor::new();
        let hints = ExtractionHints::default();
        let resume = extractor.extract("just some words", &hints).await.unwrap();
        assert!(resume.experience.is_empty());
    }
}
