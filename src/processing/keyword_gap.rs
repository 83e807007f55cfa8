//! Job keyword gap analysis
//!
//! Derives a keyword candidate set from a job posting, classifies each
//! keyword as matched or missing against the resume, and aggregates a 0-100
//! match percentage. Tier assignment and related-term expansion are
//! deliberately pluggable: the heuristics vary per deployment, the interface
//! does not.

use crate::processing::resume::StructuredResume;
use crate::processing::text_processor::TextProcessor;
use aho_corasick::AhoCorasick;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use strsim::jaro_winkler;

/// Resume skills at least this similar to a missing keyword are surfaced as
/// related.
const RELATED_SIMILARITY_THRESHOLD: f64 = 0.88;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportanceTier {
    MustHave,
    StronglyPreferred,
    NiceToHave,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillCategory {
    Technical,
    Soft,
    RoleSpecific,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedKeyword {
    pub term: String,
    pub category: SkillCategory,
    pub tier: ImportanceTier,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingKeyword {
    pub term: String,
    pub category: SkillCategory,
    pub tier: ImportanceTier,
    /// The sentence in the job text where the term occurred.
    pub context: Option<String>,
    /// Resume terms close enough to be worth mentioning.
    pub related_found: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordAnalysis {
    /// Percentage of job keywords matched, 0-100.
    pub ats_score: u8,
    pub matched_keywords: Vec<MatchedKeyword>,
    pub missing_keywords: Vec<MissingKeyword>,
}

/// Importance tier assignment. The default reads requirement cues out of the
/// sentence the keyword occurred in; deployments with better signals swap in
/// their own.
pub trait TierStrategy: Send + Sync {
    fn assign(&self, term: &str, job_title: &str, context: Option<&str>) -> ImportanceTier;
}

/// Sentence-cue driven tier assignment.
pub struct ContextTierStrategy;

impl TierStrategy for ContextTierStrategy {
    fn assign(&self, term: &str, job_title: &str, context: Option<&str>) -> ImportanceTier {
        if contains_term(&job_title.to_lowercase(), term) {
            return ImportanceTier::MustHave;
        }

        if let Some(sentence) = context {
            let sentence = sentence.to_lowercase();
            if ["required", "must have", "must-have", "essential", "need to have"]
                .iter()
                .any(|cue| sentence.contains(cue))
            {
                return ImportanceTier::MustHave;
            }
            if ["nice to have", "nice-to-have", "a plus", "bonus", "familiarity with"]
                .iter()
                .any(|cue| sentence.contains(cue))
            {
                return ImportanceTier::NiceToHave;
            }
            if ["preferred", "should have", "strong", "proficient", "expertise"]
                .iter()
                .any(|cue| sentence.contains(cue))
            {
                return ImportanceTier::StronglyPreferred;
            }
        }

        ImportanceTier::StronglyPreferred
    }
}

/// Related-term expansion. The default is a fixed alias table.
pub trait RelatedTermProvider: Send + Sync {
    fn related(&self, term: &str) -> Vec<String>;
}

pub struct StaticRelatedTerms;

impl RelatedTermProvider for StaticRelatedTerms {
    fn related(&self, term: &str) -> Vec<String> {
        let aliases: &[&str] = match term {
            "kubernetes" => &["k8s"],
            "k8s" => &["kubernetes"],
            "javascript" => &["js", "node.js", "typescript"],
            "typescript" => &["javascript"],
            "postgresql" => &["postgres"],
            "postgres" => &["postgresql"],
            "aws" => &["amazon web services"],
            "amazon web services" => &["aws"],
            "gcp" => &["google cloud"],
            "go" => &["golang"],
            "golang" => &["go"],
            "cicd" => &["ci/cd", "continuous integration"],
            "machine learning" => &["ml"],
            "leadership" => &["lead", "led"],
            _ => &[],
        };
        aliases.iter().map(|a| a.to_string()).collect()
    }
}

pub struct KeywordGapAnalyzer {
    matcher: AhoCorasick,
    vocabulary: Vec<String>,
    tech_skills: HashSet<String>,
    soft_skills: HashSet<String>,
    processor: TextProcessor,
    tiers: Box<dyn TierStrategy>,
    related: Box<dyn RelatedTermProvider>,
}

impl KeywordGapAnalyzer {
    pub fn new() -> Self {
        Self::with_strategies(Box::new(ContextTierStrategy), Box::new(StaticRelatedTerms))
    }

    pub fn with_strategies(
        tiers: Box<dyn TierStrategy>,
        related: Box<dyn RelatedTermProvider>,
    ) -> Self {
        let mut vocabulary = Self::default_vocabulary();
        // Longest first so "machine learning" beats "learning".
        vocabulary.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        vocabulary.dedup();

        let matcher = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .match_kind(aho_corasick::MatchKind::LeftmostLongest)
            .build(&vocabulary)
            .expect("Failed to build keyword matcher");

        Self {
            matcher,
            vocabulary,
            tech_skills: Self::default_tech_skills(),
            soft_skills: Self::default_soft_skills(),
            processor: TextProcessor::new(),
            tiers,
            related,
        }
    }

    /// Analyze a resume against a job posting. Pure: identical inputs yield
    /// identical output and nothing external is touched.
    pub fn analyze(
        &self,
        job_title: &str,
        job_description: &str,
        resume: &StructuredResume,
        resume_text: &str,
    ) -> KeywordAnalysis {
        let job_text = format!("{}\n{}", job_title, job_description);
        let candidates = self.job_keywords(&job_text);

        let resume_haystack = format!("{}\n{}", resume_text, resume.to_plain_text()).to_lowercase();
        let sentences = self.processor.split_sentences(job_description);

        let mut matched_keywords = Vec::new();
        let mut missing_keywords = Vec::new();

        for term in &candidates {
            let context = sentences
                .iter()
                .find(|s| contains_term(&s.to_lowercase(), term))
                .cloned();
            let category = self.category_of(term);
            let tier = self.tiers.assign(term, job_title, context.as_deref());

            let direct = contains_term(&resume_haystack, term);
            let via_alias = self
                .related
                .related(term)
                .iter()
                .any(|alias| contains_term(&resume_haystack, &alias.to_lowercase()));

            if direct || via_alias {
                matched_keywords.push(MatchedKeyword {
                    term: term.clone(),
                    category,
                    tier,
                });
            } else {
                missing_keywords.push(MissingKeyword {
                    term: term.clone(),
                    category,
                    tier,
                    context,
                    related_found: self.similar_resume_skills(term, resume),
                });
            }
        }

        let total = matched_keywords.len() + missing_keywords.len();
        let ats_score = if total == 0 {
            0
        } else {
            (100.0 * matched_keywords.len() as f64 / total as f64).round() as u8
        };

        KeywordAnalysis {
            ats_score,
            matched_keywords,
            missing_keywords,
        }
    }

    /// Keyword candidates from the job text, first-seen order, de-duplicated.
    fn job_keywords(&self, job_text: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut candidates = Vec::new();

        for mat in self.matcher.find_iter(job_text) {
            if !word_boundary(job_text, mat.start(), mat.end()) {
                continue;
            }
            let term = self.vocabulary[mat.pattern().as_usize()].clone();
            if seen.insert(term.clone()) {
                candidates.push(term);
            }
        }

        candidates
    }

    fn category_of(&self, term: &str) -> SkillCategory {
        if self.soft_skills.contains(term) {
            SkillCategory::Soft
        } else if self.tech_skills.contains(term) {
            SkillCategory::Technical
        } else {
            SkillCategory::RoleSpecific
        }
    }

    /// Resume skills close to a missing term, found by string similarity.
    fn similar_resume_skills(&self, term: &str, resume: &StructuredResume) -> Vec<String> {
        let mut related: Vec<String> = resume
            .skill_keywords()
            .into_iter()
            .filter(|skill| {
                let skill_lower = skill.to_lowercase();
                skill_lower != term
                    && jaro_winkler(&skill_lower, term) >= RELATED_SIMILARITY_THRESHOLD
            })
            .collect();
        related.dedup();
        related
    }

    /// Technical skills vocabulary
    fn default_tech_skills() -> HashSet<String> {
        vec![
            // Programming languages
            "rust", "python", "javascript", "typescript", "java", "c++", "c#", "go", "golang",
            "ruby", "php", "swift", "kotlin", "scala", "r", "sql",
            // Web
            "react", "vue", "angular", "html", "css", "node.js", "express", "nextjs",
            "graphql", "rest", "grpc", "api",
            // Infrastructure
            "docker", "kubernetes", "k8s", "aws", "azure", "gcp", "terraform", "ansible",
            "jenkins", "cicd", "devops", "microservices", "linux", "git", "nginx",
            // Data
            "postgresql", "postgres", "mysql", "mongodb", "redis", "elasticsearch",
            "kafka", "spark", "airflow", "dynamodb", "sqlite",
            // ML
            "machine learning", "deep learning", "tensorflow", "pytorch", "pandas", "numpy",
            // Testing
            "pytest", "jest", "selenium", "tdd",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    /// Soft skills vocabulary
    fn default_soft_skills() -> HashSet<String> {
        vec![
            "leadership", "communication", "teamwork", "problem solving", "critical thinking",
            "creativity", "adaptability", "time management", "project management",
            "collaboration", "mentoring", "presentation", "negotiation", "analytical",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    /// Role keywords vocabulary
    fn default_role_keywords() -> Vec<String> {
        vec![
            "software engineer", "backend", "frontend", "full stack", "data scientist",
            "ml engineer", "sre", "architect", "product manager", "agile", "scrum",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    fn default_vocabulary() -> Vec<String> {
        let mut vocabulary: Vec<String> = Self::default_tech_skills().into_iter().collect();
        vocabulary.extend(Self::default_soft_skills());
        vocabulary.extend(Self::default_role_keywords());
        vocabulary
    }
}

impl Default for KeywordGapAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Substring containment with word boundaries on both sides.
fn contains_term(haystack_lower: &str, term_lower: &str) -> bool {
    if term_lower.is_empty() {
        return false;
    }
    for (start, _) in haystack_lower.match_indices(term_lower) {
        if word_boundary(haystack_lower, start, start + term_lower.len()) {
            return true;
        }
    }
    false
}

fn word_boundary(text: &str, start: usize, end: usize) -> bool {
    let before_ok = start == 0
        || text[..start]
            .chars()
            .next_back()
            .map(|c| !c.is_alphanumeric())
            .unwrap_or(true);
    let after_ok = end >= text.len()
        || text[end..]
            .chars()
            .next()
            .map(|c| !c.is_alphanumeric())
            .unwrap_or(true);
    before_ok && after_ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::resume::SkillGroup;

    fn analyzer() -> KeywordGapAnalyzer {
        KeywordGapAnalyzer::new()
    }

    #[test]
    fn test_three_keyword_gap_scenario() {
        // Job wants python, kubernetes, communication; resume has python only.
        let analysis = analyzer().analyze(
            "Platform Engineer",
            "We use python daily. Kubernetes experience required. Strong communication skills preferred.",
            &StructuredResume::default(),
            "Seasoned python developer building services.",
        );

        let matched: Vec<&str> = analysis.matched_keywords.iter().map(|k| k.term.as_str()).collect();
        let missing: Vec<&str> = analysis.missing_keywords.iter().map(|k| k.term.as_str()).collect();
        assert_eq!(matched, vec!["python"]);
        assert_eq!(missing, vec!["kubernetes", "communication"]);
        assert_eq!(analysis.ats_score, 33);
    }

    #[test]
    fn test_tiers_follow_sentence_cues() {
        let analysis = analyzer().analyze(
            "Engineer",
            "Kubernetes experience required. Communication skills preferred. Terraform is a plus.",
            &StructuredResume::default(),
            "",
        );

        let tier_of = |term: &str| {
            analysis
                .missing_keywords
                .iter()
                .find(|k| k.term == term)
                .map(|k| k.tier)
                .unwrap()
        };
        assert_eq!(tier_of("kubernetes"), ImportanceTier::MustHave);
        assert_eq!(tier_of("communication"), ImportanceTier::StronglyPreferred);
        assert_eq!(tier_of("terraform"), ImportanceTier::NiceToHave);
    }

    #[test]
    fn test_title_terms_are_must_have() {
        let analysis = analyzer().analyze(
            "Senior Rust Backend Engineer",
            "You will build services in rust for our backend platform.",
            &StructuredResume::default(),
            "",
        );
        let rust = analysis.missing_keywords.iter().find(|k| k.term == "rust").unwrap();
        assert_eq!(rust.tier, ImportanceTier::MustHave);
    }

    #[test]
    fn test_alias_counts_as_matched() {
        let analysis = analyzer().analyze(
            "Engineer",
            "Kubernetes experience required.",
            &StructuredResume::default(),
            "Operated k8s clusters in production.",
        );
        assert!(analysis.matched_keywords.iter().any(|k| k.term == "kubernetes"));
        assert_eq!(analysis.ats_score, 100);
    }

    #[test]
    fn test_missing_keyword_carries_context_sentence() {
        let analysis = analyzer().analyze(
            "Engineer",
            "You will own deployments. Kubernetes experience required.",
            &StructuredResume::default(),
            "",
        );
        let kube = analysis.missing_keywords.iter().find(|k| k.term == "kubernetes").unwrap();
        assert_eq!(kube.context.as_deref(), Some("Kubernetes experience required."));
    }

    #[test]
    fn test_related_resume_skills_surface_for_missing_terms() {
        let resume = StructuredResume {
            skills: vec![SkillGroup {
                category: None,
                keywords: vec!["PostgreSQL".to_string()],
            }],
            ..Default::default()
        };
        let analysis = analyzer().analyze(
            "Engineer",
            "Experience with postgres required.",
            &resume,
            "Worked with relational databases.",
        );
        // "postgres" matches via the PostgreSQL alias, so nothing is missing.
        assert!(analysis.matched_keywords.iter().any(|k| k.term == "postgres"));
    }

    #[test]
    fn test_word_boundaries_prevent_substring_matches() {
        let analysis = analyzer().analyze(
            "Engineer",
            "Go experience required.",
            &StructuredResume::default(),
            "Worked at Google on search.",
        );
        // "Google" must not satisfy "go".
        assert!(analysis.missing_keywords.iter().any(|k| k.term == "go"));
    }

    #[test]
    fn test_adding_missing_keyword_is_monotonic() {
        let job_title = "Engineer";
        let job = "python kubernetes communication";
        let before = analyzer().analyze(job_title, job, &StructuredResume::default(), "python");
        let after = analyzer().analyze(
            job_title,
            job,
            &StructuredResume::default(),
            "python kubernetes",
        );
        assert!(after.matched_keywords.len() >= before.matched_keywords.len());
        assert!(after.ats_score >= before.ats_score);
    }

    #[test]
    fn test_no_candidates_scores_zero() {
        let analysis = analyzer().analyze("Janitor", "Sweep floors nightly.", &StructuredResume::default(), "");
        assert_eq!(analysis.ats_score, 0);
        assert!(analysis.matched_keywords.is_empty());
        assert!(analysis.missing_keywords.is_empty());
    }

    #[test]
    fn test_categories_assigned() {
        let analysis = analyzer().analyze(
            "Engineer",
            "python and communication and scrum",
            &StructuredResume::default(),
            "",
        );
        let category_of = |term: &str| {
            analysis
                .missing_keywords
                .iter()
                .find(|k| k.term == term)
                .map(|k| k.category)
                .unwrap()
        };
        assert_eq!(category_of("python"), SkillCategory::Technical);
        assert_eq!(category_of("communication"), SkillCategory::Soft);
        assert_eq!(category_of("scrum"), SkillCategory::RoleSpecific);
    }
}
