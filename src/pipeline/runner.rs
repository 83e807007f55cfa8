//! Attempt runner and external interface of the processing pipeline
//!
//! Submission returns an identifier immediately; processing runs out-of-band
//! and lands in `Processed` or, after every extraction strategy has failed,
//! in `Error`. The strategy chain is an explicit ordered list; the winner is
//! recorded on the record for observability.

use crate::config::Config;
use crate::error::{Result, ResumeAnalyzerError};
use crate::flat::{codec, FlatRecord};
use crate::input::extractor::{DocumentExtraction, DocumentExtractor};
use crate::input::file_detector::FileType;
use crate::input::metadata_tool::MetadataToolClient;
use crate::llm::extractor::{ExtractionHints, HeuristicExtractor, StructuredExtractor};
use crate::pipeline::record::{ProcessingRecord, Status};
use crate::pipeline::store::RecordStore;
use crate::processing::keyword_gap::{KeywordAnalysis, KeywordGapAnalyzer};
use crate::processing::merge::{merge, MergeOutcome};
use crate::processing::resume::StructuredResume;
use crate::processing::scoring::{ScoringEngine, ScoringResult};
use log::{info, warn};
use std::fmt;
use std::time::Duration;
use tokio::time::timeout;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct JobPosting {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExtractionStrategy {
    /// Generative extraction merged with embedded metadata.
    Generative,
    /// Regex/heading extraction merged with embedded metadata.
    Heuristic,
    /// Embedded metadata alone.
    MetadataOnly,
}

impl fmt::Display for ExtractionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExtractionStrategy::Generative => "generative",
            ExtractionStrategy::Heuristic => "heuristic",
            ExtractionStrategy::MetadataOnly => "metadata-only",
        };
        write!(f, "{}", name)
    }
}

const STRATEGY_CHAIN: [ExtractionStrategy; 3] = [
    ExtractionStrategy::Generative,
    ExtractionStrategy::Heuristic,
    ExtractionStrategy::MetadataOnly,
];

struct AttemptOutcome {
    text: String,
    resume: StructuredResume,
    scoring: ScoringResult,
    keyword_analysis: Option<KeywordAnalysis>,
    strategy: ExtractionStrategy,
}

pub struct Pipeline<S: RecordStore, G: StructuredExtractor> {
    store: S,
    generator: G,
    extractor: DocumentExtractor,
    heuristic: HeuristicExtractor,
    scoring: ScoringEngine,
    gap: KeywordGapAnalyzer,
    attempt_timeout: Duration,
    max_document_bytes: usize,
}

impl<S: RecordStore, G: StructuredExtractor> Pipeline<S, G> {
    pub fn new(config: &Config, store: S, generator: G) -> Self {
        let metadata_tool = MetadataToolClient::from_config(&config.metadata_tool);
        Self {
            store,
            generator,
            extractor: DocumentExtractor::new(config.extraction.clone(), metadata_tool),
            heuristic: HeuristicExtractor::new(),
            scoring: ScoringEngine::new(),
            gap: KeywordGapAnalyzer::new(),
            attempt_timeout: Duration::from_secs(config.pipeline.attempt_timeout_secs),
            max_document_bytes: config.extraction.max_document_bytes,
        }
    }

    /// Create a record for an uploaded document. Input problems are rejected
    /// here, before any state exists.
    pub fn submit(&self, bytes: &[u8], owner: &str, title: &str) -> Result<Uuid> {
        if bytes.is_empty() {
            return Err(ResumeAnalyzerError::InvalidInput("Document is empty".to_string()));
        }
        if bytes.len() > self.max_document_bytes {
            return Err(ResumeAnalyzerError::DocumentTooLarge {
                size: bytes.len(),
                limit: self.max_document_bytes,
            });
        }

        let record = ProcessingRecord::new(owner, title);
        let id = record.id;
        self.store.insert(record)?;
        info!("Submitted document '{}' as record {}", title, id);
        Ok(id)
    }

    /// Run one processing attempt. Failures land in the record's `Error`
    /// state rather than bubbling to the caller; only store problems are
    /// returned as errors.
    pub async fn process(
        &self,
        id: Uuid,
        bytes: &[u8],
        file_type: FileType,
        job: Option<&JobPosting>,
    ) -> Result<ProcessingRecord> {
        self.store.update(id, &mut |r| r.transition(Status::Processing))?;

        let attempt = timeout(self.attempt_timeout, self.run_attempt(bytes, file_type, job)).await;

        match attempt {
            Ok(Ok(outcome)) => {
                info!(
                    "Record {} processed via {} strategy (score {})",
                    id, outcome.strategy, outcome.scoring.total
                );
                // Results and the status flip land in one write.
                self.store.update(id, &mut |r| {
                    r.transition(Status::Processed)?;
                    r.text = Some(outcome.text.clone());
                    r.resume = Some(outcome.resume.clone());
                    r.scoring = Some(outcome.scoring.clone());
                    r.keyword_analysis = outcome.keyword_analysis.clone();
                    r.strategy = Some(outcome.strategy.to_string());
                    Ok(())
                })
            }
            Ok(Err(e)) => {
                warn!("Record {} failed: {}", id, e);
                self.store.update(id, &mut |r| r.record_failure(&e.to_string()))
            }
            Err(_) => {
                let message = format!(
                    "Processing attempt exceeded {}s",
                    self.attempt_timeout.as_secs()
                );
                warn!("Record {} timed out: {}", id, message);
                self.store.update(id, &mut |r| r.record_failure(&message))
            }
        }
    }

    async fn run_attempt(
        &self,
        bytes: &[u8],
        file_type: FileType,
        job: Option<&JobPosting>,
    ) -> Result<AttemptOutcome> {
        let extraction = self.extractor.extract(bytes, file_type).await?;

        let metadata_resume = extraction
            .metadata
            .as_ref()
            .map(codec::decode)
            .filter(|r| !r.is_empty());

        let (merged, strategy) = self.extract_structured(&extraction, metadata_resume.as_ref()).await?;

        let job_text = job.map(|j| format!("{}\n{}", j.title, j.description));
        let scoring = self.scoring.score(
            &extraction,
            &merged.resume,
            job_text.as_deref(),
            merged.confidence,
        );
        let keyword_analysis = job.map(|j| {
            self.gap
                .analyze(&j.title, &j.description, &merged.resume, &extraction.text)
        });

        Ok(AttemptOutcome {
            text: extraction.text,
            resume: merged.resume,
            scoring,
            keyword_analysis,
            strategy,
        })
    }

    /// Try each extraction strategy in order; a strategy fails when it errors
    /// or produces an empty record.
    async fn extract_structured(
        &self,
        extraction: &DocumentExtraction,
        metadata_resume: Option<&StructuredResume>,
    ) -> Result<(MergeOutcome, ExtractionStrategy)> {
        let mut last_error = String::from("no strategy applicable");

        for strategy in STRATEGY_CHAIN {
            match self.try_strategy(strategy, extraction, metadata_resume).await {
                Ok(outcome) => {
                    info!("Extraction strategy '{}' succeeded", strategy);
                    return Ok((outcome, strategy));
                }
                Err(e) => {
                    warn!("Extraction strategy '{}' failed: {}", strategy, e);
                    last_error = e.to_string();
                }
            }
        }

        Err(ResumeAnalyzerError::Pipeline(format!(
            "All extraction strategies failed; last error: {}",
            last_error
        )))
    }

    async fn try_strategy(
        &self,
        strategy: ExtractionStrategy,
        extraction: &DocumentExtraction,
        metadata_resume: Option<&StructuredResume>,
    ) -> Result<MergeOutcome> {
        let generated = match strategy {
            ExtractionStrategy::Generative => {
                let hints = ExtractionHints {
                    sections: extraction.sections.clone(),
                    title: None,
                };
                self.generator.extract(&extraction.text, &hints).await?
            }
            ExtractionStrategy::Heuristic => self.heuristic.parse(&extraction.text),
            ExtractionStrategy::MetadataOnly => {
                if metadata_resume.is_none() {
                    return Err(ResumeAnalyzerError::Extraction(
                        "No embedded metadata to fall back to".to_string(),
                    ));
                }
                StructuredResume::default()
            }
        };

        let outcome = merge(metadata_resume, &generated, &extraction.warnings);
        if outcome.resume.is_empty() {
            return Err(ResumeAnalyzerError::Extraction(
                "Extraction produced an empty record".to_string(),
            ));
        }
        Ok(outcome)
    }

    /// Re-open an errored record for another attempt.
    pub fn resubmit(&self, id: Uuid) -> Result<ProcessingRecord> {
        self.store.update(id, &mut |r| r.transition(Status::Uploaded))
    }

    pub fn status(&self, id: Uuid) -> Result<Status> {
        Ok(self.store.get(id)?.status)
    }

    pub fn get(&self, id: Uuid) -> Result<ProcessingRecord> {
        self.store.get(id)
    }

    /// Latest compatibility score for a processed record.
    pub fn score(&self, id: Uuid) -> Result<ScoringResult> {
        self.store.get(id)?.scoring.ok_or_else(|| {
            ResumeAnalyzerError::Pipeline("Record has no score yet".to_string())
        })
    }

    /// Run keyword gap analysis for a processed record against a job posting
    /// and persist the result with the record.
    pub fn analyze(&self, id: Uuid, job_title: &str, job_description: &str) -> Result<KeywordAnalysis> {
        let record = self.store.get(id)?;
        let resume = record.resume.ok_or_else(|| {
            ResumeAnalyzerError::Pipeline("Record has no extracted resume yet".to_string())
        })?;
        let resume_text = record.text.unwrap_or_else(|| resume.to_plain_text());

        let analysis = self.gap.analyze(job_title, job_description, &resume, &resume_text);

        let persisted = analysis.clone();
        self.store.update(id, &mut |r| {
            r.keyword_analysis = Some(persisted.clone());
            Ok(())
        })?;

        Ok(analysis)
    }

    /// Flat encoding of the record's resume, for write-back into the
    /// embedded-metadata store.
    pub fn export_flat(&self, id: Uuid) -> Result<FlatRecord> {
        let record = self.store.get(id)?;
        let resume = record.resume.ok_or_else(|| {
            ResumeAnalyzerError::Pipeline("Record has no extracted resume yet".to_string())
        })?;
        Ok(codec::encode(&resume))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::store::MemoryStore;

    const SAMPLE: &str = "Jane Doe\njane@example.com | (555) 123-4567\n\
        \n\
        Summary\n\
        Backend engineer with eight years of experience.\n\
        \n\
        Experience\n\
        Acme Corp - Senior Engineer 2020 - Present\n\
        - Reduced pipeline latency by 40%\n\
        \n\
        Education\n\
        State University 2013 - 2017\n\
        BS, Computer Science\n\
        \n\
        Skills\n\
        Rust, Python, Kubernetes, Docker, Postgres, Terraform\n";

    /// Generator stub: either echoes the heuristic result or fails.
    struct StubGenerator {
        fail: bool,
    }

    impl StructuredExtractor for StubGenerator {
        async fn extract(&self, text: &str, _hints: &ExtractionHints) -> Result<StructuredResume> {
            if self.fail {
                return Err(ResumeAnalyzerError::Extraction("model unavailable".to_string()));
            }
            Ok(HeuristicExtractor::new().parse(text))
        }
    }

    fn pipeline(fail_generator: bool) -> Pipeline<MemoryStore, StubGenerator> {
        let mut config = Config::default();
        config.metadata_tool.program = None;
        Pipeline::new(&config, MemoryStore::new(), StubGenerator { fail: fail_generator })
    }

    #[tokio::test]
    async fn test_successful_attempt_reaches_processed() {
        let pipeline = pipeline(false);
        let id = pipeline.submit(SAMPLE.as_bytes(), "user-1", "resume.txt").unwrap();
        assert_eq!(pipeline.status(id).unwrap(), Status::Uploaded);

        let record = pipeline.process(id, SAMPLE.as_bytes(), FileType::Text, None).await.unwrap();
        assert_eq!(record.status, Status::Processed);
        assert_eq!(record.strategy.as_deref(), Some("generative"));

        let scoring = record.scoring.unwrap();
        assert!(scoring.total > 0);
        let resume = record.resume.unwrap();
        assert_eq!(resume.contact.email.as_deref(), Some("jane@example.com"));
    }

    #[tokio::test]
    async fn test_generative_failure_falls_back_to_heuristic() {
        let pipeline = pipeline(true);
        let id = pipeline.submit(SAMPLE.as_bytes(), "user-1", "resume.txt").unwrap();

        let record = pipeline.process(id, SAMPLE.as_bytes(), FileType::Text, None).await.unwrap();
        assert_eq!(record.status, Status::Processed);
        assert_eq!(record.strategy.as_deref(), Some("heuristic"));
        assert!(record.resume.is_some());
    }

    #[tokio::test]
    async fn test_all_strategies_failing_reaches_error() {
        let pipeline = pipeline(true);
        // Whitespace text: heuristic yields an empty record, no metadata.
        let bytes = b"   \n   \n";
        let id = pipeline.submit(bytes, "user-1", "blank.txt").unwrap();

        let record = pipeline.process(id, bytes, FileType::Text, None).await.unwrap();
        assert_eq!(record.status, Status::Error);
        assert!(record.error.as_deref().unwrap().contains("strategies failed"));
        assert!(record.error_at.is_some());
    }

    #[tokio::test]
    async fn test_error_record_is_retriable() {
        let pipeline = pipeline(true);
        let bytes = b"   \n";
        let id = pipeline.submit(bytes, "user-1", "blank.txt").unwrap();
        pipeline.process(id, bytes, FileType::Text, None).await.unwrap();
        assert_eq!(pipeline.status(id).unwrap(), Status::Error);

        pipeline.resubmit(id).unwrap();
        assert_eq!(pipeline.status(id).unwrap(), Status::Uploaded);

        let record = pipeline.process(id, SAMPLE.as_bytes(), FileType::Text, None).await.unwrap();
        assert_eq!(record.status, Status::Processed);
    }

    #[tokio::test]
    async fn test_submit_rejects_bad_input_without_state() {
        let pipeline = pipeline(false);
        assert!(pipeline.submit(&[], "user-1", "x").is_err());

        let oversized = vec![b'a'; 11 * 1024 * 1024];
        let result = pipeline.submit(&oversized, "user-1", "big.txt");
        assert!(matches!(result, Err(ResumeAnalyzerError::DocumentTooLarge { .. })));
    }

    #[tokio::test]
    async fn test_job_posting_produces_keyword_analysis() {
        let pipeline = pipeline(false);
        let id = pipeline.submit(SAMPLE.as_bytes(), "user-1", "resume.txt").unwrap();
        let job = JobPosting {
            title: "Platform Engineer".to_string(),
            description: "Kubernetes and Rust required. Communication preferred.".to_string(),
        };

        let record = pipeline
            .process(id, SAMPLE.as_bytes(), FileType::Text, Some(&job))
            .await
            .unwrap();
        let analysis = record.keyword_analysis.unwrap();
        assert!(analysis.matched_keywords.iter().any(|k| k.term == "kubernetes"));
        assert!(analysis.matched_keywords.iter().any(|k| k.term == "rust"));
        assert!(analysis.missing_keywords.iter().any(|k| k.term == "communication"));
    }

    #[tokio::test]
    async fn test_analyze_after_processing_persists_result() {
        let pipeline = pipeline(false);
        let id = pipeline.submit(SAMPLE.as_bytes(), "user-1", "resume.txt").unwrap();
        pipeline.process(id, SAMPLE.as_bytes(), FileType::Text, None).await.unwrap();

        let analysis = pipeline.analyze(id, "Engineer", "Rust required.").unwrap();
        assert_eq!(analysis.ats_score, 100);
        assert_eq!(pipeline.get(id).unwrap().keyword_analysis, Some(analysis));
    }

    #[tokio::test]
    async fn test_export_flat_round_trips() {
        let pipeline = pipeline(false);
        let id = pipeline.submit(SAMPLE.as_bytes(), "user-1", "resume.txt").unwrap();
        pipeline.process(id, SAMPLE.as_bytes(), FileType::Text, None).await.unwrap();

        let flat = pipeline.export_flat(id).unwrap();
        let decoded = codec::decode(&flat);
        assert_eq!(Some(decoded), pipeline.get(id).unwrap().resume);
    }

    #[tokio::test]
    async fn test_score_requires_processing() {
        let pipeline = pipeline(false);
        let id = pipeline.submit(SAMPLE.as_bytes(), "user-1", "resume.txt").unwrap();
        assert!(pipeline.score(id).is_err());
    }
}
