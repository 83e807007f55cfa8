//! Processing records and their status state machine

use crate::error::{Result, ResumeAnalyzerError};
use crate::processing::keyword_gap::KeywordAnalysis;
use crate::processing::resume::StructuredResume;
use crate::processing::scoring::ScoringResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Uploaded,
    Processing,
    Processed,
    Error,
}

impl Status {
    /// Legal transitions. `Processing -> Processing` is allowed so the
    /// initial status write stays idempotent; `Error` can re-enter
    /// `Processing` (retry) or `Uploaded` (re-submission).
    pub fn can_transition_to(self, next: Status) -> bool {
        matches!(
            (self, next),
            (Status::Uploaded, Status::Processing)
                | (Status::Processing, Status::Processing)
                | (Status::Processing, Status::Processed)
                | (Status::Processing, Status::Error)
                | (Status::Error, Status::Processing)
                | (Status::Error, Status::Uploaded)
        )
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Status::Uploaded => "uploaded",
            Status::Processing => "processing",
            Status::Processed => "processed",
            Status::Error => "error",
        };
        write!(f, "{}", name)
    }
}

/// Durable state for one submitted document. Created on upload, mutated only
/// by the pipeline, never deleted here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingRecord {
    pub id: Uuid,
    pub owner: String,
    pub title: String,
    pub status: Status,
    /// Normalized text from the latest successful extraction; kept so
    /// re-analysis works after the original bytes are gone.
    pub text: Option<String>,
    pub resume: Option<StructuredResume>,
    pub scoring: Option<ScoringResult>,
    pub keyword_analysis: Option<KeywordAnalysis>,
    /// Which strategy produced the latest result.
    pub strategy: Option<String>,
    pub error: Option<String>,
    pub error_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProcessingRecord {
    pub fn new(owner: &str, title: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner: owner.to_string(),
            title: title.to_string(),
            status: Status::Uploaded,
            text: None,
            resume: None,
            scoring: None,
            keyword_analysis: None,
            strategy: None,
            error: None,
            error_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Transition to a new status, enforcing the state machine.
    pub fn transition(&mut self, next: Status) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(ResumeAnalyzerError::InvalidTransition {
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next;
        self.updated_at = Utc::now();
        if next != Status::Error {
            self.error = None;
            self.error_at = None;
        }
        Ok(())
    }

    pub fn record_failure(&mut self, message: &str) -> Result<()> {
        self.transition(Status::Error)?;
        self.error = Some(message.to_string());
        self.error_at = Some(Utc::now());
        Ok(())
    }
}
