//! Error handling for the resume analyzer

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResumeAnalyzerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("File format not supported: {0}")]
    UnsupportedFormat(String),

    #[error("Document too large: {size} bytes (limit {limit})")]
    DocumentTooLarge { size: usize, limit: usize },

    #[error("PDF extraction error: {0}")]
    PdfExtraction(String),

    #[error("Text processing error: {0}")]
    TextProcessing(String),

    #[error("Metadata tool error: {0}")]
    MetadataTool(String),

    #[error("Structured extraction error: {0}")]
    Extraction(String),

    #[error("Pipeline error: {0}")]
    Pipeline(String),

    #[error("Record not found: {0}")]
    RecordNotFound(String),

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ResumeAnalyzerError>;

impl ResumeAnalyzerError {
    /// True for rejections that happen before any record is created or mutated.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ResumeAnalyzerError::InvalidInput(_)
                | ResumeAnalyzerError::UnsupportedFormat(_)
                | ResumeAnalyzerError::DocumentTooLarge { .. }
        )
    }
}

/// Convert anyhow errors to our custom error type
impl From<anyhow::Error> for ResumeAnalyzerError {
    fn from(err: anyhow::Error) -> Self {
        ResumeAnalyzerError::Pipeline(err.to_string())
    }
}
