//! Document text and metadata extraction
//!
//! Turns raw upload bytes into normalized plain text (whole and per page),
//! document statistics, detected section labels, and the optional embedded
//! flat metadata block. Failures of the external metadata utility degrade to
//! warnings; only malformed or oversized input is a hard error.

use crate::config::ExtractionConfig;
use crate::error::{Result, ResumeAnalyzerError};
use crate::flat::FlatRecord;
use crate::input::file_detector::FileType;
use crate::input::metadata_tool::MetadataToolClient;
use crate::processing::sections::{SectionDetector, SectionLabel};
use crate::processing::text_processor::TextProcessor;
use log::warn;
use serde::{Deserialize, Serialize};

/// Documents longer than this draw a formatting warning.
const RECOMMENDED_MAX_PAGES: usize = 3;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentStats {
    pub page_count: usize,
    pub word_count: usize,
    pub character_count: usize,
    pub encrypted: bool,
    pub producer: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentExtraction {
    /// Normalized whole-document text.
    pub text: String,
    /// Normalized per-page text.
    pub pages: Vec<String>,
    pub stats: DocumentStats,
    pub sections: Vec<SectionLabel>,
    /// Embedded flat metadata, when the external tool produced it.
    pub metadata: Option<FlatRecord>,
    /// Non-fatal observations, collected rather than thrown.
    pub warnings: Vec<String>,
}

pub struct DocumentExtractor {
    config: ExtractionConfig,
    metadata_tool: Option<MetadataToolClient>,
    processor: TextProcessor,
    detector: SectionDetector,
}

impl DocumentExtractor {
    pub fn new(config: ExtractionConfig, metadata_tool: Option<MetadataToolClient>) -> Self {
        Self {
            config,
            metadata_tool,
            processor: TextProcessor::new(),
            detector: SectionDetector::new(),
        }
    }

    /// Extract text, statistics, sections, and embedded metadata from an
    /// uploaded document.
    pub async fn extract(&self, bytes: &[u8], file_type: FileType) -> Result<DocumentExtraction> {
        if bytes.is_empty() {
            return Err(ResumeAnalyzerError::InvalidInput("Document is empty".to_string()));
        }
        if bytes.len() > self.config.max_document_bytes {
            return Err(ResumeAnalyzerError::DocumentTooLarge {
                size: bytes.len(),
                limit: self.config.max_document_bytes,
            });
        }

        let mut warnings = Vec::new();

        let (raw_pages, mut stats) = match file_type {
            FileType::Pdf => self.extract_pdf(bytes, &mut warnings)?,
            FileType::Text => {
                let text = String::from_utf8_lossy(bytes).to_string();
                (vec![text], DocumentStats { page_count: 1, ..Default::default() })
            }
            FileType::Markdown => {
                let markdown = String::from_utf8_lossy(bytes);
                (vec![markdown_to_text(&markdown)], DocumentStats { page_count: 1, ..Default::default() })
            }
            FileType::Unknown => {
                return Err(ResumeAnalyzerError::UnsupportedFormat(
                    "Only PDF, plain text, and markdown documents are supported".to_string(),
                ));
            }
        };

        let pages: Vec<String> = raw_pages.iter().map(|p| self.processor.normalize(p)).collect();
        let text = pages
            .iter()
            .filter(|p| !p.is_empty())
            .cloned()
            .collect::<Vec<_>>()
            .join("\n\n");

        stats.word_count = self.processor.word_count(&text);
        stats.character_count = text.chars().count();

        let metadata = if file_type == FileType::Pdf {
            self.read_embedded_metadata(bytes, &mut warnings).await
        } else {
            None
        };

        if text.len() < self.config.min_text_length {
            warnings.push(format!(
                "Extracted text is only {} characters; the document may be image-based or empty",
                text.len()
            ));
        }
        if stats.page_count > RECOMMENDED_MAX_PAGES {
            warnings.push(format!(
                "Document has {} pages; most screeners read at most {}",
                stats.page_count, RECOMMENDED_MAX_PAGES
            ));
        }
        if stats.encrypted {
            warnings.push("Document is encrypted; some systems will fail to parse it".to_string());
        }

        let sections = self.detector.detect(&text);

        Ok(DocumentExtraction {
            text,
            pages,
            stats,
            sections,
            metadata,
            warnings,
        })
    }

    fn extract_pdf(
        &self,
        bytes: &[u8],
        warnings: &mut Vec<String>,
    ) -> Result<(Vec<String>, DocumentStats)> {
        match lopdf::Document::load_mem(bytes) {
            Ok(doc) => {
                let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
                let stats = DocumentStats {
                    page_count: page_numbers.len().max(1),
                    encrypted: doc.is_encrypted(),
                    producer: info_entry(&doc, "Producer"),
                    version: Some(doc.version.clone()),
                    ..Default::default()
                };

                let mut pages = Vec::with_capacity(page_numbers.len());
                for page_number in &page_numbers {
                    match doc.extract_text(&[*page_number]) {
                        Ok(page_text) => pages.push(page_text),
                        Err(e) => {
                            warnings.push(format!(
                                "Failed to extract text from page {}: {}",
                                page_number, e
                            ));
                            pages.push(String::new());
                        }
                    }
                }

                // Some producers defeat per-page extraction entirely; retry
                // with the whole-document path before giving up.
                if pages.iter().all(|p| p.trim().is_empty()) {
                    if let Ok(text) = pdf_extract::extract_text_from_mem(bytes) {
                        if !text.trim().is_empty() {
                            pages = vec![text];
                        }
                    }
                }

                Ok((pages, stats))
            }
            Err(load_err) => {
                let text = pdf_extract::extract_text_from_mem(bytes).map_err(|e| {
                    ResumeAnalyzerError::PdfExtraction(format!(
                        "Document unreadable ({}); fallback extraction failed: {}",
                        load_err, e
                    ))
                })?;
                warnings.push(format!(
                    "PDF structure unreadable ({}); used fallback text extraction",
                    load_err
                ));
                Ok((vec![text], DocumentStats { page_count: 1, ..Default::default() }))
            }
        }
    }

    /// Embedded metadata is best-effort: absence, timeout, or a bad exit all
    /// degrade to a warning and `None`.
    async fn read_embedded_metadata(
        &self,
        bytes: &[u8],
        warnings: &mut Vec<String>,
    ) -> Option<FlatRecord> {
        let Some(tool) = &self.metadata_tool else {
            warnings.push("Metadata extraction utility unavailable: not configured".to_string());
            return None;
        };

        match tool.extract_flat(bytes).await {
            Ok(flat) if !flat.is_empty() => Some(flat),
            Ok(_) => None,
            Err(e) => {
                warn!("Embedded metadata extraction degraded: {}", e);
                warnings.push(format!("Metadata extraction utility unavailable: {}", e));
                None
            }
        }
    }
}

/// Strip markdown down to plain text.
fn markdown_to_text(markdown: &str) -> String {
    use pulldown_cmark::{Event, Parser, Tag};

    let mut out = String::new();
    for event in Parser::new(markdown) {
        match event {
            Event::Text(text) | Event::Code(text) => out.push_str(&text),
            Event::SoftBreak | Event::HardBreak => out.push('\n'),
            Event::End(Tag::Paragraph | Tag::Heading(..) | Tag::Item) => out.push('\n'),
            _ => {}
        }
    }
    out
}

fn info_entry(doc: &lopdf::Document, key: &str) -> Option<String> {
    let info = doc.trailer.get(b"Info").ok()?;
    let dict = match info {
        lopdf::Object::Reference(id) => doc.get_object(*id).ok()?.as_dict().ok()?,
        lopdf::Object::Dictionary(dict) => dict,
        _ => return None,
    };
    let bytes = dict.get(key.as_bytes()).ok()?.as_str().ok()?;
    let value = String::from_utf8_lossy(bytes).trim().to_string();
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn extractor() -> DocumentExtractor {
        DocumentExtractor::new(Config::default().extraction, None)
    }

    const SAMPLE: &str = "Jane Doe\njane@example.com\n\nSummary\nBackend engineer with eight years of experience \
        building data platforms and APIs in Rust and Python.\n\nExperience\nAcme Corp - Senior Engineer\n- Reduced \
        pipeline latency by 40%\n\nEducation\nState University, BS Computer Science\n\nSkills\nRust, Python, Kubernetes\n";

    #[tokio::test]
    async fn test_plain_text_extraction() {
        let extraction = extractor().extract(SAMPLE.as_bytes(), FileType::Text).await.unwrap();
        assert_eq!(extraction.stats.page_count, 1);
        assert!(extraction.text.contains("Jane Doe"));
        assert!(extraction.stats.word_count > 20);
        assert!(extraction.sections.contains(&SectionLabel::Experience));
        assert!(extraction.sections.contains(&SectionLabel::Skills));
        assert!(extraction.metadata.is_none());
    }

    #[tokio::test]
    async fn test_empty_document_rejected() {
        let result = extractor().extract(&[], FileType::Text).await;
        assert!(matches!(result, Err(ResumeAnalyzerError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_oversized_document_rejected_before_work() {
        let config = ExtractionConfig { max_document_bytes: 16, min_text_length: 1 };
        let extractor = DocumentExtractor::new(config, None);
        let result = extractor.extract(&[b'a'; 64], FileType::Text).await;
        assert!(matches!(result, Err(ResumeAnalyzerError::DocumentTooLarge { .. })));
    }

    #[tokio::test]
    async fn test_unsupported_type_rejected() {
        let result = extractor().extract(b"PK\x03\x04zipzip", FileType::Unknown).await;
        assert!(matches!(result, Err(ResumeAnalyzerError::UnsupportedFormat(_))));
    }

    #[tokio::test]
    async fn test_short_text_warns_but_succeeds() {
        let extraction = extractor().extract(b"Jane Doe", FileType::Text).await.unwrap();
        assert!(extraction
            .warnings
            .iter()
            .any(|w| w.contains("characters")));
    }

    #[tokio::test]
    async fn test_markdown_formatting_is_stripped() {
        let markdown = "# Jane Doe\n\n**Summary**\n\nEngineer with *impact*.\n";
        let extraction = extractor().extract(markdown.as_bytes(), FileType::Markdown).await.unwrap();
        assert!(extraction.text.contains("Jane Doe"));
        assert!(!extraction.text.contains('#'));
        assert!(!extraction.text.contains('*'));
    }
}
