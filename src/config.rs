//! Configuration management for the resume analyzer

use crate::error::{Result, ResumeAnalyzerError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub extraction: ExtractionConfig,
    pub metadata_tool: MetadataToolConfig,
    pub pipeline: PipelineConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Documents above this size are rejected before any work is done.
    pub max_document_bytes: usize,
    /// Extractions shorter than this produce a warning.
    pub min_text_length: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataToolConfig {
    /// External utility used to read embedded flat metadata from a document.
    /// `None` disables the metadata pass entirely.
    pub program: Option<PathBuf>,
    pub timeout_ms: u64,
    /// Stdout larger than this counts as a tool failure.
    pub max_output_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Outer bound on a whole processing attempt, generative step included.
    pub attempt_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub detailed: bool,
    pub color_output: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Console,
    Json,
    Markdown,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            extraction: ExtractionConfig {
                max_document_bytes: 10 * 1024 * 1024,
                min_text_length: 150,
            },
            metadata_tool: MetadataToolConfig {
                program: Some(PathBuf::from("exiftool")),
                timeout_ms: 20_000,
                max_output_bytes: 1024 * 1024,
            },
            pipeline: PipelineConfig {
                attempt_timeout_secs: 180,
            },
            output: OutputConfig {
                format: OutputFormat::Console,
                detailed: false,
                color_output: true,
            },
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = toml::from_str(&content)
                .map_err(|e| ResumeAnalyzerError::Configuration(format!("Failed to parse config: {}", e)))?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save()?;
            Ok(config)
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ResumeAnalyzerError::Configuration(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(&config_path, content)?;
        Ok(())
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("resume-analyzer")
            .join("config.toml")
    }
}
