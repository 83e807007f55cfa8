//! CLI interface for the resume analyzer

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "resume-analyzer")]
#[command(about = "Resume parsing, ATS scoring, and job keyword gap analysis")]
#[command(long_about = "Parse a resume, score its ATS compatibility, and compare it against a target job description")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a resume, optionally against a job description
    Analyze {
        /// Path to resume file (PDF, TXT, MD)
        #[arg(short, long)]
        resume: PathBuf,

        /// Path to job description file (TXT, MD)
        #[arg(short, long)]
        job: Option<PathBuf>,

        /// Job title used for keyword weighting
        #[arg(short = 't', long)]
        job_title: Option<String>,

        /// Output format: console, json, markdown
        #[arg(short, long, default_value = "console")]
        output: String,

        /// Include context snippets and examples in the output
        #[arg(short, long)]
        detailed: bool,
    },

    /// Score a resume's ATS compatibility
    Score {
        /// Path to resume file (PDF, TXT, MD)
        #[arg(short, long)]
        resume: PathBuf,

        /// Output format: console, json, markdown
        #[arg(short, long, default_value = "console")]
        output: String,
    },

    /// Export a resume's structured record as flat metadata keys
    ExportFlat {
        /// Path to resume file (PDF, TXT, MD)
        #[arg(short, long)]
        resume: PathBuf,

        /// Write the flat record to this file instead of stdout
        #[arg(short, long)]
        save: Option<PathBuf>,
    },

    /// Show configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Reset configuration to defaults
    Reset,
}

/// Parse and validate output format
pub fn parse_output_format(format: &str) -> Result<crate::config::OutputFormat, String> {
    match format.to_lowercase().as_str() {
        "console" => Ok(crate::config::OutputFormat::Console),
        "json" => Ok(crate::config::OutputFormat::Json),
        "markdown" | "md" => Ok(crate::config::OutputFormat::Markdown),
        _ => Err(format!(
            "Invalid output format: {}. Supported: console, json, markdown",
            format
        )),
    }
}

/// Validate file extension
pub fn validate_file_extension(path: &PathBuf, allowed_extensions: &[&str]) -> Result<(), String> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => {
            if allowed_extensions.contains(&ext.to_lowercase().as_str()) {
                Ok(())
            } else {
                Err(format!(
                    "Unsupported file extension: .{}. Allowed: {}",
                    ext,
                    allowed_extensions.join(", ")
                ))
            }
        }
        None => Err("File has no extension".to_string()),
    }
}
