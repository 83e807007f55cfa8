//! Resume analyzer: parsing, ATS scoring, and job keyword gap analysis

mod cli;
mod config;
mod error;
mod flat;
mod input;
mod llm;
mod output;
mod pipeline;
mod processing;

use clap::Parser;
use cli::{Cli, Commands, ConfigAction};
use config::Config;
use error::{Result, ResumeAnalyzerError};
use input::file_detector::FileType;
use llm::extractor::HeuristicExtractor;
use log::error;
use output::report::formatter_for;
use pipeline::runner::{JobPosting, Pipeline};
use pipeline::store::MemoryStore;
use std::path::Path;
use std::process;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run_command(cli.command, config).await {
        error!("Command failed: {}", e);
        process::exit(1);
    }
}

async fn run_command(command: Commands, config: Config) -> Result<()> {
    match command {
        Commands::Analyze {
            resume,
            job,
            job_title,
            output,
            detailed,
        } => {
            cli::validate_file_extension(&resume, &["pdf", "txt", "md"])
                .map_err(|e| ResumeAnalyzerError::InvalidInput(format!("Resume file: {}", e)))?;
            let output_format =
                cli::parse_output_format(&output).map_err(ResumeAnalyzerError::InvalidInput)?;

            let posting = match &job {
                Some(job_path) => {
                    cli::validate_file_extension(job_path, &["txt", "md"]).map_err(|e| {
                        ResumeAnalyzerError::InvalidInput(format!("Job description file: {}", e))
                    })?;
                    let description = std::fs::read_to_string(job_path)?;
                    let title = job_title.clone().unwrap_or_else(|| {
                        job_path
                            .file_stem()
                            .map(|s| s.to_string_lossy().to_string())
                            .unwrap_or_default()
                    });
                    Some(JobPosting { title, description })
                }
                None => None,
            };

            let record = run_pipeline(&config, &resume, posting.as_ref()).await?;

            let formatter = formatter_for(&output_format, config.output.color_output, detailed);
            println!("{}", formatter.format_report(&record)?);
        }

        Commands::Score { resume, output } => {
            cli::validate_file_extension(&resume, &["pdf", "txt", "md"])
                .map_err(|e| ResumeAnalyzerError::InvalidInput(format!("Resume file: {}", e)))?;
            let output_format =
                cli::parse_output_format(&output).map_err(ResumeAnalyzerError::InvalidInput)?;

            let record = run_pipeline(&config, &resume, None).await?;

            let formatter = formatter_for(&output_format, config.output.color_output, false);
            println!("{}", formatter.format_report(&record)?);
        }

        Commands::ExportFlat { resume, save } => {
            cli::validate_file_extension(&resume, &["pdf", "txt", "md"])
                .map_err(|e| ResumeAnalyzerError::InvalidInput(format!("Resume file: {}", e)))?;

            let bytes = std::fs::read(&resume)?;
            let file_type = detect_type(&resume, &bytes);
            let pipeline = Pipeline::new(&config, MemoryStore::new(), HeuristicExtractor::new());

            let id = pipeline.submit(&bytes, "cli", &resume.display().to_string())?;
            let record = pipeline.process(id, &bytes, file_type, None).await?;
            if let Some(error) = record.error {
                return Err(ResumeAnalyzerError::Pipeline(error));
            }

            let flat = pipeline.export_flat(id)?;
            let rendered = serde_json::to_string_pretty(&flat)?;
            match save {
                Some(path) => std::fs::write(path, rendered)?,
                None => println!("{}", rendered),
            }
        }

        Commands::Config { action } => match action.unwrap_or(ConfigAction::Show) {
            ConfigAction::Show => {
                let content = toml::to_string_pretty(&config).map_err(|e| {
                    ResumeAnalyzerError::Configuration(format!("Failed to render config: {}", e))
                })?;
                println!("{}", content);
            }
            ConfigAction::Reset => {
                Config::default().save()?;
                println!("Configuration reset to defaults");
            }
        },
    }

    Ok(())
}

async fn run_pipeline(
    config: &Config,
    resume: &Path,
    posting: Option<&JobPosting>,
) -> Result<pipeline::record::ProcessingRecord> {
    let bytes = std::fs::read(resume)?;
    let file_type = detect_type(resume, &bytes);

    // The CLI has no generative model attached; the heuristic extractor
    // serves as both primary and fallback here.
    let pipeline = Pipeline::new(config, MemoryStore::new(), HeuristicExtractor::new());

    let id = pipeline.submit(&bytes, "cli", &resume.display().to_string())?;
    pipeline.process(id, &bytes, file_type, posting).await
}

fn detect_type(path: &Path, bytes: &[u8]) -> FileType {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => FileType::from_extension(ext),
        None => FileType::from_bytes(bytes),
    }
}
