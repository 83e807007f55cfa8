//! External embedded-metadata tool invocation
//!
//! The flat metadata block lives inside the document and is read by an
//! external utility invoked as a child process. The call is bounded by a
//! timeout and an output-size cap; every failure mode here is recoverable and
//! the extractor degrades to "no embedded metadata" with a warning.

use crate::config::MetadataToolConfig;
use crate::error::{Result, ResumeAnalyzerError};
use crate::flat::codec::is_resume_key;
use crate::flat::key::canonical_key;
use crate::flat::{FlatRecord, FlatValue};
use log::debug;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

pub struct MetadataToolClient {
    program: PathBuf,
    timeout: Duration,
    max_output_bytes: usize,
}

impl MetadataToolClient {
    pub fn new(program: PathBuf, timeout_ms: u64, max_output_bytes: usize) -> Self {
        Self {
            program,
            timeout: Duration::from_millis(timeout_ms),
            max_output_bytes,
        }
    }

    pub fn from_config(config: &MetadataToolConfig) -> Option<Self> {
        config
            .program
            .as_ref()
            .map(|program| Self::new(program.clone(), config.timeout_ms, config.max_output_bytes))
    }

    /// Run the tool against a document on disk and return its stdout.
    pub async fn run(&self, path: &Path, args: &[&str]) -> Result<String> {
        let mut command = Command::new(&self.program);
        command
            .args(args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!("Running metadata tool: {:?} {:?} {}", self.program, args, path.display());

        let child = command.spawn().map_err(|e| {
            ResumeAnalyzerError::MetadataTool(format!(
                "Failed to spawn {}: {}",
                self.program.display(),
                e
            ))
        })?;

        let output = match timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|e| {
                ResumeAnalyzerError::MetadataTool(format!("Failed to collect tool output: {}", e))
            })?,
            Err(_) => {
                // kill_on_drop reaps the child when the future is dropped.
                return Err(ResumeAnalyzerError::MetadataTool(format!(
                    "Tool timed out after {}ms",
                    self.timeout.as_millis()
                )));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ResumeAnalyzerError::MetadataTool(format!(
                "Tool exited with {:?}: {}",
                output.status.code(),
                stderr.trim()
            )));
        }

        if output.stdout.len() > self.max_output_bytes {
            return Err(ResumeAnalyzerError::MetadataTool(format!(
                "Tool output of {} bytes exceeds the {} byte cap",
                output.stdout.len(),
                self.max_output_bytes
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// Stage the document bytes to a temp file and read its embedded flat
    /// metadata block.
    pub async fn extract_flat(&self, bytes: &[u8]) -> Result<FlatRecord> {
        let staged = tempfile::Builder::new()
            .prefix("resume-analyzer-")
            .suffix(".pdf")
            .tempfile()
            .map_err(|e| ResumeAnalyzerError::MetadataTool(format!("Failed to stage document: {}", e)))?;
        std::fs::write(staged.path(), bytes)
            .map_err(|e| ResumeAnalyzerError::MetadataTool(format!("Failed to stage document: {}", e)))?;

        let stdout = self.run(staged.path(), &["-json", "-n"]).await?;
        parse_tool_output(&stdout)
    }
}

/// Parse the tool's JSON stdout into a flat record. The tool emits either a
/// single object or an array with one object per file.
pub fn parse_tool_output(stdout: &str) -> Result<FlatRecord> {
    let value: serde_json::Value = serde_json::from_str(stdout.trim())
        .map_err(|e| ResumeAnalyzerError::MetadataTool(format!("Tool output is not JSON: {}", e)))?;

    let object = match &value {
        serde_json::Value::Array(items) => items.first().and_then(|v| v.as_object()),
        serde_json::Value::Object(_) => value.as_object(),
        _ => None,
    }
    .ok_or_else(|| {
        ResumeAnalyzerError::MetadataTool("Tool output is not a metadata object".to_string())
    })?;

    let mut flat = FlatRecord::new();
    for (key, value) in object {
        // Tool bookkeeping fields (source path, tool version) share the
        // store with resume data; only the resume namespace passes through.
        if !is_resume_key(&canonical_key(key)) {
            continue;
        }
        let flat_value = match value {
            serde_json::Value::String(s) => FlatValue::Text(s.clone()),
            serde_json::Value::Number(n) => match n.as_f64() {
                Some(f) => FlatValue::Number(f),
                None => continue,
            },
            serde_json::Value::Bool(b) => FlatValue::Bool(*b),
            // Nested values cannot come from the flat store; skip them.
            _ => continue,
        };
        flat.insert(key.clone(), flat_value);
    }

    Ok(flat)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_array_output() {
        let stdout = r#"[{"experience_count": 1, "experience_0_company": "Acme", "SourceFile": "x.pdf"}]"#;
        let flat = parse_tool_output(stdout).unwrap();
        assert_eq!(flat.get("experience_count"), Some(&FlatValue::Number(1.0)));
        assert_eq!(flat.get("experience_0_company"), Some(&FlatValue::text("Acme")));
        // Tool bookkeeping keys are not resume data.
        assert!(!flat.contains_key("SourceFile"));
    }

    #[test]
    fn test_parse_object_output() {
        let stdout = r#"{"contact_email": "a@b.com", "experience_0_is_current": true, "ExifToolVersion": 12.4}"#;
        let flat = parse_tool_output(stdout).unwrap();
        assert_eq!(flat.get("contact_email"), Some(&FlatValue::text("a@b.com")));
        assert_eq!(flat.get("experience_0_is_current"), Some(&FlatValue::Bool(true)));
        assert!(!flat.contains_key("ExifToolVersion"));
    }

    #[test]
    fn test_parse_rejects_non_json() {
        assert!(parse_tool_output("not json at all").is_err());
        assert!(parse_tool_output("[]").is_err());
    }

    #[tokio::test]
    async fn test_missing_tool_fails_recoverably() {
        let client = MetadataToolClient::new(
            PathBuf::from("definitely-not-a-real-tool-9f2a"),
            1_000,
            1024,
        );
        let result = client.extract_flat(b"%PDF-1.4").await;
        assert!(matches!(result, Err(ResumeAnalyzerError::MetadataTool(_))));
    }

    #[tokio::test]
    async fn test_timeout_is_a_tool_error() {
        let client = MetadataToolClient::new(PathBuf::from("sleep"), 50, 1024);
        let result = client.run(Path::new("5"), &[]).await;
        assert!(matches!(result, Err(ResumeAnalyzerError::MetadataTool(_))));
    }
}
