use crate::config::toml_config::{EngineConfig, OUTPUT_FORMATS};
use crate::utils::error::{ProgressError, Result};
use crate::utils::validation::{validate_one_of, Validate};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "transfer-progress")]
#[command(about = "Check a transcript against a transfer articulation agreement")]
pub struct CliConfig {
    /// Student course list (.json or .csv)
    #[arg(long)]
    pub courses: Option<PathBuf>,

    /// Agreement document file to evaluate against
    #[arg(long, conflicts_with = "key")]
    pub document: Option<PathBuf>,

    /// Program to pick when the document bundles several
    #[arg(long, requires = "document")]
    pub program: Option<String>,

    /// Agreement key, e.g. "51_to_79_master.json_Computer Science, B.A."
    #[arg(long)]
    pub key: Option<String>,

    /// Directory holding agreement documents (overrides the config file)
    #[arg(long)]
    pub documents_dir: Option<String>,

    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format: json or text (overrides the config file)
    #[arg(long)]
    pub format: Option<String>,

    /// Print lookup-index rows for the document instead of evaluating
    #[arg(long)]
    pub index: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub log_json: bool,
}

impl CliConfig {
    /// Load the config file, if any, and apply command-line overrides on top.
    pub fn engine_config(&self) -> Result<EngineConfig> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::from_file(path)?,
            None => EngineConfig::default(),
        };
        if let Some(dir) = &self.documents_dir {
            config.documents.root = dir.clone();
        }
        if let Some(format) = &self.format {
            config.output.format = format.clone();
        }
        if self.log_json {
            config.monitoring.json_logs = true;
        }
        Ok(config)
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if self.document.is_none() && self.key.is_none() {
            return Err(ProgressError::MissingConfigError {
                field: "--document or --key".to_string(),
            });
        }
        if self.index && self.document.is_none() {
            return Err(ProgressError::ConfigValidationError {
                field: "--index".to_string(),
                message: "indexing needs --document".to_string(),
            });
        }
        if let Some(format) = &self.format {
            validate_one_of("--format", format, &OUTPUT_FORMATS)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliConfig {
        CliConfig::try_parse_from(std::iter::once("transfer-progress").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn test_document_mode() {
        let config = parse(&["--courses", "c.json", "--document", "d.json", "--program", "Physics"]);
        assert!(config.validate().is_ok());
        assert_eq!(config.program.as_deref(), Some("Physics"));
    }

    #[test]
    fn test_key_and_document_conflict() {
        let result = CliConfig::try_parse_from([
            "transfer-progress",
            "--document",
            "d.json",
            "--key",
            "d.json_Physics",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_needs_a_document_source() {
        let config = parse(&["--courses", "c.json"]);
        assert!(matches!(
            config.validate(),
            Err(ProgressError::MissingConfigError { .. })
        ));
    }

    #[test]
    fn test_overrides_apply_over_defaults() {
        let config = parse(&["--key", "a.json_B", "--documents-dir", "/tmp/docs", "--format", "text"]);
        let engine = config.engine_config().unwrap();
        assert_eq!(engine.documents.root, "/tmp/docs");
        assert_eq!(engine.output.format, "text");

        let bad = parse(&["--key", "a.json_B", "--format", "yaml"]);
        assert!(bad.validate().is_err());
    }
}
