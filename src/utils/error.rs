use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProgressError {
    #[error("Malformed agreement document: {reason}")]
    MalformedDocument { reason: String },

    #[error("Agreement document not found: {key}")]
    DocumentNotFound { key: String },

    #[error("Invalid agreement key: {key}")]
    InvalidAgreementKey { key: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Document,
    Input,
    Configuration,
}

impl ProgressError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedDocument {
            reason: reason.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MalformedDocument { .. } => ErrorCategory::Document,
            Self::DocumentNotFound { .. }
            | Self::InvalidAgreementKey { .. }
            | Self::IoError(_)
            | Self::SerializationError(_)
            | Self::CsvError(_) => ErrorCategory::Input,
            Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::MalformedDocument { .. } => {
                "The agreement has no requirement tree; pick a different program or document"
            }
            Self::DocumentNotFound { .. } => "Check --documents-dir and the agreement key",
            Self::InvalidAgreementKey { .. } => {
                "Agreement keys look like '<file>.json_<program name>'"
            }
            Self::IoError(_) => "Make sure the input files exist and are readable",
            Self::SerializationError(_) => "Make sure the input file is valid JSON",
            Self::CsvError(_) => {
                "CSV course lists need a header row: course_code,course_name,credits,grade"
            }
            Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => "Review the configuration file",
        }
    }
}

pub type Result<T> = std::result::Result<T, ProgressError>;
