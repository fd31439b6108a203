use crate::core::document::{agreement_context, DocumentShape};
use crate::utils::error::{ProgressError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

const KEY_SEPARATOR: &str = ".json_";

/// Names one program inside one agreement document: `"{document_file}_{program_name}"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgreementKey {
    document_file: String,
    program: String,
}

impl AgreementKey {
    pub fn new(document_file: impl Into<String>, program: impl Into<String>) -> Self {
        Self {
            document_file: document_file.into(),
            program: program.into(),
        }
    }

    /// Splits at the first `.json_`, so program names may themselves contain underscores.
    pub fn parse(raw: &str) -> Result<Self> {
        let invalid = || ProgressError::InvalidAgreementKey {
            key: raw.to_string(),
        };
        let split = raw.find(KEY_SEPARATOR).ok_or_else(invalid)?;
        let document_file = &raw[..split + ".json".len()];
        let program = &raw[split + KEY_SEPARATOR.len()..];
        if program.trim().is_empty() || document_file == ".json" {
            return Err(invalid());
        }
        Ok(Self::new(document_file, program))
    }

    pub fn document_file(&self) -> &str {
        &self.document_file
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl fmt::Display for AgreementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.document_file, self.program)
    }
}

impl std::str::FromStr for AgreementKey {
    type Err = ProgressError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// One row of the lookup index that maps institution pairs and programs to documents.
///
/// The index itself lives outside this crate; this is the shape it is expected to hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub sending_id: Option<i64>,
    pub sending_name: String,
    pub receiving_id: Option<i64>,
    pub receiving_name: String,
    pub program_name: String,
    pub agreement_key: String,
}

impl IndexEntry {
    /// Index rows for every named program of a bundled agreement document.
    ///
    /// Single-program documents carry no program names and yield nothing.
    pub fn from_document(document_file: &str, document: &Value) -> Result<Vec<Self>> {
        let DocumentShape::Bundle { programs } = DocumentShape::detect(document)? else {
            return Ok(Vec::new());
        };
        let context = agreement_context(document);

        Ok(programs
            .iter()
            .filter_map(|program| program.get("name").and_then(Value::as_str))
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| Self {
                sending_id: context.sending_id,
                sending_name: context
                    .sending_name
                    .clone()
                    .unwrap_or_else(|| "Unknown CC".to_string()),
                receiving_id: context.receiving_id,
                receiving_name: context
                    .receiving_name
                    .clone()
                    .unwrap_or_else(|| "Unknown Uni".to_string()),
                program_name: name.to_string(),
                agreement_key: AgreementKey::new(document_file, name).to_string(),
            })
            .collect())
    }
}
