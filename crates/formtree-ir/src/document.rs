use crate::{definition::FieldDefinition, schema};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::path::Path;

/// A definition together with its initial value, as supplied by a host or
/// fetched from a remote source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormDocument {
    pub definition: FieldDefinition,
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default)]
    pub settings: Map<String, Value>,
    /// sha256 of the bytes the document was parsed from.
    #[serde(skip)]
    pub digest: Option<String>,
}

impl FormDocument {
    pub fn new(definition: FieldDefinition, value: Value) -> Self {
        Self {
            definition,
            value,
            theme: None,
            settings: Map::new(),
            digest: None,
        }
    }

    /// Parse and schema-check a document from JSON bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let raw: Value =
            serde_json::from_slice(bytes).context("failed to parse form document as JSON")?;
        schema::validate_form_document_value(&raw)
            .context("form document failed schema validation")?;
        let mut document: FormDocument =
            serde_json::from_value(raw).context("failed to deserialize form document")?;
        document.digest = Some(sha256_hex(bytes));
        Ok(document)
    }

    pub fn from_json_str(source: &str) -> Result<Self> {
        Self::from_slice(source.as_bytes())
    }

    /// Load a document from a JSON file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes =
            std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_slice(&bytes).with_context(|| format!("invalid form document {}", path.display()))
    }

    /// Initial value as an object; non-object values start empty.
    pub fn initial_value(&self) -> Map<String, Value> {
        crate::value::as_object(&self.value)
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
