use std::sync::OnceLock;

use anyhow::{Result, anyhow};
use jsonschema::{Draft, JSONSchema};
use serde_json::Value;

use crate::document::FormDocument;

static DOCUMENT_SCHEMA: OnceLock<JSONSchema> = OnceLock::new();

fn compile_schema(source: &'static str) -> JSONSchema {
    let schema_value: Value =
        serde_json::from_str(source).expect("embedded schema should parse as JSON");
    JSONSchema::options()
        .with_draft(Draft::Draft202012)
        .compile(&schema_value)
        .expect("embedded schema should compile")
}

fn document_schema() -> &'static JSONSchema {
    DOCUMENT_SCHEMA
        .get_or_init(|| compile_schema(include_str!("../schema/form_document.schema.json")))
}

fn validate_value(schema: &JSONSchema, value: &Value, label: &str) -> Result<()> {
    if let Err(errors) = schema.validate(value) {
        let messages: Vec<String> = errors.into_iter().map(|err| err.to_string()).collect();
        let joined = messages.join("\n");
        return Err(anyhow!("{label} failed schema validation:\n{joined}"));
    }
    Ok(())
}

/// Validates a `serde_json::Value` against the form document schema.
pub fn validate_form_document_value(value: &Value) -> Result<()> {
    validate_value(document_schema(), value, "form document")
}

/// Validates a parsed [`FormDocument`] against the form document schema.
pub fn validate_form_document(document: &FormDocument) -> Result<()> {
    let value = serde_json::to_value(document)?;
    validate_form_document_value(&value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_nested_document() {
        let value = json!({
            "definition": {
                "type": "object",
                "fields": [
                    {"type": "string", "name": "email"},
                    {"type": "repeating", "name": "contacts", "min": 1,
                     "form": {"type": "form", "fields": [{"type": "string", "name": "phone"}]}}
                ]
            },
            "value": {"email": "a@b.com"}
        });
        validate_form_document_value(&value).expect("document should satisfy schema");
    }

    #[test]
    fn rejects_field_without_type() {
        let value = json!({"definition": {"type": "form", "fields": [{"name": "x"}]}});
        let err = validate_form_document_value(&value).unwrap_err();
        assert!(err.to_string().contains("form document failed schema validation"));
    }

    #[test]
    fn rejects_missing_definition() {
        assert!(validate_form_document_value(&json!({"value": {}})).is_err());
    }
}
