use std::io::Write;
use std::time::Duration;

use formtree_config::FetchConfig;
use formtree_io::{DocumentLoader, LoadError};
use serde_json::json;

fn write_document(value: serde_json::Value) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(file, "{value}").expect("write document");
    file
}

#[test]
fn loads_document_from_path() {
    let file = write_document(json!({
        "definition": {"type": "form", "fields": [{"type": "string", "name": "email"}]},
        "value": {"email": "a@b.com"}
    }));
    let mut loader = DocumentLoader::new();
    let id = loader.request(&file.path().display().to_string());
    let result = loader.wait(Duration::from_secs(5)).expect("load finishes");
    assert_eq!(result.request_id, id);
    let document = result.outcome.expect("document loads");
    assert_eq!(document.value, json!({"email": "a@b.com"}));
    assert!(!loader.has_pending());
}

#[test]
fn latest_request_wins() {
    let first = write_document(json!({
        "definition": {"type": "form", "fields": [{"type": "string", "name": "first"}]}
    }));
    let second = write_document(json!({
        "definition": {"type": "form", "fields": [{"type": "string", "name": "second"}]}
    }));
    let mut loader = DocumentLoader::new();
    let superseded = loader.request(&first.path().display().to_string());
    let latest = loader.request(&format!("file://{}", second.path().display()));
    assert_ne!(superseded, latest);

    let result = loader.wait(Duration::from_secs(5)).expect("load finishes");
    assert_eq!(result.request_id, latest);
    let document = result.outcome.expect("document loads");
    assert_eq!(document.definition.child_fields()[0].name(), Some("second"));
    assert!(loader.poll().is_none());
}

#[test]
fn invalid_document_is_reported() {
    let file = write_document(json!({"definition": {"type": "form", "fields": [{"name": "x"}]}}));
    let mut loader = DocumentLoader::new();
    loader.request(&file.path().display().to_string());
    let result = loader.wait(Duration::from_secs(5)).expect("load finishes");
    assert!(matches!(result.outcome, Err(LoadError::Document(_))));
}

#[test]
fn config_allowlist_blocks_remote_origin() {
    let config = FetchConfig {
        timeout_secs: 1,
        allowed_origins: vec!["https://forms.example:443".to_string()],
    };
    let mut loader = DocumentLoader::from_config(&config);
    loader.request("https://elsewhere.example/form.json");
    let result = loader.wait(Duration::from_secs(5)).expect("load finishes");
    assert!(matches!(result.outcome, Err(LoadError::OriginNotAllowed(_))));
}
