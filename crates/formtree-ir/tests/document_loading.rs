use anyhow::Result;
use formtree_ir::{FieldKind, FormDocument};
use std::io::Write;

#[test]
fn loads_document_from_file() -> Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    write!(
        file,
        r#"{{
            "definition": {{
                "type": "object",
                "fields": [
                    {{"type": "string", "name": "email"}},
                    {{"type": "selectableSection", "name": "payment", "selections": [
                        {{"label": "Card", "value": "card", "form": {{"type": "form", "fields": [{{"type": "string", "name": "number"}}]}}}},
                        {{"label": "Invoice"}}
                    ]}}
                ]
            }},
            "value": {{"email": "a@b.com"}}
        }}"#
    )?;

    let document = FormDocument::from_path(file.path())?;
    let fields = document.definition.child_fields();
    assert_eq!(fields.len(), 2);
    match fields[1].kind() {
        FieldKind::Selectable { selections } => {
            assert_eq!(selections.len(), 2);
            assert_eq!(selections[0].key(), "card");
            assert_eq!(selections[1].key(), "Invoice");
        }
        other => panic!("unexpected kind {other:?}"),
    }
    assert_eq!(document.initial_value().len(), 1);
    assert!(document.digest.is_some());
    Ok(())
}

#[test]
fn missing_file_reports_path() {
    let err = FormDocument::from_path(std::path::Path::new("/nonexistent/form.json")).unwrap_err();
    assert!(format!("{err:#}").contains("/nonexistent/form.json"));
}
