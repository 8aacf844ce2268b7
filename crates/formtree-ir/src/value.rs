//! Value-tree helpers: slicing a parent value for a child, hidden defaults,
//! and pruning keys of fields that no longer exist in the definition.

use serde_json::{Map, Value};

use crate::definition::{FieldDefinition, FieldKind};

/// Members kept by [`prune`] even though no field declares them.
pub const RESERVED_MEMBERS: [&str; 2] = ["type", "layout"];

/// Keys a node contributes to its parent's value object.
pub fn owned_keys(definition: &FieldDefinition) -> Vec<String> {
    if let Some(name) = definition.name() {
        return vec![name.to_string()];
    }
    if definition.is_anonymous() {
        return definition
            .child_fields()
            .iter()
            .flat_map(owned_keys)
            .collect();
    }
    Vec::new()
}

/// Value handed to a child: its named member, or for an anonymous node an
/// object with the members its children own.
pub fn slice_for(definition: &FieldDefinition, parent: &Map<String, Value>) -> Value {
    if let Some(name) = definition.name() {
        return parent.get(name).cloned().unwrap_or(Value::Null);
    }
    if definition.is_anonymous() {
        let mut slice = Map::new();
        for key in owned_keys(definition) {
            if let Some(member) = parent.get(&key) {
                slice.insert(key, member.clone());
            }
        }
        return Value::Object(slice);
    }
    Value::Null
}

/// Writes the default of every named `hidden` field into `value`,
/// descending into anonymous composites.
pub fn apply_hidden_fields(fields: &[FieldDefinition], value: &mut Map<String, Value>) {
    for field in fields {
        if field.kind() == FieldKind::Hidden {
            if let (Some(name), Some(default)) = (field.name(), field.default.as_ref()) {
                value.insert(name.to_string(), default.clone());
            }
        } else if field.is_anonymous() {
            apply_hidden_fields(field.child_fields(), value);
        }
    }
}

/// Copy of `value` restricted to the members `fields` still declare.
pub fn prune(fields: &[FieldDefinition], value: &Map<String, Value>) -> Map<String, Value> {
    let mut pruned = Map::new();
    collect_declared(fields, value, &mut pruned);
    for member in RESERVED_MEMBERS {
        if let Some(entry) = value.get(member) {
            pruned.insert(member.to_string(), entry.clone());
        }
    }
    pruned
}

fn collect_declared(
    fields: &[FieldDefinition],
    value: &Map<String, Value>,
    pruned: &mut Map<String, Value>,
) {
    for field in fields {
        if let Some(name) = field.name() {
            if let Some(entry) = value.get(name) {
                pruned.insert(name.to_string(), entry.clone());
            }
        } else if field.is_anonymous() {
            collect_declared(field.child_fields(), value, pruned);
        }
    }
}

/// Object view of a value; anything else is treated as empty.
pub fn as_object(value: &Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Vec<FieldDefinition> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn prune_drops_removed_fields_and_keeps_reserved() {
        let definition = fields(json!([
            {"type": "string", "name": "a"},
            {"type": "form", "fields": [{"type": "string", "name": "b"}]}
        ]));
        let value = as_object(&json!({"a": 1, "b": 2, "stale": 3, "type": "x"}));
        let pruned = prune(&definition, &value);
        assert_eq!(Value::Object(pruned), json!({"a": 1, "b": 2, "type": "x"}));
    }

    #[test]
    fn hidden_defaults_are_applied() {
        let definition = fields(json!([
            {"type": "hidden", "name": "token", "default": "abc"},
            {"type": "hidden", "name": "empty"},
            {"type": "nestedForm", "form": {"type": "form", "fields": [
                {"type": "hidden", "name": "inner", "default": 7}
            ]}}
        ]));
        let mut value = Map::new();
        apply_hidden_fields(&definition, &mut value);
        assert_eq!(Value::Object(value), json!({"token": "abc", "inner": 7}));
    }

    #[test]
    fn anonymous_slice_collects_owned_members() {
        let anonymous: FieldDefinition = serde_json::from_value(json!({
            "type": "form",
            "fields": [{"type": "string", "name": "x"}, {"type": "string", "name": "y"}]
        }))
        .unwrap();
        let parent = as_object(&json!({"x": 1, "y": 2, "z": 3}));
        assert_eq!(slice_for(&anonymous, &parent), json!({"x": 1, "y": 2}));
        assert_eq!(owned_keys(&anonymous), vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn named_slice_and_missing_member() {
        let named = FieldDefinition::new("string").named("x");
        let parent = as_object(&json!({"x": "v"}));
        assert_eq!(slice_for(&named, &parent), json!("v"));
        let other = FieldDefinition::new("string").named("missing");
        assert_eq!(slice_for(&other, &parent), Value::Null);
    }
}
