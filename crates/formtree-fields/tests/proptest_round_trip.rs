use std::sync::Arc;

use formtree_engine::{Form, FormOptions};
use formtree_ir::{Action, FieldDefinition, FieldPath, Segment};
use proptest::prelude::*;
use serde_json::{Map, Value, json};

/// Shape of one top-level entry: a leaf, a named group or an anonymous group.
#[derive(Debug, Clone, Copy)]
enum Entry {
    Leaf,
    Named(usize),
    Anonymous(usize),
}

fn entry() -> impl Strategy<Value = Entry> {
    prop_oneof![
        Just(Entry::Leaf),
        (1usize..4).prop_map(Entry::Named),
        (1usize..4).prop_map(Entry::Anonymous),
    ]
}

/// Definition for `entries` plus the absolute path of every leaf.
fn build(entries: &[Entry]) -> (FieldDefinition, Vec<FieldPath>) {
    let mut fields = Vec::new();
    let mut leaves = Vec::new();
    for (i, entry) in entries.iter().enumerate() {
        match *entry {
            Entry::Leaf => {
                let name = format!("f{i}");
                fields.push(json!({"type": "string", "name": name}));
                leaves.push(FieldPath::key(name));
            }
            Entry::Named(count) | Entry::Anonymous(count) => {
                let group = format!("g{i}");
                let names: Vec<String> = (0..count).map(|j| format!("f{i}_{j}")).collect();
                let children: Vec<Value> = names
                    .iter()
                    .map(|name| json!({"type": "string", "name": name}))
                    .collect();
                if matches!(entry, Entry::Named(_)) {
                    fields.push(json!({"type": "form", "name": group, "fields": children}));
                    leaves.extend(names.into_iter().map(|name| FieldPath::key(&group).child(&name)));
                } else {
                    fields.push(json!({"type": "form", "fields": children}));
                    leaves.extend(names.into_iter().map(FieldPath::key));
                }
            }
        }
    }
    let definition = serde_json::from_value(json!({"type": "form", "fields": fields}))
        .expect("generated definition parses");
    (definition, leaves)
}

fn set_at(target: &mut Value, path: &FieldPath, value: Value) {
    let mut current = target;
    for segment in path.segments() {
        let Segment::Key(key) = segment else {
            unreachable!("generated paths only use keys");
        };
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        current = current
            .as_object_mut()
            .map(|object| object.entry(key.clone()).or_insert(Value::Null))
            .expect("object ensured above");
    }
    *current = value;
}

proptest! {
    #[test]
    fn input_updates_only_its_own_path(
        entries in prop::collection::vec(entry(), 1..5),
        pick in any::<prop::sample::Index>(),
        text in "[a-z]{1,8}",
    ) {
        let (definition, leaves) = build(&entries);
        let mut form = Form::new(
            Arc::new(formtree_fields::registry()),
            FormOptions::new(definition),
        );
        let target = leaves[pick.index(leaves.len())].clone();
        let mut expected = form.value().clone();
        set_at(&mut expected, &target, Value::String(text.clone()));

        let result = form.interact(&Action::input(target.clone(), Value::String(text.clone())));
        prop_assert!(result.is_handled());
        prop_assert_eq!(form.value(), &expected);

        let rendered = form.render().expect("root renders");
        let node = rendered.find(&target).expect("leaf renders at its path");
        prop_assert_eq!(&node.value, &Value::String(text));
    }
}
