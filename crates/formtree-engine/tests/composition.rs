mod common;

use std::sync::Arc;

use common::{contacts_definition, definition, path, registry, registry_with};
use formtree_engine::{Form, FormEvent, FormOptions};
use formtree_ir::{Action, Breakpoint, ChangeKind, ErrorMap, FieldError};
use serde_json::json;

fn changes(events: &[FormEvent]) -> Vec<&FormEvent> {
    events
        .iter()
        .filter(|event| matches!(event, FormEvent::Changed { .. }))
        .collect()
}

#[test]
fn repeating_rows_are_seeded_and_added() {
    let mut form = Form::new(registry(), FormOptions::new(contacts_definition()));
    assert_eq!(form.value(), &json!({"contacts": [{}]}));

    assert!(form.interact(&Action::add_item(path("contacts"))).is_handled());
    assert_eq!(form.value()["contacts"].as_array().map(Vec::len), Some(2));

    let events = form.take_events();
    assert_eq!(
        events,
        vec![FormEvent::Changed {
            kind: ChangeKind::InputChange,
            path: path("contacts"),
            value: json!({"contacts": [{}, {}]}),
        }]
    );
}

#[test]
fn leaf_input_reaches_the_root_value() {
    let mut form = Form::new(registry(), FormOptions::new(contacts_definition()));
    form.interact(&Action::input(path("email"), json!("a@b.com")));
    form.interact(&Action::input(path("contacts[0].phone"), json!("555")));

    assert_eq!(
        form.value(),
        &json!({"email": "a@b.com", "contacts": [{"phone": "555"}]})
    );
    let events = form.take_events();
    let changed = changes(&events);
    assert_eq!(changed.len(), 2);
    match changed[1] {
        FormEvent::Changed { path: origin, value, .. } => {
            assert_eq!(origin, &path("contacts[0].phone"));
            assert_eq!(value["contacts"][0]["phone"], json!("555"));
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn errors_are_visible_only_to_their_field() {
    let mut form = Form::new(
        registry(),
        FormOptions::new(contacts_definition())
            .with_value(json!({"contacts": [{"phone": "1"}, {"phone": "2"}]})),
    );
    form.set_errors(ErrorMap::single(
        path("contacts[0].phone"),
        FieldError::custom("bad number"),
    ));

    let rendered = form.render().expect("root renders");
    let first = rendered.find(&path("contacts[0].phone")).expect("row 0 phone");
    let second = rendered.find(&path("contacts[1].phone")).expect("row 1 phone");
    let email = rendered.find(&path("email")).expect("email");
    assert_eq!(first.error.as_ref().map(|e| e.message.as_str()), Some("bad number"));
    assert!(second.error.is_none());
    assert!(email.error.is_none());
}

#[test]
fn submit_reports_missing_values_once() {
    let mut form = Form::new(registry(), FormOptions::new(contacts_definition()));
    assert!(!form.submit());

    let events = form.take_events();
    assert_eq!(events.len(), 1);
    let FormEvent::Invalid { errors } = &events[0] else {
        panic!("expected invalid event, got {:?}", events[0]);
    };
    assert_eq!(errors.len(), 1);
    assert!(errors.contains(&path("contacts[0].phone")));

    form.interact(&Action::input(path("contacts[0].phone"), json!("555")));
    assert!(form.errors().is_empty());
    assert!(form.submit());
    assert!(matches!(
        form.take_events().last(),
        Some(FormEvent::Submitted { .. })
    ));
}

#[test]
fn removing_a_row_moves_errors_up() {
    let mut form = Form::new(
        registry(),
        FormOptions::new(contacts_definition())
            .with_value(json!({"contacts": [{"phone": "1"}, {}, {}]})),
    );
    assert!(!form.validate(true));
    assert!(form.errors().contains(&path("contacts[2].phone")));

    form.interact(&Action::remove_item(path("contacts"), 1));
    assert_eq!(form.value()["contacts"].as_array().map(Vec::len), Some(2));
    assert!(form.errors().contains(&path("contacts[1].phone")));
    assert!(!form.errors().contains(&path("contacts[2].phone")));
}

#[test]
fn anonymous_sections_share_the_parent_value() {
    let definition = definition(json!({
        "type": "form",
        "fields": [
            {"type": "form", "fields": [
                {"type": "string", "name": "first"},
                {"type": "string", "name": "last"}
            ]},
            {"type": "string", "name": "city"}
        ]
    }));
    let mut form = Form::new(
        registry(),
        FormOptions::new(definition).with_value(json!({"first": "Ada", "stale": true})),
    );
    assert_eq!(form.value(), &json!({"first": "Ada"}));

    form.interact(&Action::input(path("last"), json!("Lovelace")));
    assert_eq!(form.value(), &json!({"first": "Ada", "last": "Lovelace"}));

    form.set_errors(ErrorMap::single(path("last"), FieldError::custom("too short")));
    let rendered = form.render().expect("root renders");
    let last = rendered.find(&path("last")).expect("flattened field renders");
    assert_eq!(last.type_tag, "string");
    assert!(last.error.is_some());
}

#[test]
fn named_root_keeps_its_value_under_the_name() {
    let definition = definition(json!({
        "type": "form",
        "name": "profile",
        "fields": [{"type": "string", "name": "nick"}]
    }));
    let mut form = Form::new(
        registry(),
        FormOptions::new(definition).with_value(json!({"profile": {"nick": "ada"}})),
    );
    form.interact(&Action::input(path("profile.nick"), json!("grace")));
    assert_eq!(form.value(), &json!({"profile": {"nick": "grace"}}));
}

#[test]
fn unknown_types_are_skipped() {
    let definition = definition(json!({
        "type": "form",
        "fields": [
            {"type": "mystery", "name": "x"},
            {"type": "string", "name": "y"}
        ]
    }));
    let form = Form::new(registry(), FormOptions::new(definition));
    let rendered = form.render().expect("root renders");
    assert_eq!(rendered.children.len(), 1);
    assert_eq!(rendered.children[0].name.as_deref(), Some("y"));
}

#[test]
fn hidden_fields_contribute_defaults_without_rendering() {
    let definition = definition(json!({
        "type": "form",
        "fields": [
            {"type": "hidden", "name": "token", "default": "abc"},
            {"type": "string", "name": "y"}
        ]
    }));
    let form = Form::new(registry(), FormOptions::new(definition));
    assert_eq!(form.value(), &json!({"token": "abc"}));
    assert_eq!(form.render().map(|node| node.children.len()), Some(1));
}

#[test]
fn libraries_are_isolated() {
    let mut registry = registry_with("plain");
    formtree_engine::register_composites(&mut registry, "fancy");
    let registry = Arc::new(registry);
    let definition = definition(json!({
        "type": "form",
        "fields": [{"type": "string", "name": "y"}]
    }));

    let plain = Form::new(registry.clone(), FormOptions::new(definition.clone()));
    assert_eq!(plain.library(), Some("plain"));
    assert_eq!(plain.render().map(|node| node.children.len()), Some(1));

    let fancy = Form::new(registry, FormOptions::new(definition).with_library("fancy"));
    let rendered = fancy.render().expect("composites exist in fancy");
    assert_eq!(rendered.library.as_deref(), Some("fancy"));
    assert!(rendered.children.is_empty());
}

#[test]
fn missing_root_renderer_renders_nothing() {
    let form = Form::new(
        registry(),
        FormOptions::new(contacts_definition()).with_library("absent"),
    );
    assert!(!form.is_rendered());
    assert!(form.render().is_none());
}

#[test]
fn breakpoint_changes_bubble_with_addresses() {
    let definition = definition(json!({
        "type": "form",
        "fields": [
            {"type": "string", "name": "name"},
            {"type": "form", "name": "address", "fields": [
                {"type": "string", "name": "street"}
            ]}
        ]
    }));
    let mut form = Form::new(registry(), FormOptions::new(definition));

    form.resize(700.0);
    let events = form.take_events();
    assert_eq!(
        events,
        vec![
            FormEvent::LayoutChanged { id: vec![0], breakpoint: Breakpoint::M },
            FormEvent::LayoutChanged { id: vec![0, 1], breakpoint: Breakpoint::M },
        ]
    );

    assert!(form.measure(&[0, 1], 900.0).is_handled());
    assert_eq!(
        form.take_events(),
        vec![FormEvent::LayoutChanged { id: vec![0, 1], breakpoint: Breakpoint::L }]
    );
    let rendered = form.render().expect("root renders");
    assert_eq!(rendered.breakpoint, Some(Breakpoint::M));
    assert_eq!(rendered.children[1].breakpoint, Some(Breakpoint::L));

    form.resize(700.0);
    assert_eq!(
        form.take_events(),
        vec![FormEvent::LayoutChanged { id: vec![0, 1], breakpoint: Breakpoint::M }]
    );
    assert!(!form.measure(&[3], 100.0).is_handled());
}

#[test]
fn focus_prefers_autofocus_then_first_field() {
    let mut form = Form::new(registry(), FormOptions::new(contacts_definition()));
    assert!(form.focus());
    let rendered = form.render().expect("root renders");
    assert!(rendered.find(&path("email")).is_some_and(|node| node.focused));

    let definition = definition(json!({
        "type": "form",
        "fields": [
            {"type": "string", "name": "a"},
            {"type": "string", "name": "b", "focus": true}
        ]
    }));
    let mut form = Form::new(registry(), FormOptions::new(definition));
    assert!(form.focus());
    let rendered = form.render().expect("root renders");
    assert!(!rendered.find(&path("a")).is_some_and(|node| node.focused));
    assert!(rendered.find(&path("b")).is_some_and(|node| node.focused));

    assert!(form.focus_field(&path("a")));
    let rendered = form.render().expect("root renders");
    assert!(rendered.find(&path("a")).is_some_and(|node| node.focused));
    assert!(!rendered.find(&path("b")).is_some_and(|node| node.focused));
}

#[test]
fn reset_restores_initial_value() {
    let mut form = Form::new(
        registry(),
        FormOptions::new(contacts_definition()).with_value(json!({"email": "x@y.z"})),
    );
    form.interact(&Action::input(path("email"), json!("changed")));
    form.validate(true);
    form.reset();
    assert_eq!(form.value(), &json!({"email": "x@y.z", "contacts": [{}]}));
    assert!(form.errors().is_empty());
}

#[test]
fn changing_definition_prunes_removed_members() {
    let mut form = Form::new(
        registry(),
        FormOptions::new(contacts_definition())
            .with_value(json!({"email": "x@y.z", "contacts": [{"phone": "1"}]})),
    );
    form.set_definition(definition(json!({
        "type": "form",
        "fields": [{"type": "string", "name": "email"}]
    })));
    assert_eq!(form.value(), &json!({"email": "x@y.z"}));
}

#[test]
fn changing_definition_drops_errors_of_removed_members() {
    let mut form = Form::new(
        registry(),
        FormOptions::new(contacts_definition())
            .with_value(json!({"email": "x@y.z", "contacts": [{}]})),
    );
    assert!(!form.validate(true));
    let mut errors = form.errors().clone();
    errors.insert(path("email"), FieldError::custom("taken"));
    form.set_errors(errors);
    assert!(form.errors().contains(&path("contacts[0].phone")));

    form.set_definition(definition(json!({
        "type": "form",
        "fields": [{"type": "string", "name": "email"}]
    })));
    assert_eq!(
        form.errors().paths().map(ToString::to_string).collect::<Vec<_>>(),
        vec!["email"]
    );
    let rendered = form.render().expect("root renders");
    assert!(rendered.find(&path("email")).is_some_and(|node| node.error.is_some()));
}

#[test]
fn focus_moves_are_reported_with_paths() {
    let definition = definition(json!({
        "type": "form",
        "fields": [
            {"type": "string", "name": "a"},
            {"type": "string", "name": "b", "focus": true}
        ]
    }));
    let mut form = Form::new(registry(), FormOptions::new(definition));
    form.take_events();

    assert!(form.focus());
    assert_eq!(form.take_events(), vec![FormEvent::Focused { path: path("b") }]);

    assert!(form.focus_field(&path("a")));
    assert_eq!(
        form.take_events(),
        vec![
            FormEvent::Blurred { path: path("b") },
            FormEvent::Focused { path: path("a") },
        ]
    );

    form.blur();
    assert_eq!(form.take_events(), vec![FormEvent::Blurred { path: path("a") }]);
    form.blur();
    assert!(form.take_events().is_empty());
}

#[test]
fn focus_events_carry_nested_paths() {
    let mut form = Form::new(
        registry(),
        FormOptions::new(contacts_definition()).with_value(json!({"contacts": [{}, {}]})),
    );
    form.take_events();
    assert!(form.focus_field(&path("contacts[1].phone")));
    assert_eq!(
        form.take_events(),
        vec![FormEvent::Focused { path: path("contacts[1].phone") }]
    );
}
