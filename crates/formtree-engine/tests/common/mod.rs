//! Minimal text leaf and registries used by the engine tests.

#![allow(dead_code)]

use std::sync::Arc;

use formtree_engine::{
    Component, EventResult, Field, FieldInit, FieldListener, Registry, RenderNode,
    register_composites,
};
use formtree_ir::{
    Action, ActionKind, ChangeEvent, ErrorMap, FieldDefinition, FieldError, FieldPath,
    InvalidEvent,
};
use serde_json::{Value, json};

pub struct TextLeaf {
    definition: FieldDefinition,
    path: FieldPath,
    value: Value,
    errors: ErrorMap,
    focusable: bool,
    focused: bool,
}

impl TextLeaf {
    pub fn new(init: FieldInit) -> Self {
        let value = match init.value {
            Value::Null => init.definition.default.clone().unwrap_or(Value::Null),
            value => value,
        };
        Self {
            definition: init.definition,
            path: init.path,
            value,
            errors: init.errors,
            focusable: init.focusable,
            focused: false,
        }
    }

    fn set_focused(&mut self, focused: bool, listener: &mut dyn FieldListener) -> bool {
        if focused != self.focused {
            self.focused = focused;
            if focused {
                listener.focused(&self.path);
            } else {
                listener.blurred(&self.path);
            }
        }
        focused
    }

    fn check(&self) -> ErrorMap {
        let missing = match &self.value {
            Value::Null => true,
            Value::String(text) => text.is_empty(),
            _ => false,
        };
        if self.definition.required && missing {
            ErrorMap::single(
                FieldPath::root(),
                FieldError::native("required", json!({"valueMissing": true})),
            )
        } else {
            ErrorMap::new()
        }
    }
}

impl Field for TextLeaf {
    fn definition(&self) -> &FieldDefinition {
        &self.definition
    }

    fn path(&self) -> &FieldPath {
        &self.path
    }

    fn value(&self) -> &Value {
        &self.value
    }

    fn errors(&self) -> &ErrorMap {
        &self.errors
    }

    fn set_value(&mut self, value: Value) {
        self.value = value;
    }

    fn set_errors(&mut self, errors: ErrorMap) {
        self.errors = errors;
    }

    fn interact(&mut self, action: &Action, listener: &mut dyn FieldListener) -> EventResult {
        if action.target != self.path {
            return EventResult::Ignored;
        }
        let ActionKind::Input { value, change } = &action.kind else {
            return EventResult::Ignored;
        };
        self.value = value.clone();
        listener.changed(ChangeEvent::at(*change, self.path.clone(), self.value.clone()));
        if !self.errors.is_empty() {
            self.errors = self.check();
            listener.invalid(InvalidEvent {
                scope: self.path.clone(),
                errors: self.errors.clone(),
            });
        }
        EventResult::Handled
    }

    fn validate(&mut self, report: bool, listener: &mut dyn FieldListener) -> bool {
        let errors = self.check();
        let valid = errors.is_empty();
        if report {
            self.errors = errors;
            listener.invalid(InvalidEvent {
                scope: self.path.clone(),
                errors: self.errors.clone(),
            });
        }
        valid
    }

    fn focus_field(&mut self, path: &FieldPath, listener: &mut dyn FieldListener) -> bool {
        self.set_focused(self.focusable && path == &self.path, listener)
    }

    fn autofocus(&mut self, listener: &mut dyn FieldListener) -> bool {
        self.set_focused(self.focusable && self.definition.focus, listener)
    }

    fn focus_first(&mut self, listener: &mut dyn FieldListener) -> bool {
        self.set_focused(self.focusable, listener)
    }

    fn blur(&mut self, listener: &mut dyn FieldListener) {
        self.set_focused(false, listener);
    }

    fn render(&self) -> RenderNode {
        let mut node = RenderNode::new(&self.definition, &self.path, self.value.clone());
        node.error = self.errors.get(&FieldPath::root()).cloned();
        node.focused = self.focused;
        node
    }
}

/// Registry with one library `library` holding the composites and a
/// `string` leaf.
pub fn registry_with(library: &str) -> Registry {
    let mut registry = Registry::new();
    register_composites(&mut registry, library);
    registry.register_component(
        library,
        "string",
        Component::new(|init| Box::new(TextLeaf::new(init))),
    );
    registry
}

pub fn registry() -> Arc<Registry> {
    Arc::new(registry_with("test"))
}

pub fn path(source: &str) -> FieldPath {
    source.parse().expect("valid path")
}

pub fn definition(value: Value) -> FieldDefinition {
    serde_json::from_value(value).expect("valid definition")
}

/// `email` plus repeating `contacts` rows holding a required `phone`.
pub fn contacts_definition() -> FieldDefinition {
    definition(json!({
        "type": "form",
        "fields": [
            {"type": "string", "name": "email"},
            {"type": "repeatingSection", "name": "contacts", "min": 1,
             "form": {"type": "form", "fields": [
                 {"type": "string", "name": "phone", "required": true}
             ]}}
        ]
    }))
}
