//! Generic leaf renderer. Libraries supply a [`Widget`] describing the
//! host element; [`LeafField`] implements the field contract around it.

use formtree_engine::{Component, EventResult, Field, FieldInit, FieldListener, RenderContext, RenderNode};
use formtree_ir::{
    Action, ActionKind, ChangeEvent, ChangeKind, ErrorMap, FieldDefinition, FieldError, FieldPath,
    InvalidEvent,
};
use serde_json::Value;

use crate::messages::validation_message;
use crate::validity::{Constraints, InputKind, Validity, option_entries};

/// Library specific part of a leaf renderer.
pub trait Widget: Send + Sync + 'static {
    fn kind(&self) -> InputKind;

    /// Host element the node maps to, e.g. `input` or `mwc-textfield`.
    fn element(&self) -> &'static str;

    /// Add library specific attributes to the rendered node.
    fn decorate(&self, context: &RenderContext, definition: &FieldDefinition, node: &mut RenderNode) {
        let _ = (context, definition, node);
    }
}

/// A leaf field: owns one value, checks it and reports errors at its own path.
pub struct LeafField<W> {
    widget: W,
    context: RenderContext,
    definition: FieldDefinition,
    constraints: Constraints,
    path: FieldPath,
    value: Value,
    errors: ErrorMap,
    focusable: bool,
    focused: bool,
}

impl<W: Widget> LeafField<W> {
    pub fn new(init: FieldInit, widget: W) -> Self {
        let FieldInit {
            context,
            definition,
            path,
            value,
            errors,
            focusable,
        } = init;
        let value = match value {
            Value::Null => definition.default.clone().unwrap_or(Value::Null),
            value => value,
        };
        Self {
            value: widget.kind().coerce(value),
            constraints: Constraints::from_definition(&definition),
            widget,
            context,
            definition,
            path,
            errors,
            focusable,
            focused: false,
        }
    }

    pub fn widget(&self) -> &W {
        &self.widget
    }

    /// Current validity. Disabled fields are never invalid.
    pub fn validity(&self) -> Validity {
        if !self.definition.is_enabled() {
            return Validity::default();
        }
        self.widget.kind().check(&self.constraints, &self.value)
    }

    fn is_named(&self) -> bool {
        self.definition.name().is_some_and(|name| !name.is_empty())
    }

    /// Errors of the current value. A custom error stays until the value
    /// changes; a failed check takes precedence over it.
    fn current_errors(&self) -> ErrorMap {
        let validity = self.validity();
        if let Some(key) = validity.failure() {
            let message = validation_message(&self.context, key, &self.constraints);
            return ErrorMap::single(
                FieldPath::root(),
                FieldError::native(message, validity.to_value()),
            );
        }
        match self.errors.get(&FieldPath::root()) {
            Some(error) if error.custom && self.definition.is_enabled() => {
                ErrorMap::single(FieldPath::root(), error.clone())
            }
            _ => ErrorMap::new(),
        }
    }

    fn report(&mut self, errors: ErrorMap, listener: &mut dyn FieldListener) {
        self.errors = errors;
        listener.invalid(InvalidEvent {
            scope: self.path.clone(),
            errors: self.errors.clone(),
        });
    }

    fn input(&mut self, value: &Value, change: ChangeKind, listener: &mut dyn FieldListener) {
        self.value = self.widget.kind().coerce(value.clone());
        listener.changed(ChangeEvent::at(change, self.path.clone(), self.value.clone()));
        if !self.errors.is_empty() {
            // The value changed, so a custom error no longer applies.
            self.errors.clear();
            let errors = self.current_errors();
            self.report(errors, listener);
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

    fn click(&mut self, listener: &mut dyn FieldListener) {
        self.value = self
            .definition
            .default
            .clone()
            .unwrap_or(Value::Bool(true));
        tracing::debug!(path = %self.path, "button pressed");
        listener.changed(ChangeEvent::at(
            ChangeKind::Change,
            self.path.clone(),
            self.value.clone(),
        ));
    }
}

impl<W: Widget + Clone> LeafField<W> {
    /// Registry entry creating this leaf with a copy of `widget`.
    pub fn component(widget: W) -> Component {
        let focusable = widget.kind().is_focusable();
        Component::new(move |init| Box::new(LeafField::new(init, widget.clone()))).focusable(focusable)
    }
}

impl<W: Widget> Field for LeafField<W> {
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
        self.value = self.widget.kind().coerce(value);
    }

    fn set_errors(&mut self, errors: ErrorMap) {
        self.errors = errors;
    }

    fn interact(&mut self, action: &Action, listener: &mut dyn FieldListener) -> EventResult {
        if action.target != self.path || !self.definition.is_enabled() {
            return EventResult::Ignored;
        }
        let kind = self.widget.kind();
        match &action.kind {
            ActionKind::Input { value, change } if kind.accepts_input() && self.is_named() => {
                self.input(value, *change, listener);
                EventResult::Handled
            }
            ActionKind::Click if kind == InputKind::Button => {
                self.click(listener);
                EventResult::Handled
            }
            _ => EventResult::Ignored,
        }
    }

    fn validate(&mut self, report: bool, listener: &mut dyn FieldListener) -> bool {
        let errors = self.current_errors();
        let valid = errors.is_empty();
        if report {
            self.report(errors, listener);
        }
        valid
    }

    fn focus_field(&mut self, path: &FieldPath, listener: &mut dyn FieldListener) -> bool {
        let focused = self.focusable && self.is_named() && path == &self.path;
        self.set_focused(focused, listener)
    }

    fn autofocus(&mut self, listener: &mut dyn FieldListener) -> bool {
        let focused = self.focusable && self.definition.focus && self.definition.is_enabled();
        self.set_focused(focused, listener)
    }

    fn focus_first(&mut self, listener: &mut dyn FieldListener) -> bool {
        let focused = self.focusable && self.definition.is_enabled() && !self.definition.hidden;
        self.set_focused(focused, listener)
    }

    fn blur(&mut self, listener: &mut dyn FieldListener) {
        self.set_focused(false, listener);
    }

    fn render(&self) -> RenderNode {
        let definition = &self.definition;
        let mut node = RenderNode::new(definition, &self.path, self.value.clone())
            .with_attribute("element", Value::from(self.widget.element()));
        node.library = self.context.library.clone();
        node.error = self.errors.get(&FieldPath::root()).cloned();
        node.focused = self.focused;

        let attributes = &mut node.attributes;
        if let Some(placeholder) = &definition.placeholder {
            attributes.insert("placeholder".into(), Value::from(placeholder.as_str()));
        }
        if let Some(autofill) = &definition.autofill {
            attributes.insert("autocomplete".into(), Value::from(autofill.as_str()));
        }
        if definition.required {
            attributes.insert("required".into(), Value::Bool(true));
        }
        if let Some(maxlength) = definition.maxlength {
            attributes.insert("maxlength".into(), Value::from(maxlength));
        }
        if let Some(min) = definition.min {
            attributes.insert("min".into(), Value::from(min));
        }
        if let Some(max) = definition.max {
            attributes.insert("max".into(), Value::from(max));
        }
        if let Some(pattern) = &definition.pattern {
            attributes.insert("pattern".into(), Value::from(pattern.as_str()));
        }
        if !definition.options.is_empty() {
            attributes.insert("options".into(), option_entries(&definition.options));
        }
        if definition.other {
            attributes.insert("other".into(), Value::Bool(true));
        }
        if let Some(control_label) = &definition.control_label {
            attributes.insert("controlLabel".into(), Value::from(control_label.as_str()));
        }
        if self.widget.kind() == InputKind::Boolean && definition.indeterminate {
            attributes.insert(
                "indeterminate".into(),
                Value::Bool(self.value.is_null()),
            );
        }
        self.widget.decorate(&self.context, definition, &mut node);
        node
    }
}
