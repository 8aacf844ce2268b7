use formtree_ir::{
    Action, ActionKind, ChangeEvent, ChangeKind, ErrorMap, FieldDefinition, FieldKind, FieldPath,
    InvalidEvent, Segment,
};
use serde_json::{Map, Value};

use crate::compose::{Children, CompositeState, FieldInit, Relation, RenderContext};
use crate::field::{EventResult, Field, FieldListener, RenderNode};

/// Ordered list of rows sharing one nested form definition.
///
/// Rows live at `name[i]`. At least `min` rows exist; `add_item` and
/// `remove_item` actions respect `min` and `max`.
pub struct RepeatingSectionField {
    context: RenderContext,
    state: CompositeState,
    row: FieldDefinition,
    min: usize,
    max: Option<usize>,
    children: Children,
}

impl RepeatingSectionField {
    pub fn new(init: FieldInit) -> Self {
        let FieldInit {
            context,
            definition,
            path,
            value,
            errors,
            ..
        } = init;
        let (min, max, row) = match definition.kind() {
            FieldKind::Repeating { min, max, form } => (min, max, row_definition(form)),
            _ => (0, None, row_definition(None)),
        };
        let mut field = Self {
            context,
            state: CompositeState {
                definition,
                path,
                value: Value::Null,
                errors,
            },
            row,
            min,
            max,
            children: Children::new(),
        };
        field.state.value = field.seeded(value);
        field.rebuild();
        field
    }

    pub fn len(&self) -> usize {
        rows(&self.state.value).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn can_add(&self) -> bool {
        self.max.is_none_or(|max| self.len() < max)
    }

    fn can_remove(&self) -> bool {
        self.len() > self.min
    }

    /// Rows of `value`, topped up with empty objects to `min`.
    fn seeded(&self, value: Value) -> Value {
        let mut rows = match value {
            Value::Array(rows) => rows,
            _ => Vec::new(),
        };
        while rows.len() < self.min {
            rows.push(Value::Object(Map::new()));
        }
        Value::Array(rows)
    }

    fn rebuild(&mut self) {
        self.children.clear();
        for index in 0..self.len() {
            self.children.spawn(
                &self.context,
                &self.row,
                Relation::Member(Segment::Index(index)),
                index.to_string(),
                &self.state,
            );
        }
        self.children.collect(&mut self.state);
    }

    fn add_row(&mut self, listener: &mut dyn FieldListener) {
        if !self.can_add() {
            tracing::debug!(path = %self.state.path, "row limit reached");
            return;
        }
        let index = self.len();
        if let Value::Array(rows) = &mut self.state.value {
            rows.push(Value::Object(Map::new()));
        }
        self.children.spawn(
            &self.context,
            &self.row,
            Relation::Member(Segment::Index(index)),
            index.to_string(),
            &self.state,
        );
        self.children.collect(&mut self.state);
        self.notify_changed(listener);
    }

    fn remove_row(&mut self, index: usize, listener: &mut dyn FieldListener) {
        if !self.can_remove() || index >= self.len() {
            tracing::debug!(path = %self.state.path, index, "row not removable");
            return;
        }
        if let Value::Array(rows) = &mut self.state.value {
            rows.remove(index);
        }
        let had_errors = !self.state.errors.is_empty();
        self.state.errors = shift_rows(&self.state.errors, index);
        self.rebuild();
        self.notify_changed(listener);
        if had_errors {
            listener.invalid(InvalidEvent {
                scope: self.state.path.clone(),
                errors: self.state.errors.clone(),
            });
        }
    }

    fn notify_changed(&self, listener: &mut dyn FieldListener) {
        listener.changed(ChangeEvent::at(
            ChangeKind::InputChange,
            self.state.path.clone(),
            self.state.value.clone(),
        ));
    }
}

/// Definition every row is rendered with.
fn row_definition(form: Option<&FieldDefinition>) -> FieldDefinition {
    let mut row = form.cloned().unwrap_or_default();
    if row.type_tag.is_empty() {
        row.type_tag = "form".to_string();
    }
    row.name = None;
    row
}

fn rows(value: &Value) -> &[Value] {
    value.as_array().map(Vec::as_slice).unwrap_or(&[])
}

/// Errors after removing row `removed`: its entries are dropped and later
/// rows move up by one.
fn shift_rows(errors: &ErrorMap, removed: usize) -> ErrorMap {
    errors
        .iter()
        .filter_map(|(path, error)| match path.first() {
            Some(Segment::Index(index)) if *index == removed => None,
            Some(Segment::Index(index)) if *index > removed => {
                let shifted = FieldPath::from(Segment::Index(index - 1)).join(&path.tail());
                Some((shifted, error.clone()))
            }
            _ => Some((path.clone(), error.clone())),
        })
        .collect()
}

impl Field for RepeatingSectionField {
    fn definition(&self) -> &FieldDefinition {
        &self.state.definition
    }

    fn path(&self) -> &FieldPath {
        &self.state.path
    }

    fn value(&self) -> &Value {
        &self.state.value
    }

    fn errors(&self) -> &ErrorMap {
        &self.state.errors
    }

    fn set_value(&mut self, value: Value) {
        let previous = self.len();
        self.state.value = self.seeded(value);
        if previous == self.len() {
            self.children.set_values(&self.state);
            self.children.collect(&mut self.state);
        } else {
            self.rebuild();
        }
    }

    fn set_errors(&mut self, errors: ErrorMap) {
        self.state.errors = errors;
        self.children.set_errors(&self.state);
    }

    fn interact(&mut self, action: &Action, listener: &mut dyn FieldListener) -> EventResult {
        if action.target != self.state.path {
            return self.children.interact(&mut self.state, action, listener);
        }
        match &action.kind {
            ActionKind::AddItem => self.add_row(listener),
            ActionKind::RemoveItem { index } => self.remove_row(*index, listener),
            _ => return EventResult::Ignored,
        }
        EventResult::Handled
    }

    fn validate(&mut self, report: bool, listener: &mut dyn FieldListener) -> bool {
        self.children.validate(&mut self.state, report, listener)
    }

    fn focus_field(&mut self, path: &FieldPath, listener: &mut dyn FieldListener) -> bool {
        self.children.focus_field(path, listener)
    }

    fn autofocus(&mut self, listener: &mut dyn FieldListener) -> bool {
        self.children.autofocus(listener)
    }

    fn focus_first(&mut self, listener: &mut dyn FieldListener) -> bool {
        self.children.focus_first(listener)
    }

    fn blur(&mut self, listener: &mut dyn FieldListener) {
        self.children.blur(listener);
    }

    fn measure(
        &mut self,
        id: &[usize],
        width: f64,
        listener: &mut dyn FieldListener,
    ) -> EventResult {
        self.children.measure(&mut self.state, id, width, listener)
    }

    fn resize(&mut self, width: f64, listener: &mut dyn FieldListener) {
        self.children.resize(&mut self.state, width, listener);
    }

    fn render(&self) -> RenderNode {
        let mut node = RenderNode::new(
            &self.state.definition,
            &self.state.path,
            self.state.value.clone(),
        )
        .with_attribute("canAdd", Value::Bool(self.can_add()))
        .with_attribute("canRemove", Value::Bool(self.can_remove()));
        node.library = self.context.library.clone();
        node.error = self.state.errors.get(&FieldPath::root()).cloned();
        for child in self.children.iter() {
            let mut rendered = child.field.render();
            rendered.area = Some(child.area.clone());
            node.children.push(rendered);
        }
        node
    }
}
