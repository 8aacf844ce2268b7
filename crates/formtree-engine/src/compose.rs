//! Field composition: resolving renderers for definition nodes and wiring
//! each child so its notifications are merged into the parent before they
//! travel further up.

use std::sync::Arc;

use formtree_config::{DEFAULT_LAYOUT, FormtreeConfig};
use formtree_ir::errors::{add_field_errors, add_nested_errors};
use formtree_ir::value::owned_keys;
use formtree_ir::{
    Action, Breakpoints, ChangeEvent, ErrorMap, FieldDefinition, FieldKind, FieldPath,
    InvalidEvent, LayoutChangedEvent, Segment,
};
use serde_json::{Map, Value};

use crate::error::ComposeError;
use crate::field::{EventResult, Field, FieldListener, RenderNode};
use crate::registry::Registry;

/// Everything a renderer needs besides its own slice of the form.
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub registry: Arc<Registry>,
    /// Library override; `None` defers to the registry's default.
    pub library: Option<String>,
    pub settings: Arc<Map<String, Value>>,
    pub locale: String,
    /// Thresholds for sizes a composite's layout leaves unset.
    pub breakpoints: Breakpoints,
    pub default_grid: String,
}

impl RenderContext {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            library: None,
            settings: Arc::new(Map::new()),
            locale: "en".to_string(),
            breakpoints: Breakpoints::DEFAULT,
            default_grid: DEFAULT_LAYOUT.to_string(),
        }
    }

    pub fn with_library(mut self, library: Option<String>) -> Self {
        self.library = library;
        self
    }

    pub fn with_settings(mut self, settings: Map<String, Value>) -> Self {
        self.settings = Arc::new(settings);
        self
    }

    /// Apply layout and locale settings from the configuration.
    pub fn configured(mut self, config: &FormtreeConfig) -> Self {
        self.breakpoints = config.layout.breakpoints;
        self.default_grid = config.layout.default_grid.clone();
        self.locale = config.locale.language.clone();
        self
    }

    /// Effective library: the override, else the registry default.
    pub fn library(&self) -> Option<&str> {
        self.library
            .as_deref()
            .or_else(|| self.registry.default_library())
    }

    pub fn translate(&self, key: &str) -> Option<&str> {
        self.registry.translate(&self.locale, key)
    }
}

/// Arguments handed to a renderer factory.
#[derive(Debug, Clone)]
pub struct FieldInit {
    pub context: RenderContext,
    pub definition: FieldDefinition,
    pub path: FieldPath,
    pub value: Value,
    pub errors: ErrorMap,
    pub focusable: bool,
}

/// Instantiate the renderer for `definition` in the effective library.
pub fn create_field(
    context: &RenderContext,
    definition: &FieldDefinition,
    path: FieldPath,
    value: Value,
    errors: ErrorMap,
) -> Result<Box<dyn Field>, ComposeError> {
    let library = context
        .library()
        .ok_or(ComposeError::NoLibrary)?
        .to_string();
    let component = context
        .registry
        .library(&library)
        .ok_or_else(|| ComposeError::UnknownLibrary(library.clone()))?
        .component(&definition.type_tag)
        .ok_or_else(|| ComposeError::UnknownType {
            library: library.clone(),
            type_tag: definition.type_tag.clone(),
            path: path.clone(),
        })?;
    tracing::trace!(%path, library = %library, type_tag = %definition.type_tag, "creating field");

    let init = FieldInit {
        context: context.clone().with_library(Some(library)),
        definition: definition.clone(),
        path,
        value,
        errors,
        focusable: component.focusable,
    };
    Ok((component.factory)(init))
}

/// How a child's value and errors sit inside its parent's.
#[derive(Debug, Clone, PartialEq)]
pub enum Relation {
    /// Named member or row of the parent value.
    Member(Segment),
    /// Anonymous composite whose children own these keys of the parent value.
    Flatten(Vec<String>),
    /// The child owns the parent's entire value.
    Whole,
    /// No value of its own, e.g. sections and buttons.
    Detached,
}

impl Relation {
    pub fn of(definition: &FieldDefinition) -> Self {
        if let Some(name) = definition.name() {
            Relation::Member(Segment::key(name))
        } else if definition.is_anonymous() {
            Relation::Flatten(owned_keys(definition))
        } else {
            Relation::Detached
        }
    }

    pub fn child_path(&self, parent: &FieldPath) -> FieldPath {
        match self {
            Relation::Member(segment) => parent.with(segment.clone()),
            Relation::Flatten(_) | Relation::Whole | Relation::Detached => parent.clone(),
        }
    }

    /// Slice of `value` the child owns.
    pub fn value_in(&self, value: &Value) -> Value {
        match self {
            Relation::Member(Segment::Key(key)) => value.get(key).cloned().unwrap_or(Value::Null),
            Relation::Member(Segment::Index(index)) => {
                value.get(*index).cloned().unwrap_or(Value::Null)
            }
            Relation::Flatten(keys) => {
                let mut slice = Map::new();
                for key in keys {
                    if let Some(member) = value.get(key) {
                        slice.insert(key.clone(), member.clone());
                    }
                }
                Value::Object(slice)
            }
            Relation::Whole => value.clone(),
            Relation::Detached => Value::Null,
        }
    }

    /// Errors of `errors` the child may see, keyed relative to the child.
    pub fn errors_in(&self, errors: &ErrorMap) -> ErrorMap {
        let mut view = ErrorMap::new();
        match self {
            Relation::Member(segment) => add_field_errors(errors, &mut view, segment),
            Relation::Flatten(keys) => add_nested_errors(errors, &mut view, keys),
            Relation::Whole => view = errors.clone(),
            Relation::Detached => {}
        }
        view
    }

    /// Write the child's whole value back into `target`.
    pub fn merge_value(&self, target: &mut Value, child: Value) {
        match self {
            Relation::Member(Segment::Key(key)) => {
                if !target.is_object() {
                    *target = Value::Object(Map::new());
                }
                if let Value::Object(map) = target {
                    map.insert(key.clone(), child);
                }
            }
            Relation::Member(Segment::Index(index)) => {
                if !target.is_array() {
                    *target = Value::Array(Vec::new());
                }
                if let Value::Array(rows) = target {
                    if *index >= rows.len() {
                        rows.resize(*index + 1, Value::Object(Map::new()));
                    }
                    rows[*index] = child;
                }
            }
            Relation::Flatten(keys) => {
                if !target.is_object() {
                    *target = Value::Object(Map::new());
                }
                if let (Value::Object(map), Value::Object(members)) = (target, child) {
                    for (key, member) in members {
                        if keys.contains(&key) {
                            map.insert(key, member);
                        }
                    }
                }
            }
            Relation::Whole => *target = child,
            Relation::Detached => {}
        }
    }

    /// Replace the errors `target` holds for the child with `child`.
    pub fn merge_errors(&self, target: &mut ErrorMap, child: &ErrorMap) {
        match self {
            Relation::Member(segment) => {
                let prefix = FieldPath::from(segment.clone());
                target.clear_under(&prefix);
                target.merge(child.prefixed(&prefix));
            }
            Relation::Flatten(keys) => {
                for key in keys {
                    target.clear_under(&FieldPath::key(key.clone()));
                }
                target.merge(child.clone());
            }
            Relation::Whole => *target = child.clone(),
            Relation::Detached => {}
        }
    }
}

/// State a composite exposes to the listeners of its children.
pub trait ScopeState {
    fn path(&self) -> &FieldPath;
    fn value(&self) -> &Value;
    fn errors(&self) -> &ErrorMap;

    fn child_value(&self, relation: &Relation) -> Value {
        relation.value_in(self.value())
    }

    fn child_errors(&self, relation: &Relation) -> ErrorMap {
        relation.errors_in(self.errors())
    }

    fn child_path(&self, relation: &Relation) -> FieldPath {
        relation.child_path(self.path())
    }

    /// Take the whole value of the child at `relation`.
    fn merge_value(&mut self, relation: &Relation, value: Value);

    /// Take the complete error set of the child at `relation`.
    fn merge_errors(&mut self, relation: &Relation, errors: &ErrorMap);
}

/// Definition, path, value and errors of an object-valued composite.
#[derive(Debug, Clone)]
pub struct CompositeState {
    pub definition: FieldDefinition,
    pub path: FieldPath,
    pub value: Value,
    pub errors: ErrorMap,
}

impl ScopeState for CompositeState {
    fn path(&self) -> &FieldPath {
        &self.path
    }

    fn value(&self) -> &Value {
        &self.value
    }

    fn errors(&self) -> &ErrorMap {
        &self.errors
    }

    fn merge_value(&mut self, relation: &Relation, value: Value) {
        relation.merge_value(&mut self.value, value);
    }

    fn merge_errors(&mut self, relation: &Relation, errors: &ErrorMap) {
        relation.merge_errors(&mut self.errors, errors);
    }
}

/// Listener handed to one child: merges into the parent's state, then
/// re-emits the notification scoped to the parent.
pub struct Scope<'a, S: ScopeState + ?Sized> {
    state: &'a mut S,
    relation: &'a Relation,
    position: usize,
    upstream: &'a mut dyn FieldListener,
}

impl<'a, S: ScopeState + ?Sized> Scope<'a, S> {
    pub fn new(
        state: &'a mut S,
        relation: &'a Relation,
        position: usize,
        upstream: &'a mut dyn FieldListener,
    ) -> Self {
        Self {
            state,
            relation,
            position,
            upstream,
        }
    }
}

impl<S: ScopeState + ?Sized> FieldListener for Scope<'_, S> {
    fn changed(&mut self, event: ChangeEvent) {
        tracing::trace!(origin = %event.origin, scope = %self.state.path(), "merging change");
        self.state.merge_value(self.relation, event.value.clone());
        self.upstream.changed(ChangeEvent {
            kind: event.kind,
            origin: event.origin,
            scope: self.state.path().clone(),
            value: self.state.value().clone(),
        });
    }

    fn invalid(&mut self, event: InvalidEvent) {
        tracing::trace!(scope = %self.state.path(), count = event.errors.len(), "merging errors");
        self.state.merge_errors(self.relation, &event.errors);
        self.upstream.invalid(InvalidEvent {
            scope: self.state.path().clone(),
            errors: self.state.errors().clone(),
        });
    }

    fn layout_changed(&mut self, event: LayoutChangedEvent) {
        self.upstream.layout_changed(event.nested_in(self.position));
    }

    fn focused(&mut self, path: &FieldPath) {
        self.upstream.focused(path);
    }

    fn blurred(&mut self, path: &FieldPath) {
        self.upstream.blurred(path);
    }
}

/// One rendered child of a composite.
pub struct Child {
    pub relation: Relation,
    pub field: Box<dyn Field>,
    /// Grid area name among its siblings.
    pub area: String,
}

/// Ordered children of a composite, with the routing every composite shares.
#[derive(Default)]
pub struct Children {
    entries: Vec<Child>,
}

impl Children {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a child per definition. Hidden fields only contribute their
    /// default value and get no renderer. Definitions without a renderer are
    /// logged and skipped.
    pub fn compose<S: ScopeState + ?Sized>(
        context: &RenderContext,
        fields: &[FieldDefinition],
        state: &S,
    ) -> Self {
        let mut children = Self::new();
        for definition in fields {
            if definition.kind() == FieldKind::Hidden {
                continue;
            }
            let relation = Relation::of(definition);
            let area = formtree_ir::definition::area(definition, fields);
            children.spawn(context, definition, relation, area, state);
        }
        children
    }

    /// Create and append one child, logging a registry miss.
    pub fn spawn<S: ScopeState + ?Sized>(
        &mut self,
        context: &RenderContext,
        definition: &FieldDefinition,
        relation: Relation,
        area: String,
        state: &S,
    ) -> bool {
        let path = state.child_path(&relation);
        let value = state.child_value(&relation);
        let errors = state.child_errors(&relation);
        match create_field(context, definition, path, value, errors) {
            Ok(field) => {
                self.entries.push(Child {
                    relation,
                    field,
                    area,
                });
                true
            }
            Err(err) => {
                tracing::warn!(error = %err, "skipping field without renderer");
                false
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Child> {
        self.entries.iter()
    }

    pub fn get(&self, position: usize) -> Option<&Child> {
        self.entries.get(position)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn remove(&mut self, position: usize) -> Option<Child> {
        (position < self.entries.len()).then(|| self.entries.remove(position))
    }

    /// Push the current value of `state` down to every child.
    pub fn set_values<S: ScopeState + ?Sized>(&mut self, state: &S) {
        for child in &mut self.entries {
            child.field.set_value(state.child_value(&child.relation));
        }
    }

    /// Pull every child's value into `state`. Children without a value
    /// leave the parent untouched.
    pub fn collect<S: ScopeState + ?Sized>(&self, state: &mut S) {
        for child in &self.entries {
            let value = child.field.value();
            if !value.is_null() {
                state.merge_value(&child.relation, value.clone());
            }
        }
    }

    /// Push the current errors of `state` down to every child.
    pub fn set_errors<S: ScopeState + ?Sized>(&mut self, state: &S) {
        for child in &mut self.entries {
            child.field.set_errors(state.child_errors(&child.relation));
        }
    }

    pub fn interact<S: ScopeState + ?Sized>(
        &mut self,
        state: &mut S,
        action: &Action,
        listener: &mut dyn FieldListener,
    ) -> EventResult {
        for (position, child) in self.entries.iter_mut().enumerate() {
            if !action.target.starts_with(child.field.path()) {
                continue;
            }
            let mut scope = Scope::new(&mut *state, &child.relation, position, &mut *listener);
            if child.field.interact(action, &mut scope).is_handled() {
                return EventResult::Handled;
            }
        }
        EventResult::Ignored
    }

    /// Logical AND of every child's validity. All children are visited so
    /// each one can report.
    pub fn validate<S: ScopeState + ?Sized>(
        &mut self,
        state: &mut S,
        report: bool,
        listener: &mut dyn FieldListener,
    ) -> bool {
        let mut valid = true;
        for (position, child) in self.entries.iter_mut().enumerate() {
            let mut scope = Scope::new(&mut *state, &child.relation, position, &mut *listener);
            valid &= child.field.validate(report, &mut scope);
        }
        valid
    }

    pub fn measure<S: ScopeState + ?Sized>(
        &mut self,
        state: &mut S,
        id: &[usize],
        width: f64,
        listener: &mut dyn FieldListener,
    ) -> EventResult {
        let Some((&position, rest)) = id.split_first() else {
            return EventResult::Ignored;
        };
        let Some(child) = self.entries.get_mut(position) else {
            return EventResult::Ignored;
        };
        let mut scope = Scope::new(state, &child.relation, position, listener);
        child.field.measure(rest, width, &mut scope)
    }

    pub fn resize<S: ScopeState + ?Sized>(
        &mut self,
        state: &mut S,
        width: f64,
        listener: &mut dyn FieldListener,
    ) {
        for (position, child) in self.entries.iter_mut().enumerate() {
            let mut scope = Scope::new(&mut *state, &child.relation, position, &mut *listener);
            child.field.resize(width, &mut scope);
        }
    }

    pub fn focus_field(&mut self, path: &FieldPath, listener: &mut dyn FieldListener) -> bool {
        self.entries
            .iter_mut()
            .filter(|child| path.starts_with(child.field.path()))
            .any(|child| child.field.focus_field(path, &mut *listener))
    }

    pub fn autofocus(&mut self, listener: &mut dyn FieldListener) -> bool {
        self.entries
            .iter_mut()
            .any(|child| child.field.autofocus(&mut *listener))
    }

    pub fn focus_first(&mut self, listener: &mut dyn FieldListener) -> bool {
        self.entries
            .iter_mut()
            .any(|child| child.field.focus_first(&mut *listener))
    }

    pub fn blur(&mut self, listener: &mut dyn FieldListener) {
        for child in &mut self.entries {
            child.field.blur(&mut *listener);
        }
    }

    pub fn render(&self) -> Vec<RenderNode> {
        self.entries.iter().map(|child| child.field.render()).collect()
    }
}
