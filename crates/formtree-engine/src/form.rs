//! Root of a rendered form and its boundary towards the host.

use std::sync::Arc;

use formtree_ir::{
    Action, Breakpoint, ChangeEvent, ChangeKind, ErrorMap, FieldDefinition, FieldPath,
    FormDocument, InvalidEvent, LayoutChangedEvent, Segment,
};
use serde::Serialize;
use serde_json::{Map, Value};

use formtree_ir::value::owned_keys;

use crate::compose::{Relation, RenderContext, Scope, ScopeState, create_field};
use crate::field::{EventResult, Field, FieldListener, RenderNode};
use crate::registry::Registry;

/// Notification for the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FormEvent {
    /// A field changed; `value` is the whole form value.
    Changed {
        kind: ChangeKind,
        path: FieldPath,
        value: Value,
    },
    /// Validation failed; `errors` is keyed by absolute path.
    Invalid { errors: ErrorMap },
    /// A composite switched breakpoint. `id` addresses it for [`Form::measure`].
    LayoutChanged { id: Vec<usize>, breakpoint: Breakpoint },
    Submitted { value: Value },
    Focused { path: FieldPath },
    Blurred { path: FieldPath },
}

/// Declarative input of a form.
#[derive(Debug, Clone, Default)]
pub struct FormOptions {
    pub definition: FieldDefinition,
    pub value: Value,
    pub library: Option<String>,
    pub settings: Map<String, Value>,
}

impl FormOptions {
    pub fn new(definition: FieldDefinition) -> Self {
        Self {
            definition,
            ..Self::default()
        }
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.value = value;
        self
    }

    pub fn with_library(mut self, library: impl Into<String>) -> Self {
        self.library = Some(library.into());
        self
    }

    pub fn with_settings(mut self, settings: Map<String, Value>) -> Self {
        self.settings = settings;
        self
    }
}

impl From<&FormDocument> for FormOptions {
    fn from(document: &FormDocument) -> Self {
        let mut settings = document.settings.clone();
        if let Some(theme) = &document.theme {
            settings.insert("theme".to_string(), Value::String(theme.clone()));
        }
        Self {
            definition: document.definition.clone(),
            value: document.value.clone(),
            library: None,
            settings,
        }
    }
}

struct RootState {
    path: FieldPath,
    value: Value,
    errors: ErrorMap,
}

impl ScopeState for RootState {
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

/// Turns notifications reaching the root into [`FormEvent`]s.
struct EventSink<'a> {
    events: &'a mut Vec<FormEvent>,
    report_invalid: bool,
}

impl FieldListener for EventSink<'_> {
    fn changed(&mut self, event: ChangeEvent) {
        self.events.push(FormEvent::Changed {
            kind: event.kind,
            path: event.origin,
            value: event.value,
        });
    }

    fn invalid(&mut self, event: InvalidEvent) {
        if self.report_invalid && !event.errors.is_empty() {
            self.events.push(FormEvent::Invalid {
                errors: event.errors,
            });
        }
    }

    fn layout_changed(&mut self, event: LayoutChangedEvent) {
        self.events.push(FormEvent::LayoutChanged {
            id: event.id,
            breakpoint: event.breakpoint,
        });
    }

    fn focused(&mut self, path: &FieldPath) {
        self.events.push(FormEvent::Focused { path: path.clone() });
    }

    fn blurred(&mut self, path: &FieldPath) {
        self.events.push(FormEvent::Blurred { path: path.clone() });
    }
}

/// A rendered form: the root field, the whole value and the whole error map.
///
/// A named root definition keeps its value under its name; otherwise the
/// root field owns the entire value.
pub struct Form {
    context: RenderContext,
    definition: FieldDefinition,
    initial: Value,
    relation: Relation,
    state: RootState,
    root: Option<Box<dyn Field>>,
    events: Vec<FormEvent>,
}

impl Form {
    pub fn new(registry: Arc<Registry>, options: FormOptions) -> Self {
        let context = RenderContext::new(registry)
            .with_library(options.library)
            .with_settings(options.settings);
        Self::with_context(context, options.definition, options.value)
    }

    pub fn from_document(registry: Arc<Registry>, document: &FormDocument) -> Self {
        Self::new(registry, FormOptions::from(document))
    }

    /// Build with a prepared context, e.g. one carrying configuration.
    pub fn with_context(context: RenderContext, definition: FieldDefinition, value: Value) -> Self {
        let library = context.library().map(str::to_string);
        let context = context.with_library(library);
        let mut form = Self {
            context,
            relation: root_relation(&definition),
            definition,
            initial: value.clone(),
            state: RootState {
                path: FieldPath::root(),
                value,
                errors: ErrorMap::new(),
            },
            root: None,
            events: Vec::new(),
        };
        form.rebuild();
        form
    }

    fn rebuild(&mut self) {
        let path = self.state.child_path(&self.relation);
        let value = self.state.child_value(&self.relation);
        let errors = self.state.child_errors(&self.relation);
        self.root = match create_field(&self.context, &self.definition, path, value, errors) {
            Ok(root) => Some(root),
            Err(err) => {
                tracing::warn!(error = %err, "form has no root renderer");
                None
            }
        };
        self.pull_value();
    }

    /// Adopt the root field's normalized value.
    fn pull_value(&mut self) {
        if let Some(root) = &self.root {
            let value = root.value();
            if !value.is_null() {
                self.state.merge_value(&self.relation, value.clone());
            }
        }
    }

    pub fn definition(&self) -> &FieldDefinition {
        &self.definition
    }

    pub fn context(&self) -> &RenderContext {
        &self.context
    }

    /// Library the form renders with.
    pub fn library(&self) -> Option<&str> {
        self.context.library.as_deref()
    }

    pub fn value(&self) -> &Value {
        &self.state.value
    }

    /// Errors keyed by absolute path.
    pub fn errors(&self) -> &ErrorMap {
        &self.state.errors
    }

    /// Whether a renderer was found for the root definition.
    pub fn is_rendered(&self) -> bool {
        self.root.is_some()
    }

    pub fn take_events(&mut self) -> Vec<FormEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn interact(&mut self, action: &Action) -> EventResult {
        let Some(root) = self.root.as_mut() else {
            return EventResult::Ignored;
        };
        let mut sink = EventSink {
            events: &mut self.events,
            report_invalid: true,
        };
        let mut scope = Scope::new(&mut self.state, &self.relation, 0, &mut sink);
        root.interact(action, &mut scope)
    }

    /// Check every field. With `report` set, invalid fields show their
    /// errors and a single [`FormEvent::Invalid`] carries the merged map.
    pub fn validate(&mut self, report: bool) -> bool {
        let Some(root) = self.root.as_mut() else {
            return true;
        };
        let mut sink = EventSink {
            events: &mut self.events,
            report_invalid: false,
        };
        let mut scope = Scope::new(&mut self.state, &self.relation, 0, &mut sink);
        let valid = root.validate(report, &mut scope);
        if report && !valid {
            self.events.push(FormEvent::Invalid {
                errors: self.state.errors.clone(),
            });
        }
        valid
    }

    /// Validate with reporting and emit [`FormEvent::Submitted`] when valid.
    pub fn submit(&mut self) -> bool {
        let valid = self.validate(true);
        if valid {
            self.events.push(FormEvent::Submitted {
                value: self.state.value.clone(),
            });
        }
        valid
    }

    /// Swap the definition, keeping the value members and errors it still
    /// declares.
    pub fn set_definition(&mut self, definition: FieldDefinition) {
        let owned = owned_keys(&definition);
        let stale: Vec<FieldPath> = self
            .state
            .errors
            .paths()
            .filter(|path| path.first_key().is_some_and(|key| !owned.iter().any(|own| own == key)))
            .cloned()
            .collect();
        for path in &stale {
            self.state.errors.remove(path);
        }
        self.relation = root_relation(&definition);
        self.definition = definition;
        self.rebuild();
    }

    pub fn set_value(&mut self, value: Value) {
        self.state.value = value;
        if let Some(root) = self.root.as_mut() {
            root.set_value(self.state.child_value(&self.relation));
        }
        self.pull_value();
    }

    /// Replace all errors, e.g. with custom errors from a server.
    pub fn set_errors(&mut self, errors: ErrorMap) {
        self.state.errors = errors;
        if let Some(root) = self.root.as_mut() {
            root.set_errors(self.state.child_errors(&self.relation));
        }
    }

    pub fn clear_errors(&mut self) {
        self.set_errors(ErrorMap::new());
    }

    /// Back to the initial value without errors.
    pub fn reset(&mut self) {
        self.set_value(self.initial.clone());
        self.clear_errors();
    }

    /// Focus the field requesting initial focus, else the first focusable one.
    pub fn focus(&mut self) -> bool {
        let Some(root) = self.root.as_mut() else {
            return false;
        };
        let mut sink = EventSink {
            events: &mut self.events,
            report_invalid: true,
        };
        root.blur(&mut sink);
        root.autofocus(&mut sink) || root.focus_first(&mut sink)
    }

    pub fn focus_field(&mut self, path: &FieldPath) -> bool {
        let Some(root) = self.root.as_mut() else {
            return false;
        };
        let mut sink = EventSink {
            events: &mut self.events,
            report_invalid: true,
        };
        root.blur(&mut sink);
        root.focus_field(path, &mut sink)
    }

    pub fn blur(&mut self) {
        if let Some(root) = self.root.as_mut() {
            let mut sink = EventSink {
                events: &mut self.events,
                report_invalid: true,
            };
            root.blur(&mut sink);
        }
    }

    /// Deliver a width measurement for the composite addressed by `id`, as
    /// carried by [`FormEvent::LayoutChanged`]. `[0]` is the root field.
    pub fn measure(&mut self, id: &[usize], width: f64) -> EventResult {
        let (Some(root), Some((&0, rest))) = (self.root.as_mut(), id.split_first()) else {
            return EventResult::Ignored;
        };
        let mut sink = EventSink {
            events: &mut self.events,
            report_invalid: true,
        };
        let mut scope = Scope::new(&mut self.state, &self.relation, 0, &mut sink);
        root.measure(rest, width, &mut scope)
    }

    /// Measure every composite at `width`.
    pub fn resize(&mut self, width: f64) {
        let Some(root) = self.root.as_mut() else {
            return;
        };
        let mut sink = EventSink {
            events: &mut self.events,
            report_invalid: true,
        };
        let mut scope = Scope::new(&mut self.state, &self.relation, 0, &mut sink);
        root.resize(width, &mut scope);
    }

    pub fn render(&self) -> Option<RenderNode> {
        self.root.as_ref().map(|root| root.render())
    }
}

fn root_relation(definition: &FieldDefinition) -> Relation {
    match definition.name() {
        Some(name) => Relation::Member(Segment::key(name)),
        None => Relation::Whole,
    }
}
