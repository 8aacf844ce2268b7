use formtree_ir::value::{apply_hidden_fields, as_object, prune};
use formtree_ir::{Action, ErrorMap, FieldDefinition, FieldPath, LayoutChangedEvent};
use serde_json::Value;

use crate::compose::{Children, CompositeState, FieldInit, RenderContext};
use crate::field::{EventResult, Field, FieldListener, RenderNode};
use crate::layout::ResponsiveState;

/// Object-valued composite: `form`, `object`, `nestedForm`, `toolbar`.
///
/// Named instances own one member of their parent's value; anonymous ones
/// share the parent's object and contribute their children's keys to it.
pub struct FormField {
    context: RenderContext,
    state: CompositeState,
    layout: ResponsiveState,
    children: Children,
}

impl FormField {
    pub fn new(init: FieldInit) -> Self {
        let FieldInit {
            context,
            definition,
            path,
            value,
            errors,
            ..
        } = init;
        let value = normalize(&definition, &value);
        let layout = ResponsiveState::new(
            definition.responsive_layout(),
            &context.breakpoints,
            &context.default_grid,
        );
        let mut state = CompositeState {
            definition,
            path,
            value,
            errors,
        };
        let children = Children::compose(&context, state.definition.child_fields(), &state);
        children.collect(&mut state);
        Self {
            context,
            state,
            layout,
            children,
        }
    }

    pub fn layout(&self) -> &ResponsiveState {
        &self.layout
    }
}

/// Drop members no field declares any more, then apply hidden defaults.
fn normalize(definition: &FieldDefinition, value: &Value) -> Value {
    let fields = definition.child_fields();
    let mut object = prune(fields, &as_object(value));
    apply_hidden_fields(fields, &mut object);
    Value::Object(object)
}

impl Field for FormField {
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
        self.state.value = normalize(&self.state.definition, &value);
        self.children.set_values(&self.state);
        self.children.collect(&mut self.state);
    }

    fn set_errors(&mut self, errors: ErrorMap) {
        self.state.errors = errors;
        self.children.set_errors(&self.state);
    }

    fn interact(&mut self, action: &Action, listener: &mut dyn FieldListener) -> EventResult {
        self.children.interact(&mut self.state, action, listener)
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
        if !id.is_empty() {
            return self.children.measure(&mut self.state, id, width, listener);
        }
        if let Some(breakpoint) = self.layout.measure(width) {
            listener.layout_changed(LayoutChangedEvent {
                id: Vec::new(),
                breakpoint,
            });
        }
        EventResult::Handled
    }

    fn resize(&mut self, width: f64, listener: &mut dyn FieldListener) {
        self.measure(&[], width, listener);
        self.children.resize(&mut self.state, width, listener);
    }

    fn render(&self) -> RenderNode {
        let registry = &self.context.registry;
        let fields = self.state.definition.child_fields();
        let mut node = RenderNode::new(
            &self.state.definition,
            &self.state.path,
            self.state.value.clone(),
        );
        node.library = self.context.library.clone();
        node.error = self.state.errors.get(&FieldPath::root()).cloned();
        node.breakpoint = Some(self.layout.current());
        node.style = Some(self.layout.container_style(registry, fields));
        if let Some(section) = self.layout.section_style() {
            node = node.with_attribute("sectionStyle", Value::String(section.to_string()));
        }
        for child in self.children.iter() {
            let mut rendered = child.field.render();
            rendered.area = Some(child.area.clone());
            rendered.field_style = self
                .layout
                .field_style(registry, child.field.definition(), &child.area);
            node.children.push(rendered);
        }
        node
    }
}
