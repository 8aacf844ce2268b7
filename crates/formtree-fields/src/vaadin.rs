//! Renderers mapping onto Vaadin web components.

use formtree_engine::fields::{FormField, SelectableSectionField};
use formtree_engine::{Component, Registry, RenderContext, RenderNode, register_composites};
use formtree_ir::FieldDefinition;
use serde_json::Value;

use crate::leaf::{LeafField, Widget};
use crate::validity::InputKind;

pub const LIBRARY: &str = "vaadin";

#[derive(Debug, Clone, Copy)]
pub struct VaadinWidget {
    kind: InputKind,
    element: &'static str,
}

impl Widget for VaadinWidget {
    fn kind(&self) -> InputKind {
        self.kind
    }

    fn element(&self) -> &'static str {
        self.element
    }

    fn decorate(&self, _context: &RenderContext, definition: &FieldDefinition, node: &mut RenderNode) {
        let error = node.error.as_ref().map(|error| error.message.clone());
        let attributes = &mut node.attributes;
        attributes.insert("invalid".into(), Value::Bool(error.is_some()));
        if let Some(message) = error {
            attributes.insert("errorMessage".into(), Value::from(message));
        }
        if matches!(self.kind, InputKind::Text | InputKind::Email | InputKind::Url) {
            attributes.insert("clearButtonVisible".into(), Value::Bool(true));
        }
        if self.kind == InputKind::Button {
            let theme = definition
                .extra
                .get("theme")
                .cloned()
                .unwrap_or_else(|| Value::from("primary"));
            attributes.insert("theme".into(), theme);
        }
    }
}

const fn widget(kind: InputKind, element: &'static str) -> VaadinWidget {
    VaadinWidget { kind, element }
}

pub const WIDGETS: [(&str, VaadinWidget); 11] = [
    ("boolean", widget(InputKind::Boolean, "vaadin-checkbox")),
    ("checkboxes", widget(InputKind::MultiChoice, "vaadin-checkbox-group")),
    ("button", widget(InputKind::Button, "vaadin-button")),
    ("time", widget(InputKind::Time, "vaadin-time-picker")),
    ("dateTime", widget(InputKind::DateTime, "vaadin-date-time-picker")),
    ("email", widget(InputKind::Email, "vaadin-email-field")),
    ("url", widget(InputKind::Url, "vaadin-text-field")),
    ("password", widget(InputKind::Text, "vaadin-password-field")),
    ("string", widget(InputKind::Text, "vaadin-text-field")),
    ("text", widget(InputKind::Text, "vaadin-text-area")),
    ("list", widget(InputKind::Choice, "vaadin-combo-box")),
];

/// Register the composites, the Vaadin leaves and the Vaadin flavored
/// `styledForm` and `selectableSection`.
pub fn install(registry: &mut Registry) {
    register_composites(registry, LIBRARY);
    for (type_tag, widget) in WIDGETS {
        registry.register_component(
            LIBRARY,
            type_tag,
            LeafField::component(widget).with_module(LIBRARY),
        );
    }
    registry.register_component(
        LIBRARY,
        "styledForm",
        Component::new(|init| Box::new(FormField::new(init)))
            .with_import_path("@vaadin/vaadin-form-layout")
            .with_module(LIBRARY)
            .focusable(false),
    );
    registry.register_component(
        LIBRARY,
        "selectableSection",
        Component::new(|init| Box::new(SelectableSectionField::new(init)))
            .with_import_path("@vaadin/vaadin-radio-button")
            .with_module(LIBRARY)
            .focusable(false),
    );
    tracing::debug!(library = LIBRARY, components = WIDGETS.len(), "library installed");
}
