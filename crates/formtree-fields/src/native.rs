//! Renderers mapping onto plain HTML form controls.

use formtree_engine::{Registry, RenderContext, RenderNode, register_composites};
use formtree_ir::FieldDefinition;
use serde_json::Value;

use crate::leaf::{LeafField, Widget};
use crate::validity::InputKind;

pub const LIBRARY: &str = "native";

pub const ICON_COLOR_FIELD: &str = "<svg viewBox=\"0 0 32 32\"><circle cx=\"16\" cy=\"16\" r=\"12\"/></svg>";

/// A native control, optionally an `input` of a specific `type`.
#[derive(Debug, Clone, Copy)]
pub struct NativeWidget {
    kind: InputKind,
    element: &'static str,
    input_type: Option<&'static str>,
}

impl NativeWidget {
    const fn input(kind: InputKind, input_type: &'static str) -> Self {
        Self {
            kind,
            element: "input",
            input_type: Some(input_type),
        }
    }

    const fn tag(kind: InputKind, element: &'static str) -> Self {
        Self {
            kind,
            element,
            input_type: None,
        }
    }
}

impl Widget for NativeWidget {
    fn kind(&self) -> InputKind {
        self.kind
    }

    fn element(&self) -> &'static str {
        self.element
    }

    fn decorate(&self, context: &RenderContext, definition: &FieldDefinition, node: &mut RenderNode) {
        if let Some(input_type) = self.input_type {
            node.attributes
                .insert("inputType".into(), Value::from(input_type));
        }
        match definition.type_tag.as_str() {
            "toggle" => {
                node.attributes.insert("role".into(), Value::from("switch"));
            }
            "color" => {
                if let Some(icon) = context.registry.icon("color") {
                    node.attributes.insert("icon".into(), Value::from(icon));
                }
            }
            "markup" | "image" | "section" => {
                for key in ["markup", "url", "alt", "title", "description"] {
                    if let Some(entry) = definition.extra.get(key) {
                        node.attributes.insert(key.into(), entry.clone());
                    }
                }
            }
            _ => {}
        }
    }
}

pub const WIDGETS: [(&str, NativeWidget); 23] = [
    ("boolean", NativeWidget::input(InputKind::Boolean, "checkbox")),
    ("checkbox", NativeWidget::input(InputKind::Boolean, "checkbox")),
    ("toggle", NativeWidget::input(InputKind::Boolean, "checkbox")),
    ("checkboxes", NativeWidget::tag(InputKind::MultiChoice, "fieldset")),
    ("multipleChoice", NativeWidget::tag(InputKind::Choice, "fieldset")),
    ("list", NativeWidget::tag(InputKind::Choice, "select")),
    ("string", NativeWidget::input(InputKind::Text, "text")),
    ("text", NativeWidget::tag(InputKind::Text, "textarea")),
    ("email", NativeWidget::input(InputKind::Email, "email")),
    ("password", NativeWidget::input(InputKind::Text, "password")),
    ("search", NativeWidget::input(InputKind::Text, "search")),
    ("url", NativeWidget::input(InputKind::Url, "url")),
    ("phone", NativeWidget::input(InputKind::Phone, "tel")),
    ("number", NativeWidget::input(InputKind::Number, "number")),
    ("currency", NativeWidget::input(InputKind::Number, "number")),
    ("date", NativeWidget::input(InputKind::Date, "date")),
    ("time", NativeWidget::input(InputKind::Time, "time")),
    ("dateTime", NativeWidget::input(InputKind::DateTime, "datetime-local")),
    ("color", NativeWidget::input(InputKind::Color, "color")),
    ("section", NativeWidget::tag(InputKind::Display, "header")),
    ("markup", NativeWidget::tag(InputKind::Display, "div")),
    ("image", NativeWidget::tag(InputKind::Display, "img")),
    ("button", NativeWidget::tag(InputKind::Button, "button")),
];

/// Register the composites and every native leaf in `native`.
pub fn install(registry: &mut Registry) {
    register_composites(registry, LIBRARY);
    for (type_tag, widget) in WIDGETS {
        registry.register_component(
            LIBRARY,
            type_tag,
            LeafField::component(widget).with_module(LIBRARY),
        );
    }
    registry.register_icon("color", ICON_COLOR_FIELD);
    tracing::debug!(library = LIBRARY, components = WIDGETS.len(), "library installed");
}
