//! Renderers mapping onto Material web components.

use formtree_engine::fields::FormField;
use formtree_engine::{Component, Registry, RenderContext, RenderNode, register_composites};
use formtree_ir::FieldDefinition;
use serde_json::Value;

use crate::leaf::{LeafField, Widget};
use crate::validity::InputKind;

pub const LIBRARY: &str = "material";

/// A Material component. Text inputs share `mwc-textfield` and differ by `type`.
#[derive(Debug, Clone, Copy)]
pub struct MaterialWidget {
    kind: InputKind,
    element: &'static str,
    input_type: &'static str,
}

const fn textfield(kind: InputKind, input_type: &'static str) -> MaterialWidget {
    MaterialWidget {
        kind,
        element: "mwc-textfield",
        input_type,
    }
}

impl Widget for MaterialWidget {
    fn kind(&self) -> InputKind {
        self.kind
    }

    fn element(&self) -> &'static str {
        self.element
    }

    fn decorate(&self, context: &RenderContext, definition: &FieldDefinition, node: &mut RenderNode) {
        let attributes = &mut node.attributes;
        if !self.input_type.is_empty() {
            attributes.insert("type".into(), Value::from(self.input_type));
        }
        if let Some(help) = &definition.help_text {
            attributes.insert("helper".into(), Value::from(help.as_str()));
        }
        if definition.maxlength.is_some() {
            attributes.insert("charCounter".into(), Value::Bool(true));
        }
        if let Some(outlined) = context.settings.get("outlined").and_then(Value::as_bool) {
            attributes.insert("outlined".into(), Value::Bool(outlined));
        }
        if let Some(error) = &node.error {
            attributes.insert("validationMessage".into(), Value::from(error.message.as_str()));
        }
    }
}

pub const WIDGETS: [(&str, MaterialWidget); 9] = [
    ("string", textfield(InputKind::Text, "text")),
    ("email", textfield(InputKind::Email, "email")),
    ("password", textfield(InputKind::Text, "password")),
    ("search", textfield(InputKind::Text, "search")),
    ("number", textfield(InputKind::Number, "number")),
    ("date", textfield(InputKind::Date, "date")),
    (
        "text",
        MaterialWidget {
            kind: InputKind::Text,
            element: "mwc-textarea",
            input_type: "",
        },
    ),
    (
        "list",
        MaterialWidget {
            kind: InputKind::Choice,
            element: "mwc-select",
            input_type: "",
        },
    ),
    (
        "boolean",
        MaterialWidget {
            kind: InputKind::Boolean,
            element: "mwc-checkbox",
            input_type: "",
        },
    ),
];

/// Register the composites, the Material leaves and a Material `styledForm`.
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
            .with_import_path("@material/mwc-formfield")
            .with_module(LIBRARY)
            .focusable(false),
    );
    tracing::debug!(library = LIBRARY, components = WIDGETS.len(), "library installed");
}
