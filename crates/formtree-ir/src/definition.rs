use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::layout::ResponsiveLayout;

/// One node of a form schema.
///
/// The `type` tag selects a renderer from the active library. Composite
/// nodes carry nested definitions in `fields`, `form` or `selections`.
/// Attributes this model does not know about are kept in `extra` so custom
/// renderers can read them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    #[serde(rename = "type", default)]
    pub type_tag: String,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
    #[serde(default)]
    #[serde(skip_serializing_if = "is_false")]
    pub required: bool,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default)]
    #[serde(skip_serializing_if = "is_false")]
    pub hidden: bool,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autofill: Option<String>,
    /// Request initial focus when the form is focused.
    #[serde(default)]
    #[serde(skip_serializing_if = "is_false")]
    pub focus: bool,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub control_label: Option<String>,

    // List-like types
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<ListOption>,
    #[serde(default)]
    #[serde(skip_serializing_if = "is_false")]
    pub other: bool,
    #[serde(default)]
    #[serde(skip_serializing_if = "is_false")]
    pub multiple_choice: bool,
    #[serde(default)]
    #[serde(skip_serializing_if = "is_false")]
    pub indeterminate: bool,

    // Numeric and repeating bounds
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maxlength: Option<usize>,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    // Composites
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldDefinition>>,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form: Option<Box<FieldDefinition>>,
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub selections: Vec<Selection>,
    #[serde(default)]
    #[serde(skip_serializing_if = "is_false")]
    pub selectable: bool,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<ResponsiveLayout>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Option entry of a list-like field: either a bare string or a label/value pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListOption {
    Plain(String),
    Labeled {
        label: String,
        #[serde(default)]
        #[serde(skip_serializing_if = "Option::is_none")]
        value: Option<String>,
    },
}

impl ListOption {
    pub fn label(&self) -> &str {
        match self {
            ListOption::Plain(text) => text,
            ListOption::Labeled { label, .. } => label,
        }
    }

    /// Stored value: the explicit value, else the label.
    pub fn value(&self) -> &str {
        match self {
            ListOption::Plain(text) => text,
            ListOption::Labeled { label, value } => value.as_deref().unwrap_or(label),
        }
    }
}

/// One choice of a selectable section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub label: String,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form: Option<Box<FieldDefinition>>,
}

impl Selection {
    pub fn key(&self) -> &str {
        self.value.as_deref().unwrap_or(&self.label)
    }
}

/// Typed view over the definition kinds the engine composes itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind<'a> {
    Form {
        fields: &'a [FieldDefinition],
        layout: Option<&'a ResponsiveLayout>,
    },
    NestedForm {
        form: Option<&'a FieldDefinition>,
    },
    Toolbar {
        form: Option<&'a FieldDefinition>,
    },
    Repeating {
        min: usize,
        max: Option<usize>,
        form: Option<&'a FieldDefinition>,
    },
    Selectable {
        selections: &'a [Selection],
    },
    Table {
        fields: &'a [FieldDefinition],
        selectable: bool,
    },
    Hidden,
    Leaf(&'a str),
}

impl FieldDefinition {
    pub fn new(type_tag: impl Into<String>) -> Self {
        Self {
            type_tag: type_tag.into(),
            ..Self::default()
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_fields(mut self, fields: Vec<FieldDefinition>) -> Self {
        self.fields = Some(fields);
        self
    }

    pub fn with_form(mut self, form: FieldDefinition) -> Self {
        self.form = Some(Box::new(form));
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    /// A node without a name whose children splice into the parent value.
    pub fn is_anonymous(&self) -> bool {
        self.name.is_none() && (self.fields.is_some() || self.form.is_some())
    }

    /// Nested field list: `fields`, else the fields of `form`.
    pub fn child_fields(&self) -> &[FieldDefinition] {
        if let Some(fields) = self.fields.as_deref() {
            return fields;
        }
        self.form
            .as_deref()
            .and_then(|form| form.fields.as_deref())
            .unwrap_or(&[])
    }

    /// Responsive layout of this node or of its nested `form`.
    pub fn responsive_layout(&self) -> Option<&ResponsiveLayout> {
        self.layout
            .as_ref()
            .or_else(|| self.form.as_deref().and_then(|form| form.layout.as_ref()))
    }

    pub fn kind(&self) -> FieldKind<'_> {
        match self.type_tag.as_str() {
            "form" | "object" | "styledForm" => FieldKind::Form {
                fields: self.child_fields(),
                layout: self.responsive_layout(),
            },
            "nestedForm" => FieldKind::NestedForm {
                form: self.form.as_deref(),
            },
            "toolbar" => FieldKind::Toolbar {
                form: self.form.as_deref(),
            },
            "repeatingSection" | "repeating" => FieldKind::Repeating {
                min: self.min.map(|min| min.max(0.0) as usize).unwrap_or(0),
                max: self.max.map(|max| max.max(0.0) as usize),
                form: self.form.as_deref(),
            },
            "selectableSection" => FieldKind::Selectable {
                selections: &self.selections,
            },
            "table" => FieldKind::Table {
                fields: self.fields.as_deref().unwrap_or(&[]),
                selectable: self.selectable,
            },
            "hidden" => FieldKind::Hidden,
            other => FieldKind::Leaf(other),
        }
    }
}

/// Grid area name for `field` among its siblings.
///
/// Named fields use their name; unnamed ones use the type tag followed by
/// the number of same-typed siblings before them.
pub fn area(field: &FieldDefinition, fields: &[FieldDefinition]) -> String {
    if let Some(name) = field.name().filter(|name| !name.is_empty()) {
        return name.to_string();
    }
    let ordinal = fields
        .iter()
        .take_while(|sibling| !std::ptr::eq(*sibling, field))
        .filter(|sibling| sibling.type_tag == field.type_tag)
        .count();
    format!("{}{}", field.type_tag, ordinal)
}
