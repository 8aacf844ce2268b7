//! Renderer contract shared by composites and leaf widgets.

use formtree_ir::{
    Action, Breakpoint, ChangeEvent, ErrorMap, FieldDefinition, FieldError, FieldPath,
    InvalidEvent, LayoutChangedEvent,
};
use serde::Serialize;
use serde_json::{Map, Value};

/// Result of offering an action or measurement to a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResult {
    /// The field (or one of its descendants) consumed it.
    Handled,
    /// Not addressed to this subtree.
    Ignored,
}

impl EventResult {
    pub fn is_handled(&self) -> bool {
        matches!(self, EventResult::Handled)
    }
}

/// Receiver of the notifications a field raises towards its parent.
///
/// Composites hand each child a listener that merges the notification into
/// their own state before forwarding it, so a child never touches the
/// state of its ancestors directly.
pub trait FieldListener {
    fn changed(&mut self, event: ChangeEvent);

    /// `event.errors` is the complete error set of the emitting subtree and
    /// replaces whatever the receiver held for it.
    fn invalid(&mut self, event: InvalidEvent);

    fn layout_changed(&mut self, event: LayoutChangedEvent) {
        let _ = event;
    }

    /// The field at `path` took focus.
    fn focused(&mut self, path: &FieldPath) {
        let _ = path;
    }

    /// The field at `path` lost focus.
    fn blurred(&mut self, path: &FieldPath) {
        let _ = path;
    }
}

/// Listener that drops every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct Detached;

impl FieldListener for Detached {
    fn changed(&mut self, _event: ChangeEvent) {}
    fn invalid(&mut self, _event: InvalidEvent) {}
}

/// A rendered node of the form tree.
pub trait Field {
    fn definition(&self) -> &FieldDefinition;

    /// Absolute path of the value this field owns.
    fn path(&self) -> &FieldPath;

    fn value(&self) -> &Value;

    /// Errors of this subtree keyed relative to [`Field::path`].
    fn errors(&self) -> &ErrorMap;

    /// Replace the value from above. Does not notify.
    fn set_value(&mut self, value: Value);

    /// Replace the errors from above. Does not notify.
    fn set_errors(&mut self, errors: ErrorMap);

    /// Apply a user action addressed to this field or a descendant.
    fn interact(&mut self, action: &Action, listener: &mut dyn FieldListener) -> EventResult;

    /// Check validity. With `report` set, errors become visible and are
    /// reported through [`FieldListener::invalid`].
    fn validate(&mut self, report: bool, listener: &mut dyn FieldListener) -> bool;

    /// Focus the field at `path`. Returns whether a field took focus.
    /// Focus moves are reported through [`FieldListener::focused`] and
    /// [`FieldListener::blurred`].
    fn focus_field(&mut self, path: &FieldPath, listener: &mut dyn FieldListener) -> bool {
        let _ = (path, listener);
        false
    }

    /// Focus the first field whose definition requests initial focus.
    fn autofocus(&mut self, listener: &mut dyn FieldListener) -> bool {
        let _ = listener;
        false
    }

    /// Focus the first focusable field.
    fn focus_first(&mut self, listener: &mut dyn FieldListener) -> bool {
        let _ = listener;
        false
    }

    fn blur(&mut self, listener: &mut dyn FieldListener) {
        let _ = listener;
    }

    /// Width measurement for the composite at child positions `id` below
    /// this field; an empty `id` addresses this field itself.
    fn measure(
        &mut self,
        id: &[usize],
        width: f64,
        listener: &mut dyn FieldListener,
    ) -> EventResult {
        let _ = (id, width, listener);
        EventResult::Ignored
    }

    /// Re-measure this field and every nested composite at `width`.
    fn resize(&mut self, width: f64, listener: &mut dyn FieldListener) {
        let _ = (width, listener);
    }

    fn render(&self) -> RenderNode;
}

/// Host-facing description of one rendered field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderNode {
    #[serde(rename = "type")]
    pub type_tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub library: Option<String>,
    pub path: FieldPath,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
    pub value: Value,
    /// Error shown on this node, if it reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<FieldError>,
    pub enabled: bool,
    pub hidden: bool,
    pub focused: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakpoint: Option<Breakpoint>,
    /// Container style of a composite.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    /// Placement of this node inside its parent's layout.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_style: Option<String>,
    /// Grid area name among its siblings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
    /// Widget specific data (options, bounds, icons, controls).
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub attributes: Map<String, Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RenderNode>,
}

impl RenderNode {
    pub fn new(definition: &FieldDefinition, path: &FieldPath, value: Value) -> Self {
        Self {
            type_tag: definition.type_tag.clone(),
            library: None,
            path: path.clone(),
            name: definition.name.clone(),
            label: definition.label.clone().or_else(|| definition.prompt.clone()),
            help_text: definition.help_text.clone(),
            value,
            error: None,
            enabled: definition.is_enabled(),
            hidden: definition.hidden,
            focused: false,
            breakpoint: None,
            style: None,
            field_style: None,
            area: None,
            attributes: Map::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, key: &str, value: Value) -> Self {
        self.attributes.insert(key.to_string(), value);
        self
    }

    /// Deepest node rendered at `path`.
    pub fn find(&self, path: &FieldPath) -> Option<&RenderNode> {
        self.children
            .iter()
            .find_map(|child| child.find(path))
            .or_else(|| (&self.path == path).then_some(self))
    }

    /// Every node in depth-first order.
    pub fn walk(&self) -> Vec<&RenderNode> {
        let mut nodes = vec![self];
        for child in &self.children {
            nodes.extend(child.walk());
        }
        nodes
    }
}
