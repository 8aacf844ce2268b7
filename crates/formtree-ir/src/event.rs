use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ErrorMap;
use crate::layout::Breakpoint;
use crate::path::FieldPath;

/// Flavor of a value change, mirroring the host's input/commit distinction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChangeKind {
    /// Keystroke-level update.
    Input,
    /// Committed update (blur, enter).
    Change,
    /// Single interaction that is both, e.g. a checkbox click.
    #[default]
    InputChange,
}

/// Value change travelling from a leaf towards the root.
///
/// `origin` is the absolute path of the field the user touched and never
/// changes on the way up. `scope` is the absolute path of the component that
/// emitted this hop and `value` is that component's whole value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub origin: FieldPath,
    pub scope: FieldPath,
    pub value: Value,
}

impl ChangeEvent {
    /// Event raised by the field at `path` itself.
    pub fn at(kind: ChangeKind, path: FieldPath, value: Value) -> Self {
        Self {
            kind,
            origin: path.clone(),
            scope: path,
            value,
        }
    }
}

/// Errors reported by the component at `scope`, keyed relative to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvalidEvent {
    pub scope: FieldPath,
    pub errors: ErrorMap,
}

/// Breakpoint change of a composite. `id` lists child positions from the
/// receiver down to the emitting composite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutChangedEvent {
    pub id: Vec<usize>,
    pub breakpoint: Breakpoint,
}

impl LayoutChangedEvent {
    /// Same event as seen by the parent of the child at `position`.
    pub fn nested_in(mut self, position: usize) -> Self {
        self.id.insert(0, position);
        self
    }
}

/// User interaction addressed to the field at `target`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub target: FieldPath,
    #[serde(flatten)]
    pub kind: ActionKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionKind {
    /// Replace the value of a leaf.
    Input {
        value: Value,
        #[serde(default)]
        change: ChangeKind,
    },
    /// Append an empty row to a repeating section.
    AddItem,
    /// Remove one row of a repeating section.
    RemoveItem { index: usize },
    /// Press a button-like field.
    Click,
}

impl Action {
    pub fn input(target: FieldPath, value: Value) -> Self {
        Self {
            target,
            kind: ActionKind::Input {
                value,
                change: ChangeKind::InputChange,
            },
        }
    }

    pub fn add_item(target: FieldPath) -> Self {
        Self {
            target,
            kind: ActionKind::AddItem,
        }
    }

    pub fn remove_item(target: FieldPath, index: usize) -> Self {
        Self {
            target,
            kind: ActionKind::RemoveItem { index },
        }
    }
}
