//! Flat path → error maps and the filters that project them onto subtrees.
//!
//! A component holds errors keyed relative to its own value, so the root's
//! map is keyed by absolute paths. Going down, a composite hands each child
//! only the entries under that child's segment, with the segment stripped.
//! Going up, a composite prefixes the child's segment again before merging.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::definition::FieldDefinition;
use crate::path::{FieldPath, Segment};
use crate::value::owned_keys;

/// A single validation failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    pub message: String,
    /// Set for programmatic (custom) errors, clear for native validity failures.
    #[serde(default)]
    pub custom: bool,
    /// Renderer-specific validity details.
    #[serde(default)]
    #[serde(skip_serializing_if = "Value::is_null")]
    pub validity: Value,
}

impl FieldError {
    pub fn native(message: impl Into<String>, validity: Value) -> Self {
        Self {
            message: message.into(),
            custom: false,
            validity,
        }
    }

    pub fn custom(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            custom: true,
            validity: Value::Null,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorMap {
    entries: BTreeMap<FieldPath, FieldError>,
}

impl ErrorMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map holding one error at `path`.
    pub fn single(path: FieldPath, error: FieldError) -> Self {
        let mut map = Self::new();
        map.insert(path, error);
        map
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn insert(&mut self, path: FieldPath, error: FieldError) -> Option<FieldError> {
        self.entries.insert(path, error)
    }

    pub fn get(&self, path: &FieldPath) -> Option<&FieldError> {
        self.entries.get(path)
    }

    pub fn remove(&mut self, path: &FieldPath) -> Option<FieldError> {
        self.entries.remove(path)
    }

    pub fn contains(&self, path: &FieldPath) -> bool {
        self.entries.contains_key(path)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FieldPath, &FieldError)> {
        self.entries.iter()
    }

    pub fn paths(&self) -> impl Iterator<Item = &FieldPath> {
        self.entries.keys()
    }

    /// Copies every entry of `other` into `self`; `other` wins on conflicts.
    pub fn merge(&mut self, other: ErrorMap) {
        self.entries.extend(other.entries);
    }

    /// Entries under `prefix`, re-keyed relative to it.
    pub fn scoped(&self, prefix: &FieldPath) -> ErrorMap {
        let entries = self
            .entries
            .iter()
            .filter_map(|(path, error)| {
                path.strip_prefix(prefix)
                    .map(|relative| (relative, error.clone()))
            })
            .collect();
        ErrorMap { entries }
    }

    /// Every entry re-keyed below `prefix`.
    pub fn prefixed(&self, prefix: &FieldPath) -> ErrorMap {
        let entries = self
            .entries
            .iter()
            .map(|(path, error)| (prefix.join(path), error.clone()))
            .collect();
        ErrorMap { entries }
    }

    /// Drops every entry at or below `prefix`.
    pub fn clear_under(&mut self, prefix: &FieldPath) {
        self.entries.retain(|path, _| !path.starts_with(prefix));
    }
}

impl FromIterator<(FieldPath, FieldError)> for ErrorMap {
    fn from_iter<I: IntoIterator<Item = (FieldPath, FieldError)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for ErrorMap {
    type Item = (FieldPath, FieldError);
    type IntoIter = std::collections::btree_map::IntoIter<FieldPath, FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Copies the entries of `errors` that belong to the child at `segment`.
///
/// An entry belongs to the child when its path is the segment itself, or
/// continues it with a dotted member (`f.x`) or an ordinal (`f[0]`). The
/// segment is stripped so the child sees paths relative to itself.
pub fn add_field_errors(errors: &ErrorMap, field_errors: &mut ErrorMap, segment: &Segment) {
    for (path, error) in errors.iter() {
        if path.first() == Some(segment) {
            field_errors.insert(path.tail(), error.clone());
        }
    }
}

/// Copies the entries under any of `keys` without stripping anything. Used
/// for anonymous nodes, whose children address the parent's value object.
pub fn add_nested_errors(errors: &ErrorMap, field_errors: &mut ErrorMap, keys: &[String]) {
    for (path, error) in errors.iter() {
        if path
            .first_key()
            .is_some_and(|first| keys.iter().any(|key| key == first))
        {
            field_errors.insert(path.clone(), error.clone());
        }
    }
}

/// Error view of one child of a composite.
pub fn errors_for_field(errors: &ErrorMap, definition: &FieldDefinition) -> ErrorMap {
    let mut field_errors = ErrorMap::new();
    if definition.is_anonymous() {
        add_nested_errors(errors, &mut field_errors, &owned_keys(definition));
    } else if let Some(name) = definition.name() {
        add_field_errors(errors, &mut field_errors, &Segment::key(name));
    }
    field_errors
}
