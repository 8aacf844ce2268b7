use formtree_ir::{
    Action, ChangeEvent, ChangeKind, ErrorMap, FieldDefinition, FieldKind, FieldPath,
    InvalidEvent, ListOption, Segment, Selection,
};
use serde_json::{Map, Value, json};

use crate::compose::{Children, FieldInit, Relation, RenderContext, ScopeState};
use crate::field::{EventResult, Field, FieldListener, RenderNode};

const SELECTION: &str = "selection";
const VALUE: &str = "value";

/// Value `{selection, value}` of a selectable section plus the flags raised
/// when the selection switches.
struct SelectableState {
    definition: FieldDefinition,
    path: FieldPath,
    value: Value,
    errors: ErrorMap,
    switched: bool,
    /// Errors of the previous nested form were dropped by the switch.
    errors_dropped: bool,
}

impl SelectableState {
    fn selection(&self) -> Option<&str> {
        self.value.get(SELECTION).and_then(Value::as_str)
    }

    fn selected(&self) -> Option<&Selection> {
        let key = self.selection()?;
        self.definition
            .selections
            .iter()
            .find(|selection| selection.key() == key)
    }
}

impl ScopeState for SelectableState {
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
        match relation {
            Relation::Member(Segment::Key(key)) if key == SELECTION => {
                let Some(choice) = value.as_str() else {
                    return;
                };
                if self.selection() == Some(choice) {
                    return;
                }
                if !self
                    .definition
                    .selections
                    .iter()
                    .any(|selection| selection.key() == choice)
                {
                    tracing::warn!(path = %self.path, choice, "unknown selection");
                    return;
                }
                self.value = json!({ SELECTION: choice, VALUE: {} });
                self.switched = true;
                let nested = FieldPath::key(VALUE);
                if self.errors.paths().any(|path| path.starts_with(&nested)) {
                    self.errors.clear_under(&nested);
                    self.errors_dropped = true;
                }
            }
            other => other.merge_value(&mut self.value, value),
        }
    }

    fn merge_errors(&mut self, relation: &Relation, errors: &ErrorMap) {
        relation.merge_errors(&mut self.errors, errors);
    }
}

/// A choice list plus the nested form of the chosen entry, stored under
/// `value`. Switching the choice discards the previous nested value.
pub struct SelectableSectionField {
    context: RenderContext,
    state: SelectableState,
    children: Children,
}

impl SelectableSectionField {
    pub fn new(init: FieldInit) -> Self {
        let FieldInit {
            context,
            definition,
            path,
            value,
            errors,
            ..
        } = init;
        let value = normalize(&definition, value);
        let mut field = Self {
            context,
            state: SelectableState {
                definition,
                path,
                value,
                errors,
                switched: false,
                errors_dropped: false,
            },
            children: Children::new(),
        };
        field.rebuild();
        field
    }

    fn rebuild(&mut self) {
        self.children.clear();
        self.state.switched = false;
        let list = selection_list(&self.state.definition.selections);
        self.children.spawn(
            &self.context,
            &list,
            Relation::Member(Segment::key(SELECTION)),
            SELECTION.to_string(),
            &self.state,
        );
        if let Some(form) = self.state.selected().and_then(|selection| selection.form.as_deref()) {
            let mut form = form.clone();
            if form.type_tag.is_empty() {
                form.type_tag = "form".to_string();
            }
            form.name = None;
            self.children.spawn(
                &self.context,
                &form,
                Relation::Member(Segment::key(VALUE)),
                VALUE.to_string(),
                &self.state,
            );
        }
        self.children.collect(&mut self.state);
    }
}

/// `{selection, value}` with a known selection, defaulting to the first.
fn normalize(definition: &FieldDefinition, value: Value) -> Value {
    let keys: Vec<&str> = match definition.kind() {
        FieldKind::Selectable { selections } => selections.iter().map(Selection::key).collect(),
        _ => Vec::new(),
    };
    let mut object = match value {
        Value::Object(object) => object,
        _ => Map::new(),
    };
    let known = object
        .get(SELECTION)
        .and_then(Value::as_str)
        .is_some_and(|selection| keys.contains(&selection));
    if !known {
        object.clear();
        if let Some(first) = keys.first() {
            object.insert(SELECTION.to_string(), Value::String(first.to_string()));
        }
    }
    if !object.get(VALUE).is_some_and(Value::is_object) {
        object.insert(VALUE.to_string(), Value::Object(Map::new()));
    }
    Value::Object(object)
}

fn selection_list(selections: &[Selection]) -> FieldDefinition {
    let mut list = FieldDefinition::new("list").named(SELECTION);
    list.options = selections
        .iter()
        .map(|selection| ListOption::Labeled {
            label: selection.label.clone(),
            value: Some(selection.key().to_string()),
        })
        .collect();
    list
}

impl Field for SelectableSectionField {
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
        let previous = self.state.selection().map(str::to_string);
        self.state.value = normalize(&self.state.definition, value);
        if self.state.selection() == previous.as_deref() {
            self.children.set_values(&self.state);
            self.children.collect(&mut self.state);
        } else {
            self.rebuild();
        }
    }

    fn set_errors(&mut self, errors: ErrorMap) {
        self.state.errors = errors;
        self.children.set_errors(&self.state);
    }

    fn interact(&mut self, action: &Action, listener: &mut dyn FieldListener) -> EventResult {
        let result = self.children.interact(&mut self.state, action, listener);
        if self.state.switched {
            // The new nested form adds its defaults while it is built.
            self.rebuild();
            listener.changed(ChangeEvent::at(
                ChangeKind::Change,
                self.state.path.clone(),
                self.state.value.clone(),
            ));
        }
        if std::mem::take(&mut self.state.errors_dropped) {
            listener.invalid(InvalidEvent {
                scope: self.state.path.clone(),
                errors: self.state.errors.clone(),
            });
        }
        result
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
        self.children.measure(&mut self.state, id, width, listener)
    }

    fn resize(&mut self, width: f64, listener: &mut dyn FieldListener) {
        self.children.resize(&mut self.state, width, listener);
    }

    fn render(&self) -> RenderNode {
        let mut node = RenderNode::new(
            &self.state.definition,
            &self.state.path,
            self.state.value.clone(),
        );
        node.library = self.context.library.clone();
        node.error = self.state.errors.get(&FieldPath::root()).cloned();
        for child in self.children.iter() {
            let mut rendered = child.field.render();
            rendered.area = Some(child.area.clone());
            node.children.push(rendered);
        }
        node
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition() -> FieldDefinition {
        serde_json::from_value(json!({
            "type": "selectableSection",
            "name": "payment",
            "selections": [
                {"label": "Card", "value": "card", "form": {"fields": [{"type": "string", "name": "number"}]}},
                {"label": "Invoice"}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn normalize_defaults_to_first_selection() {
        assert_eq!(
            normalize(&definition(), Value::Null),
            json!({"selection": "card", "value": {}})
        );
        assert_eq!(
            normalize(&definition(), json!({"selection": "Invoice", "value": {"x": 1}})),
            json!({"selection": "Invoice", "value": {"x": 1}})
        );
        assert_eq!(
            normalize(&definition(), json!({"selection": "cash", "value": {"x": 1}})),
            json!({"selection": "card", "value": {}})
        );
    }

    #[test]
    fn switching_selection_resets_nested_value() {
        let mut state = SelectableState {
            definition: definition(),
            path: FieldPath::key("payment"),
            value: json!({"selection": "card", "value": {"number": "4111"}}),
            errors: ErrorMap::new(),
            switched: false,
            errors_dropped: false,
        };
        let relation = Relation::Member(Segment::key(SELECTION));
        state.merge_value(&relation, json!("card"));
        assert!(!state.switched);
        state.merge_value(&relation, json!("Invoice"));
        assert!(state.switched);
        assert_eq!(state.value, json!({"selection": "Invoice", "value": {}}));

        state.merge_value(&Relation::Member(Segment::key(VALUE)), json!({"note": "x"}));
        assert_eq!(state.value["value"], json!({"note": "x"}));
    }

    #[test]
    fn switching_selection_drops_nested_errors() {
        let mut state = SelectableState {
            definition: definition(),
            path: FieldPath::key("payment"),
            value: json!({"selection": "card", "value": {"number": "4111"}}),
            errors: ErrorMap::single(
                "value.number".parse().unwrap(),
                formtree_ir::FieldError::custom("declined"),
            ),
            switched: false,
            errors_dropped: false,
        };
        state.merge_value(&Relation::Member(Segment::key(SELECTION)), json!("Invoice"));
        assert!(state.errors.is_empty());
        assert!(state.errors_dropped);
    }

    #[test]
    fn selection_list_uses_keys() {
        let list = selection_list(&definition().selections);
        let values: Vec<&str> = list.options.iter().map(ListOption::value).collect();
        assert_eq!(values, vec!["card", "Invoice"]);
        assert_eq!(list.name(), Some(SELECTION));
    }
}
