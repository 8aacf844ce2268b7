use formtree_ir::{Action, ErrorMap, FieldDefinition, FieldPath, Segment};
use serde_json::{Map, Value};

use crate::compose::{Children, FieldInit, Relation, RenderContext, ScopeState};
use crate::field::{EventResult, Field, FieldListener, RenderNode};

const DATA: &str = "data";
const SELECTIONS: &str = "selections";
const SELECT_ALL: &str = "selectAll";
/// Row member carrying the row's selection checkbox.
const ROW_SELECTED: &str = "__s";

/// Value `{data, selections, selectAll}` of a table. Rows render at
/// `data[i]`; their selection checkbox maps onto `selections`.
struct TableState {
    definition: FieldDefinition,
    path: FieldPath,
    value: Value,
    errors: ErrorMap,
    refresh: bool,
}

impl TableState {
    fn rows(&self) -> &[Value] {
        self.value
            .get(DATA)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn select_all(&self) -> Option<bool> {
        self.value.get(SELECT_ALL).and_then(Value::as_bool)
    }

    fn selections(&self) -> Vec<usize> {
        self.value
            .get(SELECTIONS)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_u64)
                    .map(|index| index as usize)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn is_selected(&self, index: usize) -> bool {
        self.definition.selectable
            && (self.select_all() == Some(true) || self.selections().contains(&index))
    }

    fn set_selected(&mut self, index: usize, selected: bool) {
        if self.is_selected(index) == selected {
            return;
        }
        let mut selections = if self.select_all() == Some(true) {
            (0..self.rows().len()).collect()
        } else {
            self.selections()
        };
        selections.retain(|&row| row != index);
        if selected {
            selections.push(index);
        }
        selections.sort_unstable();
        if let Value::Object(object) = &mut self.value {
            object.remove(SELECT_ALL);
            object.insert(SELECTIONS.to_string(), Value::from(selections));
        }
        self.refresh = true;
    }

    fn row_path(index: usize) -> FieldPath {
        FieldPath::key(DATA).index(index)
    }
}

impl ScopeState for TableState {
    fn path(&self) -> &FieldPath {
        &self.path
    }

    fn value(&self) -> &Value {
        &self.value
    }

    fn errors(&self) -> &ErrorMap {
        &self.errors
    }

    fn child_path(&self, relation: &Relation) -> FieldPath {
        match relation {
            Relation::Member(Segment::Index(index)) => self.path.join(&Self::row_path(*index)),
            other => other.child_path(&self.path),
        }
    }

    fn child_value(&self, relation: &Relation) -> Value {
        match relation {
            Relation::Member(Segment::Index(index)) => {
                let mut row = self
                    .rows()
                    .get(*index)
                    .and_then(Value::as_object)
                    .cloned()
                    .unwrap_or_default();
                if self.definition.selectable {
                    row.insert(ROW_SELECTED.to_string(), Value::Bool(self.is_selected(*index)));
                }
                Value::Object(row)
            }
            Relation::Member(Segment::Key(key)) if key == SELECT_ALL => {
                self.select_all().map(Value::Bool).unwrap_or(Value::Null)
            }
            other => other.value_in(&self.value),
        }
    }

    fn child_errors(&self, relation: &Relation) -> ErrorMap {
        match relation {
            Relation::Member(Segment::Index(index)) => self.errors.scoped(&Self::row_path(*index)),
            other => other.errors_in(&self.errors),
        }
    }

    fn merge_value(&mut self, relation: &Relation, value: Value) {
        match relation {
            Relation::Member(Segment::Index(index)) => {
                let Value::Object(mut row) = value else {
                    return;
                };
                if let Some(selected) = row.remove(ROW_SELECTED).and_then(|v| v.as_bool()) {
                    self.set_selected(*index, selected);
                }
                if let Value::Object(object) = &mut self.value {
                    let data = object
                        .entry(DATA.to_string())
                        .or_insert_with(|| Value::Array(Vec::new()));
                    Relation::Member(Segment::Index(*index)).merge_value(data, Value::Object(row));
                }
            }
            Relation::Member(Segment::Key(key)) if key == SELECT_ALL => {
                if self.select_all() == value.as_bool() {
                    return;
                }
                if let Value::Object(object) = &mut self.value {
                    object.remove(SELECTIONS);
                    match value.as_bool() {
                        Some(all) => object.insert(SELECT_ALL.to_string(), Value::Bool(all)),
                        None => object.remove(SELECT_ALL),
                    };
                }
                self.refresh = true;
            }
            other => other.merge_value(&mut self.value, value),
        }
    }

    fn merge_errors(&mut self, relation: &Relation, errors: &ErrorMap) {
        match relation {
            Relation::Member(Segment::Index(index)) => {
                let prefix = Self::row_path(*index);
                self.errors.clear_under(&prefix);
                self.errors.merge(errors.prefixed(&prefix));
            }
            other => other.merge_errors(&mut self.errors, errors),
        }
    }
}

/// Grid of records with one column per field definition and optional row
/// selection.
pub struct TableField {
    context: RenderContext,
    state: TableState,
    row: FieldDefinition,
    children: Children,
}

impl TableField {
    pub fn new(init: FieldInit) -> Self {
        let FieldInit {
            context,
            definition,
            path,
            value,
            errors,
            ..
        } = init;
        let row = row_definition(&definition);
        let mut field = Self {
            context,
            state: TableState {
                definition,
                path,
                value: normalize(value),
                errors,
                refresh: false,
            },
            row,
            children: Children::new(),
        };
        field.rebuild();
        field
    }

    fn rebuild(&mut self) {
        self.children.clear();
        self.state.refresh = false;
        if self.state.definition.selectable {
            let mut select_all = FieldDefinition::new("checkbox").named(SELECT_ALL);
            select_all.indeterminate = self.state.select_all().is_none();
            self.children.spawn(
                &self.context,
                &select_all,
                Relation::Member(Segment::key(SELECT_ALL)),
                SELECT_ALL.to_string(),
                &self.state,
            );
        }
        for index in 0..self.state.rows().len() {
            self.children.spawn(
                &self.context,
                &self.row,
                Relation::Member(Segment::Index(index)),
                index.to_string(),
                &self.state,
            );
        }
    }

    fn columns(&self) -> Vec<Value> {
        self.state
            .definition
            .fields
            .iter()
            .flatten()
            .map(|column| {
                Value::String(
                    column
                        .label
                        .clone()
                        .or_else(|| column.name.clone())
                        .unwrap_or_default(),
                )
            })
            .collect()
    }
}

/// Definition of one row: a selection checkbox followed by the columns
/// with their labels stripped.
fn row_definition(table: &FieldDefinition) -> FieldDefinition {
    let mut cells = Vec::new();
    if table.selectable {
        cells.push(FieldDefinition::new("checkbox").named(ROW_SELECTED));
    }
    for column in table.fields.iter().flatten() {
        let mut cell = column.clone();
        cell.label = None;
        cell.help_text = None;
        cells.push(cell);
    }
    FieldDefinition::new("form").with_fields(cells)
}

fn normalize(value: Value) -> Value {
    let mut object = match value {
        Value::Object(object) => object,
        _ => Map::new(),
    };
    if !object.get(DATA).is_some_and(Value::is_array) {
        object.insert(DATA.to_string(), Value::Array(Vec::new()));
    }
    Value::Object(object)
}

impl Field for TableField {
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
        let previous = self.state.rows().len();
        self.state.value = normalize(value);
        if previous == self.state.rows().len() {
            self.children.set_values(&self.state);
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
        if self.state.refresh {
            self.state.refresh = false;
            self.children.set_values(&self.state);
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
        )
        .with_attribute("columns", Value::Array(self.columns()))
        .with_attribute("selectable", Value::Bool(self.state.definition.selectable));
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
    use serde_json::json;

    fn state(value: Value) -> TableState {
        let mut definition = FieldDefinition::new("table").named("people");
        definition.selectable = true;
        TableState {
            definition,
            path: FieldPath::key("people"),
            value: normalize(value),
            errors: ErrorMap::new(),
            refresh: false,
        }
    }

    #[test]
    fn rows_carry_selection_flag() {
        let state = state(json!({"data": [{"n": 1}, {"n": 2}], "selections": [1]}));
        let row = Relation::Member(Segment::Index(1));
        assert_eq!(state.child_value(&row), json!({"n": 2, "__s": true}));
        assert_eq!(state.child_path(&row).to_string(), "people.data[1]");
    }

    #[test]
    fn unchecking_a_row_under_select_all_keeps_others() {
        let mut state = state(json!({"data": [{}, {}, {}], "selectAll": true}));
        state.merge_value(&Relation::Member(Segment::Index(1)), json!({"__s": false}));
        assert_eq!(state.value["selections"], json!([0, 2]));
        assert!(state.value.get("selectAll").is_none());
        assert!(state.refresh);
        assert_eq!(state.value["data"], json!([{}, {}, {}]));
    }

    #[test]
    fn select_all_clears_explicit_selections() {
        let mut state = state(json!({"data": [{}, {}], "selections": [0]}));
        state.merge_value(&Relation::Member(Segment::key(SELECT_ALL)), json!(true));
        assert_eq!(state.value["selectAll"], json!(true));
        assert!(state.value.get("selections").is_none());
        assert!(state.is_selected(1));
    }

    #[test]
    fn row_errors_are_scoped_to_data_rows() {
        let mut state = state(json!({"data": [{}]}));
        let row = Relation::Member(Segment::Index(0));
        let child = ErrorMap::single(FieldPath::key("n"), formtree_ir::FieldError::custom("bad"));
        state.merge_errors(&row, &child);
        assert!(state.errors.contains(&"data[0].n".parse().unwrap()));
        assert_eq!(state.child_errors(&row), child);
    }
}
