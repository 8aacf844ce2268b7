//! Layout formatters turning a breakpoint's [`Layout`] into grid or flex styles.

use std::sync::Arc;

use formtree_engine::{Formatter, Registry};
use formtree_ir::{FieldDefinition, Layout};

const GRID_GAP: &str = "grid-gap:5px 5px";

/// Fractional grid columns; fields flow into them in order.
#[derive(Debug, Default, Clone, Copy)]
pub struct ColumnsFormatter;

/// Named grid areas; each field is placed in the area named after it.
#[derive(Debug, Default, Clone, Copy)]
pub struct AreasFormatter;

/// Fixed-width table columns.
#[derive(Debug, Default, Clone, Copy)]
pub struct TableFormatter;

/// Flex row with optional per-field growth.
#[derive(Debug, Default, Clone, Copy)]
pub struct ToolbarFormatter;

fn fractions(columns: &[f64]) -> String {
    if columns.is_empty() {
        return "1fr".to_string();
    }
    columns
        .iter()
        .map(|column| format!("{column}fr"))
        .collect::<Vec<_>>()
        .join(" ")
}

impl Formatter for ColumnsFormatter {
    fn container_style(&self, layout: &Layout, _fields: &[FieldDefinition]) -> String {
        match layout {
            Layout::Columns { columns } => {
                format!("grid-template-columns:{};{GRID_GAP}", fractions(columns))
            }
            _ => format!("grid-template-columns:1fr;{GRID_GAP}"),
        }
    }
}

impl Formatter for AreasFormatter {
    fn container_style(&self, layout: &Layout, _fields: &[FieldDefinition]) -> String {
        let Layout::Areas { columns, areas } = layout else {
            return format!("grid-template-columns:1fr;{GRID_GAP}");
        };
        let mut style = format!("grid-template-columns:{}", fractions(columns));
        if !areas.is_empty() {
            let rows: Vec<String> = areas.iter().map(|row| format!("\"{row}\"")).collect();
            style.push_str(&format!(";grid-template-areas:{}", rows.join(" ")));
        }
        format!("{style};{GRID_GAP}")
    }

    fn field_style(&self, layout: &Layout, _field: &FieldDefinition, area: &str) -> Option<String> {
        matches!(layout, Layout::Areas { .. }).then(|| format!("grid-area:{area}"))
    }
}

impl Formatter for TableFormatter {
    fn container_style(&self, layout: &Layout, _fields: &[FieldDefinition]) -> String {
        let Layout::Table {
            columns,
            vertical,
            row_height,
            ..
        } = layout
        else {
            return format!("grid-template-columns:1fr;{GRID_GAP}");
        };
        let widths: Vec<String> = columns
            .iter()
            .map(|column| format!("{}px", column.width))
            .collect();
        let mut style = format!("display:grid;grid-template-columns:{}", widths.join(" "));
        if let Some(vertical) = vertical {
            style.push_str(&format!(";align-items:{vertical}"));
        }
        if let Some(row_height) = row_height {
            style.push_str(&format!(";grid-auto-rows:{row_height}"));
        }
        style
    }
}

impl Formatter for ToolbarFormatter {
    fn container_style(&self, layout: &Layout, _fields: &[FieldDefinition]) -> String {
        let Layout::Toolbar {
            horizontal,
            vertical,
            wrap,
            ..
        } = layout
        else {
            return "display:flex".to_string();
        };
        let mut style = "display:flex".to_string();
        if let Some(horizontal) = horizontal {
            style.push_str(&format!(";justify-content:{horizontal}"));
        }
        if let Some(vertical) = vertical {
            style.push_str(&format!(";align-items:{vertical}"));
        }
        if let Some(wrap) = wrap {
            style.push_str(&format!(";flex-wrap:{wrap}"));
        }
        style
    }

    fn field_style(&self, layout: &Layout, _field: &FieldDefinition, area: &str) -> Option<String> {
        match layout {
            Layout::Toolbar { grow, .. } => grow.get(area).map(|grow| format!("flex-grow:{grow}")),
            _ => None,
        }
    }
}

/// Register the built-in formatters under the names layouts refer to.
pub fn install(registry: &mut Registry) {
    registry.register_formatter("columns", Arc::new(ColumnsFormatter));
    registry.register_formatter("areas", Arc::new(AreasFormatter));
    registry.register_formatter("table", Arc::new(TableFormatter));
    registry.register_formatter("toolbar", Arc::new(ToolbarFormatter));
}
