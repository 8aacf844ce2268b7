//! Breakpoint tracking and style resolution for composite fields.

use formtree_ir::{Breakpoint, Breakpoints, FieldDefinition, Layout, ResponsiveLayout, Thresholds};

use crate::registry::Registry;

/// Current breakpoint of one composite plus the layout it resolves against.
#[derive(Debug, Clone)]
pub struct ResponsiveState {
    layout: Option<ResponsiveLayout>,
    thresholds: Thresholds,
    current: Breakpoint,
    default_grid: String,
}

impl ResponsiveState {
    /// Starts at the largest size until the first measurement arrives.
    pub fn new(layout: Option<&ResponsiveLayout>, base: &Breakpoints, default_grid: &str) -> Self {
        let thresholds = layout
            .and_then(|layout| layout.breakpoints)
            .unwrap_or_default()
            .or(base)
            .thresholds();
        Self {
            layout: layout.cloned(),
            thresholds,
            current: Breakpoint::LARGEST,
            default_grid: default_grid.to_string(),
        }
    }

    pub fn current(&self) -> Breakpoint {
        self.current
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Classify `width`. Returns the new breakpoint only when it differs
    /// from the current one.
    pub fn measure(&mut self, width: f64) -> Option<Breakpoint> {
        let detected = self.thresholds.classify(width);
        if detected == self.current {
            return None;
        }
        tracing::debug!(from = %self.current, to = %detected, width, "breakpoint changed");
        self.current = detected;
        Some(detected)
    }

    /// Style of the section wrapping the composite.
    pub fn section_style(&self) -> Option<&str> {
        self.layout.as_ref().and_then(|layout| layout.style.as_deref())
    }

    /// Formatter layout in effect at the current breakpoint.
    pub fn active_layout(&self) -> Option<&Layout> {
        self.layout
            .as_ref()
            .and_then(|layout| layout.size_for(self.current))
    }

    /// Container style at the current breakpoint: a formatter layout if
    /// one applies, else the raw grid, else the default grid.
    pub fn container_style(&self, registry: &Registry, fields: &[FieldDefinition]) -> String {
        if let Some(active) = self.active_layout() {
            match registry.formatter(active.formatter()) {
                Some(formatter) => return formatter.container_style(active, fields),
                None => {
                    tracing::warn!(formatter = active.formatter(), "layout formatter not registered")
                }
            }
        }
        self.layout
            .as_ref()
            .and_then(|layout| layout.grid_for(self.current))
            .unwrap_or(self.default_grid.as_str())
            .to_string()
    }

    /// Placement of `field` inside the container, if the formatter sets one.
    pub fn field_style(
        &self,
        registry: &Registry,
        field: &FieldDefinition,
        area: &str,
    ) -> Option<String> {
        let active = self.active_layout()?;
        registry
            .formatter(active.formatter())?
            .field_style(active, field, area)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Formatter;
    use formtree_config::DEFAULT_LAYOUT;
    use serde_json::json;
    use std::sync::Arc;

    fn layout(value: serde_json::Value) -> ResponsiveLayout {
        serde_json::from_value(value).expect("layout parses")
    }

    #[test]
    fn starts_at_largest_and_reports_changes_once() {
        let mut state = ResponsiveState::new(None, &Breakpoints::DEFAULT, DEFAULT_LAYOUT);
        assert_eq!(state.current(), Breakpoint::Xl);
        assert_eq!(state.measure(5000.0), None);
        assert_eq!(state.measure(400.0), Some(Breakpoint::S));
        assert_eq!(state.measure(410.0), None);
        assert_eq!(state.measure(100.0), Some(Breakpoint::Xs));
    }

    #[test]
    fn layout_breakpoints_override_base() {
        let responsive = layout(json!({"breakpoints": {"s": 900}}));
        let mut state = ResponsiveState::new(Some(&responsive), &Breakpoints::DEFAULT, DEFAULT_LAYOUT);
        assert_eq!(state.measure(800.0), Some(Breakpoint::S));
    }

    #[test]
    fn grid_scan_falls_back_to_smaller_sizes() {
        let responsive = layout(json!({
            "grids": {"xs": "grid-template-columns:1fr", "m": "grid-template-columns:1fr 1fr"}
        }));
        let registry = Registry::new();
        let mut state = ResponsiveState::new(Some(&responsive), &Breakpoints::DEFAULT, DEFAULT_LAYOUT);
        assert_eq!(state.container_style(&registry, &[]), "grid-template-columns:1fr 1fr");
        state.measure(600.0);
        assert_eq!(state.current(), Breakpoint::M);
        state.measure(400.0);
        assert_eq!(state.container_style(&registry, &[]), "grid-template-columns:1fr");
    }

    #[test]
    fn default_grid_without_layout() {
        let state = ResponsiveState::new(None, &Breakpoints::DEFAULT, DEFAULT_LAYOUT);
        assert_eq!(state.container_style(&Registry::new(), &[]), DEFAULT_LAYOUT);
        assert_eq!(state.section_style(), None);
    }

    struct Fixed;

    impl Formatter for Fixed {
        fn container_style(&self, _layout: &Layout, fields: &[FieldDefinition]) -> String {
            format!("columns:{}", fields.len())
        }
    }

    #[test]
    fn formatter_layout_wins_over_grid() {
        let responsive = layout(json!({
            "grids": {"xs": "grid-template-columns:1fr"},
            "sizes": {"xl": {"formatter": "columns", "columns": [1, 2]}}
        }));
        let mut registry = Registry::new();
        let state = ResponsiveState::new(Some(&responsive), &Breakpoints::DEFAULT, DEFAULT_LAYOUT);
        assert_eq!(state.container_style(&registry, &[]), "grid-template-columns:1fr");
        registry.register_formatter("columns", Arc::new(Fixed));
        let fields = [FieldDefinition::new("string")];
        assert_eq!(state.container_style(&registry, &fields), "columns:1");
        assert_eq!(state.field_style(&registry, &fields[0], "string0"), None);
    }
}
