//! Responsive layout model: breakpoint sizes, thresholds and per-size layouts.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Named size classes, ordered from smallest to largest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Breakpoint {
    Xxs,
    Xs,
    S,
    M,
    L,
    Xl,
    Xxl,
}

impl Breakpoint {
    /// Sizes evaluated during width detection, in ascending order.
    pub const SUPPORTED: [Breakpoint; 5] = [
        Breakpoint::Xs,
        Breakpoint::S,
        Breakpoint::M,
        Breakpoint::L,
        Breakpoint::Xl,
    ];

    /// Largest supported size, used before any measurement exists.
    pub const LARGEST: Breakpoint = Breakpoint::Xl;

    pub const fn label(self) -> &'static str {
        match self {
            Breakpoint::Xxs => "xxs",
            Breakpoint::Xs => "xs",
            Breakpoint::S => "s",
            Breakpoint::M => "m",
            Breakpoint::L => "l",
            Breakpoint::Xl => "xl",
            Breakpoint::Xxl => "xxl",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "xxs" => Some(Breakpoint::Xxs),
            "xs" => Some(Breakpoint::Xs),
            "s" => Some(Breakpoint::S),
            "m" => Some(Breakpoint::M),
            "l" => Some(Breakpoint::L),
            "xl" => Some(Breakpoint::Xl),
            "xxl" => Some(Breakpoint::Xxl),
            _ => None,
        }
    }
}

impl std::fmt::Display for Breakpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Pixel thresholds per size. Missing entries fall back to another set
/// (configuration, then [`Breakpoints::DEFAULT`]).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Breakpoints {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xxs: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xs: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub m: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub l: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xl: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xxl: Option<f64>,
}

impl Breakpoints {
    /// 320 / 568 / 768 / 1024 / 1366 pixels.
    pub const DEFAULT: Self = Self {
        xxs: None,
        xs: Some(320.0),
        s: Some(568.0),
        m: Some(768.0),
        l: Some(1024.0),
        xl: Some(1366.0),
        xxl: None,
    };

    pub fn get(&self, breakpoint: Breakpoint) -> Option<f64> {
        match breakpoint {
            Breakpoint::Xxs => self.xxs,
            Breakpoint::Xs => self.xs,
            Breakpoint::S => self.s,
            Breakpoint::M => self.m,
            Breakpoint::L => self.l,
            Breakpoint::Xl => self.xl,
            Breakpoint::Xxl => self.xxl,
        }
    }

    pub fn set(&mut self, breakpoint: Breakpoint, threshold: f64) {
        let slot = match breakpoint {
            Breakpoint::Xxs => &mut self.xxs,
            Breakpoint::Xs => &mut self.xs,
            Breakpoint::S => &mut self.s,
            Breakpoint::M => &mut self.m,
            Breakpoint::L => &mut self.l,
            Breakpoint::Xl => &mut self.xl,
            Breakpoint::Xxl => &mut self.xxl,
        };
        *slot = Some(threshold);
    }

    /// Entries of `self`, falling back to `fallback` and then to the defaults.
    pub fn or(&self, fallback: &Breakpoints) -> Breakpoints {
        let mut merged = Breakpoints::default();
        for breakpoint in [
            Breakpoint::Xxs,
            Breakpoint::Xs,
            Breakpoint::S,
            Breakpoint::M,
            Breakpoint::L,
            Breakpoint::Xl,
            Breakpoint::Xxl,
        ] {
            if let Some(threshold) = self
                .get(breakpoint)
                .or_else(|| fallback.get(breakpoint))
                .or_else(|| Breakpoints::DEFAULT.get(breakpoint))
            {
                merged.set(breakpoint, threshold);
            }
        }
        merged
    }

    /// Effective thresholds of the supported sizes.
    ///
    /// Values are made non-decreasing so that a wider measurement never
    /// resolves to a smaller size.
    pub fn thresholds(&self) -> Thresholds {
        let resolved = self.or(&Breakpoints::DEFAULT);
        let mut entries = [(Breakpoint::Xs, 0.0); 5];
        let mut floor = f64::MIN;
        for (slot, breakpoint) in entries.iter_mut().zip(Breakpoint::SUPPORTED) {
            let threshold = resolved.get(breakpoint).unwrap_or(floor).max(floor);
            floor = threshold;
            *slot = (breakpoint, threshold);
        }
        Thresholds { entries }
    }
}

/// Sanitized thresholds of the supported sizes in ascending order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    entries: [(Breakpoint, f64); 5],
}

impl Thresholds {
    pub fn entries(&self) -> &[(Breakpoint, f64); 5] {
        &self.entries
    }

    /// First size whose threshold exceeds `width`, else the largest.
    pub fn classify(&self, width: f64) -> Breakpoint {
        self.entries
            .iter()
            .find(|(_, threshold)| *threshold > width)
            .map(|(breakpoint, _)| *breakpoint)
            .unwrap_or(Breakpoint::LARGEST)
    }
}

/// Layout of a composite for one breakpoint, interpreted by a named formatter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "formatter", rename_all = "camelCase")]
pub enum Layout {
    Columns {
        #[serde(default)]
        columns: Vec<f64>,
    },
    #[serde(rename_all = "camelCase")]
    Areas {
        #[serde(default)]
        columns: Vec<f64>,
        #[serde(default)]
        areas: Vec<String>,
    },
    #[serde(rename_all = "camelCase")]
    Table {
        #[serde(default)]
        columns: Vec<TableColumn>,
        #[serde(default)]
        #[serde(skip_serializing_if = "Option::is_none")]
        vertical: Option<String>,
        #[serde(default)]
        #[serde(skip_serializing_if = "Option::is_none")]
        row_height: Option<String>,
        #[serde(default)]
        #[serde(skip_serializing_if = "Option::is_none")]
        fixed_columns: Option<usize>,
    },
    Toolbar {
        #[serde(default)]
        #[serde(skip_serializing_if = "Option::is_none")]
        horizontal: Option<String>,
        #[serde(default)]
        #[serde(skip_serializing_if = "Option::is_none")]
        vertical: Option<String>,
        #[serde(default)]
        #[serde(skip_serializing_if = "Option::is_none")]
        wrap: Option<String>,
        #[serde(default)]
        grow: BTreeMap<String, f64>,
    },
}

impl Layout {
    pub fn formatter(&self) -> &'static str {
        match self {
            Layout::Columns { .. } => "columns",
            Layout::Areas { .. } => "areas",
            Layout::Table { .. } => "table",
            Layout::Toolbar { .. } => "toolbar",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableColumn {
    pub width: f64,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

/// Breakpoint-driven layout configuration of a composite field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponsiveLayout {
    /// Style of the section wrapping the composite.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakpoints: Option<Breakpoints>,
    /// Raw grid style per size.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub grids: BTreeMap<Breakpoint, String>,
    /// Formatter-based layout per size.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub sizes: BTreeMap<Breakpoint, Layout>,
}

impl ResponsiveLayout {
    /// Grid style in effect at `current`: the last one defined at or below it.
    pub fn grid_for(&self, current: Breakpoint) -> Option<&str> {
        last_defined(&self.grids, current).map(String::as_str)
    }

    /// Formatter layout in effect at `current`, same scan as [`Self::grid_for`].
    pub fn size_for(&self, current: Breakpoint) -> Option<&Layout> {
        last_defined(&self.sizes, current)
    }
}

fn last_defined<T>(map: &BTreeMap<Breakpoint, T>, current: Breakpoint) -> Option<&T> {
    let mut found = None;
    for breakpoint in Breakpoint::SUPPORTED {
        if let Some(entry) = map.get(&breakpoint) {
            found = Some(entry);
        }
        if breakpoint == current {
            break;
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classify_uses_first_exceeding_threshold() {
        let thresholds = Breakpoints::DEFAULT.thresholds();
        assert_eq!(thresholds.classify(100.0), Breakpoint::Xs);
        assert_eq!(thresholds.classify(320.0), Breakpoint::S);
        assert_eq!(thresholds.classify(700.0), Breakpoint::M);
        assert_eq!(thresholds.classify(1365.0), Breakpoint::Xl);
        assert_eq!(thresholds.classify(5000.0), Breakpoint::Xl);
    }

    #[test]
    fn overrides_fall_back_to_defaults() {
        let custom = Breakpoints {
            m: Some(900.0),
            ..Breakpoints::default()
        };
        let thresholds = custom.thresholds();
        assert_eq!(thresholds.classify(800.0), Breakpoint::M);
        assert_eq!(thresholds.classify(950.0), Breakpoint::L);
    }

    #[test]
    fn thresholds_are_made_monotonic() {
        let broken = Breakpoints {
            s: Some(1000.0),
            m: Some(600.0),
            ..Breakpoints::default()
        };
        let thresholds = broken.thresholds();
        let values: Vec<f64> = thresholds.entries().iter().map(|(_, t)| *t).collect();
        assert!(values.windows(2).all(|pair| pair[0] <= pair[1]));
        assert_eq!(thresholds.classify(700.0), Breakpoint::S);
    }

    #[test]
    fn grid_resolution_inherits_from_smaller_sizes() {
        let layout: ResponsiveLayout = serde_json::from_value(json!({
            "grids": {"xs": "grid-template-columns:1fr", "l": "grid-template-columns:1fr 1fr"}
        }))
        .unwrap();
        assert_eq!(layout.grid_for(Breakpoint::Xs), Some("grid-template-columns:1fr"));
        assert_eq!(layout.grid_for(Breakpoint::M), Some("grid-template-columns:1fr"));
        assert_eq!(layout.grid_for(Breakpoint::Xl), Some("grid-template-columns:1fr 1fr"));
    }

    #[test]
    fn sizes_parse_by_formatter_tag() {
        let layout: ResponsiveLayout = serde_json::from_value(json!({
            "sizes": {
                "s": {"formatter": "columns", "columns": [1.0]},
                "l": {"formatter": "areas", "columns": [1.0, 2.0], "areas": ["a b"]}
            }
        }))
        .unwrap();
        assert_eq!(layout.size_for(Breakpoint::M).map(Layout::formatter), Some("columns"));
        assert_eq!(layout.size_for(Breakpoint::Xl).map(Layout::formatter), Some("areas"));
        assert_eq!(layout.size_for(Breakpoint::Xs), None);
    }
}
