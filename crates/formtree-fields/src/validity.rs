//! Value coercion and constraint checks shared by every leaf widget.

use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use formtree_ir::{FieldDefinition, ListOption};
use regex::Regex;
use serde::Serialize;
use serde_json::{Number, Value};

/// Email shape accepted by browsers for `input[type=email]`.
static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$",
    )
    .expect("Invalid email regex")
});

static URL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*:\S+$").expect("Invalid URL regex"));

static COLOR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("Invalid color regex"));

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMATS: [&str; 2] = ["%H:%M:%S", "%H:%M"];
const DATE_TIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

/// Failed checks of one value, named after the browser's validity flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Validity {
    pub value_missing: bool,
    pub too_long: bool,
    pub range_underflow: bool,
    pub range_overflow: bool,
    pub type_mismatch: bool,
    pub bad_input: bool,
    pub pattern_mismatch: bool,
}

impl Validity {
    pub fn is_valid(&self) -> bool {
        self.failure().is_none()
    }

    /// Message key of the first failed check.
    pub fn failure(&self) -> Option<&'static str> {
        [
            (self.value_missing, "valueMissing"),
            (self.bad_input, "badInput"),
            (self.type_mismatch, "typeMismatch"),
            (self.too_long, "tooLong"),
            (self.range_underflow, "rangeUnderflow"),
            (self.range_overflow, "rangeOverflow"),
            (self.pattern_mismatch, "patternMismatch"),
        ]
        .into_iter()
        .find_map(|(failed, key)| failed.then_some(key))
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Constraints of a leaf, read once from its definition.
#[derive(Debug, Clone, Default)]
pub struct Constraints {
    pub required: bool,
    pub maxlength: Option<usize>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub pattern: Option<Regex>,
    /// Values of the declared options.
    pub options: Vec<String>,
    /// Values outside `options` are allowed.
    pub other: bool,
}

impl Constraints {
    pub fn from_definition(definition: &FieldDefinition) -> Self {
        let pattern = definition.pattern.as_deref().and_then(|pattern| {
            Regex::new(&format!("^(?:{pattern})$"))
                .inspect_err(|err| {
                    tracing::warn!(field = ?definition.name, pattern, error = %err, "ignoring invalid pattern")
                })
                .ok()
        });
        Self {
            required: definition.required,
            maxlength: definition.maxlength,
            min: definition.min,
            max: definition.max,
            pattern,
            options: definition
                .options
                .iter()
                .map(|option| option.value().to_string())
                .collect(),
            other: definition.other,
        }
    }
}

/// Behavior class of a leaf widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// Free text: string, text, password, search.
    Text,
    Email,
    Url,
    Phone,
    Color,
    Number,
    Date,
    Time,
    DateTime,
    /// Checkbox or toggle.
    Boolean,
    /// One value out of the options: list, multipleChoice.
    Choice,
    /// Any number of options: checkboxes.
    MultiChoice,
    /// Pressable control without a value of its own.
    Button,
    /// Static content: section, markup, image.
    Display,
}

impl InputKind {
    /// Whether the user edits a value through this widget.
    pub fn accepts_input(self) -> bool {
        !matches!(self, InputKind::Button | InputKind::Display)
    }

    pub fn is_focusable(self) -> bool {
        !matches!(self, InputKind::Display)
    }

    fn is_textual(self) -> bool {
        matches!(
            self,
            InputKind::Text
                | InputKind::Email
                | InputKind::Url
                | InputKind::Phone
                | InputKind::Color
                | InputKind::Date
                | InputKind::Time
                | InputKind::DateTime
        )
    }

    /// Bring a value from the host or the parent into this widget's shape.
    pub fn coerce(self, value: Value) -> Value {
        match self {
            kind if kind.is_textual() => match value {
                Value::Null | Value::String(_) => value,
                Value::Number(number) => Value::String(number.to_string()),
                Value::Bool(flag) => Value::String(flag.to_string()),
                _ => Value::Null,
            },
            InputKind::Number => match value {
                Value::String(text) => parse_number(&text),
                Value::Number(_) | Value::Null => value,
                _ => Value::Null,
            },
            InputKind::Boolean => match value {
                Value::Bool(_) | Value::Null => value,
                Value::String(text) => Value::Bool(matches!(text.as_str(), "true" | "on" | "1")),
                Value::Number(number) => Value::Bool(number.as_f64().is_some_and(|n| n != 0.0)),
                _ => Value::Null,
            },
            InputKind::Choice => match value {
                Value::Number(number) => Value::String(number.to_string()),
                Value::Null | Value::String(_) => value,
                _ => Value::Null,
            },
            InputKind::MultiChoice => match value {
                Value::Array(items) => Value::Array(
                    items
                        .into_iter()
                        .filter_map(|item| match item {
                            Value::String(_) => Some(item),
                            Value::Number(number) => Some(Value::String(number.to_string())),
                            _ => None,
                        })
                        .collect(),
                ),
                Value::String(text) if text.is_empty() => Value::Array(Vec::new()),
                Value::String(text) => Value::Array(vec![Value::String(text)]),
                _ => Value::Null,
            },
            _ => Value::Null,
        }
    }

    /// Check `value` against `constraints`.
    pub fn check(self, constraints: &Constraints, value: &Value) -> Validity {
        let mut validity = Validity::default();
        if !self.accepts_input() {
            return validity;
        }
        if is_empty(self, value) {
            validity.value_missing = constraints.required;
            return validity;
        }
        match (self, value) {
            (InputKind::Number, Value::String(_)) => validity.bad_input = true,
            (InputKind::Number, Value::Number(number)) => {
                let number = number.as_f64().unwrap_or_default();
                validity.range_underflow = constraints.min.is_some_and(|min| number < min);
                validity.range_overflow = constraints.max.is_some_and(|max| number > max);
            }
            (InputKind::Choice, Value::String(choice)) => {
                validity.type_mismatch = !constraints.other && !constraints.options.contains(choice);
            }
            (InputKind::MultiChoice, Value::Array(items)) => {
                validity.type_mismatch = !constraints.other
                    && items.iter().filter_map(Value::as_str).any(|item| {
                        !constraints.options.iter().any(|option| option == item)
                    });
            }
            (kind, Value::String(text)) if kind.is_textual() => {
                check_text(kind, constraints, text, &mut validity)
            }
            _ => {}
        }
        validity
    }
}

fn check_text(kind: InputKind, constraints: &Constraints, text: &str, validity: &mut Validity) {
    validity.too_long = constraints
        .maxlength
        .is_some_and(|maxlength| text.chars().count() > maxlength);
    match kind {
        InputKind::Email => validity.type_mismatch = !EMAIL_REGEX.is_match(text),
        InputKind::Url => validity.type_mismatch = !URL_REGEX.is_match(text),
        InputKind::Color => validity.type_mismatch = !COLOR_REGEX.is_match(text),
        InputKind::Date => validity.bad_input = NaiveDate::parse_from_str(text, DATE_FORMAT).is_err(),
        InputKind::Time => {
            validity.bad_input = !TIME_FORMATS
                .iter()
                .any(|format| NaiveTime::parse_from_str(text, format).is_ok())
        }
        InputKind::DateTime => {
            validity.bad_input = !DATE_TIME_FORMATS
                .iter()
                .any(|format| NaiveDateTime::parse_from_str(text, format).is_ok())
        }
        _ => {}
    }
    if let Some(pattern) = &constraints.pattern {
        validity.pattern_mismatch = !pattern.is_match(text);
    }
}

fn is_empty(kind: InputKind, value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Bool(checked) => kind == InputKind::Boolean && !checked,
        _ => false,
    }
}

/// Integer or float from user text. Empty text clears the value; anything
/// unparsable is kept so it can be reported as bad input.
fn parse_number(text: &str) -> Value {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    if let Ok(integer) = trimmed.parse::<i64>() {
        return Value::Number(integer.into());
    }
    trimmed
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(text.to_string()))
}

/// Label and value of every option, as a host renders them.
pub fn option_entries(options: &[ListOption]) -> Value {
    Value::Array(
        options
            .iter()
            .map(|option| {
                serde_json::json!({
                    "label": option.label(),
                    "value": option.value(),
                })
            })
            .collect(),
    )
}
