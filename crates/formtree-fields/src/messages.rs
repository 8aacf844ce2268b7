//! Built-in validation messages.

use formtree_engine::{Registry, RenderContext};

use crate::validity::Constraints;

pub const ENGLISH: [(&str, &str); 7] = [
    ("valueMissing", "Please fill out this field."),
    ("tooLong", "Please use at most {maxlength} characters."),
    ("rangeUnderflow", "Value must be greater than or equal to {min}."),
    ("rangeOverflow", "Value must be less than or equal to {max}."),
    ("typeMismatch", "Please enter a valid value."),
    ("badInput", "The value could not be understood."),
    ("patternMismatch", "Please match the requested format."),
];

/// Register the English catalog under `en`.
pub fn install(registry: &mut Registry) {
    registry.register_messages("en", ENGLISH);
}

/// Message for the failed check `key` in the form's locale, falling back
/// to English, with the field's limits filled in.
pub fn validation_message(context: &RenderContext, key: &str, constraints: &Constraints) -> String {
    let template = context
        .translate(key)
        .or_else(|| {
            ENGLISH
                .iter()
                .find(|(candidate, _)| *candidate == key)
                .map(|(_, text)| *text)
        })
        .unwrap_or(key);
    let mut message = template.to_string();
    if let Some(maxlength) = constraints.maxlength {
        message = message.replace("{maxlength}", &maxlength.to_string());
    }
    if let Some(min) = constraints.min {
        message = message.replace("{min}", &min.to_string());
    }
    if let Some(max) = constraints.max {
        message = message.replace("{max}", &max.to_string());
    }
    message
}
