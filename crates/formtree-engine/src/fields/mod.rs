//! Composite renderers shared by every library.

mod form;
mod repeating;
mod selectable;
mod table;

pub use form::FormField;
pub use repeating::RepeatingSectionField;
pub use selectable::SelectableSectionField;
pub use table::TableField;

use crate::registry::{Component, Registry};

/// Type tags handled by [`FormField`].
pub const FORM_TYPES: [&str; 5] = ["form", "object", "styledForm", "nestedForm", "toolbar"];

/// Register the composite renderers in `library`.
pub fn register_composites(registry: &mut Registry, library: &str) {
    let lib = registry.get_library(library);
    for type_tag in FORM_TYPES {
        lib.register_component(
            type_tag,
            Component::new(|init| Box::new(FormField::new(init)))
                .with_import_path("formtree_engine::fields::FormField")
                .focusable(false),
        );
    }
    for type_tag in ["repeatingSection", "repeating"] {
        lib.register_component(
            type_tag,
            Component::new(|init| Box::new(RepeatingSectionField::new(init)))
                .with_import_path("formtree_engine::fields::RepeatingSectionField")
                .focusable(false),
        );
    }
    lib.register_component(
        "selectableSection",
        Component::new(|init| Box::new(SelectableSectionField::new(init)))
            .with_import_path("formtree_engine::fields::SelectableSectionField")
            .focusable(false),
    );
    lib.register_component(
        "table",
        Component::new(|init| Box::new(TableField::new(init)))
            .with_import_path("formtree_engine::fields::TableField")
            .focusable(false),
    );
}
