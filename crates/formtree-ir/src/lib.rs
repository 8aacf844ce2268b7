//! Data model for schema-driven forms: field definitions, value and error
//! addressing, responsive layout configuration and form documents.

pub mod definition;
pub mod document;
pub mod errors;
pub mod event;
pub mod layout;
pub mod path;
pub mod schema;
pub mod value;

pub use definition::{FieldDefinition, FieldKind, ListOption, Selection};
pub use document::FormDocument;
pub use errors::{ErrorMap, FieldError};
pub use event::{Action, ActionKind, ChangeEvent, ChangeKind, InvalidEvent, LayoutChangedEvent};
pub use layout::{Breakpoint, Breakpoints, Layout, ResponsiveLayout, Thresholds};
pub use path::{FieldPath, PathError, Segment};
