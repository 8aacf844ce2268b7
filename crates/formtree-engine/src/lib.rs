//! Composition engine for schema-driven forms.
//!
//! A [`Registry`] maps type tags to renderer factories per library. A
//! [`Form`] resolves its definition tree against the registry, keeps the
//! whole value and error map, and routes user actions, validation and
//! layout measurements through the rendered tree.

pub mod compose;
pub mod error;
pub mod field;
pub mod fields;
pub mod form;
pub mod layout;
pub mod registry;

pub use compose::{
    Child, Children, CompositeState, FieldInit, Relation, RenderContext, Scope, ScopeState,
    create_field,
};
pub use error::ComposeError;
pub use field::{Detached, EventResult, Field, FieldListener, RenderNode};
pub use fields::register_composites;
pub use form::{Form, FormEvent, FormOptions};
pub use layout::ResponsiveState;
pub use registry::{
    Category, Component, DefaultLibrary, FieldFactory, Formatter, Library, Registry, Renderer,
};
