//! Leaf renderers for the `native`, `material` and `vaadin` libraries,
//! the built-in layout formatters and the default validation messages.

pub mod formatters;
pub mod leaf;
pub mod material;
pub mod messages;
pub mod native;
pub mod vaadin;
pub mod validity;

use formtree_engine::Registry;

pub use leaf::{LeafField, Widget};
pub use validity::{Constraints, InputKind, Validity};

/// Install every library, the formatters and the English messages. The
/// first library installed is `native`.
pub fn install_all(registry: &mut Registry) {
    native::install(registry);
    material::install(registry);
    vaadin::install(registry);
    formatters::install(registry);
    messages::install(registry);
}

/// Registry with everything from [`install_all`].
pub fn registry() -> Registry {
    let mut registry = Registry::new();
    install_all(&mut registry);
    registry
}
