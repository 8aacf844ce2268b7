//! Library and component registry.
//!
//! A [`Registry`] maps `(library, type tag)` to a renderer factory and keeps
//! the auxiliary tables renderers consult (icons, categories, layout
//! formatters, localized messages and property editors). It is a plain value
//! that can be built per form or shared; [`global`] offers a process-wide
//! instance for widget modules that register themselves.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use formtree_config::RegistryConfig;
use formtree_ir::{FieldDefinition, Layout};

use crate::compose::FieldInit;
use crate::field::Field;

pub type FieldFactory = Arc<dyn Fn(FieldInit) -> Box<dyn Field> + Send + Sync>;

/// Registration of one renderer.
#[derive(Clone)]
pub struct Component {
    pub factory: FieldFactory,
    /// Modules a host must load before the renderer is usable.
    pub import_path: Vec<String>,
    pub module: Option<String>,
    pub focusable: bool,
}

impl Component {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn(FieldInit) -> Box<dyn Field> + Send + Sync + 'static,
    {
        Self {
            factory: Arc::new(factory),
            import_path: Vec::new(),
            module: None,
            focusable: true,
        }
    }

    pub fn with_import_path(mut self, path: impl Into<String>) -> Self {
        self.import_path.push(path.into());
        self
    }

    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    pub fn focusable(mut self, focusable: bool) -> Self {
        self.focusable = focusable;
        self
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("import_path", &self.import_path)
            .field("module", &self.module)
            .field("focusable", &self.focusable)
            .finish_non_exhaustive()
    }
}

/// Named set of renderers implementing the field contract with one widget set.
#[derive(Debug, Clone, Default)]
pub struct Library {
    name: String,
    components: BTreeMap<String, Component>,
}

impl Library {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            components: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Insert or overwrite the renderer for `type_tag`; the last
    /// registration wins.
    pub fn register_component(
        &mut self,
        type_tag: impl Into<String>,
        component: Component,
    ) -> Option<Component> {
        self.components.insert(type_tag.into(), component)
    }

    pub fn component(&self, type_tag: &str) -> Option<&Component> {
        self.components.get(type_tag)
    }

    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.components.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

/// How the library of a form that names none is chosen.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DefaultLibrary {
    /// The library that was registered first.
    #[default]
    FirstRegistered,
    Named(String),
}

/// Turns a responsive [`Layout`] into styles for a container and its fields.
pub trait Formatter: Send + Sync {
    fn container_style(&self, layout: &Layout, fields: &[FieldDefinition]) -> String;

    /// Placement of `field`, known to its container as grid area `area`.
    fn field_style(&self, layout: &Layout, field: &FieldDefinition, area: &str) -> Option<String> {
        let _ = (layout, field, area);
        None
    }
}

/// Palette entry grouping field types for editors.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Category {
    pub name: String,
    pub icon: Option<String>,
    pub types: Vec<String>,
}

/// Named alternative rendering of a field type, with the editor that
/// configures it.
#[derive(Debug, Clone, PartialEq)]
pub struct Renderer {
    pub type_tag: String,
    pub editor: FieldDefinition,
}

#[derive(Clone, Default)]
pub struct Registry {
    libraries: Vec<Library>,
    default_library: DefaultLibrary,
    icons: BTreeMap<String, String>,
    categories: BTreeMap<String, Category>,
    formatters: BTreeMap<String, Arc<dyn Formatter>>,
    messages: BTreeMap<String, BTreeMap<String, String>>,
    editors: BTreeMap<String, FieldDefinition>,
    renderers: BTreeMap<String, Renderer>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("libraries", &self.libraries)
            .field("default_library", &self.default_library)
            .field("icons", &self.icons.keys().collect::<Vec<_>>())
            .field("categories", &self.categories)
            .field("formatters", &self.formatters.keys().collect::<Vec<_>>())
            .field("messages", &self.messages.keys().collect::<Vec<_>>())
            .field("editors", &self.editors.keys().collect::<Vec<_>>())
            .field("renderers", &self.renderers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_library(mut self, policy: DefaultLibrary) -> Self {
        self.default_library = policy;
        self
    }

    pub fn set_default_library(&mut self, policy: DefaultLibrary) {
        self.default_library = policy;
    }

    /// Apply the `[registry]` section of the configuration.
    pub fn configure(&mut self, config: &RegistryConfig) {
        self.default_library = match &config.default_library {
            Some(name) => DefaultLibrary::Named(name.clone()),
            None => DefaultLibrary::FirstRegistered,
        };
    }

    /// The library called `name`, created empty on first use.
    pub fn get_library(&mut self, name: &str) -> &mut Library {
        let index = match self.libraries.iter().position(|lib| lib.name == name) {
            Some(index) => index,
            None => {
                tracing::debug!(library = name, "creating renderer library");
                self.libraries.push(Library::new(name));
                self.libraries.len() - 1
            }
        };
        &mut self.libraries[index]
    }

    pub fn library(&self, name: &str) -> Option<&Library> {
        self.libraries.iter().find(|lib| lib.name == name)
    }

    /// Libraries in registration order.
    pub fn libraries(&self) -> impl Iterator<Item = &Library> {
        self.libraries.iter()
    }

    pub fn register_component(
        &mut self,
        library: &str,
        type_tag: impl Into<String>,
        component: Component,
    ) -> Option<Component> {
        self.get_library(library).register_component(type_tag, component)
    }

    /// Library used when a form names none, per the configured policy.
    pub fn default_library(&self) -> Option<&str> {
        match &self.default_library {
            DefaultLibrary::FirstRegistered => self.libraries.first().map(Library::name),
            DefaultLibrary::Named(name) => Some(name.as_str()),
        }
    }

    pub fn resolve(&self, library: &str, type_tag: &str) -> Option<&Component> {
        self.library(library)?.component(type_tag)
    }

    pub fn register_icon(&mut self, name: impl Into<String>, icon: impl Into<String>) {
        self.icons.insert(name.into(), icon.into());
    }

    pub fn icon(&self, name: &str) -> Option<&str> {
        self.icons.get(name).map(String::as_str)
    }

    pub fn add_category(&mut self, category: Category) {
        self.categories.insert(category.name.clone(), category);
    }

    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.get(name)
    }

    pub fn categories(&self) -> impl Iterator<Item = &Category> {
        self.categories.values()
    }

    pub fn register_formatter(&mut self, name: impl Into<String>, formatter: Arc<dyn Formatter>) {
        self.formatters.insert(name.into(), formatter);
    }

    pub fn formatter(&self, name: &str) -> Option<&dyn Formatter> {
        self.formatters.get(name).map(|formatter| formatter.as_ref())
    }

    /// Add or replace messages of `locale`.
    pub fn register_messages<I, K, V>(&mut self, locale: &str, messages: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let catalog = self.messages.entry(locale.to_string()).or_default();
        for (key, text) in messages {
            catalog.insert(key.into(), text.into());
        }
    }

    pub fn translate(&self, locale: &str, key: &str) -> Option<&str> {
        self.messages
            .get(locale)
            .and_then(|catalog| catalog.get(key))
            .map(String::as_str)
    }

    /// Definition of the property editor for fields of `type_tag`.
    pub fn register_editor(&mut self, type_tag: impl Into<String>, editor: FieldDefinition) {
        self.editors.insert(type_tag.into(), editor);
    }

    pub fn editor(&self, type_tag: &str) -> Option<&FieldDefinition> {
        self.editors.get(type_tag)
    }

    pub fn register_renderer(&mut self, name: impl Into<String>, renderer: Renderer) {
        self.renderers.insert(name.into(), renderer);
    }

    pub fn renderer(&self, name: &str) -> Option<&Renderer> {
        self.renderers.get(name)
    }

    pub fn renderers(&self) -> impl Iterator<Item = (&str, &Renderer)> {
        self.renderers
            .iter()
            .map(|(name, renderer)| (name.as_str(), renderer))
    }
}

/// Process-wide registry for self-registering widget modules.
///
/// Tests that touch it should call [`global::reset`] first.
pub mod global {
    use std::sync::{Arc, OnceLock, PoisonError, RwLock};

    use super::Registry;

    static REGISTRY: OnceLock<RwLock<Registry>> = OnceLock::new();

    fn cell() -> &'static RwLock<Registry> {
        REGISTRY.get_or_init(|| RwLock::new(Registry::new()))
    }

    pub fn with<R>(f: impl FnOnce(&Registry) -> R) -> R {
        let guard = cell().read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    pub fn update<R>(f: impl FnOnce(&mut Registry) -> R) -> R {
        let mut guard = cell().write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    /// Copy of the current state, suitable for building forms.
    pub fn snapshot() -> Arc<Registry> {
        Arc::new(with(Registry::clone))
    }

    pub fn reset() {
        update(|registry| *registry = Registry::new());
    }
}
