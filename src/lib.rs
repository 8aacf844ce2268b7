//! Schema-driven form engine.
//!
//! A [`FieldDefinition`] tree is composed into renderers taken from a
//! [`Registry`], bound to one JSON value and one error map. The tree is
//! headless: [`Form::render`] returns [`RenderNode`]s for a host to draw,
//! and the host feeds user input back as [`Action`]s addressed by path.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;

pub use formtree_config as config;
pub use formtree_engine as engine;
pub use formtree_fields as fields;
pub use formtree_io as io;
pub use formtree_ir as ir;

pub use formtree_config::FormtreeConfig;
pub use formtree_engine::{
    EventResult, Form, FormEvent, FormOptions, Registry, RenderContext, RenderNode,
};
pub use formtree_fields::install_all;
pub use formtree_io::{DocumentLoader, LoadError, LoadResult};
pub use formtree_ir::{
    Action, Breakpoint, ErrorMap, FieldDefinition, FieldError, FieldPath, FormDocument,
};

pub mod prelude {
    pub use crate::{
        Action, DocumentLoader, ErrorMap, FieldDefinition, FieldError, FieldPath, Form,
        FormDocument, FormEvent, FormOptions, FormtreeConfig, Registry, RenderNode,
    };
}

/// Registry with every built-in library, its default-library policy
/// taken from `config`.
pub fn configured_registry(config: &FormtreeConfig) -> Registry {
    let mut registry = formtree_fields::registry();
    registry.configure(&config.registry);
    registry
}

/// Form for `options`, with breakpoints and locale taken from `config`.
pub fn open(registry: Arc<Registry>, config: &FormtreeConfig, options: FormOptions) -> Form {
    let context = RenderContext::new(registry)
        .configured(config)
        .with_library(options.library)
        .with_settings(options.settings);
    Form::with_context(context, options.definition, options.value)
}

/// Form for `document` using the built-in libraries.
pub fn open_document(config: &FormtreeConfig, document: &FormDocument) -> Form {
    open(
        Arc::new(configured_registry(config)),
        config,
        FormOptions::from(document),
    )
}

/// Read, validate and open the document at `path`.
pub fn open_file(config: &FormtreeConfig, path: &Path) -> anyhow::Result<Form> {
    let document = FormDocument::from_path(path)
        .with_context(|| format!("failed to open form {}", path.display()))?;
    Ok(open_document(config, &document))
}
