use formtree_ir::FieldPath;

/// Why a definition node could not be turned into a renderer.
///
/// These are recoverable: the composite that hit one logs it and renders
/// its remaining children.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ComposeError {
    #[error("no renderer library registered")]
    NoLibrary,
    #[error("unknown library `{0}`")]
    UnknownLibrary(String),
    #[error("library `{library}` has no renderer for type `{type_tag}` at `{path}`")]
    UnknownType {
        library: String,
        type_tag: String,
        path: FieldPath,
    },
}
