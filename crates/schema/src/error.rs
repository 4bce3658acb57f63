use thiserror::Error;

/// A descriptor that can never validate anything, reported when the schema is built.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("union at '{path}' has no variants")]
    EmptyUnion { path: String },

    #[error("literal at '{path}' must be a string, number, boolean or null, found: {literal}")]
    InvalidLiteral { path: String, literal: String },

    #[error("struct at '{path}' declares a field with an empty name")]
    EmptyFieldName { path: String },
}

impl SchemaError {
    pub(crate) fn empty_union(path: &[String]) -> Self {
        Self::EmptyUnion { path: join(path) }
    }

    pub(crate) fn invalid_literal<S: ToString>(path: &[String], literal: S) -> Self {
        Self::InvalidLiteral { path: join(path), literal: literal.to_string() }
    }

    pub(crate) fn empty_field_name(path: &[String]) -> Self {
        Self::EmptyFieldName { path: join(path) }
    }
}

/// A candidate value that does not satisfy its schema.
///
/// `path` locates the offending value from the root, one entry per struct key, record key
/// or list index.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", render(.path, .message))]
pub struct ValidationError {
    path: Vec<String>,
    message: String,
}

impl ValidationError {
    pub fn new<S: ToString>(path: &[String], message: S) -> Self {
        Self { path: path.to_vec(), message: message.to_string() }
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

fn join(path: &[String]) -> String {
    if path.is_empty() { String::from("<root>") } else { path.join(".") }
}

fn render(path: &[String], message: &str) -> String {
    if path.is_empty() { message.to_string() } else { format!("{}: {}", path.join("."), message) }
}
