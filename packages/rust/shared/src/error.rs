//! Error types for reviewpress.
//!
//! Library crates use [`ReviewPressError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all reviewpress operations.
#[derive(Debug, thiserror::Error)]
pub enum ReviewPressError {
    /// The input document is not well-formed YAML/JSON.
    #[error("invalid document {path:?}: {message}")]
    InvalidDocument { path: PathBuf, message: String },

    /// The input document parsed but does not satisfy the article schema.
    #[error("schema violation in {path:?}: {violation}")]
    SchemaViolation {
        path: PathBuf,
        violation: SchemaViolation,
    },

    /// The persisted index artifact exists but cannot be trusted.
    #[error("corrupt index state {path:?}: {message}")]
    CorruptIndexState { path: PathBuf, message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Template registration or rendering error.
    #[error("template error: {0}")]
    Template(String),

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ReviewPressError>;

/// A single reason an input document was rejected.
///
/// `field` is a location inside the document such as `article.slug` or
/// `reviews[1].rating`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaViolation {
    #[error("{field}: required field is missing")]
    MissingField { field: String },

    #[error("{field}: must not be empty")]
    EmptyField { field: String },

    #[error("{field}: expected {expected}")]
    WrongType {
        field: String,
        expected: &'static str,
    },

    #[error("{field}: {slug:?} is not a valid slug (lowercase letters, digits and single hyphens)")]
    InvalidSlug { field: String, slug: String },

    #[error("reviews[{review}].rating: {value} is not a number in [0, 5]")]
    InvalidRating { review: usize, value: String },

    #[error("{field}: {value:?} is not a date (expected YYYY-MM-DD)")]
    InvalidDate { field: String, value: String },

    #[error("reviews: at least one review is required")]
    NoReviews,
}

impl ReviewPressError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create an invalid-document error for the file at `path`.
    pub fn invalid_document(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::InvalidDocument {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Attach the offending file to a schema violation.
    pub fn schema(path: impl Into<PathBuf>, violation: SchemaViolation) -> Self {
        Self::SchemaViolation {
            path: path.into(),
            violation,
        }
    }

    /// Create a corrupt-index error for the artifact at `path`.
    pub fn corrupt_index(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::CorruptIndexState {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
