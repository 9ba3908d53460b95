//! Shared types, error model, and configuration for reviewpress.
//!
//! This crate is the foundation depended on by all other reviewpress crates.
//! It provides:
//! - [`ReviewPressError`] as the unified error type
//! - Domain types ([`ArticleDocument`], [`IndexEntry`], [`IndexState`], [`Slug`])
//! - Configuration ([`AppConfig`], [`SiteConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, PathsSection, SiteConfig, SiteSection, config_dir, config_file_path, load_config,
    load_config_from,
};
pub use error::{ReviewPressError, Result, SchemaViolation};
pub use types::{
    AggregateRating, ArticleDocument, ArticleRecord, CURRENT_SCHEMA_VERSION, IndexEntry,
    IndexFile, IndexState, InvalidSlug, MAX_RATING, ResolvedImage, ReviewRecord, Slug,
};
