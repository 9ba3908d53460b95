//! Core domain logic and pipeline orchestration for reviewpress.
//!
//! The [`pipeline::generate`] entry point turns one article document into a
//! static page and, optionally, folds it into the cumulative site index.

pub mod assembler;
pub mod assets;
pub mod index;
pub mod pipeline;
pub mod rating;
pub mod render;
pub mod validate;
