//! Template rendering for article and index pages.
//!
//! Wraps a [`Handlebars`] registry preloaded with the built-in templates.
//! A templates directory may replace either one by providing a file named
//! after [`TemplateId::file_name`]. HTML escaping is always on; templates opt
//! out per value with triple braces (used only for the inlined stylesheet).

use std::path::Path;

use handlebars::Handlebars;
use serde::Serialize;
use tracing::{debug, instrument};

use reviewpress_shared::{Result, ReviewPressError};

const ARTICLE_TEMPLATE: &str = include_str!("../templates/article.html.hbs");
const INDEX_TEMPLATE: &str = include_str!("../templates/index.html.hbs");

/// The pages the generator knows how to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateId {
    Article,
    Index,
}

impl TemplateId {
    pub const ALL: [TemplateId; 2] = [TemplateId::Article, TemplateId::Index];

    /// Registry name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Article => "article",
            Self::Index => "index",
        }
    }

    /// File name looked up in a templates override directory.
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Article => "article.html.hbs",
            Self::Index => "index.html.hbs",
        }
    }

    fn builtin_source(self) -> &'static str {
        match self {
            Self::Article => ARTICLE_TEMPLATE,
            Self::Index => INDEX_TEMPLATE,
        }
    }
}

/// A compiled set of page templates.
pub struct Templates {
    registry: Handlebars<'static>,
}

impl Templates {
    /// Only the templates compiled into the binary.
    pub fn builtin() -> Result<Self> {
        Self::load(None)
    }

    /// Built-in templates, with per-template overrides read from `dir`.
    #[instrument(skip_all, fields(dir = ?dir))]
    pub fn load(dir: Option<&Path>) -> Result<Self> {
        if let Some(dir) = dir {
            if !dir.is_dir() {
                return Err(ReviewPressError::config(format!(
                    "templates directory {} does not exist",
                    dir.display()
                )));
            }
        }

        let mut registry = Handlebars::new();
        registry.register_escape_fn(handlebars::html_escape);

        for id in TemplateId::ALL {
            let source = match dir.map(|d| d.join(id.file_name())) {
                Some(path) if path.is_file() => {
                    debug!(template = id.name(), path = %path.display(), "using template override");
                    std::fs::read_to_string(&path).map_err(|e| ReviewPressError::io(&path, e))?
                }
                _ => id.builtin_source().to_string(),
            };

            registry
                .register_template_string(id.name(), source)
                .map_err(|e| {
                    ReviewPressError::Template(format!("{} template: {e}", id.name()))
                })?;
        }

        Ok(Self { registry })
    }

    /// Render the page model `data` with template `id`.
    pub fn render<T: Serialize>(&self, id: TemplateId, data: &T) -> Result<String> {
        self.registry
            .render(id.name(), data)
            .map_err(|e| ReviewPressError::Template(format!("{} template: {e}", id.name())))
    }
}

impl std::fmt::Debug for Templates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Templates").finish_non_exhaustive()
    }
}
