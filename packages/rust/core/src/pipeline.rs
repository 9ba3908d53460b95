//! End-to-end `generate` pipeline: document → validate → resolve → aggregate → render → write.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{info, instrument, warn};

use reviewpress_shared::{IndexState, Result, ReviewPressError, SiteConfig, Slug};
use reviewpress_templates::Templates;

use crate::assembler::{self, WrittenFile};
use crate::{assets, index, rating, render, validate};

/// Configuration for one `generate` run.
#[derive(Debug, Clone)]
pub struct GenerateConfig {
    /// Article document (YAML or JSON).
    pub input: PathBuf,
    /// Directory all image paths are resolved against.
    pub images_root: PathBuf,
    /// Output directory, created if absent.
    pub out_dir: PathBuf,
    /// Load, merge, and persist the cumulative index.
    pub update_index: bool,
    /// Reseed the index from sidecars instead of `index.json`. Implies `update_index`.
    pub rebuild_index: bool,
    /// Merged presentation settings.
    pub site: SiteConfig,
}

/// What happened to the index step of a run.
#[derive(Debug)]
pub enum IndexOutcome {
    /// `--index` was not requested; the index was not read or written.
    Skipped,
    /// The index page and state were written.
    Updated { page: WrittenFile, entries: usize },
    /// The article was written but the index step failed.
    Failed(ReviewPressError),
}

/// Result of the `generate` pipeline.
#[derive(Debug)]
pub struct GenerateReport {
    pub slug: Slug,
    pub article: WrittenFile,
    /// `<slug>.meta.json`, or why it could not be written.
    pub sidecar: Result<PathBuf>,
    /// Declared paths of images that did not resolve.
    pub missing_images: Vec<String>,
    pub index: IndexOutcome,
    pub elapsed: Duration,
}

impl GenerateReport {
    /// True when the article was written but its sidecar or the index step failed.
    pub fn is_partial(&self) -> bool {
        self.sidecar.is_err() || matches!(self.index, IndexOutcome::Failed(_))
    }
}

/// Run the full `generate` pipeline.
///
/// 1. Load and validate the document (nothing is written on failure)
/// 2. Load templates and the optional stylesheet
/// 3. Resolve images and aggregate ratings
/// 4. Render and write the article page and its sidecar
/// 5. Optionally merge into the index and rewrite `index.html`
#[instrument(skip_all, fields(input = %config.input.display(), out = %config.out_dir.display()))]
pub fn generate(config: &GenerateConfig) -> Result<GenerateReport> {
    let start = Instant::now();

    // --- Phase 1: Validate ---
    let document = validate::load_document(&config.input)?;
    let slug = document.article.slug.clone();
    info!(%slug, reviews = document.reviews.len(), "document validated");

    // --- Phase 2: Presentation ---
    let templates = Templates::load(config.site.templates_dir.as_deref())?;
    let styles = render::load_styles(config.site.assets_dir.as_deref())?;

    // --- Phase 3: Resolve + aggregate ---
    let resolved = assets::resolve_article_assets(&document, &config.images_root);
    let missing_images: Vec<String> = resolved
        .missing()
        .map(|img| img.declared_path.clone())
        .collect();
    let aggregate = rating::aggregate(&document.reviews);
    info!(
        mean = %aggregate.display_mean(),
        count = aggregate.count,
        missing_images = missing_images.len(),
        "article prepared"
    );

    // --- Phase 4: Render + write article ---
    let page = render::build_article_page(
        &document,
        &resolved,
        &aggregate,
        &config.site,
        styles.as_deref(),
    );
    let rendered = render::render_article(&page, &templates)?;

    assembler::ensure_out_dir(&config.out_dir)?;
    let article = assembler::write_page(&config.out_dir, &rendered)?;

    let entry = index::project_entry(&document, &resolved, &aggregate, &config.site);
    let sidecar = index::write_sidecar(&config.out_dir, &entry)
        .inspect_err(|e| warn!(error = %e, "sidecar write failed, article was still written"));
    info!(path = %article.path.display(), "article written");

    // --- Phase 5: Index ---
    let index = if config.update_index || config.rebuild_index {
        match update_index(config, &templates, styles.as_deref(), entry) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "index step failed, article was still written");
                IndexOutcome::Failed(e)
            }
        }
    } else {
        IndexOutcome::Skipped
    };

    let report = GenerateReport {
        slug,
        article,
        sidecar,
        missing_images,
        index,
        elapsed: start.elapsed(),
    };

    info!(
        slug = %report.slug,
        partial = report.is_partial(),
        elapsed_ms = report.elapsed.as_millis(),
        "generate pipeline complete"
    );

    Ok(report)
}

fn update_index(
    config: &GenerateConfig,
    templates: &Templates,
    styles: Option<&str>,
    entry: reviewpress_shared::IndexEntry,
) -> Result<IndexOutcome> {
    let existing: IndexState = if config.rebuild_index {
        index::rebuild_from_sidecars(&config.out_dir)?
    } else {
        index::load_index(&config.out_dir)?
    };

    let state = index::merge(existing, entry);
    let page = render::build_index_page(&state, &config.site, styles);
    let rendered = render::render_index(&page, templates)?;
    let written = index::persist_index(&config.out_dir, &state, &rendered)?;

    Ok(IndexOutcome::Updated {
        page: written,
        entries: state.len(),
    })
}
