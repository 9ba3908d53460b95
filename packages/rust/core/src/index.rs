//! Cumulative article index.
//!
//! The index is explicit state: [`load_index`] reads it, [`merge`] upserts
//! one entry, [`persist_index`] writes it back. Nothing is cached between
//! calls, and runs without `--index` never touch it.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use reviewpress_shared::{
    AggregateRating, ArticleDocument, CURRENT_SCHEMA_VERSION, IndexEntry, IndexFile, IndexState,
    Result, ReviewPressError, SiteConfig,
};

use crate::assembler::{self, WrittenFile};
use crate::assets::ResolvedAssets;
use crate::render::{RenderedPage, image_src};

/// File name of the persisted index state inside the output directory.
pub const INDEX_STATE_FILE: &str = "index.json";

const SIDECAR_SUFFIX: &str = ".meta.json";

/// Project an article and its computed rating into an index entry.
pub fn project_entry(
    document: &ArticleDocument,
    assets: &ResolvedAssets,
    rating: &AggregateRating,
    site: &SiteConfig,
) -> IndexEntry {
    let article = &document.article;
    IndexEntry {
        slug: article.slug.clone(),
        title: article.title.clone(),
        description: article.description.clone(),
        date: article.date,
        hero_image: assets
            .hero
            .as_ref()
            .filter(|img| img.exists)
            .map(|img| image_src(&site.image_base_url, img)),
        rating: rating.clone(),
        tags: article.tags.iter().cloned().collect(),
    }
}

/// Upsert `entry` by slug, then restore date-descending / slug-ascending order.
pub fn merge(existing: IndexState, entry: IndexEntry) -> IndexState {
    let mut entries: Vec<IndexEntry> = existing
        .entries
        .into_iter()
        .filter(|e| e.slug != entry.slug)
        .collect();
    entries.push(entry);
    sort_entries(&mut entries);
    IndexState { entries }
}

/// Canonical index order: newest first, ties broken by slug.
pub fn sort_entries(entries: &mut [IndexEntry]) {
    entries.sort_by(canonical_order);
}

fn canonical_order(a: &IndexEntry, b: &IndexEntry) -> Ordering {
    b.date.cmp(&a.date).then_with(|| a.slug.cmp(&b.slug))
}

/// Load `<out_dir>/index.json`. A missing file is an empty index; anything
/// unreadable, unparsable, or inconsistent is [`ReviewPressError::CorruptIndexState`].
#[instrument(skip_all, fields(out_dir = %out_dir.display()))]
pub fn load_index(out_dir: &Path) -> Result<IndexState> {
    let path = out_dir.join(INDEX_STATE_FILE);

    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no index yet, starting empty");
            return Ok(IndexState::default());
        }
        Err(e) => {
            return Err(ReviewPressError::corrupt_index(
                &path,
                format!("unreadable: {e}"),
            ));
        }
    };

    let file: IndexFile = serde_json::from_str(&content)
        .map_err(|e| ReviewPressError::corrupt_index(&path, format!("unparsable: {e}")))?;

    if file.schema_version != CURRENT_SCHEMA_VERSION {
        return Err(ReviewPressError::corrupt_index(
            &path,
            format!(
                "unsupported schema_version: {} (expected {})",
                file.schema_version, CURRENT_SCHEMA_VERSION
            ),
        ));
    }

    let mut seen = BTreeSet::new();
    if let Some(dup) = file.entries.iter().find(|e| !seen.insert(&e.slug)) {
        return Err(ReviewPressError::corrupt_index(
            &path,
            format!("duplicate slug {}", dup.slug),
        ));
    }

    let mut entries = file.entries;
    sort_entries(&mut entries);

    debug!(entries = entries.len(), "index loaded");
    Ok(IndexState { entries })
}

/// Rebuild the index from every `<slug>.meta.json` sidecar in `out_dir`.
/// Sidecars that cannot be read are skipped with a warning.
#[instrument(skip_all, fields(out_dir = %out_dir.display()))]
pub fn rebuild_from_sidecars(out_dir: &Path) -> Result<IndexState> {
    let read_dir = std::fs::read_dir(out_dir).map_err(|e| ReviewPressError::io(out_dir, e))?;

    let mut sidecars: Vec<PathBuf> = read_dir
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(SIDECAR_SUFFIX) && !n.starts_with('.'))
        })
        .collect();
    sidecars.sort();

    let mut state = IndexState::default();
    for path in sidecars {
        match read_sidecar(&path) {
            Ok(entry) => state = merge(state, entry),
            Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable sidecar"),
        }
    }

    info!(entries = state.len(), "index rebuilt from sidecars");
    Ok(state)
}

fn read_sidecar(path: &Path) -> Result<IndexEntry> {
    let content = std::fs::read_to_string(path).map_err(|e| ReviewPressError::io(path, e))?;
    serde_json::from_str(&content)
        .map_err(|e| ReviewPressError::corrupt_index(path, format!("unparsable sidecar: {e}")))
}

/// Write `<out_dir>/<slug>.meta.json` for one entry.
pub fn write_sidecar(out_dir: &Path, entry: &IndexEntry) -> Result<PathBuf> {
    let path = out_dir.join(entry.slug.sidecar_file_name());
    assembler::write_json(&path, entry)?;
    Ok(path)
}

/// Persist the state to `index.json` and the rendered page to `index.html`,
/// each replaced atomically.
#[instrument(skip_all, fields(out_dir = %out_dir.display(), entries = state.len()))]
pub fn persist_index(
    out_dir: &Path,
    state: &IndexState,
    page: &RenderedPage,
) -> Result<WrittenFile> {
    let file = IndexFile {
        schema_version: CURRENT_SCHEMA_VERSION,
        tool_version: env!("CARGO_PKG_VERSION").to_string(),
        updated_at: Utc::now(),
        entries: state.entries.clone(),
    };
    assembler::write_json(&out_dir.join(INDEX_STATE_FILE), &file)?;
    let written = assembler::write_page(out_dir, page)?;

    info!(path = %written.path.display(), "index updated");
    Ok(written)
}
