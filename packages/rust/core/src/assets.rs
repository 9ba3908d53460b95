//! Image reference resolution against the images root.
//!
//! Resolution never fails: every declared path comes back as a
//! [`ResolvedImage`] whose `exists` flag tells the caller whether to render
//! it. Paths that would leave the images root are reported as missing.

use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, instrument, warn};

use reviewpress_shared::{ArticleDocument, ResolvedImage};

/// File extensions (lowercase) picked up when listing a gallery directory.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Every image an article references, resolved.
#[derive(Debug, Clone, Default)]
pub struct ResolvedAssets {
    pub hero: Option<ResolvedImage>,
    /// Gallery images enumerated from disk, sorted by file name.
    pub gallery: Vec<ResolvedImage>,
    /// One list per review, parallel to `ArticleDocument::reviews`.
    pub reviews: Vec<Vec<ResolvedImage>>,
}

impl ResolvedAssets {
    /// Declared images that could not be found.
    pub fn missing(&self) -> impl Iterator<Item = &ResolvedImage> {
        self.hero
            .iter()
            .chain(self.reviews.iter().flatten())
            .filter(|img| !img.exists)
    }
}

/// Resolve `relative_path` under `images_root`.
///
/// A symlink counts only when its target also lies inside the root.
pub fn resolve(relative_path: &str, images_root: &Path) -> ResolvedImage {
    let normalized = normalize_relative(relative_path).filter(|parts| !parts.is_empty());

    let Some(parts) = normalized else {
        return ResolvedImage {
            declared_path: relative_path.to_string(),
            resolved_path: PathBuf::new(),
            normalized_path: String::new(),
            exists: false,
        };
    };

    let resolved_path = images_root.join(parts.iter().collect::<PathBuf>());
    let exists = std::fs::metadata(&resolved_path)
        .map(|m| m.is_file())
        .unwrap_or(false)
        && images_root
            .canonicalize()
            .is_ok_and(|root| stays_within(&resolved_path, &root));

    ResolvedImage {
        declared_path: relative_path.to_string(),
        resolved_path,
        normalized_path: join_forward(&parts),
        exists,
    }
}

/// List the image files directly inside `gallery_dir`.
///
/// An absent, unreadable or escaping directory yields an empty gallery.
pub fn resolve_gallery(gallery_dir: &str, images_root: &Path) -> Vec<ResolvedImage> {
    let Some(parts) = normalize_relative(gallery_dir) else {
        debug!(gallery_dir, "gallery path leaves the images root, ignoring");
        return Vec::new();
    };
    let dir = images_root.join(parts.iter().collect::<PathBuf>());

    let entries = match std::fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(path = %dir.display(), error = %e, "gallery directory not readable");
            return Vec::new();
        }
    };

    let Ok(root) = images_root.canonicalize() else {
        return Vec::new();
    };

    let mut files: Vec<(OsString, PathBuf)> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| (entry.file_name(), entry.path()))
        .filter(|(_, path)| {
            path.is_file() && has_image_extension(path) && stays_within(path, &root)
        })
        .collect();
    files.sort_by(|a, b| a.0.cmp(&b.0));

    files
        .into_iter()
        .map(|(name, path)| {
            let mut rel = parts.clone();
            rel.push(name);
            let normalized_path = join_forward(&rel);
            ResolvedImage {
                declared_path: normalized_path.clone(),
                resolved_path: path,
                normalized_path,
                exists: true,
            }
        })
        .collect()
}

/// Resolve hero, gallery, and review images for one article, logging each miss.
#[instrument(skip_all, fields(slug = %document.article.slug))]
pub fn resolve_article_assets(document: &ArticleDocument, images_root: &Path) -> ResolvedAssets {
    let hero = document
        .article
        .hero_image
        .as_deref()
        .map(|p| resolve(p, images_root));

    let gallery = document
        .article
        .gallery_dir
        .as_deref()
        .map(|dir| resolve_gallery(dir, images_root))
        .unwrap_or_default();

    let reviews: Vec<Vec<ResolvedImage>> = document
        .reviews
        .iter()
        .map(|review| {
            review
                .images
                .iter()
                .map(|p| resolve(p, images_root))
                .collect::<Vec<_>>()
        })
        .collect();

    let assets = ResolvedAssets {
        hero,
        gallery,
        reviews,
    };

    for img in assets.missing() {
        warn!(
            image = %img.declared_path,
            root = %images_root.display(),
            "skipping missing image"
        );
    }
    debug!(
        gallery = assets.gallery.len(),
        missing = assets.missing().count(),
        "assets resolved"
    );

    assets
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Lexically normalize a relative path. `None` if it is absolute or climbs
/// above its starting point.
fn normalize_relative(declared: &str) -> Option<Vec<OsString>> {
    let declared = declared.trim();
    if declared.is_empty() {
        return None;
    }

    let mut parts: Vec<OsString> = Vec::new();
    for component in Path::new(declared).components() {
        match component {
            Component::Normal(part) => parts.push(part.to_os_string()),
            Component::CurDir => {}
            Component::ParentDir => {
                parts.pop()?;
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(parts)
}

fn join_forward(parts: &[OsString]) -> String {
    parts
        .iter()
        .map(|p| p.to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Whether `path`, with symlinks followed, lands under the canonical `root`.
fn stays_within(path: &Path, root: &Path) -> bool {
    path.canonicalize().is_ok_and(|real| real.starts_with(root))
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use reviewpress_shared::{ArticleRecord, ReviewRecord, Slug};

    fn images_root() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("product-x/gallery")).unwrap();
        std::fs::write(root.join("product-x/hero.jpg"), b"jpg").unwrap();
        std::fs::write(root.join("product-x/gallery/b.PNG"), b"png").unwrap();
        std::fs::write(root.join("product-x/gallery/a.webp"), b"webp").unwrap();
        std::fs::write(root.join("product-x/gallery/notes.txt"), b"txt").unwrap();
        std::fs::create_dir_all(root.join("product-x/gallery/nested.jpg")).unwrap();
        dir
    }

    fn document(hero: Option<&str>, gallery: Option<&str>, review_images: &[&str]) -> ArticleDocument {
        ArticleDocument {
            article: ArticleRecord {
                title: "Product X".into(),
                slug: Slug::parse("product-x").unwrap(),
                description: None,
                date: NaiveDate::from_ymd_opt(2025, 8, 1).unwrap(),
                hero_image: hero.map(String::from),
                tags: vec![],
                cover_credit: None,
                gallery_dir: gallery.map(String::from),
            },
            reviews: vec![ReviewRecord {
                author: "Alice".into(),
                rating: 4.0,
                date: None,
                content: String::new(),
                pros: vec![],
                cons: vec![],
                images: review_images.iter().map(|s| s.to_string()).collect(),
            }],
        }
    }

    #[test]
    fn existing_file_resolves() {
        let root = images_root();
        let img = resolve("product-x/hero.jpg", root.path());
        assert!(img.exists);
        assert_eq!(img.normalized_path, "product-x/hero.jpg");
        assert_eq!(img.resolved_path, root.path().join("product-x/hero.jpg"));
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let root = images_root();
        let img = resolve("product-x/nope.jpg", root.path());
        assert!(!img.exists);
        assert_eq!(img.declared_path, "product-x/nope.jpg");
    }

    #[test]
    fn directories_do_not_count_as_images() {
        let root = images_root();
        assert!(!resolve("product-x", root.path()).exists);
    }

    #[test]
    fn normalization_stays_inside_root() {
        let root = images_root();
        let img = resolve("./product-x/gallery/../hero.jpg", root.path());
        assert!(img.exists);
        assert_eq!(img.normalized_path, "product-x/hero.jpg");
    }

    #[test]
    fn traversal_is_treated_as_missing() {
        let site = tempfile::tempdir().unwrap();
        let root = site.path().join("images");
        std::fs::create_dir_all(root.join("product-x")).unwrap();
        std::fs::write(site.path().join("outside.jpg"), b"secret").unwrap();

        for escaping in ["../outside.jpg", "product-x/../../outside.jpg", "/etc/passwd", ""] {
            let img = resolve(escaping, &root);
            assert!(!img.exists, "{escaping:?} must not resolve");
            assert_eq!(img.resolved_path, PathBuf::new());
        }
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_out_of_the_root_are_missing() {
        use std::os::unix::fs::symlink;

        let site = tempfile::tempdir().unwrap();
        let root = site.path().join("images");
        std::fs::create_dir_all(root.join("gallery")).unwrap();
        std::fs::write(root.join("inside.jpg"), b"jpg").unwrap();
        std::fs::write(site.path().join("outside.jpg"), b"secret").unwrap();
        symlink(site.path().join("outside.jpg"), root.join("leak.jpg")).unwrap();
        symlink(root.join("inside.jpg"), root.join("alias.jpg")).unwrap();
        symlink(site.path().join("outside.jpg"), root.join("gallery/leak.jpg")).unwrap();
        symlink(root.join("inside.jpg"), root.join("gallery/alias.jpg")).unwrap();

        assert!(!resolve("leak.jpg", &root).exists);
        assert!(resolve("alias.jpg", &root).exists);

        let gallery: Vec<String> = resolve_gallery("gallery", &root)
            .into_iter()
            .map(|img| img.normalized_path)
            .collect();
        assert_eq!(gallery, ["gallery/alias.jpg"]);
    }

    #[test]
    fn resolution_is_repeatable() {
        let root = images_root();
        let first = resolve("product-x/hero.jpg", root.path());
        let second = resolve("product-x/hero.jpg", root.path());
        assert_eq!(first, second);
    }

    #[test]
    fn gallery_lists_sorted_images_only() {
        let root = images_root();
        let gallery = resolve_gallery("product-x/gallery", root.path());
        let names: Vec<_> = gallery.iter().map(|g| g.normalized_path.as_str()).collect();
        assert_eq!(names, ["product-x/gallery/a.webp", "product-x/gallery/b.PNG"]);
        assert!(gallery.iter().all(|g| g.exists));
    }

    #[test]
    fn absent_or_escaping_gallery_is_empty() {
        let root = images_root();
        assert!(resolve_gallery("product-x/missing", root.path()).is_empty());
        assert!(resolve_gallery("../", root.path()).is_empty());
    }

    #[test]
    fn article_assets_track_misses() {
        let root = images_root();
        let doc = document(
            Some("product-x/hero.jpg"),
            Some("product-x/gallery"),
            &["product-x/hero.jpg", "product-x/gone.jpg"],
        );
        let assets = resolve_article_assets(&doc, root.path());

        assert!(assets.hero.as_ref().unwrap().exists);
        assert_eq!(assets.gallery.len(), 2);
        assert_eq!(assets.reviews.len(), 1);
        assert_eq!(assets.reviews[0].len(), 2);

        let missing: Vec<_> = assets.missing().map(|m| m.declared_path.as_str()).collect();
        assert_eq!(missing, ["product-x/gone.jpg"]);
    }

    #[test]
    fn no_images_declared() {
        let root = images_root();
        let assets = resolve_article_assets(&document(None, None, &[]), root.path());
        assert!(assets.hero.is_none());
        assert!(assets.gallery.is_empty());
        assert!(assets.reviews[0].is_empty());
        assert_eq!(assets.missing().count(), 0);
    }
}
