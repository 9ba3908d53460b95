//! Page models and rendering.
//!
//! Builds flat, template-ready structures from validated documents and
//! resolved assets. Every presentational decision (which images survive,
//! star strings, formatted dates, paragraph splitting) is made here so the
//! templates only iterate and branch on presence.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use reviewpress_shared::{
    AggregateRating, ArticleDocument, IndexState, ResolvedImage, Result, ReviewPressError,
    SiteConfig,
};
use reviewpress_templates::{TemplateId, Templates};

use crate::assets::ResolvedAssets;
use crate::rating::{self, star_bucket};

/// Value of the `generator` meta tag.
pub const GENERATOR: &str = concat!("reviewpress ", env!("CARGO_PKG_VERSION"));

/// Name of the stylesheet looked up in the assets directory.
const STYLESHEET: &str = "styles.css";

const DATE_FORMAT: &str = "%Y-%m-%d";

// ---------------------------------------------------------------------------
// Page models
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageImage {
    pub src: String,
    pub alt: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BucketView {
    pub stars: u8,
    pub label: String,
    pub count: usize,
    /// Share of all reviews, 0-100.
    pub percent: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct RatingView {
    pub mean: String,
    pub count: usize,
    pub stars: String,
    /// Highest bucket first.
    pub distribution: Vec<BucketView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewView {
    pub author: String,
    pub rating: String,
    pub stars: String,
    pub date: Option<String>,
    pub paragraphs: Vec<String>,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
    /// Only images that exist on disk.
    pub images: Vec<PageImage>,
}

/// Everything the article template needs.
#[derive(Debug, Clone, Serialize)]
pub struct ArticlePage {
    pub site_title: String,
    pub generator: &'static str,
    pub styles: Option<String>,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub date: String,
    pub tags: Vec<String>,
    pub cover_credit: Option<String>,
    pub hero_image: Option<PageImage>,
    pub gallery: Vec<PageImage>,
    pub rating: RatingView,
    /// Input order, never re-sorted.
    pub reviews: Vec<ReviewView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IndexCard {
    pub slug: String,
    pub href: String,
    pub title: String,
    pub description: Option<String>,
    pub date: String,
    pub hero_image: Option<PageImage>,
    pub rating_mean: String,
    pub rating_count: usize,
    pub stars: String,
    pub tags: Vec<String>,
}

/// Everything the index template needs.
#[derive(Debug, Clone, Serialize)]
pub struct IndexPage {
    pub site_title: String,
    pub generator: &'static str,
    pub styles: Option<String>,
    /// Same order as the index state.
    pub articles: Vec<IndexCard>,
}

/// Rendered markup plus where it goes, relative to the output directory.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub relative_path: PathBuf,
    pub html: String,
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// Combine a validated document, its resolved assets, and its aggregate
/// rating into the article page model.
pub fn build_article_page(
    document: &ArticleDocument,
    assets: &ResolvedAssets,
    rating: &AggregateRating,
    site: &SiteConfig,
    styles: Option<&str>,
) -> ArticlePage {
    let article = &document.article;
    let base = site.image_base_url.as_str();

    let hero_image = assets
        .hero
        .as_ref()
        .filter(|img| img.exists)
        .map(|img| page_image(base, img, article.title.clone()));

    let gallery = assets
        .gallery
        .iter()
        .filter(|img| img.exists)
        .enumerate()
        .map(|(i, img)| page_image(base, img, format!("{} gallery image {}", article.title, i + 1)))
        .collect();

    let reviews = document
        .reviews
        .iter()
        .enumerate()
        .map(|(i, review)| {
            let images: Vec<PageImage> = assets
                .reviews
                .get(i)
                .map(|imgs| {
                    imgs.iter()
                        .filter(|img| img.exists)
                        .map(|img| page_image(base, img, format!("Photo from {}", review.author)))
                        .collect()
                })
                .unwrap_or_default();

            ReviewView {
                author: review.author.clone(),
                rating: format_rating(review.rating),
                stars: rating::stars(review.rating),
                date: review.date.map(|d| d.format(DATE_FORMAT).to_string()),
                paragraphs: paragraphs(&review.content),
                pros: review.pros.clone(),
                cons: review.cons.clone(),
                images,
            }
        })
        .collect();

    ArticlePage {
        site_title: site.title.clone(),
        generator: GENERATOR,
        styles: styles.map(String::from),
        title: article.title.clone(),
        slug: article.slug.to_string(),
        description: article.description.clone(),
        date: article.date.format(DATE_FORMAT).to_string(),
        tags: article.tags.clone(),
        cover_credit: article.cover_credit.clone(),
        hero_image,
        gallery,
        rating: rating_view(rating),
        reviews,
    }
}

/// Build the index page model from the merged index state.
pub fn build_index_page(state: &IndexState, site: &SiteConfig, styles: Option<&str>) -> IndexPage {
    let articles = state
        .entries
        .iter()
        .map(|entry| IndexCard {
            slug: entry.slug.to_string(),
            href: entry.slug.page_file_name(),
            title: entry.title.clone(),
            description: entry.description.clone(),
            date: entry.date.format(DATE_FORMAT).to_string(),
            hero_image: entry.hero_image.as_ref().map(|src| PageImage {
                src: src.clone(),
                alt: entry.title.clone(),
            }),
            rating_mean: entry.rating.display_mean(),
            rating_count: entry.rating.count,
            stars: rating::stars(entry.rating.mean),
            tags: entry.tags.iter().cloned().collect(),
        })
        .collect();

    IndexPage {
        site_title: site.title.clone(),
        generator: GENERATOR,
        styles: styles.map(String::from),
        articles,
    }
}

/// Render an article page to `<slug>.html`.
pub fn render_article(page: &ArticlePage, templates: &Templates) -> Result<RenderedPage> {
    let html = templates.render(TemplateId::Article, page)?;
    Ok(RenderedPage {
        relative_path: PathBuf::from(format!("{}.html", page.slug)),
        html,
    })
}

/// Render the index page to `index.html`.
pub fn render_index(page: &IndexPage, templates: &Templates) -> Result<RenderedPage> {
    let html = templates.render(TemplateId::Index, page)?;
    Ok(RenderedPage {
        relative_path: PathBuf::from("index.html"),
        html,
    })
}

/// Read `styles.css` from the assets directory, if there is one.
pub fn load_styles(assets_dir: Option<&Path>) -> Result<Option<String>> {
    let Some(dir) = assets_dir else {
        return Ok(None);
    };
    let path = dir.join(STYLESHEET);
    if !path.is_file() {
        debug!(path = %path.display(), "no stylesheet, pages will be unstyled");
        return Ok(None);
    }
    std::fs::read_to_string(&path)
        .map(Some)
        .map_err(|e| ReviewPressError::io(&path, e))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Public URL of a resolved image.
pub(crate) fn image_src(base_url: &str, image: &ResolvedImage) -> String {
    format!("{base_url}{}", image.normalized_path)
}

fn page_image(base_url: &str, image: &ResolvedImage, alt: String) -> PageImage {
    PageImage {
        src: image_src(base_url, image),
        alt,
    }
}

fn rating_view(rating: &AggregateRating) -> RatingView {
    let total = rating.count.max(1);
    let distribution = (0..=5u8)
        .rev()
        .filter_map(|stars| {
            let count = rating.distribution.get(&stars).copied().unwrap_or(0);
            // Zero-star bucket only appears when someone used it.
            (stars > 0 || count > 0).then(|| BucketView {
                stars,
                label: format!("{stars} ★"),
                count,
                percent: ((count * 100 + total / 2) / total) as u32,
            })
        })
        .collect();

    RatingView {
        mean: rating.display_mean(),
        count: rating.count,
        stars: rating::stars(rating.mean),
        distribution,
    }
}

/// Ratings keep one decimal unless they are whole.
fn format_rating(rating: f64) -> String {
    if rating.fract() == 0.0 {
        format!("{}", star_bucket(rating))
    } else {
        format!("{rating:.1}")
    }
}

/// Split free text into paragraphs on blank lines.
fn paragraphs(content: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            if !current.is_empty() {
                out.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        out.push(current.join("\n"));
    }
    out
}
