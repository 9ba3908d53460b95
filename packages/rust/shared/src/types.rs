//! Core domain types for review articles and the cumulative index.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Current schema version for the persisted index format.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Highest rating a review may carry.
pub const MAX_RATING: f64 = 5.0;

// ---------------------------------------------------------------------------
// Slug
// ---------------------------------------------------------------------------

static SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("valid regex"));

/// URL-safe article identifier: lowercase alphanumerics separated by single hyphens.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Slug(String);

/// Returned when a string is not a valid [`Slug`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0:?} is not a valid slug")]
pub struct InvalidSlug(pub String);

impl Slug {
    /// Validate `raw` against the slug pattern.
    pub fn parse(raw: &str) -> std::result::Result<Self, InvalidSlug> {
        if SLUG_RE.is_match(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(InvalidSlug(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name of the rendered article page (`<slug>.html`).
    pub fn page_file_name(&self) -> String {
        format!("{}.html", self.0)
    }

    /// File name of the per-article metadata sidecar (`<slug>.meta.json`).
    pub fn sidecar_file_name(&self) -> String {
        format!("{}.meta.json", self.0)
    }
}

impl TryFrom<String> for Slug {
    type Error = InvalidSlug;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Slug> for String {
    fn from(slug: Slug) -> Self {
        slug.0
    }
}

impl std::fmt::Display for Slug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Slug {
    type Err = InvalidSlug;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// ---------------------------------------------------------------------------
// Input records
// ---------------------------------------------------------------------------

/// Article metadata from the `article` section of an input document.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleRecord {
    pub title: String,
    pub slug: Slug,
    pub description: Option<String>,
    pub date: NaiveDate,
    /// Hero image path relative to the images root.
    pub hero_image: Option<String>,
    pub tags: Vec<String>,
    pub cover_credit: Option<String>,
    /// Gallery directory relative to the images root.
    pub gallery_dir: Option<String>,
}

/// One review belonging to an article. Reviews keep their input order.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewRecord {
    pub author: String,
    /// Rating in `[0, MAX_RATING]`.
    pub rating: f64,
    pub date: Option<NaiveDate>,
    pub content: String,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
    /// Image paths relative to the images root.
    pub images: Vec<String>,
}

/// A validated input document. `reviews` is never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleDocument {
    pub article: ArticleRecord,
    pub reviews: Vec<ReviewRecord>,
}

// ---------------------------------------------------------------------------
// Derived values
// ---------------------------------------------------------------------------

/// An image reference paired with a definitive existence check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImage {
    /// Path as written in the input document.
    pub declared_path: String,
    /// Location on disk under the images root (empty when the path escapes it).
    pub resolved_path: PathBuf,
    /// Path relative to the images root, normalized to forward slashes.
    pub normalized_path: String,
    pub exists: bool,
}

/// Summary score and star-bucket distribution for an article's reviews.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRating {
    /// Full-precision arithmetic mean.
    pub mean: f64,
    pub count: usize,
    /// Star bucket (0..=5) to number of reviews.
    pub distribution: BTreeMap<u8, usize>,
}

impl AggregateRating {
    /// Mean rounded half-up to one decimal place, as shown on pages.
    pub fn display_mean(&self) -> String {
        format!("{:.1}", (self.mean * 10.0).round() / 10.0)
    }
}

// ---------------------------------------------------------------------------
// Index
// ---------------------------------------------------------------------------

/// Long-term summary of one article, as stored in the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub slug: Slug,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub date: NaiveDate,
    /// Public `src` of the hero image, present only when the image exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hero_image: Option<String>,
    pub rating: AggregateRating,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

/// The cumulative index: entries unique by slug, ordered by date descending
/// then slug ascending.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexState {
    pub entries: Vec<IndexEntry>,
}

impl IndexState {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an entry by slug.
    pub fn get(&self, slug: &Slug) -> Option<&IndexEntry> {
        self.entries.iter().find(|e| &e.slug == slug)
    }
}

/// On-disk structure of `index.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexFile {
    /// Schema version for forward compatibility.
    pub schema_version: u32,
    /// Tool version that last wrote the index.
    pub tool_version: String,
    /// When the index was last written.
    pub updated_at: DateTime<Utc>,
    pub entries: Vec<IndexEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(slug: &str) -> IndexEntry {
        IndexEntry {
            slug: Slug::parse(slug).expect("slug"),
            title: "Product X".into(),
            description: None,
            date: NaiveDate::from_ymd_opt(2025, 8, 1).expect("date"),
            hero_image: None,
            rating: AggregateRating {
                mean: 4.25,
                count: 2,
                distribution: BTreeMap::from([(4, 1), (5, 1)]),
            },
            tags: BTreeSet::from(["audio".to_string()]),
        }
    }

    #[test]
    fn slug_accepts_url_safe_tokens() {
        assert!(Slug::parse("product-x-review").is_ok());
        assert!(Slug::parse("a").is_ok());
        assert!(Slug::parse("v2-2025").is_ok());
    }

    #[test]
    fn slug_rejects_everything_else() {
        for bad in ["", "Product", "a_b", "a--b", "-a", "a-", "a b", "a/b", "ünï"] {
            assert!(Slug::parse(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn slug_file_names() {
        let slug = Slug::parse("product-x-review").unwrap();
        assert_eq!(slug.page_file_name(), "product-x-review.html");
        assert_eq!(slug.sidecar_file_name(), "product-x-review.meta.json");
    }

    #[test]
    fn slug_deserialization_validates() {
        let ok: Slug = serde_json::from_str("\"good-slug\"").expect("valid slug");
        assert_eq!(ok.as_str(), "good-slug");
        assert!(serde_json::from_str::<Slug>("\"Bad Slug\"").is_err());
    }

    #[test]
    fn display_mean_rounds_to_one_decimal() {
        let rating = entry("a").rating;
        assert_eq!(rating.display_mean(), "4.3");
        let rating = AggregateRating {
            mean: 4.0,
            count: 1,
            distribution: BTreeMap::from([(4, 1)]),
        };
        assert_eq!(rating.display_mean(), "4.0");
    }

    #[test]
    fn index_entry_serialization() {
        let e = entry("product-x-review");
        let json = serde_json::to_string_pretty(&e).expect("serialize");
        assert!(json.contains("\"date\": \"2025-08-01\""));
        let parsed: IndexEntry = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, e);
    }

    #[test]
    fn index_state_lookup() {
        let state = IndexState {
            entries: vec![entry("a"), entry("b")],
        };
        assert_eq!(state.len(), 2);
        assert!(state.get(&Slug::parse("b").unwrap()).is_some());
        assert!(state.get(&Slug::parse("c").unwrap()).is_none());
    }
}
