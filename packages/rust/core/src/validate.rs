//! Input document parsing and schema validation.
//!
//! Documents are first parsed into a generic [`Value`] tree (YAML or JSON),
//! then walked field by field so every violation can name its exact location
//! (`article.slug`, `reviews[2].rating`, ...). Validation is all-or-nothing:
//! the first violation rejects the whole document.

use std::path::Path;

use chrono::{DateTime, NaiveDate};
use serde_json::{Map, Value};
use tracing::{debug, instrument};

use reviewpress_shared::{
    ArticleDocument, ArticleRecord, MAX_RATING, Result, ReviewPressError, ReviewRecord,
    SchemaViolation, Slug,
};

type Checked<T> = std::result::Result<T, SchemaViolation>;

/// Slugs whose page file would collide with generated site files.
const RESERVED_SLUGS: &[&str] = &["index"];

/// Serialization format of an input document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Yaml,
    Json,
}

impl DocumentFormat {
    /// Pick the format from the file extension. Unknown extensions are read as
    /// YAML, which also accepts JSON documents.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("json") => Self::Json,
            _ => Self::Yaml,
        }
    }
}

/// Parse raw text into a generic document tree.
pub fn parse_document(text: &str, format: DocumentFormat) -> std::result::Result<Value, String> {
    match format {
        DocumentFormat::Json => serde_json::from_str(text).map_err(|e| e.to_string()),
        DocumentFormat::Yaml => serde_yaml::from_str(text).map_err(|e| e.to_string()),
    }
}

/// Read, parse, and validate the document at `path`.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn load_document(path: &Path) -> Result<ArticleDocument> {
    let text = std::fs::read_to_string(path).map_err(|e| ReviewPressError::io(path, e))?;
    let format = DocumentFormat::from_path(path);

    let raw = parse_document(&text, format)
        .map_err(|msg| ReviewPressError::invalid_document(path, msg))?;
    let document = validate(&raw).map_err(|v| ReviewPressError::schema(path, v))?;

    debug!(
        slug = %document.article.slug,
        reviews = document.reviews.len(),
        "document validated"
    );
    Ok(document)
}

/// Turn a parsed document tree into a typed [`ArticleDocument`].
pub fn validate(raw: &Value) -> Checked<ArticleDocument> {
    let root = raw.as_object().ok_or_else(|| SchemaViolation::WrongType {
        field: "(document)".into(),
        expected: "a mapping with `article` and `reviews`",
    })?;
    let root = Fields::new(root, "");

    let article_map = root.required_map("article")?;
    let article_fields = Fields::new(article_map, "article");
    let mut article = validate_article(&article_fields)?;
    if article.gallery_dir.is_none() {
        article.gallery_dir = root.optional_text("gallery_dir")?;
    }

    let reviews = match root.get("reviews") {
        None => return Err(SchemaViolation::NoReviews),
        Some(Value::Array(items)) if items.is_empty() => return Err(SchemaViolation::NoReviews),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| validate_review(i, item))
            .collect::<Checked<Vec<_>>>()?,
        Some(_) => {
            return Err(SchemaViolation::WrongType {
                field: "reviews".into(),
                expected: "a list of reviews",
            });
        }
    };

    Ok(ArticleDocument { article, reviews })
}

fn validate_article(fields: &Fields<'_>) -> Checked<ArticleRecord> {
    let title = fields.required_text("title")?;

    let slug_raw = fields.required_text("slug")?;
    let slug = Slug::parse(&slug_raw)
        .ok()
        .filter(|s| !RESERVED_SLUGS.contains(&s.as_str()))
        .ok_or_else(|| SchemaViolation::InvalidSlug {
            field: fields.path("slug"),
            slug: slug_raw.clone(),
        })?;

    let date = fields
        .optional_date("date")?
        .ok_or_else(|| SchemaViolation::MissingField {
            field: fields.path("date"),
        })?;

    Ok(ArticleRecord {
        title,
        slug,
        description: fields.optional_text("description")?,
        date,
        hero_image: fields.optional_text("hero_image")?,
        tags: fields.text_list("tags")?,
        cover_credit: fields.optional_text("cover_credit")?,
        gallery_dir: fields.optional_text("gallery_dir")?,
    })
}

fn validate_review(index: usize, raw: &Value) -> Checked<ReviewRecord> {
    let prefix = format!("reviews[{index}]");
    let map = raw.as_object().ok_or_else(|| SchemaViolation::WrongType {
        field: prefix.clone(),
        expected: "a mapping",
    })?;
    let fields = Fields::new(map, &prefix);

    let author = fields.required_text("author")?;
    // A present key is never "missing": YAML `.nan` and `.inf` arrive as null.
    let rating = match map.get("rating") {
        None => {
            return Err(SchemaViolation::MissingField {
                field: fields.path("rating"),
            });
        }
        Some(value) => parse_rating(value).ok_or_else(|| SchemaViolation::InvalidRating {
            review: index,
            value: display_value(value),
        })?,
    };

    Ok(ReviewRecord {
        author,
        rating,
        date: fields.optional_date("date")?,
        content: fields.optional_text("content")?.unwrap_or_default(),
        pros: fields.text_list("pros")?,
        cons: fields.text_list("cons")?,
        images: fields.text_list("images")?,
    })
}

/// Accepts numbers and numeric strings within `[0, MAX_RATING]`.
fn parse_rating(value: &Value) -> Option<f64> {
    let rating = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (rating.is_finite() && (0.0..=MAX_RATING).contains(&rating)).then_some(rating)
}

/// `YYYY-MM-DD`, or an RFC 3339 timestamp reduced to its calendar date.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => format!("{s:?}"),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Field access with location tracking
// ---------------------------------------------------------------------------

/// A mapping plus the location prefix used in violation messages.
/// Explicit `null` values are treated as absent.
struct Fields<'a> {
    map: &'a Map<String, Value>,
    prefix: String,
}

impl<'a> Fields<'a> {
    fn new(map: &'a Map<String, Value>, prefix: &str) -> Self {
        Self {
            map,
            prefix: prefix.to_string(),
        }
    }

    fn path(&self, key: &str) -> String {
        if self.prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}.{key}", self.prefix)
        }
    }

    fn get(&self, key: &str) -> Option<&'a Value> {
        self.map.get(key).filter(|v| !v.is_null())
    }

    fn required_map(&self, key: &str) -> Checked<&'a Map<String, Value>> {
        match self.get(key) {
            None => Err(SchemaViolation::MissingField {
                field: self.path(key),
            }),
            Some(value) => value.as_object().ok_or_else(|| SchemaViolation::WrongType {
                field: self.path(key),
                expected: "a mapping",
            }),
        }
    }

    fn required_text(&self, key: &str) -> Checked<String> {
        let text = self
            .optional_text(key)?
            .ok_or_else(|| SchemaViolation::MissingField {
                field: self.path(key),
            })?;
        if text.trim().is_empty() {
            return Err(SchemaViolation::EmptyField {
                field: self.path(key),
            });
        }
        Ok(text)
    }

    fn optional_text(&self, key: &str) -> Checked<Option<String>> {
        self.get(key)
            .map(|value| {
                scalar_text(value).ok_or_else(|| SchemaViolation::WrongType {
                    field: self.path(key),
                    expected: "a string",
                })
            })
            .transpose()
    }

    fn optional_date(&self, key: &str) -> Checked<Option<NaiveDate>> {
        let Some(raw) = self.optional_text(key)? else {
            return Ok(None);
        };
        parse_date(&raw)
            .map(Some)
            .ok_or_else(|| SchemaViolation::InvalidDate {
                field: self.path(key),
                value: raw,
            })
    }

    /// A list of scalars, each coerced to a string. Absent means empty.
    fn text_list(&self, key: &str) -> Checked<Vec<String>> {
        let Some(value) = self.get(key) else {
            return Ok(Vec::new());
        };
        let items = value.as_array().ok_or_else(|| SchemaViolation::WrongType {
            field: self.path(key),
            expected: "a list of strings",
        })?;
        items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                scalar_text(item).ok_or_else(|| SchemaViolation::WrongType {
                    field: format!("{}[{i}]", self.path(key)),
                    expected: "a string",
                })
            })
            .collect()
    }
}
