//! Review rating aggregation.

use std::collections::BTreeMap;

use reviewpress_shared::{AggregateRating, MAX_RATING, ReviewRecord};

/// Nearest whole star for `rating`, rounding halves up (4.5 → 5).
pub fn star_bucket(rating: f64) -> u8 {
    (rating + 0.5).floor().clamp(0.0, MAX_RATING) as u8
}

/// Mean, count, and star distribution of the given reviews.
///
/// The validator guarantees at least one review; an empty slice yields a
/// zero rating with an empty distribution.
pub fn aggregate(reviews: &[ReviewRecord]) -> AggregateRating {
    let count = reviews.len();
    let mut distribution = BTreeMap::new();
    let mut total = 0.0;

    for review in reviews {
        total += review.rating;
        *distribution.entry(star_bucket(review.rating)).or_insert(0) += 1;
    }

    let mean = if count == 0 { 0.0 } else { total / count as f64 };

    AggregateRating {
        mean,
        count,
        distribution,
    }
}

/// Five-character star string (`★★★★☆`) for a rating.
pub fn stars(rating: f64) -> String {
    let filled = usize::from(star_bucket(rating));
    let empty = MAX_RATING as usize - filled;
    format!("{}{}", "★".repeat(filled), "☆".repeat(empty))
}
