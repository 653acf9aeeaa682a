//! Rating and review extraction from free-text model responses.
//!
//! A response such as `"4.5/5 stars Exceptional luxury hotel"` is split into
//! the numeric rating (`4.5`) and the review text that follows the rating
//! token. A single pattern captures both parts in one pass.

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

/// Leading rating token (`4`, `4.5`, `4.5/5`, `4.5 stars`, `4.5/5 stars`)
/// followed by the review remainder.
static RATING_REVIEW_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)([0-9]+(?:\.[0-9]+)?)(?:/5)?(?: stars)?(.*)")
        .expect("rating pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("no rating token found in response")]
    NoRatingToken,
    #[error("no review text follows the rating")]
    NoReviewRemainder,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RatingReview {
    pub rating: f64,
    pub review: String,
}

pub type ExtractionResult = Result<RatingReview, ExtractionError>;

#[derive(Debug, Clone, Default)]
pub struct RatingReviewExtractor {
    require_review: bool,
}

impl RatingReviewExtractor {
    /// Lenient extractor: a rating with nothing after it yields an empty review.
    pub fn new() -> Self {
        Self::default()
    }

    /// When set, an empty review is reported as `NoReviewRemainder`.
    pub fn require_review(mut self, require: bool) -> Self {
        self.require_review = require;
        self
    }

    pub fn extract(&self, text: &str) -> ExtractionResult {
        let captures = RATING_REVIEW_PATTERN
            .captures(text)
            .ok_or(ExtractionError::NoRatingToken)?;

        let rating = captures
            .get(1)
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .ok_or(ExtractionError::NoRatingToken)?;

        let review = captures
            .get(2)
            .map(|m| m.as_str().trim())
            .ok_or(ExtractionError::NoReviewRemainder)?;

        if self.require_review && review.is_empty() {
            return Err(ExtractionError::NoReviewRemainder);
        }

        Ok(RatingReview {
            rating,
            review: review.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(text: &str) -> ExtractionResult {
        RatingReviewExtractor::new().extract(text)
    }

    #[test]
    fn test_rating_with_out_of_and_stars() {
        let result = extract("4.5/5 stars Exceptional luxury hotel with outstanding service.").unwrap();
        assert_eq!(result.rating, 4.5);
        assert_eq!(result.review, "Exceptional luxury hotel with outstanding service.");
    }

    #[test]
    fn test_rating_with_stars_suffix() {
        let result = extract("4 stars Great hotel near the beach").unwrap();
        assert_eq!(result.rating, 4.0);
        assert_eq!(result.review, "Great hotel near the beach");
    }

    #[test]
    fn test_rating_after_label() {
        let result = extract("Rating: 3.8/5 Clean rooms and friendly staff.").unwrap();
        assert_eq!(result.rating, 3.8);
        assert_eq!(result.review, "Clean rooms and friendly staff.");
    }

    #[test]
    fn test_no_digits_is_no_rating_token() {
        assert_eq!(
            extract("Invalid response without rating"),
            Err(ExtractionError::NoRatingToken)
        );
        assert_eq!(
            extract("Invalid stars Great hotel with excellent service"),
            Err(ExtractionError::NoRatingToken)
        );
        assert_eq!(extract(""), Err(ExtractionError::NoRatingToken));
    }

    #[test]
    fn test_bare_number_gives_empty_review() {
        let result = extract("4.5").unwrap();
        assert_eq!(result.rating, 4.5);
        assert_eq!(result.review, "");
    }

    #[test]
    fn test_strict_extractor_rejects_empty_review() {
        let extractor = RatingReviewExtractor::new().require_review(true);
        assert_eq!(extractor.extract("4.5/5   "), Err(ExtractionError::NoReviewRemainder));
        assert!(extractor.extract("4.5/5 Lovely stay").is_ok());
    }

    #[test]
    fn test_review_spans_lines() {
        let result = extract("4.2/5\nSpacious rooms.\nGreat breakfast.").unwrap();
        assert_eq!(result.rating, 4.2);
        assert_eq!(result.review, "Spacious rooms.\nGreat breakfast.");
    }

    #[test]
    fn test_suffix_is_case_sensitive() {
        let result = extract("5 Stars Wonderful").unwrap();
        assert_eq!(result.rating, 5.0);
        assert_eq!(result.review, "Stars Wonderful");
    }

    #[test]
    fn test_rating_range_is_unconstrained() {
        let result = extract("87.5 out of 100, a solid choice").unwrap();
        assert_eq!(result.rating, 87.5);
        assert_eq!(result.review, "out of 100, a solid choice");
    }

    #[test]
    fn test_zero_rating_is_still_extracted() {
        let result = RatingReviewExtractor::new()
            .require_review(true)
            .extract("0/5 stars Terrible stay")
            .unwrap();
        assert_eq!(result.rating, 0.0);
        assert_eq!(result.review, "Terrible stay");
    }

    #[test]
    fn test_not_reapplicable_to_own_review() {
        let first = extract("4.5/5 stars Charming boutique hotel.").unwrap();
        assert_eq!(extract(&first.review), Err(ExtractionError::NoRatingToken));
    }

    #[test]
    fn test_non_ascii_digits_are_not_ratings() {
        assert_eq!(extract("٤ stars"), Err(ExtractionError::NoRatingToken));
    }
}
