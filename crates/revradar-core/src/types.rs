//! Canonical data model shared by the scraping engine and its collaborators.
//!
//! Two provenance paths produce reviews of different completeness:
//!
//! - the public review API yields full records (`id` and `rating` present),
//! - DOM extraction from a rendered page yields neither `id` nor `rating`.
//!
//! Both are represented by one [`Review`] shape with optional fields.
//! Review `id` uniqueness is enforced by the persistence collaborator, not
//! here — repeated fetch cycles may hand the store duplicate records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One physical listed location of a company in the upstream directory.
///
/// `id` is the stable upstream identifier (the last path segment of the
/// branch's deep link); the store keys branches by it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub id: String,
    pub name: String,
    /// Deep path to the branch page, query-stripped.
    pub link: String,
    /// Back-reference to the owning company by name only.
    pub company_name: String,
}

/// A company, derived from the first branch found in a resolution batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub name: String,
}

/// A normalized review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    /// Upstream-unique identifier. Absent on the DOM-extraction path.
    pub id: Option<String>,
    pub author: String,
    /// ISO-8601 on the API path, upstream-specific display text on the
    /// DOM path. Kept as a string; parsing is best-effort at filter time.
    pub date: String,
    /// 0–5 star rating. API path only.
    pub rating: Option<u8>,
    /// Photo preview URLs in upstream order.
    pub photos: Vec<String>,
    pub text: String,
    pub reply: Option<Reply>,
}

/// An official business reply attached to a review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub author: String,
    pub date: String,
    pub text: String,
}

/// Opaque bearer key for the public review API.
///
/// Fetched once per scraping session and reused for every paginated call in
/// that session. An empty key is a valid, degraded value — the upstream may
/// serve a limited result set for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential(pub String);

impl Credential {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Keeps only reviews strictly newer than `cutoff`.
///
/// This is the "reviews newer than timestamp T" filtering boundary the
/// polling collaborator uses between cycles. Dates that do not parse as
/// RFC 3339 are RETAINED: over-sending an already-seen review is preferred
/// to silently dropping a new one whose date format drifted upstream.
#[must_use]
pub fn filter_newer_than(reviews: Vec<Review>, cutoff: DateTime<Utc>) -> Vec<Review> {
    reviews
        .into_iter()
        .filter(|r| match DateTime::parse_from_rfc3339(&r.date) {
            Ok(date) => date.with_timezone(&Utc) > cutoff,
            Err(_) => true,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review_dated(date: &str) -> Review {
        Review {
            id: Some("r1".to_owned()),
            author: "Ann".to_owned(),
            date: date.to_owned(),
            rating: Some(5),
            photos: vec![],
            text: "fine".to_owned(),
            reply: None,
        }
    }

    #[test]
    fn filter_newer_than_drops_older_reviews() {
        let cutoff = DateTime::parse_from_rfc3339("2024-06-01T00:00:00+00:00")
            .unwrap()
            .with_timezone(&Utc);
        let reviews = vec![
            review_dated("2024-05-30T10:00:00+00:00"),
            review_dated("2024-06-02T10:00:00+00:00"),
        ];
        let kept = filter_newer_than(reviews, cutoff);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].date, "2024-06-02T10:00:00+00:00");
    }

    #[test]
    fn filter_newer_than_retains_unparseable_dates() {
        let cutoff = DateTime::parse_from_rfc3339("2024-06-01T00:00:00+00:00")
            .unwrap()
            .with_timezone(&Utc);
        let reviews = vec![review_dated("3 weeks ago")];
        let kept = filter_newer_than(reviews, cutoff);
        assert_eq!(kept.len(), 1, "non-ISO dates must not be dropped");
    }

    #[test]
    fn filter_newer_than_excludes_exact_cutoff() {
        let cutoff = DateTime::parse_from_rfc3339("2024-06-01T00:00:00+00:00")
            .unwrap()
            .with_timezone(&Utc);
        let kept = filter_newer_than(vec![review_dated("2024-06-01T00:00:00+00:00")], cutoff);
        assert!(kept.is_empty(), "strictly-newer semantics");
    }
}
