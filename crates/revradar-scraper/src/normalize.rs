//! Normalization from raw API records to [`revradar_core::Review`].

use revradar_core::{clean_text, Review, Reply};

use crate::types::{RawOfficialAnswer, RawReview};

/// Normalizes a raw API review into the canonical shape.
///
/// Field mapping: `author := user.name`, `date := date_created`,
/// `photos := photos[].preview_urls.url`, `reply := official_answer`.
/// Author and comment text pass through the text normalizer; dates and
/// URLs are kept verbatim.
#[must_use]
pub fn normalize_review(raw: RawReview) -> Review {
    let photos = raw
        .photos
        .into_iter()
        .map(|p| p.preview_urls.url)
        .filter(|url| !url.is_empty())
        .collect();

    Review {
        id: Some(raw.id),
        author: clean_text(&raw.user.name),
        date: raw.date_created,
        rating: raw.rating,
        photos,
        text: clean_text(&raw.text),
        reply: raw.official_answer.map(normalize_reply),
    }
}

fn normalize_reply(raw: RawOfficialAnswer) -> Reply {
    Reply {
        author: clean_text(&raw.org_name),
        date: raw.date_created,
        text: clean_text(&raw.text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ReviewsResponse;

    fn parse_one(json: &str) -> RawReview {
        let mut resp: ReviewsResponse = serde_json::from_str(json).unwrap();
        resp.reviews.remove(0)
    }

    #[test]
    fn maps_all_fields_from_full_record() {
        let raw = parse_one(
            r#"{"reviews":[{
                "id":"rev-1",
                "user":{"name":"Ivan P."},
                "text":"Nice  place",
                "date_created":"2024-06-03T11:22:33+05:00",
                "rating":4,
                "photos":[{"preview_urls":{"url":"https://img/a.jpg"}},
                          {"preview_urls":{"url":"https://img/b.jpg"}}],
                "official_answer":{"org_name":"Acme","date_created":"2024-06-04","text":"Thanks"}
            }],"meta":{}}"#,
        );
        let review = normalize_review(raw);
        assert_eq!(review.id.as_deref(), Some("rev-1"));
        assert_eq!(review.author, "Ivan P.");
        assert_eq!(review.text, "Nice place");
        assert_eq!(review.date, "2024-06-03T11:22:33+05:00");
        assert_eq!(review.rating, Some(4));
        assert_eq!(review.photos, vec!["https://img/a.jpg", "https://img/b.jpg"]);
        let reply = review.reply.unwrap();
        assert_eq!(reply.author, "Acme");
        assert_eq!(reply.date, "2024-06-04");
        assert_eq!(reply.text, "Thanks");
    }

    #[test]
    fn sparse_record_defaults_cleanly() {
        let raw = parse_one(r#"{"reviews":[{"id":"rev-2"}]}"#);
        let review = normalize_review(raw);
        assert_eq!(review.id.as_deref(), Some("rev-2"));
        assert!(review.author.is_empty());
        assert!(review.text.is_empty());
        assert!(review.rating.is_none());
        assert!(review.photos.is_empty());
        assert!(review.reply.is_none());
    }

    #[test]
    fn null_official_answer_maps_to_none() {
        let raw = parse_one(r#"{"reviews":[{"id":"rev-3","official_answer":null}]}"#);
        assert!(normalize_review(raw).reply.is_none());
    }

    #[test]
    fn empty_photo_urls_are_dropped() {
        let raw = parse_one(
            r#"{"reviews":[{"id":"rev-4","photos":[{"preview_urls":{}},
                {"preview_urls":{"url":"https://img/c.jpg"}}]}]}"#,
        );
        assert_eq!(normalize_review(raw).photos, vec!["https://img/c.jpg"]);
    }
}
