//! Wire types for the public review API.
//!
//! Observed response shape for `GET {base}/{branch_id}/reviews`:
//!
//! ```text
//! {
//!   "reviews": [ { "id", "user": {"name"}, "text", "date_created",
//!                  "rating", "photos": [{"preview_urls": {"url"}}],
//!                  "official_answer": {"org_name", "text", "date_created"} } ],
//!   "meta": { "next_link": "..." }
//! }
//! ```
//!
//! Everything except `reviews` itself has been seen absent or null on live
//! responses, so fields default aggressively. `next_link` is an opaque
//! continuation URL that already encodes the key, limit, and offset — it is
//! followed verbatim.

use serde::Deserialize;

/// Top-level response of one review API page.
#[derive(Debug, Deserialize)]
pub struct ReviewsResponse {
    #[serde(default)]
    pub reviews: Vec<RawReview>,
    #[serde(default)]
    pub meta: ReviewsMeta,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReviewsMeta {
    /// Opaque cursor to the next page; absent on the last page.
    #[serde(default)]
    pub next_link: Option<String>,
}

/// One raw review record from the API.
#[derive(Debug, Deserialize)]
pub struct RawReview {
    pub id: String,
    #[serde(default)]
    pub user: RawUser,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub date_created: String,
    /// 0–5 stars. Present on the API path only.
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(default)]
    pub photos: Vec<RawPhoto>,
    /// Business reply; `null` when the business has not answered.
    #[serde(default)]
    pub official_answer: Option<RawOfficialAnswer>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawUser {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct RawPhoto {
    #[serde(default)]
    pub preview_urls: RawPreviewUrls,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawPreviewUrls {
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct RawOfficialAnswer {
    #[serde(default)]
    pub org_name: String,
    #[serde(default)]
    pub date_created: String,
    #[serde(default)]
    pub text: String,
}
