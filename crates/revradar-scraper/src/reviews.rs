//! HTTP client for the public review API.
//!
//! Pagination follows the opaque `meta.next_link` cursor until it is
//! absent. Upstream instability is expected and never fatal: a non-2xx
//! status, a network failure that survives retries, or a body that stops
//! parsing all end the walk and hand back whatever accumulated so far.

use std::time::Duration;

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use reqwest::Client;

use revradar_core::{AppConfig, Credential, Review};

use crate::error::ScraperError;
use crate::normalize::normalize_review;
use crate::retry::retry_with_backoff;
use crate::types::ReviewsResponse;

/// Maximum number of cursor pages to follow per branch.
/// Prevents infinite loops on cycling cursors.
const MAX_PAGES: usize = 200;

/// Client for `GET {api_base}/{branch_id}/reviews`.
///
/// Transient errors (429, network failures) are retried with exponential
/// backoff up to `max_retries` additional attempts per page.
pub struct ReviewClient {
    client: Client,
    api_base: String,
    max_retries: u32,
    backoff_base_secs: u64,
}

impl ReviewClient {
    /// Creates a `ReviewClient` with configured timeout, `User-Agent`, and
    /// retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        api_base: impl Into<String>,
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_secs: u64,
    ) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_owned(),
            max_retries,
            backoff_base_secs,
        })
    }

    /// Creates a `ReviewClient` from the process configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn from_config(config: &AppConfig) -> Result<Self, ScraperError> {
        Self::new(
            config.review_api_url.clone(),
            config.request_timeout_secs,
            &config.user_agent,
            config.max_retries,
            config.retry_backoff_base_secs,
        )
    }

    /// Fetches and normalizes all reviews for one branch.
    ///
    /// Finite and not restartable: each call re-pages from the start. The
    /// session credential is used for the first request; every `next_link`
    /// already re-encodes it and is followed verbatim.
    ///
    /// Never fails: any upstream error stops pagination with a warning and
    /// returns the reviews accumulated so far (possibly none).
    pub async fn fetch_reviews(
        &self,
        branch_id: &str,
        key: &Credential,
        page_size: u32,
    ) -> Vec<Review> {
        let mut reviews: Vec<Review> = Vec::new();
        let mut url = self.first_page_url(branch_id, key, page_size);
        let mut pages = 0usize;

        loop {
            pages += 1;
            if pages > MAX_PAGES {
                tracing::warn!(
                    branch_id,
                    max_pages = MAX_PAGES,
                    "cursor chain exceeded page bound — returning partial results"
                );
                break;
            }

            let page = match self.fetch_page(&url).await {
                Ok(page) => page,
                Err(err) => {
                    tracing::warn!(
                        branch_id,
                        page = pages,
                        error = %err,
                        "review page fetch failed — returning partial results"
                    );
                    break;
                }
            };

            reviews.extend(page.reviews.into_iter().map(normalize_review));

            match page.meta.next_link {
                Some(next) if !next.is_empty() => url = next,
                _ => break,
            }
        }

        tracing::info!(branch_id, count = reviews.len(), "fetched reviews");
        reviews
    }

    /// Fetches one page of reviews, with automatic retry on transient errors.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::RateLimited`] — HTTP 429 after all retries exhausted.
    /// - [`ScraperError::UnexpectedStatus`] — any other non-2xx status.
    /// - [`ScraperError::Http`] — network failure after all retries exhausted.
    /// - [`ScraperError::Deserialize`] — body is not the expected JSON shape.
    async fn fetch_page(&self, url: &str) -> Result<ReviewsResponse, ScraperError> {
        retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            let url = url.to_owned();
            async move {
                let response = self.client.get(&url).send().await?;
                let status = response.status();

                if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    let retry_after_secs = response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.parse::<u64>().ok())
                        .unwrap_or(60);
                    return Err(ScraperError::RateLimited {
                        domain: extract_domain(&url),
                        retry_after_secs,
                    });
                }

                if !status.is_success() {
                    return Err(ScraperError::UnexpectedStatus {
                        status: status.as_u16(),
                        url,
                    });
                }

                let body = response.text().await?;
                serde_json::from_str::<ReviewsResponse>(&body).map_err(|e| {
                    ScraperError::Deserialize {
                        context: format!("review page from {url}"),
                        source: e,
                    }
                })
            }
        })
        .await
    }

    /// First-page URL: `{api_base}/{branch_id}/reviews?key=…&limit=…`.
    ///
    /// The key is percent-encoded; observed keys are alphanumeric but the
    /// value is upstream-controlled.
    fn first_page_url(&self, branch_id: &str, key: &Credential, page_size: u32) -> String {
        let key = utf8_percent_encode(key.as_str(), NON_ALPHANUMERIC);
        format!(
            "{}/{}/reviews?key={}&limit={}",
            self.api_base, branch_id, key, page_size
        )
    }
}

/// Hostname portion of a URL for error messages; falls back to the full
/// string when it does not look like a URL.
fn extract_domain(url: &str) -> String {
    let without_scheme = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);
    without_scheme
        .split('/')
        .next()
        .unwrap_or(url)
        .to_owned()
}
