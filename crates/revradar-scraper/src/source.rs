//! Pluggable review acquisition behind a single trait.
//!
//! The API source is the primary path: structured records with ids and
//! ratings, fetched over plain HTTP with an intercepted credential. The DOM
//! source is the fallback when no credential could be intercepted or the
//! API goes dark; its records carry no id and no rating.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use revradar_core::{AppConfig, Branch, Credential, Review};

use crate::browser::RenderedClient;
use crate::credential::extract_api_key;
use crate::dom_review::extract_reviews;
use crate::error::ScraperError;
use crate::reviews::ReviewClient;
use crate::selectors;

/// One way of obtaining the reviews of a branch.
#[async_trait]
pub trait ReviewSource: Send + Sync {
    async fn reviews_for(&self, branch: &Branch) -> Result<Vec<Review>, ScraperError>;
}

/// The reviews tab of a branch's directory page, as an absolute URL.
pub(crate) fn reviews_tab_url(base: &str, branch_link: &str) -> String {
    let link = branch_link.trim_end_matches('/');
    if link.starts_with("http://") || link.starts_with("https://") {
        format!("{link}/tab/reviews")
    } else {
        format!("{}{link}/tab/reviews", base.trim_end_matches('/'))
    }
}

/// Opens a rendered page on the branch's reviews tab and captures the
/// review API key from the page's own traffic.
///
/// Any branch of the company works; the key is session-scoped, not
/// branch-scoped.
///
/// # Errors
///
/// - [`ScraperError::Browser`] — page or navigation failure.
/// - [`ScraperError::CredentialTimeout`] — the page never called the API.
pub async fn acquire_credential(
    client: &RenderedClient,
    config: &AppConfig,
    branch: &Branch,
) -> Result<Credential, ScraperError> {
    let url = reviews_tab_url(&config.search_base_url, &branch.link);
    let page = client.open_page().await?;

    let result = extract_api_key(
        &page,
        &url,
        &config.review_api_url,
        Duration::from_secs(config.credential_wait_secs),
    )
    .await;

    if let Err(err) = client.save_cookies(&page).await {
        tracing::warn!(error = %err, "cookie save failed after credential capture");
    }
    client.close_page(page).await?;

    let credential = result?;
    if credential.is_empty() {
        tracing::warn!(branch_id = %branch.id, "intercepted request carried no key");
    } else {
        tracing::info!(branch_id = %branch.id, "captured review API credential");
    }
    Ok(credential)
}

/// Review acquisition via the public review API.
pub struct ApiReviewSource {
    client: ReviewClient,
    key: Credential,
    page_size: u32,
}

impl ApiReviewSource {
    pub fn new(client: ReviewClient, key: Credential, page_size: u32) -> Self {
        Self {
            client,
            key,
            page_size,
        }
    }
}

#[async_trait]
impl ReviewSource for ApiReviewSource {
    /// Infallible by construction: the client degrades every upstream
    /// failure to a partial (possibly empty) result.
    async fn reviews_for(&self, branch: &Branch) -> Result<Vec<Review>, ScraperError> {
        Ok(self
            .client
            .fetch_reviews(&branch.id, &self.key, self.page_size)
            .await)
    }
}

/// Review acquisition by rendering the branch's reviews tab and parsing the
/// expanded DOM.
pub struct DomReviewSource {
    client: Arc<RenderedClient>,
    base: String,
    selector_wait: Duration,
}

impl DomReviewSource {
    pub fn new(client: Arc<RenderedClient>, config: &AppConfig) -> Self {
        Self {
            client,
            base: config.search_base_url.clone(),
            selector_wait: Duration::from_secs(config.request_timeout_secs),
        }
    }
}

#[async_trait]
impl ReviewSource for DomReviewSource {
    async fn reviews_for(&self, branch: &Branch) -> Result<Vec<Review>, ScraperError> {
        let url = reviews_tab_url(&self.base, &branch.link);
        let page = self.client.open_page().await?;

        let result = self.render_and_extract(&page, &url, branch).await;

        if let Err(err) = self.client.save_cookies(&page).await {
            tracing::warn!(error = %err, "cookie save failed after review render");
        }
        self.client.close_page(page).await?;
        result
    }
}

impl DomReviewSource {
    async fn render_and_extract(
        &self,
        page: &chromiumoxide::Page,
        url: &str,
        branch: &Branch,
    ) -> Result<Vec<Review>, ScraperError> {
        // Weak navigation: review content attaches asynchronously, the
        // selector wait below is the real readiness signal.
        self.client.navigate_weak(page, url).await?;

        // No review card can mean zero reviews just as well as rotted
        // markup; a branch with nothing to say is not an error.
        if self
            .client
            .wait_for_selector(page, selectors::REVIEW_CARD, self.selector_wait)
            .await
            .is_err()
        {
            tracing::warn!(branch_id = %branch.id, "no review cards rendered");
            return Ok(Vec::new());
        }

        self.client.dismiss_interstitial(page).await;
        self.client.load_all_reviews(page).await;

        let html = self.client.snapshot(page).await?;
        let reviews = extract_reviews(&html);
        tracing::info!(branch_id = %branch.id, count = reviews.len(), "extracted rendered reviews");
        Ok(reviews)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_link_is_joined_to_base() {
        assert_eq!(
            reviews_tab_url("https://dir.test/", "/ufa/firm/123/"),
            "https://dir.test/ufa/firm/123/tab/reviews"
        );
    }

    #[test]
    fn absolute_link_ignores_base() {
        assert_eq!(
            reviews_tab_url("https://dir.test", "https://other.test/ufa/firm/9"),
            "https://other.test/ufa/firm/9/tab/reviews"
        );
    }
}
