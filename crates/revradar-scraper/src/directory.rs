//! Company resolution against the directory's search pages.
//!
//! Two strategies share the card parser in [`crate::parse`]:
//!
//! - **static** — plain HTTP GETs against `/{city}/search/{name}` and its
//!   `/page/{n}` continuations. Cheap, no browser, works while the upstream
//!   keeps server-rendering result pages.
//! - **rendered** — a real page that clicks the pagination control. Needed
//!   when hydration rewrites the card markup or the static path starts
//!   returning shells.

use std::time::Duration;

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use reqwest::Client;
use serde::Serialize;

use revradar_core::{clean_text, AppConfig, Branch, Company};

use crate::browser::RenderedClient;
use crate::error::ScraperError;
use crate::parse::{extract_branch_cards, has_empty_results_marker};
use crate::retry::retry_with_backoff;
use crate::selectors;

/// Bound on search result pages walked per company.
const MAX_SEARCH_PAGES: usize = 50;

/// Outcome of resolving one company name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub company: Company,
    pub branches: Vec<Branch>,
}

impl Resolution {
    /// Builds a resolution from accumulated branch cards. With no cards the
    /// company keeps the (cleaned) query name so downstream records still
    /// have something to attach to.
    fn from_branches(query: &str, branches: Vec<Branch>) -> Self {
        let name = branches
            .first()
            .map(|b| b.company_name.clone())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| clean_text(query));
        Self {
            company: Company { name },
            branches,
        }
    }
}

/// Search URL for one result page. Page 1 has no path suffix.
fn search_page_url(base: &str, city: &str, company: &str, page: usize) -> String {
    let base = base.trim_end_matches('/');
    let company = utf8_percent_encode(company, NON_ALPHANUMERIC);
    if page <= 1 {
        format!("{base}/{city}/search/{company}")
    } else {
        format!("{base}/{city}/search/{company}/page/{page}")
    }
}

/// Appends cards whose `id` is not already accumulated, returning how many
/// were new. Re-reading a page (stale DOM after a click that did not take)
/// must not duplicate branch records.
fn append_new_branches(branches: &mut Vec<Branch>, cards: Vec<Branch>) -> usize {
    let mut added = 0;
    for card in cards {
        if branches.iter().any(|b| b.id == card.id) {
            continue;
        }
        branches.push(card);
        added += 1;
    }
    added
}

/// Resolver over plain HTTP.
pub struct StaticResolver {
    client: Client,
    base: String,
    city: String,
    max_retries: u32,
    backoff_base_secs: u64,
}

impl StaticResolver {
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the HTTP client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(&config.user_agent)
            .build()?;
        Ok(Self {
            client,
            base: config.search_base_url.clone(),
            city: config.city.clone(),
            max_retries: config.max_retries,
            backoff_base_secs: config.retry_backoff_base_secs,
        })
    }

    /// Walks search result pages for `company_name` until the directory
    /// signals exhaustion.
    ///
    /// Exhaustion signals, in the order checked: the empty-results marker,
    /// a page with no cards, and the directory redirecting a `/page/{n}`
    /// request back to the first page's URL (its way of saying "past the
    /// end"). A fetch failure past page 1 degrades to a partial result.
    ///
    /// # Errors
    ///
    /// Propagates the page-1 fetch error; a company that cannot be searched
    /// at all is a hard failure.
    pub async fn resolve(&self, company_name: &str) -> Result<Resolution, ScraperError> {
        let mut branches: Vec<Branch> = Vec::new();
        let mut first_page_final_url: Option<String> = None;

        for page in 1..=MAX_SEARCH_PAGES {
            let url = search_page_url(&self.base, &self.city, company_name, page);
            let (body, final_url) = match self.fetch_page(&url).await {
                Ok(fetched) => fetched,
                Err(err) if page == 1 => return Err(err),
                Err(err) => {
                    tracing::warn!(page, error = %err, "search page fetch failed, stopping walk");
                    break;
                }
            };

            match &first_page_final_url {
                None => first_page_final_url = Some(final_url),
                Some(first) if *first == final_url => {
                    tracing::debug!(page, "redirected back to first page, walk complete");
                    break;
                }
                Some(_) => {}
            }

            if has_empty_results_marker(&body) {
                tracing::debug!(page, "empty-results marker, walk complete");
                break;
            }
            let cards = extract_branch_cards(&body);
            if cards.is_empty() {
                tracing::debug!(page, "no branch cards, walk complete");
                break;
            }
            branches.extend(cards);
        }

        tracing::info!(
            company = company_name,
            branches = branches.len(),
            "resolved company (static)"
        );
        Ok(Resolution::from_branches(company_name, branches))
    }

    /// Fetches one search page, returning the body together with the final
    /// URL after redirects (the walk's termination signal).
    async fn fetch_page(&self, url: &str) -> Result<(String, String), ScraperError> {
        retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            let url = url.to_owned();
            async move {
                let response = self.client.get(&url).send().await?;
                let status = response.status();
                if !status.is_success() {
                    return Err(ScraperError::UnexpectedStatus {
                        status: status.as_u16(),
                        url,
                    });
                }
                let final_url = response.url().to_string();
                let body = response.text().await?;
                Ok((body, final_url))
            }
        })
        .await
    }
}

/// Resolver over a rendered page. Drives the pagination control instead of
/// requesting `/page/{n}` URLs, which keeps working when the upstream stops
/// serving deep links statically.
pub struct RenderedResolver<'a> {
    client: &'a RenderedClient,
    base: String,
    city: String,
    selector_wait: Duration,
}

impl<'a> RenderedResolver<'a> {
    pub fn new(client: &'a RenderedClient, config: &AppConfig) -> Self {
        Self {
            client,
            base: config.search_base_url.clone(),
            city: config.city.clone(),
            selector_wait: Duration::from_secs(config.request_timeout_secs),
        }
    }

    /// Resolves `company_name` by rendering the search page and clicking
    /// through the pagination control while it stays active.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::Browser`] — page or navigation failure.
    /// - [`ScraperError::StructuralMismatch`] — no branch card ever
    ///   rendered; indistinguishable from a markup change, so surfaced
    ///   rather than treated as "not found".
    pub async fn resolve(&self, company_name: &str) -> Result<Resolution, ScraperError> {
        let url = search_page_url(&self.base, &self.city, company_name, 1);
        let page = self.client.open_page().await?;

        let result = self.walk(&page, &url, company_name).await;
        if let Err(err) = self.client.save_cookies(&page).await {
            tracing::warn!(error = %err, "cookie save failed after resolution");
        }
        self.client.close_page(page).await?;

        result
    }

    async fn walk(
        &self,
        page: &chromiumoxide::Page,
        url: &str,
        company_name: &str,
    ) -> Result<Resolution, ScraperError> {
        self.client.navigate(page, url).await?;
        self.client
            .wait_for_selector(page, selectors::BRANCH_CARD, self.selector_wait)
            .await?;
        self.client.dismiss_interstitial(page).await;

        let mut branches = Vec::new();
        for page_no in 1..=MAX_SEARCH_PAGES {
            let html = self.client.snapshot(page).await?;
            let added = append_new_branches(&mut branches, extract_branch_cards(&html));
            if page_no > 1 && added == 0 {
                // A snapshot that adds nothing means the click never took
                // effect and we are re-reading the previous page.
                tracing::warn!(page_no, "stale page after pagination click, stopping walk");
                break;
            }

            if !self.click_next_if_active(page).await {
                tracing::debug!(page_no, "pagination exhausted");
                break;
            }
            // Readiness after a pagination click is a committed navigation
            // plus the control re-appearing, not a fixed delay.
            if let Err(err) = self.client.wait_for_navigation(page).await {
                tracing::warn!(page_no, error = %err, "navigation failed after click");
                break;
            }
            if let Err(err) = self
                .client
                .wait_for_selector(page, selectors::PAGINATION, self.selector_wait)
                .await
            {
                tracing::warn!(page_no, error = %err, "pagination never re-rendered after click");
                break;
            }
        }

        tracing::info!(
            company = company_name,
            branches = branches.len(),
            "resolved company (rendered)"
        );
        Ok(Resolution::from_branches(company_name, branches))
    }

    /// Clicks the next-page control if it carries the active class.
    /// Returns whether a click happened.
    async fn click_next_if_active(&self, page: &chromiumoxide::Page) -> bool {
        let Ok(next) = page.find_element(selectors::PAGINATION_NEXT).await else {
            return false;
        };
        let class = match next.attribute("class").await {
            Ok(Some(class)) => class,
            Ok(None) => return false,
            Err(err) => {
                tracing::warn!(error = %err, "pagination control unreadable");
                return false;
            }
        };
        if !class
            .split_whitespace()
            .any(|c| c == selectors::PAGINATION_ACTIVE_CLASS)
        {
            return false;
        }
        match next.click().await {
            Ok(_) => true,
            Err(err) => {
                tracing::warn!(error = %err, "pagination click failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_page_url_has_no_page_suffix() {
        assert_eq!(
            search_page_url("https://dir.test/", "ufa", "Acme Pizza", 1),
            "https://dir.test/ufa/search/Acme%20Pizza"
        );
    }

    #[test]
    fn later_pages_use_page_path_suffix() {
        assert_eq!(
            search_page_url("https://dir.test", "ufa", "Acme", 3),
            "https://dir.test/ufa/search/Acme/page/3"
        );
    }

    #[test]
    fn cyrillic_names_are_percent_encoded() {
        let url = search_page_url("https://dir.test", "ufa", "кафе", 1);
        assert_eq!(
            url,
            "https://dir.test/ufa/search/%D0%BA%D0%B0%D1%84%D0%B5"
        );
    }

    #[test]
    fn empty_resolution_keeps_query_name() {
        let res = Resolution::from_branches("  Acme  Pizza ", Vec::new());
        assert_eq!(res.company.name, "Acme Pizza");
        assert!(res.branches.is_empty());
    }

    fn branch_with_id(id: &str) -> Branch {
        Branch {
            id: id.into(),
            name: format!("Branch {id}"),
            link: format!("/ufa/firm/{id}"),
            company_name: "Acme".into(),
        }
    }

    #[test]
    fn reextracted_page_adds_no_duplicate_branches() {
        let mut branches = vec![branch_with_id("111"), branch_with_id("222")];
        // Same cards again, as a stale snapshot would yield.
        let added = append_new_branches(
            &mut branches,
            vec![branch_with_id("111"), branch_with_id("222")],
        );
        assert_eq!(added, 0);
        assert_eq!(branches.len(), 2);
    }

    #[test]
    fn fresh_cards_are_appended_in_order() {
        let mut branches = vec![branch_with_id("111")];
        let added = append_new_branches(
            &mut branches,
            vec![branch_with_id("111"), branch_with_id("333")],
        );
        assert_eq!(added, 1);
        let ids: Vec<&str> = branches.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["111", "333"]);
    }

    #[test]
    fn company_name_comes_from_first_branch() {
        let branch = Branch {
            id: "1".into(),
            name: "Center".into(),
            link: "/ufa/firm/1".into(),
            company_name: "Acme pizza, delivery".into(),
        };
        let res = Resolution::from_branches("acme", vec![branch]);
        assert_eq!(res.company.name, "Acme pizza, delivery");
    }
}
