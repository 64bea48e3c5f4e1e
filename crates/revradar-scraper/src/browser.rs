//! Headless-browser session management on top of chromiumoxide.
//!
//! The rendered path exists for two reasons the static path cannot cover:
//! markup that only materializes after client-side hydration, and the
//! review API key that is only observable as browser network traffic.
//! Everything DOM-shaped is snapshotted with [`Page::content`] and handed
//! to the same pure parsers the static path uses.

use std::path::PathBuf;
use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::CookieParam;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;

use revradar_core::AppConfig;

use crate::cookies::{CookieStore, StoredCookie};
use crate::error::ScraperError;
use crate::selectors;

/// Poll interval for selector waits.
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Bound on "load more" clicks per reviews tab. The longest observed
/// threads are a few hundred reviews deep; this is far past that.
const MAX_LOAD_MORE_CLICKS: usize = 500;

/// A launched browser plus the resources that keep it alive.
///
/// Dropping the client aborts the CDP event pump; the browser process
/// itself is reaped on [`RenderedClient::shutdown`].
pub struct RenderedClient {
    browser: Browser,
    event_pump: JoinHandle<()>,
    cookie_store: CookieStore,
    settle_delay: Duration,
}

impl RenderedClient {
    /// Launches a browser per the process configuration.
    ///
    /// Headless by default; `headful` is a debugging aid. When no local
    /// Chrome/Chromium binary is found on the known paths, discovery is
    /// left to chromiumoxide.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::Configuration`] — invalid launch options.
    /// - [`ScraperError::Browser`] — the browser process failed to start.
    pub async fn launch(config: &AppConfig) -> Result<Self, ScraperError> {
        let mut builder = BrowserConfig::builder();
        if config.headful {
            builder = builder.with_head();
        }
        if let Some(executable) = find_chrome() {
            tracing::debug!(path = %executable.display(), "using local browser binary");
            builder = builder.chrome_executable(executable);
        }
        let browser_config = builder
            .build()
            .map_err(|reason| ScraperError::Configuration { reason })?;

        let (browser, mut handler) = Browser::launch(browser_config).await?;
        let event_pump = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });
        tracing::info!(headful = config.headful, "browser launched");

        Ok(Self {
            browser,
            event_pump,
            cookie_store: CookieStore::new(&config.cookie_path),
            settle_delay: Duration::from_millis(config.settle_delay_ms),
        })
    }

    /// Opens a blank page with the persisted cookie jar applied.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Browser`] if the page cannot be created or
    /// the cookies cannot be set.
    pub async fn open_page(&self) -> Result<Page, ScraperError> {
        let page = self.browser.new_page("about:blank").await?;

        let stored = self.cookie_store.load().await;
        if !stored.is_empty() {
            let params: Vec<CookieParam> = stored.into_iter().map(Into::into).collect();
            page.set_cookies(params).await?;
        }
        Ok(page)
    }

    /// Navigates and waits for the load event.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Browser`] on navigation failure.
    pub async fn navigate(&self, page: &Page, url: &str) -> Result<(), ScraperError> {
        tracing::debug!(url, "navigating");
        page.goto(url).await?;
        page.wait_for_navigation().await?;
        Ok(())
    }

    /// Waits for an in-flight navigation to complete, e.g. after clicking a
    /// control that triggers one.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Browser`] if the navigation fails.
    pub async fn wait_for_navigation(&self, page: &Page) -> Result<(), ScraperError> {
        page.wait_for_navigation().await?;
        Ok(())
    }

    /// Navigates without waiting for the load event. Used when the caller
    /// only needs the navigation to start, not the page to finish
    /// hydrating — a selector wait or network listener picks up from there.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Browser`] on navigation failure.
    pub async fn navigate_weak(&self, page: &Page, url: &str) -> Result<(), ScraperError> {
        tracing::debug!(url, "navigating (weak)");
        page.goto(url).await?;
        Ok(())
    }

    /// Clicks the cookie-consent interstitial away if present. Absence is
    /// the common case and not an error; a failed click is logged and
    /// ignored.
    pub async fn dismiss_interstitial(&self, page: &Page) {
        let Ok(control) = page.find_element(selectors::INTERSTITIAL_DISMISS).await else {
            return;
        };
        match control.click().await {
            Ok(_) => tracing::debug!("dismissed consent interstitial"),
            Err(err) => tracing::warn!(error = %err, "consent interstitial click failed"),
        }
    }

    /// Polls for `css` to appear, up to `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::StructuralMismatch`] when the selector never
    /// materializes within the deadline.
    pub async fn wait_for_selector(
        &self,
        page: &Page,
        css: &str,
        timeout: Duration,
    ) -> Result<(), ScraperError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if page.find_element(css).await.is_ok() {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(ScraperError::StructuralMismatch {
                    what: format!("selector {css} did not appear within {timeout:?}"),
                });
            }
            tokio::time::sleep(WAIT_POLL_INTERVAL).await;
        }
    }

    /// Expands a reviews tab by clicking "load more" until the control
    /// disappears.
    ///
    /// A click that stops working mid-way (detached node, re-render) ends
    /// expansion with a warning; whatever is in the DOM at that point is
    /// what gets parsed.
    pub async fn load_all_reviews(&self, page: &Page) {
        for clicks in 0..MAX_LOAD_MORE_CLICKS {
            let Ok(control) = page.find_element(selectors::LOAD_MORE).await else {
                tracing::debug!(clicks, "reviews fully expanded");
                return;
            };
            if let Err(err) = control.click().await {
                tracing::warn!(clicks, error = %err, "load-more click failed, stopping expansion");
                return;
            }
            tokio::time::sleep(self.settle_delay).await;
        }
        tracing::warn!(
            max_clicks = MAX_LOAD_MORE_CLICKS,
            "load-more click bound reached, parsing what loaded"
        );
    }

    /// Full rendered-DOM snapshot of the page.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Browser`] if the snapshot cannot be taken.
    pub async fn snapshot(&self, page: &Page) -> Result<String, ScraperError> {
        Ok(page.content().await?)
    }

    /// Persists the page's current cookies to the jar on disk.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Browser`] when cookies cannot be read, or
    /// [`ScraperError::Configuration`] when the jar cannot be written.
    pub async fn save_cookies(&self, page: &Page) -> Result<(), ScraperError> {
        let cookies = page.get_cookies().await?;
        let stored: Vec<StoredCookie> = cookies.iter().map(StoredCookie::from).collect();
        self.cookie_store.save(&stored).await
    }

    /// Closes `page` unless it is the browser's last remaining page.
    /// Closing the last page kills some Chrome builds outright, so the
    /// final page is left for [`RenderedClient::shutdown`] to reap.
    ///
    /// Returns whether the page was actually closed.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Browser`] if the page list cannot be read or
    /// the close command fails.
    pub async fn close_page(&self, page: Page) -> Result<bool, ScraperError> {
        let open = self.browser.pages().await?;
        if open.len() <= 1 {
            tracing::debug!("keeping last page open");
            return Ok(false);
        }
        page.close().await?;
        Ok(true)
    }

    /// Closes the browser process.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Browser`] if the browser refuses the close
    /// command.
    pub async fn shutdown(mut self) -> Result<(), ScraperError> {
        self.browser.close().await?;
        self.browser.wait().await.ok();
        Ok(())
    }
}

impl Drop for RenderedClient {
    fn drop(&mut self) {
        self.event_pump.abort();
    }
}

/// Looks for a Chrome/Chromium binary on well-known paths, honoring the
/// `CHROME` override first.
fn find_chrome() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("CHROME") {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }

    const CANDIDATES: &[&str] = &[
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
    ];
    CANDIDATES
        .iter()
        .map(PathBuf::from)
        .find(|path| path.exists())
}
