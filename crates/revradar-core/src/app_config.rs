use std::path::PathBuf;

/// Process-wide configuration, injected at startup.
///
/// Replaces the module-level path/URL constants of earlier iterations of
/// this pipeline: everything the engine touches — upstream endpoints, the
/// cookie cache file, timeouts, concurrency bounds — comes from here.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// City path segment used in directory search URLs.
    pub city: String,
    /// Directory site origin, e.g. `https://2gis.ru`.
    pub search_base_url: String,
    /// Public review API base, e.g.
    /// `https://public-api.reviews.2gis.com/2.0/branches`.
    pub review_api_url: String,
    /// JSON cookie cache shared by all rendered pages.
    pub cookie_path: PathBuf,
    pub user_agent: String,
    pub log_level: String,
    pub request_timeout_secs: u64,
    /// Admission bound for concurrent per-branch scrape lifecycles.
    pub max_concurrent_scrapes: usize,
    /// `limit` query parameter for review API pages.
    pub review_page_size: u32,
    /// Bounded wait for the intercepted credential request.
    pub credential_wait_secs: u64,
    /// Delay after each "load more" click before re-probing.
    pub settle_delay_ms: u64,
    pub max_retries: u32,
    pub retry_backoff_base_secs: u64,
    /// Launch the browser with a visible window (debugging aid).
    pub headful: bool,
}
