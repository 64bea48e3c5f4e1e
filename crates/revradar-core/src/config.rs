use crate::app_config::AppConfig;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value fails to parse. Every variable has a
/// default, so a bare environment always produces a valid config.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the
/// process, without touching `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value fails to parse.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// The parsing/validation logic is decoupled from the actual environment so
/// it can be tested with a pure `HashMap` lookup — no `set_var`/`remove_var`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let city = or_default("REVRADAR_CITY", "ufa");
    let search_base_url = or_default("REVRADAR_SEARCH_BASE_URL", "https://2gis.ru");
    let review_api_url = or_default(
        "REVRADAR_REVIEW_API_URL",
        "https://public-api.reviews.2gis.com/2.0/branches",
    );
    let cookie_path = PathBuf::from(or_default("REVRADAR_COOKIE_PATH", "./cookies.json"));
    let user_agent = or_default("REVRADAR_USER_AGENT", "revradar/0.1 (review-aggregation)");
    let log_level = or_default("REVRADAR_LOG_LEVEL", "info");

    let request_timeout_secs = parse_u64("REVRADAR_REQUEST_TIMEOUT_SECS", "30")?;
    let max_concurrent_scrapes = parse_usize("REVRADAR_MAX_CONCURRENT_SCRAPES", "3")?;
    let review_page_size = parse_u32("REVRADAR_REVIEW_PAGE_SIZE", "50")?;
    let credential_wait_secs = parse_u64("REVRADAR_CREDENTIAL_WAIT_SECS", "20")?;
    let settle_delay_ms = parse_u64("REVRADAR_SETTLE_DELAY_MS", "200")?;
    let max_retries = parse_u32("REVRADAR_MAX_RETRIES", "3")?;
    let retry_backoff_base_secs = parse_u64("REVRADAR_RETRY_BACKOFF_BASE_SECS", "5")?;
    let headful = or_default("REVRADAR_HEADFUL", "0") == "1";

    Ok(AppConfig {
        city,
        search_base_url,
        review_api_url,
        cookie_path,
        user_agent,
        log_level,
        request_timeout_secs,
        max_concurrent_scrapes,
        review_page_size,
        credential_wait_secs,
        settle_delay_ms,
        max_retries,
        retry_backoff_base_secs,
        headful,
    })
}
