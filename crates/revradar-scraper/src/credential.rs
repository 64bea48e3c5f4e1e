//! Recovery of the ephemeral review API key via network interception.
//!
//! Rendering a branch's reviews tab makes the page itself call the review
//! API with a key embedded in the query string. The CDP request listener is
//! registered BEFORE navigation — a late-registered observer can miss the
//! request — and the first outgoing request matching the API prefix is
//! captured.
//!
//! The original design waited for that request without bound; here the wait
//! is bounded and expires as [`ScraperError::CredentialTimeout`] so one
//! stuck page cannot hang a whole batch.

use std::time::Duration;

use chromiumoxide::cdp::browser_protocol::network::EventRequestWillBeSent;
use chromiumoxide::Page;
use futures::{Stream, StreamExt};

use revradar_core::Credential;

use crate::error::ScraperError;

/// Navigates `page` to `target_url` and captures the API key from the first
/// request whose URL starts with `api_url_prefix`.
///
/// A captured request without a `key` query parameter yields an EMPTY
/// credential — degraded but valid, not an error.
///
/// # Errors
///
/// - [`ScraperError::Browser`] — listener registration or navigation failed.
/// - [`ScraperError::CredentialTimeout`] — no matching request within `wait`.
pub async fn extract_api_key(
    page: &Page,
    target_url: &str,
    api_url_prefix: &str,
    wait: Duration,
) -> Result<Credential, ScraperError> {
    // Ordering invariant: listen first, navigate second.
    let events = page.event_listener::<EventRequestWillBeSent>().await?;
    let urls = events.map(|ev| ev.request.url.clone());

    page.goto(target_url).await?;

    let captured = first_matching_request(urls, api_url_prefix, wait).await?;
    tracing::debug!(url = %captured, "intercepted credential request");
    Ok(key_from_request_url(&captured))
}

/// Waits for the first URL in `urls` that starts with `prefix`.
///
/// A stream that ends without a match is reported the same way as one that
/// never produces it: the credential was not observable.
///
/// # Errors
///
/// Returns [`ScraperError::CredentialTimeout`] if nothing matches within
/// `wait`.
pub(crate) async fn first_matching_request<S>(
    mut urls: S,
    prefix: &str,
    wait: Duration,
) -> Result<String, ScraperError>
where
    S: Stream<Item = String> + Unpin,
{
    let scan = async {
        while let Some(url) = urls.next().await {
            if url.starts_with(prefix) {
                return Some(url);
            }
        }
        None
    };

    match tokio::time::timeout(wait, scan).await {
        Ok(Some(url)) => Ok(url),
        Ok(None) | Err(_) => Err(ScraperError::CredentialTimeout {
            wait_secs: wait.as_secs(),
        }),
    }
}

/// The `key` query parameter of a captured request URL, or an empty
/// credential when absent.
pub(crate) fn key_from_request_url(url: &str) -> Credential {
    Credential(query_param(url, "key").unwrap_or_default())
}

/// Extracts the value of a named query parameter from a URL string.
///
/// Does not decode percent-encoded characters — observed keys are plain
/// alphanumeric tokens.
fn query_param(url: &str, param: &str) -> Option<String> {
    let query_start = url.find('?')? + 1;
    let query = &url[query_start..];

    let needle = format!("{param}=");
    for pair in query.split('&') {
        if let Some(value) = pair.strip_prefix(needle.as_str()) {
            let value = value.split('#').next().unwrap_or(value);
            if !value.is_empty() {
                return Some(value.to_owned());
            }
        }
    }
    None
}
