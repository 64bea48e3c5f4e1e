//! Scraping engine: company resolution, credential interception, and
//! review acquisition against the 2GIS directory.
//!
//! The engine is storage-agnostic; callers supply a
//! [`revradar_core::ReviewStore`] and drive batches through
//! [`batch::scrape_all`].

pub mod batch;
pub mod browser;
pub mod cookies;
pub mod credential;
pub mod directory;
pub mod dom_review;
pub mod error;
pub mod normalize;
pub mod parse;
pub mod reviews;
pub mod selectors;
pub mod source;
pub mod types;

mod retry;

pub use batch::{scrape_all, BatchOutcome, ConcurrencyGuard};
pub use browser::RenderedClient;
pub use cookies::{CookieStore, StoredCookie};
pub use credential::extract_api_key;
pub use directory::{RenderedResolver, Resolution, StaticResolver};
pub use error::ScraperError;
pub use reviews::ReviewClient;
pub use source::{acquire_credential, ApiReviewSource, DomReviewSource, ReviewSource};
