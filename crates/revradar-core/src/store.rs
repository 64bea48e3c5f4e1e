//! Interface to the persistence collaborator.
//!
//! The engine never talks to a database directly; the scheduling layer
//! supplies an implementation of [`ReviewStore`] with upsert-by-unique-key
//! semantics (`Branch` by `id`, `Company` by `name`, `Review` by `id`).
//! Review deduplication across polling cycles is the store's job — the
//! engine passes potential duplicates through.

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::types::{Branch, Company, Review};

/// Document-store capability expected by the engine's callers.
#[async_trait::async_trait]
pub trait ReviewStore: Send + Sync {
    /// Upserts a company by `name`.
    async fn upsert_company(&self, company: &Company) -> Result<()>;

    /// Upserts a branch by `id`.
    async fn upsert_branch(&self, branch: &Branch) -> Result<()>;

    /// Upserts reviews by `id`. Records without an id (DOM path) are
    /// stored under a store-chosen synthetic key.
    async fn upsert_reviews(&self, branch_id: &str, reviews: &[Review]) -> Result<()>;

    /// Reviews for a branch strictly newer than `cutoff`.
    async fn reviews_newer_than(
        &self,
        branch_id: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Review>>;
}
