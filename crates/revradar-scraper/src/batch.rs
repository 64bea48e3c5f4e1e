//! Concurrent per-branch scraping with bounded admission.
//!
//! Every branch runs its full acquire-and-store lifecycle inside one permit
//! of a shared semaphore, so at most `limit` branches are in flight no
//! matter how large the company. Branch failures are isolated: one branch
//! going dark is logged and counted, never fatal to the batch.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;

use revradar_core::ReviewStore;

use crate::directory::Resolution;
use crate::error::ScraperError;
use crate::source::ReviewSource;

/// Admission bound for concurrent branch lifecycles.
#[derive(Clone)]
pub struct ConcurrencyGuard {
    semaphore: Arc<Semaphore>,
}

impl ConcurrencyGuard {
    /// # Errors
    ///
    /// Returns [`ScraperError::Configuration`] for a zero limit, which
    /// would deadlock every acquisition.
    pub fn new(limit: usize) -> Result<Self, ScraperError> {
        if limit == 0 {
            return Err(ScraperError::Configuration {
                reason: "max_concurrent_scrapes must be at least 1".to_owned(),
            });
        }
        Ok(Self {
            semaphore: Arc::new(Semaphore::new(limit)),
        })
    }

    /// Waits for an admission slot.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Configuration`] if the semaphore was closed,
    /// which this crate never does.
    pub async fn admit(&self) -> Result<OwnedSemaphorePermit, ScraperError> {
        Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| ScraperError::Configuration {
                reason: "concurrency guard closed".to_owned(),
            })
    }
}

/// Outcome counters for one batch run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchOutcome {
    pub branches: usize,
    pub failed: usize,
    pub reviews_stored: usize,
}

/// Scrapes and stores the reviews of every branch in `resolution`.
///
/// The company and its branches are recorded first; branch review
/// lifecycles then run concurrently under `guard`. A branch whose source or
/// store call fails is counted in [`BatchOutcome::failed`] and the batch
/// carries on.
///
/// # Errors
///
/// Fails only on batch-level problems: recording the company itself, or a
/// scrape task panicking.
pub async fn scrape_all(
    resolution: &Resolution,
    source: Arc<dyn ReviewSource>,
    store: Arc<dyn ReviewStore>,
    guard: &ConcurrencyGuard,
) -> anyhow::Result<BatchOutcome> {
    store.upsert_company(&resolution.company).await?;

    let mut tasks = JoinSet::new();
    for branch in resolution.branches.iter().cloned() {
        let source = Arc::clone(&source);
        let store = Arc::clone(&store);
        let guard = guard.clone();

        tasks.spawn(async move {
            let _permit = match guard.admit().await {
                Ok(permit) => permit,
                Err(err) => return (branch.id, Err(anyhow::Error::new(err))),
            };

            let outcome = async {
                store.upsert_branch(&branch).await?;
                let reviews = source.reviews_for(&branch).await?;
                store.upsert_reviews(&branch.id, &reviews).await?;
                Ok::<usize, anyhow::Error>(reviews.len())
            }
            .await;
            (branch.id, outcome)
        });
    }

    let mut result = BatchOutcome {
        branches: resolution.branches.len(),
        ..BatchOutcome::default()
    };
    while let Some(joined) = tasks.join_next().await {
        let (branch_id, outcome) = joined?;
        match outcome {
            Ok(stored) => {
                result.reviews_stored += stored;
                tracing::debug!(branch_id, stored, "branch scraped");
            }
            Err(err) => {
                result.failed += 1;
                tracing::warn!(branch_id, error = %err, "branch scrape failed");
            }
        }
    }

    tracing::info!(
        company = %resolution.company.name,
        branches = result.branches,
        failed = result.failed,
        reviews = result.reviews_stored,
        "batch complete"
    );
    Ok(result)
}
