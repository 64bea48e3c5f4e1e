//! JSON-file implementation of the persistence collaborator.
//!
//! One file per branch under the output directory, plus a `company.json`
//! marker. Good enough for the CLI front end; the chat/scheduler
//! deployment supplies its own store.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use revradar_core::{filter_newer_than, Branch, Company, Review, ReviewStore};

#[derive(Debug, Serialize, Deserialize)]
struct BranchRecord {
    branch: Branch,
    reviews: Vec<Review>,
}

/// Directory-of-JSON-files store.
pub struct JsonFileStore {
    dir: PathBuf,
    branches: Mutex<HashMap<String, Branch>>,
}

impl JsonFileStore {
    /// # Errors
    ///
    /// Fails when the output directory cannot be created.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("creating output directory {}", dir.display()))?;
        Ok(Self {
            dir,
            branches: Mutex::new(HashMap::new()),
        })
    }

    fn branch_path(&self, branch_id: &str) -> PathBuf {
        self.dir.join(format!("{branch_id}.json"))
    }

    async fn read_record(&self, branch_id: &str) -> Option<BranchRecord> {
        let raw = tokio::fs::read_to_string(self.branch_path(branch_id))
            .await
            .ok()?;
        serde_json::from_str(&raw).ok()
    }

    async fn write_record(&self, branch_id: &str, record: &BranchRecord) -> Result<()> {
        let path = self.branch_path(branch_id);
        let body = serde_json::to_string_pretty(record)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body)
            .await
            .with_context(|| format!("writing {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .with_context(|| format!("moving {} into place", path.display()))?;
        Ok(())
    }
}

#[async_trait]
impl ReviewStore for JsonFileStore {
    async fn upsert_company(&self, company: &Company) -> Result<()> {
        let path = self.dir.join("company.json");
        tokio::fs::write(&path, serde_json::to_string_pretty(company)?)
            .await
            .with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    async fn upsert_branch(&self, branch: &Branch) -> Result<()> {
        self.branches
            .lock()
            .await
            .insert(branch.id.clone(), branch.clone());
        Ok(())
    }

    /// Merges by review `id`: known ids are replaced in place, id-less
    /// records (DOM path) are appended as-is.
    async fn upsert_reviews(&self, branch_id: &str, reviews: &[Review]) -> Result<()> {
        let branch = self
            .branches
            .lock()
            .await
            .get(branch_id)
            .cloned()
            .with_context(|| format!("reviews for unknown branch {branch_id}"))?;

        let mut record = self
            .read_record(branch_id)
            .await
            .unwrap_or(BranchRecord {
                branch,
                reviews: Vec::new(),
            });

        for incoming in reviews {
            let slot = incoming.id.as_ref().and_then(|id| {
                record
                    .reviews
                    .iter_mut()
                    .find(|existing| existing.id.as_ref() == Some(id))
            });
            match slot {
                Some(existing) => *existing = incoming.clone(),
                None => record.reviews.push(incoming.clone()),
            }
        }

        self.write_record(branch_id, &record).await
    }

    async fn reviews_newer_than(
        &self,
        branch_id: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Review>> {
        let reviews = self
            .read_record(branch_id)
            .await
            .map(|r| r.reviews)
            .unwrap_or_default();
        Ok(filter_newer_than(reviews, cutoff))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(id: Option<&str>, text: &str, date: &str) -> Review {
        Review {
            id: id.map(str::to_owned),
            author: "A".to_owned(),
            date: date.to_owned(),
            rating: None,
            photos: Vec::new(),
            text: text.to_owned(),
            reply: None,
        }
    }

    fn branch() -> Branch {
        Branch {
            id: "42".to_owned(),
            name: "Center".to_owned(),
            link: "/ufa/firm/42".to_owned(),
            company_name: "Acme".to_owned(),
        }
    }

    fn temp_store(tag: &str) -> (JsonFileStore, PathBuf) {
        let dir = std::env::temp_dir().join(format!("revradar-store-{tag}-{}", std::process::id()));
        (JsonFileStore::new(&dir).unwrap(), dir)
    }

    #[tokio::test]
    async fn upsert_replaces_by_id_and_appends_idless() {
        let (store, dir) = temp_store("upsert");
        store.upsert_branch(&branch()).await.unwrap();

        store
            .upsert_reviews(
                "42",
                &[
                    review(Some("r1"), "old text", "2024-01-01T00:00:00+00:00"),
                    review(None, "dom one", "1 May"),
                ],
            )
            .await
            .unwrap();
        store
            .upsert_reviews(
                "42",
                &[
                    review(Some("r1"), "new text", "2024-01-01T00:00:00+00:00"),
                    review(None, "dom two", "2 May"),
                ],
            )
            .await
            .unwrap();

        let record = store.read_record("42").await.unwrap();
        assert_eq!(record.reviews.len(), 3, "r1 replaced, dom records appended");
        assert_eq!(record.reviews[0].text, "new text");

        tokio::fs::remove_dir_all(&dir).await.ok();
    }

    #[tokio::test]
    async fn newer_than_filters_through_stored_reviews() {
        let (store, dir) = temp_store("newer");
        store.upsert_branch(&branch()).await.unwrap();
        store
            .upsert_reviews(
                "42",
                &[
                    review(Some("a"), "old", "2024-01-01T00:00:00+00:00"),
                    review(Some("b"), "new", "2024-07-01T00:00:00+00:00"),
                ],
            )
            .await
            .unwrap();

        let cutoff = DateTime::parse_from_rfc3339("2024-06-01T00:00:00+00:00")
            .unwrap()
            .with_timezone(&Utc);
        let newer = store.reviews_newer_than("42", cutoff).await.unwrap();
        assert_eq!(newer.len(), 1);
        assert_eq!(newer[0].text, "new");

        tokio::fs::remove_dir_all(&dir).await.ok();
    }

    #[tokio::test]
    async fn unknown_branch_reads_as_empty() {
        let (store, dir) = temp_store("empty");
        let cutoff = Utc::now();
        assert!(store
            .reviews_newer_than("missing", cutoff)
            .await
            .unwrap()
            .is_empty());
        tokio::fs::remove_dir_all(&dir).await.ok();
    }
}
