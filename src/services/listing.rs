use crate::error::UploadError;
use crate::models::RemoteObjectEntry;
use crate::services::storage::{ListOptions, ObjectStore, SortOrder};
use std::sync::Arc;

/// One page only: anything past this many objects is not shown.
pub const DEFAULT_LIST_LIMIT: usize = 100;

/// Fetches the bucket's authoritative contents for the grid.
pub struct ListingService {
    store: Arc<dyn ObjectStore>,
    limit: usize,
}

impl ListingService {
    pub fn new(store: Arc<dyn ObjectStore>, limit: usize) -> Self {
        Self { store, limit }
    }

    /// Newest keys first (names are millisecond timestamps, so descending by name).
    pub async fn refresh(&self) -> Result<Vec<RemoteObjectEntry>, UploadError> {
        let options = ListOptions {
            limit: self.limit,
            offset: 0,
            order: SortOrder::Desc,
        };

        let mut entries = self
            .store
            .list("", &options)
            .await
            .map_err(UploadError::ListFailure)?;

        entries.sort_by(|a, b| b.name.cmp(&a.name));
        entries.truncate(self.limit);

        tracing::debug!("📂 Listed {} objects", entries.len());
        if entries.len() == self.limit {
            tracing::debug!("Listing hit the {} entry page limit", self.limit);
        }
        Ok(entries)
    }

    /// Same template the upload path resolves with.
    pub fn public_url(&self, entry: &RemoteObjectEntry) -> String {
        self.store.public_url(&entry.name)
    }
}
