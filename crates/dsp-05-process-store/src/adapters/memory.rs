//! # In-Memory Process Store
//!
//! Map-backed adapter for tests and single-instance deployments.

use crate::domain::{StoreError, StoredProcess};
use crate::ports::ProcessStore;
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{ProcessId, Timestamp};
use std::collections::HashMap;
use tracing::trace;

struct Inner<P> {
    records: HashMap<ProcessId, P>,
    by_correlation: HashMap<String, ProcessId>,
}

/// In-memory [`ProcessStore`] with a correlation-id index.
pub struct InMemoryProcessStore<P: StoredProcess> {
    inner: RwLock<Inner<P>>,
}

impl<P: StoredProcess> InMemoryProcessStore<P> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                records: HashMap::new(),
                by_correlation: HashMap::new(),
            }),
        }
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.inner.read().records.len()
    }

    /// Store holds no records.
    pub fn is_empty(&self) -> bool {
        self.inner.read().records.is_empty()
    }

    /// Snapshot of every record.
    pub fn all(&self) -> Vec<P> {
        self.inner.read().records.values().cloned().collect()
    }
}

impl<P: StoredProcess> Default for InMemoryProcessStore<P> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<P: StoredProcess> ProcessStore<P> for InMemoryProcessStore<P> {
    async fn load(&self, id: ProcessId) -> Result<P, StoreError> {
        self.inner
            .read()
            .records
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn load_by_correlation_id(&self, correlation_id: &str) -> Result<P, StoreError> {
        let inner = self.inner.read();
        inner
            .by_correlation
            .get(correlation_id)
            .and_then(|id| inner.records.get(id))
            .cloned()
            .ok_or_else(|| StoreError::NotFound(correlation_id.to_string()))
    }

    async fn find_by_agreement_id(&self, agreement_id: &str) -> Result<Vec<P>, StoreError> {
        Ok(self
            .inner
            .read()
            .records
            .values()
            .filter(|p| p.agreement_id() == Some(agreement_id))
            .cloned()
            .collect())
    }

    async fn list_stale(&self, older_than: Timestamp) -> Result<Vec<P>, StoreError> {
        Ok(self
            .inner
            .read()
            .records
            .values()
            .filter(|p| !p.is_terminal() && p.last_modified() < older_than)
            .cloned()
            .collect())
    }

    async fn save(&self, process: &P) -> Result<u64, StoreError> {
        let id = process.process_id();
        let mut inner = self.inner.write();

        let stored_version = inner.records.get(&id).map(|p| p.version()).unwrap_or(0);
        if stored_version != process.version() {
            return Err(StoreError::Conflict {
                id,
                expected: process.version(),
                actual: stored_version,
            });
        }

        if let Some(correlation_id) = process.correlation_id() {
            match inner.by_correlation.get(correlation_id) {
                Some(existing) if *existing != id => {
                    return Err(StoreError::DuplicateCorrelation {
                        correlation_id: correlation_id.to_string(),
                        existing: *existing,
                    });
                }
                Some(_) => {}
                None => {
                    inner.by_correlation.insert(correlation_id.to_string(), id);
                }
            }
        }

        let next_version = stored_version + 1;
        let mut record = process.clone();
        record.set_version(next_version);
        inner.records.insert(id, record);

        trace!("[dsp-05] saved {} at version {}", id, next_version);
        Ok(next_version)
    }
}
