use crate::collection::DocumentCollection;
use crate::error::BoxError;
use async_trait::async_trait;
use mongodb::bson::Document;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::time::{sleep, Duration};

/// A collection that keeps inserted documents in process memory.
///
/// Useful for measuring the overhead of the hook without a database and for
/// tests that inspect what would have been written. Clones share storage.
#[derive(Clone, Default)]
pub struct MemoryCollection {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    documents: Mutex<Vec<Document>>,
    latency: Option<Duration>,
    failing: AtomicBool,
}

impl MemoryCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every insert waits `latency` before it is stored.
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                latency: Some(latency),
                ..Inner::default()
            }),
        }
    }

    /// While failing, inserts are rejected and nothing is stored.
    pub fn set_failing(&self, failing: bool) {
        self.inner.failing.store(failing, Ordering::SeqCst);
    }

    /// Snapshot of the stored documents in insertion order.
    pub fn documents(&self) -> Vec<Document> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Document>> {
        self.inner
            .documents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl DocumentCollection for MemoryCollection {
    async fn insert_one(&self, document: Document) -> Result<(), BoxError> {
        if let Some(latency) = self.inner.latency {
            sleep(latency).await;
        }
        if self.inner.failing.load(Ordering::SeqCst) {
            return Err("memory collection is unavailable".into());
        }
        self.lock().push(document);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    #[tokio::test]
    async fn clones_share_documents() {
        let collection = MemoryCollection::new();
        let clone = collection.clone();
        clone.insert_one(doc! { "n": 1 }).await.unwrap();

        assert_eq!(collection.len(), 1);
        assert_eq!(collection.documents()[0].get_i32("n").unwrap(), 1);
    }

    #[tokio::test]
    async fn failing_collection_stores_nothing() {
        let collection = MemoryCollection::new();
        collection.set_failing(true);

        assert!(collection.insert_one(doc! { "n": 1 }).await.is_err());
        assert!(collection.is_empty());
    }
}
