use crate::error::BoxError;
use async_trait::async_trait;
use mongodb::bson::Document;
use mongodb::Collection;
use std::sync::Arc;

/// A pre-connected, caller-owned collection that accepts single document inserts.
///
/// The hook never opens or closes the connection behind it. Implementations
/// must be safe to call from many tasks at once.
#[async_trait]
pub trait DocumentCollection: Send + Sync {
    /// Insert exactly one document.
    async fn insert_one(&self, document: Document) -> Result<(), BoxError>;
}

#[async_trait]
impl DocumentCollection for Collection<Document> {
    async fn insert_one(&self, document: Document) -> Result<(), BoxError> {
        Collection::insert_one(self, document).await?;
        Ok(())
    }
}

#[async_trait]
impl<C> DocumentCollection for Arc<C>
where
    C: DocumentCollection + ?Sized,
{
    async fn insert_one(&self, document: Document) -> Result<(), BoxError> {
        (**self).insert_one(document).await
    }
}
