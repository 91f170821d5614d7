use crate::collection::DocumentCollection;
use crate::config::HookConfig;
use crate::document::build_document;
use crate::entry::{EntryContext, LogEntry};
use crate::error::HookError;
use crate::hook::Hook;
use crate::level::{Level, ALL_LEVELS};
use async_trait::async_trait;
use mongodb::bson::Document;
use mongodb::Collection;
use tokio_util::sync::DropGuard;

/// [`Hook`] that writes each entry as one document into a MongoDB collection.
///
/// The collection handle is borrowed from the caller: the hook never opens,
/// closes or reconfigures the connection behind it. Apart from that handle
/// the hook holds only its immutable [`HookConfig`], so one instance can be
/// shared across threads and fired concurrently.
///
/// Each `fire` is a single best-effort insert. Nothing is retried, buffered
/// or reported anywhere except through the returned error.
pub struct MongoHook<C = Collection<Document>> {
    collection: C,
    config: HookConfig,
}

impl<C> MongoHook<C>
where
    C: DocumentCollection,
{
    /// Create a hook over an already-connected collection.
    ///
    /// **Errors**
    /// - [`HookError::Configuration`] if `collection` is `None`.
    pub fn new(collection: Option<C>, config: HookConfig) -> Result<Self, HookError> {
        let collection = collection
            .ok_or_else(|| HookError::Configuration("undefined mongo collection".to_string()))?;
        Ok(Self { collection, config })
    }

    /// Context bounding one write: the entry's own context (or the background
    /// context), narrowed by the configured timeout when there is one.
    ///
    /// The guard is present only when a child context was derived and
    /// cancels it when dropped.
    fn context(&self, entry: &LogEntry) -> (EntryContext, Option<DropGuard>) {
        let parent = entry.context().cloned().unwrap_or_default();
        match self.config.timeout {
            Some(timeout) => {
                let (child, guard) = parent.child_with_timeout(timeout);
                (child, Some(guard))
            }
            None => (parent, None),
        }
    }
}

#[async_trait]
impl<C> Hook for MongoHook<C>
where
    C: DocumentCollection,
{
    async fn fire(&self, entry: &LogEntry) -> Result<(), HookError> {
        let (context, _guard) = self.context(entry);

        // A formatter failure only costs the `entry` key; the write still happens.
        let rendered = entry.render().ok();
        let document = build_document(entry, rendered.as_deref())?;

        context.run(self.collection.insert_one(document)).await?;
        Ok(())
    }

    fn levels(&self) -> &[Level] {
        &ALL_LEVELS
    }
}
