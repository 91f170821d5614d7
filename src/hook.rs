use crate::entry::LogEntry;
use crate::error::HookError;
use crate::level::{Level, ALL_LEVELS};
use async_trait::async_trait;

/// Destination for [`LogEntry`]s registered with a logging layer.
///
/// The layer calls `fire` once per entry whose level is listed by
/// `levels`, and decides itself what to do with a returned error.
#[async_trait]
pub trait Hook: Send + Sync {
    /// Deliver a single entry.
    ///
    /// **Returns**
    /// - `Ok(())` once the backend accepted the entry.
    /// - `Err(..)` if the entry was not delivered. Hooks do not retry; the
    ///   error describes this attempt only.
    async fn fire(&self, entry: &LogEntry) -> Result<(), HookError>;

    /// Severities this hook wants to receive. Defaults to all of them.
    fn levels(&self) -> &[Level] {
        &ALL_LEVELS
    }
}
