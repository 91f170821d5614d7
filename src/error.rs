use std::error::Error;

/// Error type returned by [`DocumentCollection`](crate::collection::DocumentCollection) implementations.
pub type BoxError = Box<dyn Error + Send + Sync>;

/// Error returned by hook construction and by [`Hook::fire`](crate::hook::Hook::fire).
#[derive(thiserror::Error, Debug)]
pub enum HookError {
    #[error("invalid hook configuration: {0}")]
    Configuration(String),

    #[error("log entry cannot be encoded as a document: {0}")]
    Encode(#[from] mongodb::bson::ser::Error),

    #[error(transparent)]
    Write(#[from] WriteError),

    /// The layer had no runtime it could block on to run the hook, or the
    /// hook panicked while running on a helper thread.
    #[error("hook could not be dispatched: {0}")]
    Dispatch(String),
}

impl HookError {
    pub fn is_deadline_exceeded(&self) -> bool {
        matches!(self, HookError::Write(WriteError::DeadlineExceeded))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, HookError::Write(WriteError::Cancelled))
    }
}

/// A single insert failed. Network, server and timeout failures all land here.
#[derive(thiserror::Error, Debug)]
pub enum WriteError {
    #[error("insert failed: {0}")]
    Insert(#[source] BoxError),

    #[error("insert deadline exceeded")]
    DeadlineExceeded,

    #[error("insert cancelled")]
    Cancelled,
}

/// A formatter could not render an entry.
#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("failed to serialize log entry: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to render log entry: {0}")]
    Format(String),
}
