use crate::error::{BoxError, RenderError, WriteError};
use crate::format::{Formatter, TextFormatter};
use crate::level::Level;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::time::{sleep_until, Duration, Instant};
use tokio_util::sync::{CancellationToken, DropGuard};

/// One structured log event handed to a [`Hook`](crate::hook::Hook).
///
/// Built either by [`HookLayer`](crate::layer::HookLayer) from a `tracing`
/// event or by hand through the builder methods below.
#[derive(Clone)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: Level,
    pub message: String,
    pub fields: BTreeMap<String, serde_json::Value>,
    formatter: Option<Arc<dyn Formatter>>,
    context: Option<EntryContext>,
}

impl LogEntry {
    /// Create an entry stamped with the current time and no fields.
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            message: message.into(),
            fields: BTreeMap::new(),
            formatter: None,
            context: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Add a structured field. A later field with the same key replaces the earlier one.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn with_fields<I, K>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, serde_json::Value)>,
        K: Into<String>,
    {
        self.fields
            .extend(fields.into_iter().map(|(key, value)| (key.into(), value)));
        self
    }

    /// Formatter used by [`LogEntry::render`]. Defaults to [`TextFormatter`].
    pub fn with_formatter(mut self, formatter: Arc<dyn Formatter>) -> Self {
        self.formatter = Some(formatter);
        self
    }

    /// Attach the caller's cancellation/deadline context.
    pub fn with_context(mut self, context: EntryContext) -> Self {
        self.context = Some(context);
        self
    }

    pub fn context(&self) -> Option<&EntryContext> {
        self.context.as_ref()
    }

    /// Render the entry to its formatter-produced string.
    pub fn render(&self) -> Result<String, RenderError> {
        match &self.formatter {
            Some(formatter) => formatter.format(self),
            None => TextFormatter::default().format(self),
        }
    }
}

impl fmt::Debug for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogEntry")
            .field("timestamp", &self.timestamp)
            .field("level", &self.level)
            .field("message", &self.message)
            .field("fields", &self.fields)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

/// Cancellation signal plus optional deadline, propagated from a log call
/// site down to the write it triggers.
///
/// The default value is the unbounded background context: never cancelled,
/// no deadline.
#[derive(Debug, Clone, Default)]
pub struct EntryContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl EntryContext {
    pub fn background() -> Self {
        Self::default()
    }

    /// Context cancelled whenever `token` is.
    pub fn with_token(token: CancellationToken) -> Self {
        Self { token, deadline: None }
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Deadline `timeout` from now. A timeout too large to represent leaves the context unbounded.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Derive a child bounded by `timeout` and by this context.
    ///
    /// The returned guard cancels the child when dropped; the parent is never
    /// cancelled through it.
    pub fn child_with_timeout(&self, timeout: Duration) -> (EntryContext, DropGuard) {
        let token = self.token.child_token();
        let deadline = match (self.deadline, Instant::now().checked_add(timeout)) {
            (Some(parent), Some(own)) => Some(parent.min(own)),
            (parent, own) => parent.or(own),
        };
        let guard = token.clone().drop_guard();
        (EntryContext { token, deadline }, guard)
    }

    /// Drive `operation` until it finishes, the context is cancelled or the deadline passes.
    ///
    /// An already-cancelled or already-expired context fails without polling `operation`.
    pub async fn run<F, T>(&self, operation: F) -> Result<T, WriteError>
    where
        F: Future<Output = Result<T, BoxError>>,
    {
        if self.token.is_cancelled() {
            return Err(WriteError::Cancelled);
        }
        if self.deadline.is_some_and(|deadline| deadline <= Instant::now()) {
            return Err(WriteError::DeadlineExceeded);
        }

        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(WriteError::Cancelled),
            _ = expire(self.deadline) => Err(WriteError::DeadlineExceeded),
            result = operation => result.map_err(WriteError::Insert),
        }
    }
}

async fn expire(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_collects_fields() {
        let entry = LogEntry::new(Level::Info, "hello")
            .with_field("user_id", 42)
            .with_field("user_id", 43)
            .with_fields([("ok", serde_json::Value::Bool(true))]);

        assert_eq!(entry.message, "hello");
        assert_eq!(entry.fields.len(), 2);
        assert_eq!(entry.fields["user_id"], serde_json::json!(43));
        assert!(entry.context().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn child_deadline_never_exceeds_parent() {
        let parent = EntryContext::background().with_timeout(Duration::from_secs(1));
        let (child, _guard) = parent.child_with_timeout(Duration::from_secs(10));
        assert_eq!(child.deadline(), parent.deadline());

        let (child, _guard) = parent.child_with_timeout(Duration::from_millis(5));
        assert!(child.deadline() < parent.deadline());
    }

    #[tokio::test]
    async fn dropping_the_guard_cancels_only_the_child() {
        let parent = EntryContext::background();
        let (child, guard) = parent.child_with_timeout(Duration::from_secs(1));
        drop(guard);

        assert!(child.is_cancelled());
        assert!(!parent.is_cancelled());
    }

    #[tokio::test]
    async fn cancelling_parent_cancels_child() {
        let parent = EntryContext::background();
        let (child, _guard) = parent.child_with_timeout(Duration::from_secs(1));
        parent.cancel();
        assert!(child.is_cancelled());
    }

    #[tokio::test]
    async fn run_reports_cancellation_first() {
        let context = EntryContext::background();
        context.cancel();
        let result = context.run(async { Ok::<_, BoxError>(()) }).await;
        assert!(matches!(result, Err(WriteError::Cancelled)));
    }

    #[tokio::test]
    async fn expired_deadline_never_polls_the_operation() {
        let polled = std::sync::atomic::AtomicBool::new(false);
        let context = EntryContext::background().with_deadline(Instant::now());
        let result = context
            .run(async {
                polled.store(true, std::sync::atomic::Ordering::SeqCst);
                Ok::<_, BoxError>(())
            })
            .await;

        assert!(matches!(result, Err(WriteError::DeadlineExceeded)));
        assert!(!polled.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn run_reports_deadline() {
        let context = EntryContext::background().with_timeout(Duration::from_millis(1));
        let result = context
            .run(async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok::<_, BoxError>(())
            })
            .await;
        assert!(matches!(result, Err(WriteError::DeadlineExceeded)));
    }

    #[tokio::test]
    async fn run_passes_operation_error_through() {
        let context = EntryContext::background();
        let result = context
            .run(async { Err::<(), BoxError>("insert refused".into()) })
            .await;
        match result {
            Err(WriteError::Insert(e)) => assert_eq!(e.to_string(), "insert refused"),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
