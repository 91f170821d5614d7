use crate::entry::LogEntry;
use crate::error::HookError;
use crate::format::{Formatter, TextFormatter};
use crate::hook::Hook;
use crate::level::Level;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::runtime::{Handle, RuntimeFlavor};
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

type ErrorHandler = Arc<dyn Fn(&HookError) + Send + Sync>;

/// `tracing_subscriber` layer that turns events into [`LogEntry`]s and
/// fires every registered [`Hook`] that wants the event's level.
///
/// Hooks run synchronously on the logging thread: the `tracing` call returns
/// only after each hook finished. Inside a multi-threaded Tokio runtime this
/// uses `block_in_place`; on a plain thread it blocks on the runtime handle
/// captured at construction. A current-thread runtime cannot block on its
/// own worker, so there the fire runs on a helper thread driving the
/// captured runtime, which must be multi-threaded. Without one the fire is
/// reported as [`HookError::Dispatch`].
///
/// Hook errors never reach the call site. They go to the error handler,
/// which prints to stderr unless replaced with [`HookLayer::on_error`].
pub struct HookLayer {
    hooks: Vec<Arc<dyn Hook>>,
    formatter: Arc<dyn Formatter>,
    runtime: Option<Handle>,
    reporter: Reporter,
    /// Total events seen by the layer.
    pub total_events: Arc<AtomicU64>,
}

#[derive(Clone)]
struct Reporter {
    on_error: ErrorHandler,
    fired: Arc<AtomicU64>,
    failed: Arc<AtomicU64>,
}

impl Reporter {
    fn report(&self, result: Result<(), HookError>) {
        match result {
            Ok(()) => {
                self.fired.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                (self.on_error)(&e);
            }
        }
    }
}

impl HookLayer {
    /// Layer firing `hook`, rendering entries with [`TextFormatter`] and
    /// using the Tokio runtime current at construction, if any.
    pub fn new(hook: Arc<dyn Hook>) -> Self {
        Self {
            hooks: vec![hook],
            formatter: Arc::new(TextFormatter::default()),
            runtime: Handle::try_current().ok(),
            reporter: Reporter {
                on_error: Arc::new(|e| eprintln!("failed to fire hook: {}", e)),
                fired: Arc::new(AtomicU64::new(0)),
                failed: Arc::new(AtomicU64::new(0)),
            },
            total_events: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Register another hook; hooks fire in registration order.
    pub fn with_hook(mut self, hook: Arc<dyn Hook>) -> Self {
        self.hooks.push(hook);
        self
    }

    pub fn with_formatter(mut self, formatter: Arc<dyn Formatter>) -> Self {
        self.formatter = formatter;
        self
    }

    /// Runtime used when an event is emitted from a thread outside any runtime.
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Replace the stderr error handler.
    pub fn on_error<F>(mut self, handler: F) -> Self
    where
        F: Fn(&HookError) + Send + Sync + 'static,
    {
        self.reporter.on_error = Arc::new(handler);
        self
    }

    /// Successful hook fires.
    pub fn fired_events(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.reporter.fired)
    }

    /// Hook fires that returned an error.
    pub fn failed_events(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.reporter.failed)
    }

    fn dispatch(&self, hook: &Arc<dyn Hook>, entry: LogEntry) {
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                let result =
                    tokio::task::block_in_place(|| handle.block_on(hook.fire(&entry)));
                self.reporter.report(result);
            }
            Ok(_) => match &self.runtime {
                Some(runtime) if runtime.runtime_flavor() == RuntimeFlavor::MultiThread => {
                    let result = std::thread::scope(|scope| {
                        scope
                            .spawn(|| runtime.block_on(hook.fire(&entry)))
                            .join()
                            .unwrap_or_else(|_| {
                                Err(HookError::Dispatch("hook panicked".to_string()))
                            })
                    });
                    self.reporter.report(result);
                }
                _ => self.reporter.report(Err(HookError::Dispatch(
                    "current-thread runtime cannot block on a hook and no multi-thread runtime was configured"
                        .to_string(),
                ))),
            },
            Err(_) => match &self.runtime {
                Some(handle) => self.reporter.report(handle.block_on(hook.fire(&entry))),
                None => self.reporter.report(Err(HookError::Dispatch(
                    "no tokio runtime available to fire hook".to_string(),
                ))),
            },
        }
    }
}

impl<S> Layer<S> for HookLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        self.total_events.fetch_add(1, Ordering::Relaxed);

        let meta = event.metadata();
        // The driver's own events would re-enter the hook.
        if meta.target().starts_with("mongodb") {
            return;
        }

        let level = Level::from(meta.level());
        if !self.hooks.iter().any(|hook| hook.levels().contains(&level)) {
            return;
        }

        let mut fields = BTreeMap::new();
        let mut message: Option<String> = None;
        let mut visitor = FieldVisitor { fields: &mut fields, message: &mut message };
        event.record(&mut visitor);

        let entry = LogEntry::new(level, message.unwrap_or_default())
            .with_fields(fields)
            .with_formatter(Arc::clone(&self.formatter));

        for hook in &self.hooks {
            if hook.levels().contains(&level) {
                self.dispatch(hook, entry.clone());
            }
        }
    }
}

/// Collects event fields as typed JSON values; `message` is kept apart.
pub struct FieldVisitor<'a> {
    pub fields: &'a mut BTreeMap<String, serde_json::Value>,
    pub message: &'a mut Option<String>,
}

impl<'a> Visit for FieldVisitor<'a> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            *self.message = Some(value.to_string());
        } else {
            self.fields.insert(field.name().to_string(), serde_json::Value::String(value.to_string()));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        let value = serde_json::Number::from_f64(value)
            .map(serde_json::Value::Number)
            .unwrap_or_else(|| serde_json::Value::String(value.to_string()));
        self.fields.insert(field.name().to_string(), value);
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            *self.message = Some(format!("{:?}", value));
        } else {
            self.fields.insert(field.name().to_string(), serde_json::Value::String(format!("{:?}", value)));
        }
    }
}
