use crate::env::MONGO_HOOK_TIMEOUT_MS_ENV;
use crate::error::HookError;
use std::time::Duration;

/// Settings applied when a [`MongoHook`](crate::mongo::MongoHook) is built.
///
/// The default has no timeout: a write is bounded only by the context the
/// log call site attaches to its entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HookConfig {
    /// Deadline applied to every insert, on top of the entry's own context.
    pub timeout: Option<Duration>,
}

impl HookConfig {
    /// Set or clear the per-write timeout.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build a config from `MONGO_HOOK_TIMEOUT_MS`.
    pub fn from_env() -> Result<Self, HookError> {
        let raw = std::env::var(MONGO_HOOK_TIMEOUT_MS_ENV).ok();
        Ok(Self {
            timeout: parse_timeout_ms(raw.as_deref())?,
        })
    }
}

fn parse_timeout_ms(raw: Option<&str>) -> Result<Option<Duration>, HookError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    match raw.parse::<u64>() {
        Ok(0) => Err(HookError::Configuration(format!(
            "{MONGO_HOOK_TIMEOUT_MS_ENV} must be greater than zero"
        ))),
        Ok(ms) => Ok(Some(Duration::from_millis(ms))),
        Err(e) => Err(HookError::Configuration(format!(
            "{MONGO_HOOK_TIMEOUT_MS_ENV}={raw:?}: {e}"
        ))),
    }
}
