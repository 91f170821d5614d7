//! Environment variable names used by this crate for convenient
//! configuration of the hook from services.
//!
//! These are purely helpers; the hook itself never reads the environment.

/// MongoDB connection string, e.g. `mongodb://localhost:27017`.
pub const MONGO_HOOK_URI_ENV: &str = "MONGO_HOOK_URI";

/// Database holding the log collection.
pub const MONGO_HOOK_DATABASE_ENV: &str = "MONGO_HOOK_DATABASE";

/// Target collection name.
pub const MONGO_HOOK_COLLECTION_ENV: &str = "MONGO_HOOK_COLLECTION";

/// Optional per-write timeout in milliseconds. Unset or empty means no timeout.
pub const MONGO_HOOK_TIMEOUT_MS_ENV: &str = "MONGO_HOOK_TIMEOUT_MS";

/// Read an environment variable or fall back to a provided default.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
