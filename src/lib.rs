pub mod level;
pub mod entry;
pub mod format;
pub mod error;
pub mod document;
pub mod collection;
pub mod hook;
pub mod mongo;
pub mod config;
pub mod env;
pub mod layer;
pub mod init;
pub mod memory;

pub use collection::DocumentCollection;
pub use config::HookConfig;
pub use entry::{EntryContext, LogEntry};
pub use error::{HookError, RenderError, WriteError};
pub use hook::Hook;
pub use layer::HookLayer;
pub use level::Level;
pub use mongo::MongoHook;
