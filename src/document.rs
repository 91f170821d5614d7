use crate::entry::LogEntry;
use crate::error::HookError;
use mongodb::bson::{self, Bson, DateTime, Document};

/// Build the document written for `entry`.
///
/// Reserved keys come first: `time`, `level`, `message` and, when a rendering
/// is available, `entry`. Structured fields are merged afterwards, so a field
/// sharing a name with a reserved key replaces it.
pub fn build_document(entry: &LogEntry, rendered: Option<&str>) -> Result<Document, HookError> {
    let mut document = Document::new();
    document.insert("time", DateTime::from_millis(entry.timestamp.timestamp_millis()));
    document.insert("level", entry.level.as_str());
    document.insert("message", entry.message.as_str());
    if let Some(rendered) = rendered {
        document.insert("entry", rendered);
    }

    for (key, value) in &entry.fields {
        document.insert(key.as_str(), field_to_bson(value)?);
    }

    Ok(document)
}

/// Integers become `Int64`, other numbers `Double`; objects and arrays keep their shape.
fn field_to_bson(value: &serde_json::Value) -> Result<Bson, HookError> {
    Ok(bson::to_bson(value)?)
}
