/// Import sessions are identified by server-issued UUIDs.
pub type SessionId = uuid::Uuid;

/// Uploaded files are referenced by their attachment record id.
pub type AttachmentId = i64;

/// A source-column to target-field mapping, in source column order.
pub type ColumnMapping = indexmap::IndexMap<String, String>;
