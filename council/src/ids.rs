//! Identifier generation for sessions, runs, messages and documents.

use uuid::Uuid;

/// Generate a fresh unique identifier.
pub fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// First 8 characters of an id, for log lines.
pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(8) {
        Some((end, _)) => &id[..end],
        None => id,
    }
}
