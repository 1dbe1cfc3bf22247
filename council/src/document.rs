//! Uploaded reference documents.
//!
//! Raw file content is reduced to plain text (whitespace and control
//! characters collapsed to single spaces) and truncated before it is attached
//! to a session. The most recently added document rides along with the next
//! query as context.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CouncilResult;
use crate::ids::new_id;

/// A document attached to a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedDocument {
    pub id: String,
    /// Display name, usually the file name.
    pub name: String,
    /// Extracted plain text.
    pub content: String,
}

impl UploadedDocument {
    /// Build a document from raw text.
    pub fn from_text(name: impl Into<String>, raw: &str, max_chars: usize) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            content: extract_plain_text(raw, max_chars),
        }
    }

    /// Read a file and build a document from it. Invalid UTF-8 is replaced
    /// rather than rejected.
    pub async fn read_from_path(path: impl AsRef<Path>, max_chars: usize) -> CouncilResult<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let raw = String::from_utf8_lossy(&bytes);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::from_text(name, &raw, max_chars))
    }

    /// Character count of the extracted text.
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}

/// Collapse runs of whitespace/control characters into single spaces, trim,
/// and keep at most `max_chars` characters.
pub fn extract_plain_text(raw: &str, max_chars: usize) -> String {
    let mut out = String::with_capacity(raw.len().min(max_chars.saturating_mul(4)));
    let mut pending_space = false;
    let mut count = 0;

    for ch in raw.chars() {
        if ch.is_whitespace() || ch.is_control() {
            pending_space = true;
            continue;
        }
        if pending_space && !out.is_empty() {
            if count == max_chars {
                break;
            }
            out.push(' ');
            count += 1;
        }
        pending_space = false;
        if count == max_chars {
            break;
        }
        out.push(ch);
        count += 1;
    }

    // a separator pushed right at the limit would leave a trailing space
    if out.ends_with(' ') {
        out.pop();
    }
    out
}
