//! Structured error types for the explicit top-level surface.
//!
//! Nothing inside the render pipeline returns these — mutation and layout
//! problems degrade silently by design (a throw mid-render would corrupt
//! the visible document). Errors exist only for the operations a user
//! invokes deliberately: saving and loading snapshots.

use thiserror::Error;

/// The unified error type returned by the snapshot API.
#[derive(Debug, Error)]
pub enum DesignError {
    /// A persisted snapshot failed to parse.
    #[error("failed to parse snapshot: {source}{}", format_hint(.hint))]
    SnapshotParse {
        source: serde_json::Error,
        hint: String,
    },

    /// The snapshot carries a format tag this build doesn't understand.
    #[error("unsupported snapshot format {found:?} (expected {expected:?})")]
    UnsupportedFormat { found: String, expected: String },

    /// Serializing the current document failed.
    #[error("failed to serialize snapshot: {0}")]
    SnapshotSerialize(#[from] serde_json::Error),
}

fn format_hint(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {hint}")
    }
}

impl DesignError {
    /// Wrap a parse failure with a category hint.
    pub fn parse(source: serde_json::Error) -> Self {
        let hint = match source.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the snapshot schema. Check field names and types."
                    .to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input — is the snapshot truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        DesignError::SnapshotParse { source, hint }
    }
}
