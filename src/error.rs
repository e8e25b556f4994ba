//! Structured error types for fcheat.
//!
//! Validation failures the user can fix (a missing column, an unresolvable
//! color ramp) are classified by [`ErrorKind`]; everything else is a hard
//! failure of the input or the environment.

use std::fmt;

/// The three recoverable failure classes of a heatmap invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A required column is absent from one of the loaded tables.
    MissingColumn,
    /// The join precondition of the reconciler was violated.
    MergeFailure,
    /// The rendering boundary rejected the ramp or failed to encode.
    RenderFailure,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::MissingColumn => "MissingColumn",
            Self::MergeFailure => "MergeFailure",
            Self::RenderFailure => "RenderFailure",
        };
        f.write_str(name)
    }
}

/// All errors that can occur while loading, reconciling and rendering.
#[derive(Debug, thiserror::Error)]
pub enum HeatmapError {
    /// A table lacks `gene_id`, `gene_symbol` or every `logFC*` column.
    #[error("Missing required columns in {role} file. Please ensure your file has: {required}")]
    MissingColumn { role: String, required: String },

    /// Join key columns were absent when merging.
    #[error("Merge failed: {0}")]
    MergeFailure(String),

    /// Ramp resolution or image encoding failed; the message is passed through.
    #[error("{0}")]
    RenderFailure(String),

    /// A requested sheet does not exist in the source.
    #[error("Worksheet {0} not found")]
    SheetNotFound(String),

    /// XML parsing error from quick-xml.
    #[error("XML parsing: {0}")]
    Xml(#[from] quick_xml::Error),

    /// ZIP archive error.
    #[error("ZIP archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// PNG encoding error.
    #[error("PNG encoding: {0}")]
    Png(#[from] png::EncodingError),

    /// Configuration file could not be decoded.
    #[error("Configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// General parse error.
    #[error("Parse error: {0}")]
    Parse(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HeatmapError {
    /// Build a [`HeatmapError::MissingColumn`] for the table playing `role`.
    pub fn missing_column(role: &str, required: &[&str]) -> Self {
        Self::MissingColumn {
            role: capitalize(role),
            required: format!("{{{}}}", required.join(", ")),
        }
    }

    /// Classify this error, or `None` for hard failures.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::MissingColumn { .. } => Some(ErrorKind::MissingColumn),
            Self::MergeFailure(_) => Some(ErrorKind::MergeFailure),
            Self::RenderFailure(_) | Self::Png(_) => Some(ErrorKind::RenderFailure),
            _ => None,
        }
    }

    /// Whether this error is one of the classified validation failures.
    pub fn is_recoverable(&self) -> bool {
        self.kind().is_some()
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, HeatmapError>;

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_column_message_names_role() {
        let err = HeatmapError::missing_column("second", &["gene_id", "gene_symbol", "logFC*"]);
        assert_eq!(
            err.to_string(),
            "Missing required columns in Second file. Please ensure your file has: {gene_id, gene_symbol, logFC*}"
        );
        assert_eq!(err.kind(), Some(ErrorKind::MissingColumn));
    }

    #[test]
    fn test_render_failure_passes_message_through() {
        let err = HeatmapError::RenderFailure("Invalid RGBA argument: 'blu'".to_string());
        assert_eq!(err.to_string(), "Invalid RGBA argument: 'blu'");
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_hard_failures_have_no_kind() {
        let err = HeatmapError::SheetNotFound("'Sheet9'".to_string());
        assert_eq!(err.kind(), None);
        let io = HeatmapError::from(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert!(!io.is_recoverable());
    }
}
