/// Extraction adapter errors.
///
/// A `ParseFailed` on one file degrades that file to partial facts and a
/// coverage gap; it never aborts a maintenance pass.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("parse failed for {path}: {reason}")]
    ParseFailed { path: String, reason: String },

    #[error("no adapter registered for {path}")]
    UnsupportedSource { path: String },

    #[error("content unavailable for {path}: {reason}")]
    ContentUnavailable { path: String, reason: String },
}
