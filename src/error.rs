use thiserror::Error;

/// Errors surfaced by the workspace core.
///
/// Soft races (an id that was closed a moment ago) are not errors and never
/// show up here; they are logged and treated as no-ops.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("invalid route pattern `{pattern}`: {source}")]
    InvalidRoutePattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// The caller's save handler failed; the tab stays open and dirty.
    #[error("save failed: {0}")]
    SaveFailed(String),

    #[error("`{0}` was not offered by this dialog")]
    ChoiceNotOffered(&'static str),

    #[error("settings I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings format error: {0}")]
    Json(#[from] serde_json::Error),
}
