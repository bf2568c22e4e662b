//! Error taxonomy for lint execution, pattern storage, and correction.
//!
//! Session-fatal variants (`ToolNotAvailable`, `Store`, `Io`) abort the run
//! with exit code 2. `LintExecution` is fatal for one lint step only; the
//! orchestrator logs it and moves on. A failed syntax check is not an error
//! at all — the gate returns `Ok(false)` and the engine falls back to the
//! next candidate pattern.

use thiserror::Error;

/// Errors surfaced by the lintfix library.
#[derive(Debug, Error)]
pub enum LintfixError {
    /// The external linter or syntax checker could not be spawned.
    #[error("external tool not available: {0}")]
    ToolNotAvailable(String),

    /// The linter exited abnormally and produced no parseable output.
    #[error("lint execution failed: {0}")]
    LintExecution(String),

    /// A pattern with the same (code, match_regex) already exists.
    #[error("duplicate pattern for {code}: {regex}")]
    DuplicatePattern { code: String, regex: String },

    /// A pattern was submitted with a regex that does not compile.
    #[error("invalid pattern regex {regex:?}: {source}")]
    InvalidRegex {
        regex: String,
        #[source]
        source: regex::Error,
    },

    #[error("pattern store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LintfixError>;
