//! Error taxonomy shared by every extbuild crate.
//!
//! Three classes of failure abort a run:
//! - configuration errors (exit code 2): missing or invalid paths, unknown
//!   platform identifiers, invalid scheme/version combinations
//! - external tool failures (exit code 3): nonzero exit status from the
//!   compiler, documentation generator, or revision query
//! - format errors (exit code 4): malformed version strings, bad date padding,
//!   template placeholder mismatches
//!
//! Filesystem and archive failures are carried as `anyhow` errors (exit code 1).

use thiserror::Error;

/// The top-level error type for extbuild operations.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Invalid or missing configuration, detected before any process is spawned.
    #[error("configuration error: {0}")]
    Config(String),

    /// An external tool exited with a nonzero status.
    #[error("{tool} failed with exit status {status}")]
    ToolFailed {
        /// Short name of the tool (e.g. "scons", "doxygen").
        tool: String,
        /// The exit status reported by the child process.
        status: i32,
    },

    /// Malformed input data (version strings, dates, templates).
    #[error("format error: {0}")]
    Format(String),

    /// I/O or archive failure with context.
    #[error("{0:#}")]
    Io(#[from] anyhow::Error),
}

impl BuildError {
    pub fn config(message: impl Into<String>) -> Self {
        BuildError::Config(message.into())
    }

    pub fn format(message: impl Into<String>) -> Self {
        BuildError::Format(message.into())
    }

    pub fn tool_failed(tool: impl Into<String>, status: i32) -> Self {
        BuildError::ToolFailed {
            tool: tool.into(),
            status,
        }
    }

    /// Returns true if this is a configuration error.
    pub fn is_config(&self) -> bool {
        matches!(self, BuildError::Config(_))
    }

    /// Returns the process exit code for this error class.
    pub fn exit_code(&self) -> u8 {
        match self {
            BuildError::Io(_) => 1,
            BuildError::Config(_) => 2,
            BuildError::ToolFailed { .. } => 3,
            BuildError::Format(_) => 4,
        }
    }
}

/// Result type alias using BuildError.
pub type BuildResult<T> = Result<T, BuildError>;
