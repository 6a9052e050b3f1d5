//! Unified error type for the Photon runtime.
//!
//! Mirrors the shape of a `thiserror`-derived workspace error the way larger
//! agent runtimes structure theirs: one enum per crate, a `Result` alias,
//! and a small set of context-adding extension traits so call sites can
//! attach a human-readable breadcrumb without losing the source error.

use std::path::PathBuf;
use thiserror::Error;

pub type PhotonResult<T> = Result<T, PhotonError>;

#[derive(Debug, Error)]
pub enum PhotonError {
    #[error("config error in {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("config is missing required field `{field}`")]
    MissingConfigField { field: String },

    #[error("io error ({context}): {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("lsp error: {reason}")]
    Lsp { reason: String },

    #[error("tool `{tool}` failed: {message}")]
    Tool { tool: String, message: String },

    #[error("symbol index error: {reason}")]
    Index { reason: String },
}

impl PhotonError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        PhotonError::Io {
            context: context.into(),
            source,
        }
    }

    pub fn lsp(reason: impl Into<String>) -> Self {
        PhotonError::Lsp {
            reason: reason.into(),
        }
    }

    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        PhotonError::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    pub fn index(reason: impl Into<String>) -> Self {
        PhotonError::Index {
            reason: reason.into(),
        }
    }

    /// Whether retrying the same operation without a config/code change
    /// could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PhotonError::Io { .. } | PhotonError::Lsp { .. })
    }
}

/// Adds breadcrumb context to a `Result<T, std::io::Error>`, converting it
/// into a `PhotonResult<T>`.
pub trait ResultExt<T> {
    fn io_context(self, context: impl Into<String>) -> PhotonResult<T>;
}

impl<T> ResultExt<T> for Result<T, std::io::Error> {
    fn io_context(self, context: impl Into<String>) -> PhotonResult<T> {
        self.map_err(|source| PhotonError::io(context, source))
    }
}

/// Turns a missing `Option` into a `PhotonError::MissingConfigField`.
pub trait OptionExt<T> {
    fn or_missing_field(self, field: impl Into<String>) -> PhotonResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn or_missing_field(self, field: impl Into<String>) -> PhotonResult<T> {
        self.ok_or_else(|| PhotonError::MissingConfigField {
            field: field.into(),
        })
    }
}
