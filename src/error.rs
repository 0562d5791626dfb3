//! Central error type for the voxel client core.
//!
//! Mirrors the donor engine's subsystem `error.rs` modules: a single
//! `thiserror`-derived enum, an `EngineResult` alias, and `From` conversions
//! for the external error types each subsystem touches.

use std::fmt;

use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    /// REST 404 or a wire-protocol reference to an id the server doesn't have.
    /// Callers should treat this as `None`, not propagate it as a failure.
    #[error("not found: {resource}")]
    NotFound { resource: String },

    /// Transient network failure; the caller may retry.
    #[error("network error: {message}")]
    NetworkError { message: String },

    /// Malformed payload (JSON, gzip). The offending unit should be dropped
    /// and the batch continued.
    #[error("decode error in {context}: {message}")]
    DecodeError { context: String, message: String },

    /// A block references a type id that didn't resolve even after its
    /// group was loaded.
    #[error("missing block type: {id}")]
    MissingType { id: String },

    /// A required collaborator was absent when an operation needed it.
    #[error("service unavailable: {service}")]
    ServiceUnavailable { service: String },

    /// 401 from the server. Terminal: the host should redirect to the exit
    /// URL and stop driving the core.
    #[error("auth error: {message}")]
    AuthError { message: String },

    /// A lock was poisoned by a panicking holder.
    #[error("lock poisoned: {resource}")]
    LockPoisoned { resource: String },

    /// Catch-all for invariant violations / unexpected internal states.
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::DecodeError {
            context: "json".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::DecodeError {
            context: "io".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for EngineError {
    fn from(err: reqwest::Error) -> Self {
        if err.status().map(|s| s.as_u16()) == Some(401) {
            EngineError::AuthError {
                message: err.to_string(),
            }
        } else {
            EngineError::NetworkError {
                message: err.to_string(),
            }
        }
    }
}

/// Extension trait giving any `Result` a way to attach subsystem context
/// and collapse into an [`EngineError::Internal`]. Subsystem-scoped traits
/// (see `block::error`, `network::error`) build on this same shape rather
/// than funnelling everything through one `map_err` at the call site.
pub trait ErrorContext<T> {
    fn context(self, context: &str) -> EngineResult<T>;
}

impl<T, E: fmt::Display> ErrorContext<T> for Result<T, E> {
    fn context(self, context: &str) -> EngineResult<T> {
        self.map_err(|e| EngineError::Internal {
            message: format!("{context}: {e}"),
        })
    }
}

pub trait OptionExt<T> {
    fn or_not_found(self, resource: impl Into<String>) -> EngineResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn or_not_found(self, resource: impl Into<String>) -> EngineResult<T> {
        self.ok_or_else(|| EngineError::NotFound {
            resource: resource.into(),
        })
    }
}
