//! Subsystem-scoped error context for the network layer, grounded on the
//! donor's `network/error.rs` shape: a thin extension trait rather than a
//! `map_err` at every call site.

use crate::error::{EngineError, EngineResult};

pub trait NetworkErrorContext<T> {
    fn network_context(self, endpoint: &str) -> EngineResult<T>;
}

impl<T, E: std::fmt::Display> NetworkErrorContext<T> for Result<T, E> {
    fn network_context(self, endpoint: &str) -> EngineResult<T> {
        self.map_err(|e| EngineError::NetworkError {
            message: format!("{endpoint}: {e}"),
        })
    }
}

pub fn connection_error(endpoint: impl Into<String>, error: impl std::fmt::Display) -> EngineError {
    EngineError::NetworkError {
        message: format!("{}: {error}", endpoint.into()),
    }
}

pub fn protocol_error(message: impl Into<String>) -> EngineError {
    EngineError::DecodeError {
        context: "protocol".to_string(),
        message: message.into(),
    }
}
