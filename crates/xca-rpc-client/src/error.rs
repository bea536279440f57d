//! JSON-RPC client errors.

use thiserror::Error;

/// Errors from JSON-RPC calls.
#[derive(Error, Debug)]
pub enum RpcError {
    /// Connection-level failure (refused, DNS, TLS).
    #[error("{endpoint}: transport error calling {method}: {source}")]
    Transport {
        endpoint: String,
        method: String,
        #[source]
        source: reqwest::Error,
    },

    /// The request exceeded the configured timeout.
    #[error("{endpoint}: {method} timed out")]
    Timeout { endpoint: String, method: String },

    /// The endpoint answered with a non-success HTTP status.
    #[error("{endpoint}: {method} returned HTTP {status}: {body}")]
    Http {
        endpoint: String,
        method: String,
        status: u16,
        body: String,
    },

    /// The endpoint returned a JSON-RPC error object.
    #[error("{endpoint}: {method} failed with JSON-RPC error {code}: {message}")]
    Rpc {
        endpoint: String,
        method: String,
        code: i64,
        message: String,
        /// Raw `error.data`, typically hex-encoded revert data.
        data: Option<String>,
    },

    /// The response carried neither `result` nor `error`, or a null where a
    /// value was required.
    #[error("{endpoint}: {method} returned no result")]
    MissingResult { endpoint: String, method: String },

    /// The response could not be decoded into the expected shape.
    #[error("{endpoint}: could not decode {method} response: {reason}")]
    Decode {
        endpoint: String,
        method: String,
        reason: String,
    },

    /// The client could not be constructed.
    #[error("invalid JSON-RPC client configuration: {0}")]
    Config(String),
}

impl RpcError {
    /// True when the endpoint could not be reached or did not answer in time.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            RpcError::Transport { .. } | RpcError::Timeout { .. } | RpcError::Http { .. }
        )
    }

    /// Revert data attached to a JSON-RPC error, if any.
    pub fn revert_data(&self) -> Option<&str> {
        match self {
            RpcError::Rpc { data, .. } => data.as_deref(),
            _ => None,
        }
    }
}
