//! # API Error Types
//!
//! Maps domain errors to HTTP status codes and a structured JSON body:
//!
//! ```json
//! { "error": { "code": "NOT_FOUND", "message": "unknown network \"east\"" } }
//! ```
//!
//! Internal failures are logged and returned with a generic message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use xca_ledger::LedgerError;
use xca_orchestrator::{CronError, OrchestrationError, QueryError, SchedulerError};
use xca_registry::RegistryError;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable code, e.g. `NOT_FOUND`.
    pub code: String,
    pub message: String,
}

/// Application-level error type that implements [`IntoResponse`].
#[derive(Error, Debug)]
pub enum AppError {
    /// 404.
    #[error("{0}")]
    NotFound(String),

    /// 422: well-formed request with invalid content.
    #[error("{0}")]
    Validation(String),

    /// 400: unparsable request or an operation invalid in the current state.
    #[error("{0}")]
    BadRequest(String),

    /// 403.
    #[error("{0}")]
    Forbidden(String),

    /// 409: rejected by the ledger's state.
    #[error("{0}")]
    Conflict(String),

    /// 503: a chain endpoint did not answer in time.
    #[error("{0}")]
    ServiceUnavailable(String),

    /// 500. The message is logged, never returned.
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::ServiceUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Internal(_) => {
                tracing::error!(error = %self, "internal server error");
                "An internal error occurred".to_string()
            }
            Self::ServiceUnavailable(_) => {
                tracing::warn!(error = %self, "service unavailable");
                self.to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };
        (status, Json(body)).into_response()
    }
}

impl From<RegistryError> for AppError {
    fn from(err: RegistryError) -> Self {
        match &err {
            RegistryError::UnknownNetwork { .. } | RegistryError::NoLedger(_) => {
                Self::NotFound(err.to_string())
            }
            RegistryError::RpcUnavailable { .. } => Self::ServiceUnavailable(err.to_string()),
            RegistryError::DuplicateNetwork(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match &err {
            LedgerError::NotFound(_) | LedgerError::EmptyLog => Self::NotFound(err.to_string()),
            LedgerError::InvalidCount | LedgerError::InvalidOwner => {
                Self::Validation(err.to_string())
            }
            LedgerError::Unauthorized { .. } => Self::Forbidden(err.to_string()),
            LedgerError::NonMonotonicBlock { .. } | LedgerError::Reverted(_) => {
                Self::Conflict(err.to_string())
            }
            LedgerError::Unavailable { .. } | LedgerError::Timeout { .. } => {
                Self::ServiceUnavailable(err.to_string())
            }
            LedgerError::InvalidResponse(_) | LedgerError::Misconfigured(_) => {
                Self::Internal(err.to_string())
            }
        }
    }
}

impl From<QueryError> for AppError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::Registry(e) => e.into(),
            QueryError::Ledger(e) => e.into(),
        }
    }
}

impl From<OrchestrationError> for AppError {
    fn from(err: OrchestrationError) -> Self {
        match err {
            OrchestrationError::SameNetwork(_) => Self::Validation(err.to_string()),
            OrchestrationError::BothNetworksUnreachable { .. } => {
                Self::ServiceUnavailable(err.to_string())
            }
            OrchestrationError::Registry(e) => e.into(),
        }
    }
}

impl From<SchedulerError> for AppError {
    fn from(err: SchedulerError) -> Self {
        match err {
            SchedulerError::NotRunning => Self::BadRequest(err.to_string()),
            SchedulerError::InvalidPair(e) => e.into(),
            SchedulerError::Exhausted(_) => Self::Validation(err.to_string()),
        }
    }
}

impl From<CronError> for AppError {
    fn from(err: CronError) -> Self {
        Self::Validation(format!("invalid interval: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xca_core::{NetworkName, U256};

    fn status(err: impl Into<AppError>) -> StatusCode {
        err.into().status_and_code().0
    }

    #[test]
    fn registry_errors() {
        assert_eq!(
            status(RegistryError::UnknownNetwork { name: "x".into() }),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status(RegistryError::RpcUnavailable {
                network: NetworkName::new("north").unwrap(),
                reason: "refused".into()
            }),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn ledger_errors() {
        assert_eq!(status(LedgerError::EmptyLog), StatusCode::NOT_FOUND);
        assert_eq!(status(LedgerError::InvalidCount), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            status(LedgerError::NonMonotonicBlock {
                block_number: U256::from(1u64),
                last_anchored: U256::from(1u64)
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status(LedgerError::Unauthorized {
                caller: xca_core::Address::ZERO
            }),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status(LedgerError::Misconfigured("no signer".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn scheduler_errors() {
        assert_eq!(status(SchedulerError::NotRunning), StatusCode::BAD_REQUEST);
        assert_eq!(
            status(SchedulerError::InvalidPair(OrchestrationError::SameNetwork(
                NetworkName::new("north").unwrap()
            ))),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[tokio::test]
    async fn internal_message_is_hidden() {
        use http_body_util::BodyExt;

        let response = AppError::Internal("db password wrong".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.error.code, "INTERNAL_ERROR");
        assert!(!body.error.message.contains("password"));
    }
}
