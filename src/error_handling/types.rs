//! Error type definitions.

use serde::Serialize;
use thiserror::Error;

use crate::store::StoreError;

/// Classification of a [`BridgeError`], as seen by the boundary layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed inputs, schema mismatch, unparseable cells, caps exceeded.
    BadRequest,
    /// The store denied a read, write, create, or commit.
    Unauthorized,
    /// Underlying transport or backend failure; safe to retry.
    Transient,
    /// Invariant violation inside the engine itself.
    Internal,
}

/// Failure of an export or upload operation.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The request cannot be served as formulated.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The store rejected an operation for lack of permissions.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The store failed for reasons unrelated to the request's shape.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The request was cancelled or timed out.
    #[error("operation cancelled")]
    Cancelled,

    /// The engine violated one of its own invariants.
    #[error("internal error: {0}")]
    Internal(String),
}

impl BridgeError {
    /// Builds a [`BridgeError::BadRequest`].
    pub fn bad_request(message: impl Into<String>) -> Self {
        BridgeError::BadRequest(message.into())
    }

    /// Builds a [`BridgeError::Unauthorized`].
    pub fn unauthorized(message: impl Into<String>) -> Self {
        BridgeError::Unauthorized(message.into())
    }

    /// Builds a [`BridgeError::Internal`].
    pub fn internal(message: impl Into<String>) -> Self {
        BridgeError::Internal(message.into())
    }

    /// Kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            BridgeError::BadRequest(_) => ErrorKind::BadRequest,
            BridgeError::Unauthorized(_) => ErrorKind::Unauthorized,
            BridgeError::Store(_) | BridgeError::Cancelled => ErrorKind::Transient,
            BridgeError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// HTTP status the boundary layer should reply with.
    pub fn http_status(&self) -> u16 {
        match self {
            BridgeError::BadRequest(_) => 400,
            BridgeError::Unauthorized(_) => 401,
            BridgeError::Cancelled => 499,
            BridgeError::Store(_) | BridgeError::Internal(_) => 500,
        }
    }
}

/// Wire form of an error reply.
///
/// Carries the full error text plus the `host` and `request_id` attributes
/// the boundary appends so that failures can be traced back to the serving
/// instance.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Rendered error tree.
    pub message: String,
    /// HTTP status matching the error kind.
    pub status: u16,
    /// Host that served the request.
    pub host: String,
    /// Request correlation id.
    pub request_id: String,
}

impl ErrorResponse {
    /// Builds the reply payload for `err`.
    pub fn new(err: &BridgeError, host: impl Into<String>, request_id: impl Into<String>) -> Self {
        ErrorResponse {
            message: err.to_string(),
            status: err.http_status(),
            host: host.into(),
            request_id: request_id.into(),
        }
    }
}
