//! Store-error classification.

use crate::store::{StoreError, StoreErrorCode};

use super::types::BridgeError;

/// Classifies a store failure by its code chain.
///
/// Authorization anywhere in the chain wins over resolve errors: a denied
/// create can surface wrapped in a resolve-flavored message, and 401 is the
/// answer the caller can act on.
pub fn classify_store_error(context: &str, err: StoreError) -> BridgeError {
    if err.contains_code(StoreErrorCode::AuthorizationError) {
        return BridgeError::unauthorized(format!("{context}: {err}"));
    }
    if err.contains_code(StoreErrorCode::ResolveError) {
        return BridgeError::bad_request(format!("{context}: {err}"));
    }
    BridgeError::Store(err)
}

/// Classifies a transaction-commit failure.
///
/// Commit errors are transient unless the chain proves an authorization
/// problem; a missing node at commit time is an engine bug, not a caller
/// mistake, so resolve codes do not downgrade to BadRequest here.
pub fn classify_tx_commit_error(err: StoreError) -> BridgeError {
    if err.contains_code(StoreErrorCode::AuthorizationError) {
        return BridgeError::unauthorized(format!("transaction commit: {err}"));
    }
    BridgeError::Store(err)
}
