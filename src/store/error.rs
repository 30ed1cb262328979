//! Store error type with an inspectable code chain.

use thiserror::Error;

/// Machine-readable code attached to a [`StoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreErrorCode {
    /// Unclassified backend failure.
    Generic,
    /// The referenced node does not exist.
    ResolveError,
    /// The caller lacks a permission for the attempted operation.
    AuthorizationError,
    /// Transport-level failure (connection reset, timeout, ...).
    Transport,
}

/// An error produced by the table store.
///
/// Store errors nest: a commit failure may wrap an authorization failure
/// several levels down. [`StoreError::contains_code`] walks the whole
/// chain, which is how the engines classify failures.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct StoreError {
    code: StoreErrorCode,
    message: String,
    #[source]
    source: Option<Box<StoreError>>,
}

impl StoreError {
    /// Creates an error with the given code.
    pub fn new(code: StoreErrorCode, message: impl Into<String>) -> Self {
        StoreError {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Generic backend failure.
    pub fn generic(message: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::Generic, message)
    }

    /// Node-resolution failure.
    pub fn resolve(message: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::ResolveError, message)
    }

    /// Authorization failure.
    pub fn authorization(message: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::AuthorizationError, message)
    }

    /// Wraps `cause` one level down the chain.
    pub fn wrap(mut self, cause: StoreError) -> Self {
        self.source = Some(Box::new(cause));
        self
    }

    /// Code of the outermost error.
    pub fn code(&self) -> StoreErrorCode {
        self.code
    }

    /// True if `code` appears anywhere in the error chain.
    pub fn contains_code(&self, code: StoreErrorCode) -> bool {
        let mut cur = Some(self);
        while let Some(err) = cur {
            if err.code == code {
                return true;
            }
            cur = err.source.as_deref();
        }
        false
    }
}
