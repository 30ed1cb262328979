//! Error kinds and classification.
//!
//! Every failure the engines surface is a [`BridgeError`] whose
//! [`ErrorKind`] drives the HTTP status at the boundary. Store failures are
//! classified by inspecting the [`crate::store::StoreError`] code chain,
//! never by matching message text.

mod categorization;
mod types;

pub use categorization::{classify_store_error, classify_tx_commit_error};
pub use types::{BridgeError, ErrorKind, ErrorResponse};
