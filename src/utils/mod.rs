//! Small shared utilities.

mod bytes;
mod naming;
mod timing;

pub use bytes::human_bytes;
pub use naming::{random_suffix, replace_non_alphanumeric};
pub use timing::with_request_timeout;
