//! REST API plumbing: client wrapper, errors and the unauthorized signal.

pub mod client;
pub mod error;
pub mod signal;

pub use client::{ApiClient, ApiResponse, RequestBody, RequestConfig, USER_AGENT};
pub use error::{ApiError, ApiErrorKind, UNREACHABLE_MESSAGE, first_message};
pub use signal::{UnauthorizedObserver, UnauthorizedSignal};
