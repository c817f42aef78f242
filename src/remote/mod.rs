//! Resilient remote calls
//!
//! This module wraps every outbound call to the catalog and the CRM:
//! - Error classification (rate limited, transient, non-retryable)
//! - A bounded retry loop with exponential backoff
//! - `Retry-After` awareness
//! - Shared HTTP client construction and response checking

mod error;
mod http;
mod retry;

pub use error::{ErrorClass, InvokeError, RemoteError};
pub use http::{
    build_http_client, check_response, classify_reqwest_error, parse_retry_after, read_json,
};
pub use retry::{ResilientClient, RetryPolicy, RetryState};
