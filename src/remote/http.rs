//! HTTP plumbing shared by the catalog and CRM clients
//!
//! This module handles:
//! - Building HTTP clients with a proper user agent string
//! - Mapping response statuses to retry classes
//! - Parsing `Retry-After` hints (delta-seconds or HTTP-date)
//! - Classifying transport errors

use crate::remote::RemoteError;
use chrono::{DateTime, Utc};
use reqwest::{header::RETRY_AFTER, Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Longest response body kept in error messages
const MAX_ERROR_BODY: usize = 512;

/// Builds an HTTP client for remote collaborators
///
/// # Example
///
/// ```no_run
/// use catalog_sync::remote::build_http_client;
///
/// let client = build_http_client().unwrap();
/// ```
pub fn build_http_client() -> Result<Client, reqwest::Error> {
    // Format: catalog-sync/Version
    let user_agent = format!("catalog-sync/{}", env!("CARGO_PKG_VERSION"));

    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Passes successful responses through and classifies everything else
///
/// | Condition | Result |
/// |-----------|--------|
/// | HTTP 2xx | Ok(response) |
/// | HTTP 429 | RateLimited, with `Retry-After` hint if present |
/// | HTTP 408 | Timeout |
/// | HTTP 5xx | Server |
/// | Other | Rejected |
pub async fn check_response(response: Response) -> Result<Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| parse_retry_after(v, Utc::now()));
        return Err(RemoteError::RateLimited { retry_after });
    }

    if status == StatusCode::REQUEST_TIMEOUT {
        return Err(RemoteError::Timeout);
    }

    let body = response.text().await.unwrap_or_default();
    let body = truncate_body(body);

    if status.is_server_error() {
        Err(RemoteError::Server {
            status: status.as_u16(),
            body,
        })
    } else {
        Err(RemoteError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

/// Reads and decodes a JSON body
///
/// A connection dropped while the body is streaming is transient; only a
/// body that arrived whole but does not parse is a final failure.
pub async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, RemoteError> {
    let body = response.bytes().await.map_err(classify_reqwest_error)?;
    decode_json(&body)
}

fn decode_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, RemoteError> {
    serde_json::from_slice(body).map_err(|e| RemoteError::Decode(e.to_string()))
}

/// Maps a transport-level reqwest error to a retry class
///
/// Everything that happens on the wire (connect, send, body streaming) is a
/// connection failure. Only a decode of a complete body is final.
pub fn classify_reqwest_error(error: reqwest::Error) -> RemoteError {
    if error.is_timeout() {
        RemoteError::Timeout
    } else if error.is_connect() || error.is_request() || error.is_body() {
        RemoteError::Connection(error.to_string())
    } else if error.is_decode() {
        RemoteError::Decode(error.to_string())
    } else if let Some(status) = error.status() {
        RemoteError::Rejected {
            status: status.as_u16(),
            body: error.to_string(),
        }
    } else {
        RemoteError::Connection(error.to_string())
    }
}

/// Parses a `Retry-After` header value relative to `now`
///
/// Accepts delta-seconds (`"120"`) or an HTTP-date
/// (`"Wed, 21 Oct 2015 07:28:00 GMT"`). Dates in the past yield zero.
pub fn parse_retry_after(value: &str, now: DateTime<Utc>) -> Option<Duration> {
    let value = value.trim();

    if let Ok(seconds) = value.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }

    let at = DateTime::parse_from_rfc2822(value).ok()?.with_timezone(&Utc);
    Some((at - now).to_std().unwrap_or(Duration::ZERO))
}

fn truncate_body(mut body: String) -> String {
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    body
}
