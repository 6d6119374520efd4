//! Shared plumbing for the JSON-over-HTTP service clients.

use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::warn;
use vidscout_core::error::ServiceError;

pub(crate) fn build_client() -> reqwest::Client {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .build()
        .unwrap_or_else(|e| {
            warn!(error = %e, "Failed to build HTTP client, using defaults");
            reqwest::Client::new()
        })
}

/// Connect failures and timeouts are transient; everything else is not.
pub(crate) fn transport_error(service: &str, e: reqwest::Error) -> ServiceError {
    if e.is_timeout() || e.is_connect() {
        ServiceError::Timeout(format!("{service}: {e}"))
    } else {
        ServiceError::Network(format!("{service}: {e}"))
    }
}

/// Map the status, then decode the body as `T`.
pub(crate) async fn read_json<T: DeserializeOwned>(
    service: &str,
    response: reqwest::Response,
) -> Result<T, ServiceError> {
    let status = response.status().as_u16();
    if status == 404 {
        return Err(ServiceError::NotFound(format!(
            "{service}: {}",
            response.url().path()
        )));
    }
    if !response.status().is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(ServiceError::Http {
            service: service.to_string(),
            status,
            message,
        });
    }
    response
        .json::<T>()
        .await
        .map_err(|e| ServiceError::Decode(format!("{service}: {e}")))
}

/// Percent-encode one URL path segment.
pub(crate) fn encode_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
