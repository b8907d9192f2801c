use futures::StreamExt;
use std::time::Duration;
use thiserror::Error;

/// Upper bound on any upstream response body (10MB).
pub const MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

/// Transport-level failures of a single GET.
///
/// HTTP status codes are deliberately absent: a 404 page is returned as text and
/// it is up to the caller's parser to notice it is not what it expected.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// Request exceeded the configured timeout
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    /// Response body exceeded the size limit
    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
}

/// Issues a GET and returns the full body as text.
///
/// The User-Agent comes from the client (see [`crate::config::Config::http_client`]).
/// The whole exchange, headers and body, is bounded by `timeout`. Invalid UTF-8
/// is replaced rather than rejected.
pub async fn fetch_text(
    client: &reqwest::Client,
    url: &str,
    timeout: Duration,
) -> Result<String, FetchError> {
    let exchange = async {
        let response = client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(url = %url, status = %status, "Non-success status, returning body anyway");
        }

        read_limited_bytes(response, MAX_BODY_SIZE).await
    };

    let bytes = tokio::time::timeout(timeout, exchange)
        .await
        .map_err(|_| FetchError::Timeout(timeout))??;

    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len > limit as u64 {
            return Err(FetchError::ResponseTooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}
