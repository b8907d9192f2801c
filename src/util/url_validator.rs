use std::net::IpAddr;
use thiserror::Error;
use url::Url;

/// Errors that can occur during URL validation.
#[derive(Error, Debug)]
pub enum UrlValidationError {
    /// The URL string could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The URL uses a scheme other than http or https.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    /// The URL has no host component.
    #[error("URL has no host")]
    MissingHost,
    /// A plain-HTTP endpoint that is not on the loopback interface.
    #[error("Insecure endpoint: HTTPS required (except localhost for testing)")]
    InsecureEndpoint,
}

/// Validates a link taken from upstream content (item URL or image URL).
///
/// Only absolute `http`/`https` URLs with a host are accepted, so the site
/// never renders `javascript:` or `data:` links handed to it by a feed.
///
/// # Examples
///
/// ```
/// use glean::util::validate_link;
///
/// assert!(validate_link("https://dev.to/devpicon/post").is_ok());
/// assert!(validate_link("javascript:alert(1)").is_err());
/// assert!(validate_link("/relative/path").is_err());
/// ```
pub fn validate_link(url_str: &str) -> Result<Url, UrlValidationError> {
    let url = Url::parse(url_str.trim())?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(UrlValidationError::MissingHost);
    }

    Ok(url)
}

/// Validates an API base URL from configuration.
///
/// Requests to these endpoints may carry an API key, so HTTPS is required.
/// Plain HTTP is allowed only for loopback hosts, which is what tests use.
pub fn validate_endpoint(url_str: &str) -> Result<Url, UrlValidationError> {
    let url = validate_link(url_str)?;

    if url.scheme() == "http" && !is_loopback_host(&url) {
        return Err(UrlValidationError::InsecureEndpoint);
    }

    Ok(url)
}

fn is_loopback_host(url: &Url) -> bool {
    let Some(host) = url.host_str() else {
        return false;
    };
    if host == "localhost" {
        return true;
    }

    // Strip brackets from IPv6 addresses for parsing
    let host_for_parse = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);

    host_for_parse
        .parse::<IpAddr>()
        .map(|ip| ip.is_loopback())
        .unwrap_or(false)
}
