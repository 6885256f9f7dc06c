//! Callback URL checks for the asynchronous recognition API.
//!
//! Watson calls the registered URL back (first with a `challenge_string`
//! GET, later with job notifications), so the URL has to be absolute,
//! HTTP(S), and carry a host. A URL pointing at loopback or a private range
//! is still accepted, since tunnels and proxies make it legitimate, but it is
//! logged because the service usually cannot reach it.

use std::net::IpAddr;
use thiserror::Error;
use tracing::warn;
use url::{Host, Url};

#[derive(Debug, Error)]
pub enum CallbackUrlError {
    #[error("invalid URL format: {0}")]
    InvalidFormat(#[from] url::ParseError),

    #[error("URL scheme must be http or https, got: {0}")]
    UnsupportedScheme(String),

    #[error("URL must have a host")]
    MissingHost,
}

/// True when the address can't be reached from the public internet.
pub fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast()
                // Shared address space (100.64.0.0/10, CGNAT)
                || (v4.octets()[0] == 100 && (v4.octets()[1] & 0xC0) == 64)
        }
        IpAddr::V6(v6) => {
            if let Some(mapped) = v6.to_ipv4_mapped() {
                return is_private_ip(&IpAddr::V4(mapped));
            }
            let first = v6.segments()[0];
            v6.is_loopback()
                || v6.is_unspecified()
                // fe80::/10 and fc00::/7
                || (first & 0xFFC0) == 0xFE80
                || (first & 0xFE00) == 0xFC00
        }
    }
}

/// Validate a callback URL and return it parsed.
///
/// ```rust
/// use watson_sdk::utils::validate_callback_url;
///
/// assert!(validate_callback_url("https://example.com/results").is_ok());
/// assert!(validate_callback_url("ftp://example.com/results").is_err());
/// assert!(validate_callback_url("/results").is_err());
/// ```
pub fn validate_callback_url(raw: &str) -> Result<Url, CallbackUrlError> {
    let parsed = Url::parse(raw)?;

    match parsed.scheme() {
        "http" | "https" => {}
        other => return Err(CallbackUrlError::UnsupportedScheme(other.to_string())),
    }

    let unreachable = match parsed.host() {
        None => return Err(CallbackUrlError::MissingHost),
        Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
        Some(Host::Ipv4(ip)) => is_private_ip(&IpAddr::V4(ip)),
        Some(Host::Ipv6(ip)) => is_private_ip(&IpAddr::V6(ip)),
    };

    if unreachable {
        warn!(callback_url = %parsed, "Callback URL points at a private or loopback host");
    }

    Ok(parsed)
}
