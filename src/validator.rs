// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Request validation for the notification endpoint.
//!
//! - Origin check against the service's own origin
//! - Client identifier extraction from proxy headers

use axum::http::{header, HeaderMap, Uri};
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Origin {origin} does not match {expected:?}")]
    OriginMismatch {
        origin: String,
        expected: Option<String>,
    },
}

/// Result of validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    /// Request is valid
    Valid,
    /// Request is invalid
    Invalid(ValidationError),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    pub fn error(&self) -> Option<&ValidationError> {
        match self {
            ValidationResult::Valid => None,
            ValidationResult::Invalid(e) => Some(e),
        }
    }
}

/// Validator for incoming notification requests.
pub struct RequestValidator {
    /// Configured public origin, already normalized
    public_origin: Option<String>,
    /// Trusted proxy header carrying the client IP
    client_ip_header: String,
}

impl RequestValidator {
    /// Create a new validator.
    ///
    /// `public_origin` pins the origin the service is served from; without it
    /// the origin is derived per request from `Host` (or the request URI's
    /// authority) and `X-Forwarded-Proto`.
    pub fn new(public_origin: Option<&str>, client_ip_header: &str) -> Self {
        Self {
            public_origin: public_origin.and_then(normalize_origin),
            client_ip_header: client_ip_header.trim().to_ascii_lowercase(),
        }
    }

    /// The origin this request was addressed to.
    ///
    /// HTTP/2 requests carry the host in the `:authority` pseudo-header, which
    /// only shows up in the URI, so that is the fallback when `Host` is absent.
    pub fn expected_origin(&self, uri: &Uri, headers: &HeaderMap) -> Option<String> {
        if let Some(origin) = &self.public_origin {
            return Some(origin.clone());
        }

        let host = header_str(headers, header::HOST.as_str())
            .or_else(|| uri.authority().map(|a| a.as_str()))?;
        let scheme = header_str(headers, "x-forwarded-proto")
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .or_else(|| uri.scheme_str())
            .unwrap_or("http");

        normalize_origin(&format!("{scheme}://{host}"))
    }

    /// Validate the `Origin` header. Requests without one are accepted.
    pub fn validate_origin(&self, uri: &Uri, headers: &HeaderMap) -> ValidationResult {
        let Some(origin) = headers.get(header::ORIGIN) else {
            return ValidationResult::Valid;
        };

        let origin = String::from_utf8_lossy(origin.as_bytes()).into_owned();
        let expected = self.expected_origin(uri, headers);

        let same_origin = match (normalize_origin(&origin), expected.as_deref()) {
            (Some(actual), Some(expected)) => actual == expected,
            _ => false,
        };

        if same_origin {
            debug!(origin = %origin, "Origin valid");
            ValidationResult::Valid
        } else {
            debug!(origin = %origin, expected = ?expected, "Origin invalid");
            ValidationResult::Invalid(ValidationError::OriginMismatch { origin, expected })
        }
    }

    /// Rate limiter key for this request.
    ///
    /// Prefers the trusted proxy header, then the first `X-Forwarded-For`
    /// entry. Returns `None` when neither is present.
    pub fn client_identifier(&self, headers: &HeaderMap) -> Option<String> {
        let trusted = header_str(headers, &self.client_ip_header)
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(ip) = trusted {
            return Some(ip.to_string());
        }

        header_str(headers, "x-forwarded-for")
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Serialize a URL's origin (scheme, host and non-default port).
///
/// Opaque origins such as `null` or `file://` never match anything.
fn normalize_origin(raw: &str) -> Option<String> {
    let parsed = Url::parse(raw.trim()).ok()?;
    let origin = parsed.origin();
    origin.is_tuple().then(|| origin.ascii_serialization())
}
