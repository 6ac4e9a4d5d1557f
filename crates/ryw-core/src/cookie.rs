//! Transaction-number cookie codec
//!
//! The cookie carries the last position a client has seen committed. A
//! deletion is the same cookie with an epoch expiry, so encode and delete
//! share one code path.

use crate::TX_COOKIE_NAME;
use crate::position::TxNumber;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// SameSite cookie attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SameSite {
    /// `SameSite=Strict`
    Strict,
    /// `SameSite=Lax`
    Lax,
    /// `SameSite=None`
    None,
}

impl SameSite {
    fn as_str(self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

/// Attributes attached to the cookie when encoding
///
/// `Default` gives `Path=/; HttpOnly; Secure; SameSite=Lax`. Callers override
/// individual fields with the builder methods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CookieAttributes {
    /// `Path`, omitted when `None`
    pub path: Option<String>,
    /// `Domain`, omitted when `None`
    pub domain: Option<String>,
    /// `HttpOnly` flag
    pub http_only: bool,
    /// `Secure` flag
    pub secure: bool,
    /// `SameSite`, omitted when `None`
    pub same_site: Option<SameSite>,
    /// `Max-Age` in seconds
    pub max_age_secs: Option<u64>,
    /// `Expires`
    pub expires: Option<DateTime<Utc>>,
}

impl Default for CookieAttributes {
    fn default() -> Self {
        Self {
            path: Some("/".to_string()),
            domain: None,
            http_only: true,
            secure: true,
            same_site: Some(SameSite::Lax),
            max_age_secs: None,
            expires: None,
        }
    }
}

impl CookieAttributes {
    /// Set `Path`
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set `Domain`
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Toggle `HttpOnly`
    pub fn with_http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    /// Toggle `Secure`
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Set or clear `SameSite`
    pub fn with_same_site(mut self, same_site: Option<SameSite>) -> Self {
        self.same_site = same_site;
        self
    }

    /// Set `Max-Age`
    pub fn with_max_age_secs(mut self, secs: u64) -> Self {
        self.max_age_secs = Some(secs);
        self
    }

    /// Set `Expires`
    pub fn with_expires(mut self, expires: DateTime<Utc>) -> Self {
        self.expires = Some(expires);
        self
    }

    /// Same attributes, expired at the Unix epoch
    ///
    /// `Max-Age` takes precedence over `Expires` in browsers, so it is dropped.
    pub fn expired(&self) -> Self {
        Self {
            max_age_secs: None,
            expires: Some(DateTime::<Utc>::UNIX_EPOCH),
            ..self.clone()
        }
    }
}

/// Result of looking for the transaction cookie in a `Cookie` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieValue {
    /// No transaction cookie was sent
    Absent,
    /// Cookie present but not a non-negative integer
    Invalid(String),
    /// Cookie carrying a position the client has seen
    Valid(TxNumber),
}

/// Encode a `Set-Cookie` header value carrying `tx`
pub fn encode(tx: TxNumber, attrs: &CookieAttributes) -> String {
    let mut parts = vec![format!("{TX_COOKIE_NAME}={tx}")];

    if let Some(max_age) = attrs.max_age_secs {
        parts.push(format!("Max-Age={max_age}"));
    }
    if let Some(domain) = &attrs.domain {
        parts.push(format!("Domain={domain}"));
    }
    if let Some(path) = &attrs.path {
        parts.push(format!("Path={path}"));
    }
    if let Some(expires) = &attrs.expires {
        parts.push(format!("Expires={}", expires.format("%a, %d %b %Y %H:%M:%S GMT")));
    }
    if attrs.http_only {
        parts.push("HttpOnly".to_string());
    }
    if attrs.secure {
        parts.push("Secure".to_string());
    }
    if let Some(same_site) = attrs.same_site {
        parts.push(format!("SameSite={}", same_site.as_str()));
    }

    parts.join("; ")
}

/// Encode a `Set-Cookie` header value that clears the transaction cookie
pub fn delete_cookie(attrs: &CookieAttributes) -> String {
    encode(TxNumber::ZERO, &attrs.expired())
}

/// Find the transaction cookie in a `Cookie` request header
///
/// Never fails: a missing header or pair is `Absent`, anything that is not a
/// plain decimal `u64` is `Invalid`.
pub fn decode(cookie_header: Option<&str>) -> CookieValue {
    let Some(header) = cookie_header else {
        return CookieValue::Absent;
    };

    let raw = header
        .split(';')
        .filter_map(|pair| pair.split_once('='))
        .find(|(name, _)| name.trim() == TX_COOKIE_NAME)
        .map(|(_, value)| unquote(value.trim()));

    match raw {
        None => CookieValue::Absent,
        Some(value) => match parse_decimal(value) {
            Some(tx) => CookieValue::Valid(tx),
            None => CookieValue::Invalid(value.to_string()),
        },
    }
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

fn parse_decimal(value: &str) -> Option<TxNumber> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse::<u64>().ok().map(TxNumber)
}
