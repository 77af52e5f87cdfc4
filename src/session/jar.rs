//! In-memory cookie jar backing the HTTP client.
//!
//! Parses `Set-Cookie` headers into [`Cookie`] records and serves them back
//! on matching requests (domain, path, secure flag, expiry).

use std::fmt;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::cookie::CookieStore;
use reqwest::header::HeaderValue;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use url::Url;

use super::{SessionError, SessionStore};

/// A single stored cookie.
///
/// The value is redacted in Debug output to keep session secrets out of logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    /// Domain the cookie belongs to, without a leading dot.
    pub domain: String,
    /// Whether only the exact host matches (no `Domain` attribute was sent).
    pub host_only: bool,
    /// URL path scope.
    pub path: String,
    /// Whether the cookie is only sent over HTTPS.
    pub secure: bool,
    /// Unix timestamp for expiry (`None` = session cookie).
    pub expires: Option<u64>,
    /// Cookie name.
    pub name: String,
    /// Cookie value (sensitive, never log).
    value: String,
}

impl Cookie {
    /// Creates a cookie scoped to `domain` and `path`.
    #[must_use]
    pub fn new(
        domain: impl Into<String>,
        path: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            domain: domain.into().trim_start_matches('.').to_ascii_lowercase(),
            host_only: false,
            path: path.into(),
            secure: false,
            expires: None,
            name: name.into(),
            value: value.into(),
        }
    }

    /// Returns the cookie value.
    ///
    /// Cookie values are sensitive, avoid logging the return value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Whether the cookie has expired at `now` (unix seconds).
    #[must_use]
    pub fn is_expired_at(&self, now: u64) -> bool {
        self.expires.is_some_and(|expires| expires <= now)
    }

    /// Whether the cookie should be sent with a request to `url`.
    #[must_use]
    pub fn matches(&self, url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };
        if self.secure && url.scheme() != "https" {
            return false;
        }
        domain_matches(&self.domain, self.host_only, host) && path_matches(&self.path, url.path())
    }

    fn same_slot(&self, other: &Self) -> bool {
        self.name == other.name && self.domain == other.domain && self.path == other.path
    }
}

// Custom Debug impl that redacts the cookie value.
impl fmt::Debug for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cookie")
            .field("domain", &self.domain)
            .field("host_only", &self.host_only)
            .field("path", &self.path)
            .field("secure", &self.secure)
            .field("expires", &self.expires)
            .field("name", &self.name)
            .field("value", &"[REDACTED]")
            .finish()
    }
}

/// Thread-safe cookie jar shared by the transport and the session store.
#[derive(Debug, Default)]
pub struct SessionJar {
    cookies: RwLock<Vec<Cookie>>,
}

impl SessionJar {
    /// Creates an empty jar.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a cookie (same name, domain, and path).
    pub fn insert(&self, cookie: Cookie) {
        let mut cookies = self
            .cookies
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        cookies.retain(|existing| !existing.same_slot(&cookie));
        cookies.push(cookie);
    }

    /// Replaces the whole jar, dropping cookies that already expired.
    pub fn replace_all(&self, replacement: Vec<Cookie>) {
        let now = unix_now();
        let mut cookies = self
            .cookies
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *cookies = replacement
            .into_iter()
            .filter(|cookie| !cookie.is_expired_at(now))
            .collect();
    }

    /// Returns a copy of every live cookie.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Cookie> {
        let now = unix_now();
        self.cookies
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|cookie| !cookie.is_expired_at(now))
            .cloned()
            .collect()
    }

    /// Number of live cookies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    /// Whether the jar holds no live cookies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStore for SessionJar {
    fn load(&self) -> Result<(), SessionError> {
        Ok(())
    }

    fn persist(&self) -> Result<(), SessionError> {
        Ok(())
    }

    fn clean(&self) {
        self.cookies
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn cookies(&self, filter: &dyn Fn(&Cookie) -> bool) -> Vec<Cookie> {
        self.snapshot()
            .into_iter()
            .filter(|cookie| filter(cookie))
            .collect()
    }

    fn get(&self, name: &str) -> Option<String> {
        self.snapshot()
            .into_iter()
            .find(|cookie| cookie.name == name)
            .map(|cookie| cookie.value)
    }
}

impl CookieStore for SessionJar {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        let now = unix_now();
        for header in cookie_headers {
            let Ok(raw) = header.to_str() else {
                continue;
            };
            let Some(cookie) = parse_set_cookie(raw, url, now) else {
                trace!(url = %url, "ignoring unusable Set-Cookie header");
                continue;
            };

            debug!(domain = %cookie.domain, name = %cookie.name, "storing cookie");
            let mut cookies = self
                .cookies
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            cookies.retain(|existing| !existing.same_slot(&cookie));
            if !cookie.is_expired_at(now) {
                cookies.push(cookie);
            }
        }
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        let now = unix_now();
        let header = self
            .cookies
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|cookie| !cookie.is_expired_at(now) && cookie.matches(url))
            .map(|cookie| format!("{}={}", cookie.name, cookie.value))
            .collect::<Vec<_>>()
            .join("; ");

        if header.is_empty() {
            None
        } else {
            HeaderValue::from_str(&header).ok()
        }
    }
}

/// Parses a `Set-Cookie` header received from `url`.
///
/// Returns `None` for headers without a name or with a `Domain` that does
/// not cover the responding host.
fn parse_set_cookie(raw: &str, url: &Url, now: u64) -> Option<Cookie> {
    let host = url.host_str()?.to_ascii_lowercase();
    let mut parts = raw.split(';');
    let (name, value) = parts.next()?.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    let mut cookie = Cookie {
        domain: host.clone(),
        host_only: true,
        path: default_path(url),
        secure: false,
        expires: None,
        name: name.to_string(),
        value: value.trim().trim_matches('"').to_string(),
    };
    let mut max_age: Option<i64> = None;

    for attribute in parts {
        let (key, val) = match attribute.split_once('=') {
            Some((key, val)) => (key.trim(), val.trim()),
            None => (attribute.trim(), ""),
        };
        match key.to_ascii_lowercase().as_str() {
            "domain" if !val.is_empty() => {
                let domain = val.trim_start_matches('.').to_ascii_lowercase();
                if !domain_matches(&domain, false, &host) {
                    return None;
                }
                cookie.domain = domain;
                cookie.host_only = false;
            }
            "path" if val.starts_with('/') => cookie.path = val.to_string(),
            "secure" => cookie.secure = true,
            "expires" => {
                if let Ok(at) = httpdate::parse_http_date(val) {
                    cookie.expires = Some(
                        at.duration_since(UNIX_EPOCH)
                            .map_or(0, |elapsed| elapsed.as_secs()),
                    );
                }
            }
            "max-age" => max_age = val.parse().ok(),
            _ => {}
        }
    }

    // Max-Age wins over Expires.
    if let Some(seconds) = max_age {
        cookie.expires = Some(if seconds <= 0 {
            0
        } else {
            now.saturating_add(seconds.unsigned_abs())
        });
    }

    Some(cookie)
}

fn default_path(url: &Url) -> String {
    let path = url.path();
    match path.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(idx) => path[..idx].to_string(),
    }
}

fn domain_matches(domain: &str, host_only: bool, host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    if host == domain {
        return true;
    }
    !host_only
        && host
            .strip_suffix(domain)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

fn path_matches(cookie_path: &str, request_path: &str) -> bool {
    if request_path == cookie_path {
        return true;
    }
    request_path.starts_with(cookie_path)
        && (cookie_path.ends_with('/')
            || request_path[cookie_path.len()..].starts_with('/'))
}

pub(super) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs()
}
