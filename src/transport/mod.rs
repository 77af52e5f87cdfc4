//! HTTP transport shared by every storefront component.
//!
//! The [`Transport`] wraps two reqwest clients that share one cookie jar:
//! the regular client follows redirects, the probe client does not (the
//! session probe treats any redirect as "not logged in"). Both send the
//! browser identity headers and decode gzip bodies.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use rushbuy_core::config::HttpSettings;
//! use rushbuy_core::session::SessionJar;
//! use rushbuy_core::transport::{Transport, build_url};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = Transport::new(Arc::new(SessionJar::new()), &HttpSettings::default())?;
//! let url = build_url("https://p.3.cn/prices/mgets", &[("type", "1"), ("skuIds", "J_100")])?;
//! let body = transport.get_bytes(&url).await?;
//! println!("{} bytes", body.len());
//! # Ok(())
//! # }
//! ```

mod error;

pub use error::TransportError;

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::header::{CONTENT_TYPE, REFERER};
use reqwest::{Client, Method, redirect};
use tracing::{debug, instrument, trace};
use url::Url;

use crate::config::HttpSettings;
use crate::session::SessionJar;
use crate::user_agent;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Status, content type, and body of a completed request.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: u16,
    /// `Content-Type` header, when present.
    pub content_type: Option<String>,
    /// Full (decompressed) body.
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Whether the status is 2xx.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Configured HTTP client with a shared session cookie store.
///
/// Cheap to clone; clones share the connection pool and the cookie jar.
#[derive(Debug, Clone)]
pub struct Transport {
    client: Client,
    probe_client: Client,
}

impl Transport {
    /// Builds the transport around a session jar.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::ClientBuild`] when reqwest rejects the
    /// configuration (for example when no TLS backend is available).
    #[instrument(level = "debug", skip(jar))]
    pub fn new(jar: Arc<SessionJar>, settings: &HttpSettings) -> Result<Self, TransportError> {
        let client = base_builder(Arc::clone(&jar), settings)
            .build()
            .map_err(|source| TransportError::ClientBuild { source })?;
        let probe_client = base_builder(jar, settings)
            .redirect(redirect::Policy::none())
            .build()
            .map_err(|source| TransportError::ClientBuild { source })?;

        debug!(
            request_timeout_ms = settings.request_timeout.as_millis(),
            connect_timeout_ms = settings.connect_timeout.as_millis(),
            "transport ready"
        );
        Ok(Self {
            client,
            probe_client,
        })
    }

    /// GETs `url` and returns the body, failing on non-2xx statuses.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] on network failure, timeout, or an error status.
    pub async fn get_bytes(&self, url: &Url) -> Result<Vec<u8>, TransportError> {
        let response = self.send(Method::GET, url, None).await?;
        ensure_success(url, response).map(|response| response.body)
    }

    /// POSTs an empty form to `url` (parameters travel in the query string)
    /// and returns the body, failing on non-2xx statuses.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] on network failure, timeout, or an error status.
    pub async fn post_bytes(&self, url: &Url) -> Result<Vec<u8>, TransportError> {
        let response = self.send(Method::POST, url, None).await?;
        ensure_success(url, response).map(|response| response.body)
    }

    /// GETs `url` and returns the response whatever its status.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] only on network failure or timeout.
    pub async fn get_raw(
        &self,
        url: &Url,
        referer: Option<&str>,
    ) -> Result<RawResponse, TransportError> {
        self.send(Method::GET, url, referer).await
    }

    /// GETs `url` without following redirects and returns the status code.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] only on network failure or timeout.
    #[instrument(level = "debug", skip(self), fields(url = %url))]
    pub async fn probe_status(&self, url: &Url) -> Result<u16, TransportError> {
        let response = self
            .probe_client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(url.as_str(), e))?;
        let status = response.status().as_u16();
        // Drain so the connection returns to the pool.
        let _ = response.bytes().await;
        debug!(status, "probe answered");
        Ok(status)
    }

    #[instrument(level = "trace", skip(self), fields(url = %url))]
    async fn send(
        &self,
        method: Method,
        url: &Url,
        referer: Option<&str>,
    ) -> Result<RawResponse, TransportError> {
        let is_post = method == Method::POST;
        let mut request = self.client.request(method, url.clone());
        if is_post {
            request = request.header(CONTENT_TYPE, FORM_CONTENT_TYPE);
        }
        if let Some(referer) = referer {
            request = request.header(REFERER, referer);
        }

        let response = request
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(url.as_str(), e))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(ToString::to_string);
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::from_reqwest(url.as_str(), e))?
            .to_vec();

        trace!(status, bytes = body.len(), "response received");
        Ok(RawResponse {
            status,
            content_type,
            body,
        })
    }
}

fn base_builder(jar: Arc<SessionJar>, settings: &HttpSettings) -> reqwest::ClientBuilder {
    Client::builder()
        .connect_timeout(settings.connect_timeout)
        .timeout(settings.request_timeout)
        .gzip(true)
        .default_headers(user_agent::default_headers())
        .cookie_provider(jar)
}

fn ensure_success(url: &Url, response: RawResponse) -> Result<RawResponse, TransportError> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(TransportError::http_status(url.as_str(), response.status))
    }
}

/// Parses `base` and appends `params` to its query string.
///
/// # Errors
///
/// Returns [`TransportError::InvalidUrl`] when `base` is not an absolute URL.
pub fn build_url(base: &str, params: &[(&str, &str)]) -> Result<Url, TransportError> {
    let mut url = Url::parse(base).map_err(|_| TransportError::invalid_url(base))?;
    if !params.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in params {
            pairs.append_pair(key, value);
        }
    }
    Ok(url)
}

/// Current unix time in milliseconds, as the storefront's cache-busting
/// query parameters expect it.
#[must_use]
pub fn unix_millis() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis()
        .to_string()
}
