//! Scan-status reply decoding.
//!
//! The endpoint answers in JSONP (`callback({...})`); the payload is
//! unwrapped and decoded into a typed reply.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use super::AuthError;

/// Code reported once the challenge has been scanned and confirmed.
pub(crate) const SCAN_CONFIRMED: i64 = 200;

#[allow(clippy::expect_used)]
static JSONP_BODY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\s*[\w$.]*\s*\((.*)\)\s*;?\s*$").expect("valid JSONP regex")
});

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct ScanReply {
    pub(crate) code: i64,
    #[serde(default)]
    pub(crate) ticket: Option<String>,
    #[serde(default)]
    pub(crate) msg: Option<String>,
}

impl ScanReply {
    /// The ticket, when the reply confirms the scan and carries one.
    pub(crate) fn confirmed_ticket(&self) -> Option<&str> {
        if self.code == SCAN_CONFIRMED {
            self.ticket.as_deref().filter(|ticket| !ticket.is_empty())
        } else {
            None
        }
    }
}

pub(crate) fn parse_scan_reply(body: &str) -> Result<ScanReply, AuthError> {
    let payload = JSONP_BODY
        .captures(body)
        .and_then(|captures| captures.get(1))
        .map_or(body.trim(), |m| m.as_str());

    serde_json::from_str(payload).map_err(|e| AuthError::malformed(format!("{e} in {body:?}")))
}
