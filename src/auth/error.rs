//! Error types for the login handshake.

use std::path::PathBuf;

use thiserror::Error;

use crate::session::SessionError;
use crate::transport::TransportError;

/// Errors that abort a login attempt.
///
/// Every variant is fatal to the run: no watcher starts without a session.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The scan-status poll never reported a scanned code.
    #[error(
        "challenge code was not scanned after {attempts} checks\n  Suggestion: Scan the code with the storefront's mobile app before it expires, then rerun"
    )]
    ScanTimeout {
        /// Number of scan-status requests made.
        attempts: u32,
    },

    /// The ticket-validation endpoint refused the issued ticket.
    #[error("login ticket rejected (HTTP {status})")]
    TicketRejected {
        /// HTTP status returned by the validation endpoint.
        status: u16,
    },

    /// The scan-status body could not be decoded.
    #[error("unreadable scan-status response: {reason}")]
    MalformedScanResponse {
        /// What was wrong with the body.
        reason: String,
    },

    /// A request in the handshake failed at the transport layer.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The session store could not be written.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The challenge image could not be written to disk.
    #[error("cannot write challenge image {path}: {source}")]
    ChallengeImage {
        /// Target path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl AuthError {
    /// Creates a malformed-response error.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedScanResponse {
            reason: reason.into(),
        }
    }

    /// Creates a challenge-image write error.
    pub fn challenge_image(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ChallengeImage {
            path: path.into(),
            source,
        }
    }
}
