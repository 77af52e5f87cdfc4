//! Error types for order finalization.

use thiserror::Error;

use crate::transport::TransportError;

/// Errors from the order page, discount bundle, or submission.
///
/// Reported once; never retried.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The storefront refused the submission.
    #[error("order submission rejected ({code}): {message}")]
    SubmitRejected {
        /// Remote result code.
        code: String,
        /// Remote message.
        message: String,
    },

    /// An order response could not be decoded.
    #[error("unreadable order response: {reason}")]
    InvalidResponse {
        /// Decoder message.
        reason: String,
    },

    /// The order request failed at the transport layer.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl OrderError {
    /// Creates an invalid-response error.
    pub fn invalid_response(reason: impl ToString) -> Self {
        Self::InvalidResponse {
            reason: reason.to_string(),
        }
    }
}
