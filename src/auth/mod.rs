//! Challenge/response login.
//!
//! [`Authenticator::ensure_logged_in`] walks the login state machine:
//!
//! ```text
//! CheckingExistingSession -> Authenticated
//!                         -> NeedsLogin -> AwaitingScan -> TokenIssued -> Validated
//! ```
//!
//! A stored session that still passes the redirect-suppressed probe costs a
//! single request. Otherwise the session is cleared, a one-time challenge
//! image is written to disk and announced through a [`ChallengeNotifier`],
//! and the scan-status endpoint is polled under a bounded [`ScanPolicy`]
//! until the code is scanned. The issued ticket is then exchanged for a
//! validated session, which is persisted.

mod challenge;
mod error;
mod scan;

pub use challenge::ChallengeNotifier;
pub use error::AuthError;

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::config::{ChallengeConfig, Endpoints, ScanPolicy};
use crate::session::SessionStore;
use crate::transport::{Transport, TransportError, build_url, unix_millis};

/// Cookie carrying the correlation token for the scan poll.
const SCAN_TOKEN_COOKIE: &str = "wlfstk_smdl";
const LOGIN_APP_ID: &str = "133";
const CHALLENGE_IMAGE_SIZE: &str = "147";
const SCAN_CALLBACK: &str = "jQuery123456";

/// Login handshake states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    /// Probing the stored session.
    CheckingExistingSession,
    /// The stored session is still valid.
    Authenticated,
    /// The stored session was rejected.
    NeedsLogin,
    /// Challenge image issued; polling for the scan.
    AwaitingScan,
    /// The scan was confirmed and a ticket issued.
    TokenIssued,
    /// The ticket was exchanged for a fresh session.
    Validated,
}

impl AuthState {
    /// Whether the handshake ends in this state.
    #[must_use]
    pub fn is_logged_in(self) -> bool {
        matches!(self, Self::Authenticated | Self::Validated)
    }
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::CheckingExistingSession => "checking existing session",
            Self::Authenticated => "authenticated",
            Self::NeedsLogin => "needs login",
            Self::AwaitingScan => "awaiting scan",
            Self::TokenIssued => "token issued",
            Self::Validated => "validated",
        };
        f.write_str(label)
    }
}

/// Runs the login handshake against the storefront.
pub struct Authenticator {
    transport: Transport,
    store: Arc<dyn SessionStore>,
    endpoints: Endpoints,
    scan: ScanPolicy,
    challenge: ChallengeConfig,
    notifier: Arc<dyn ChallengeNotifier>,
}

impl Authenticator {
    /// Creates an authenticator with the default scan policy and challenge location.
    ///
    /// `transport` must be built around the same jar `store` manages, so the
    /// cookies set during the handshake are the ones persisted.
    pub fn new(
        transport: Transport,
        store: Arc<dyn SessionStore>,
        endpoints: Endpoints,
        notifier: Arc<dyn ChallengeNotifier>,
    ) -> Self {
        Self {
            transport,
            store,
            endpoints,
            scan: ScanPolicy::default(),
            challenge: ChallengeConfig::default(),
            notifier,
        }
    }

    /// Replaces the scan-poll budget.
    #[must_use]
    pub fn with_scan_policy(mut self, scan: ScanPolicy) -> Self {
        self.scan = scan;
        self
    }

    /// Replaces where the challenge image is written.
    #[must_use]
    pub fn with_challenge_config(mut self, challenge: ChallengeConfig) -> Self {
        self.challenge = challenge;
        self
    }

    /// Makes sure the shared session is logged in, running the challenge
    /// handshake when the stored session no longer passes the probe.
    ///
    /// Returns the terminal state reached: [`AuthState::Authenticated`] or
    /// [`AuthState::Validated`]. Both paths end by persisting the session.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::ScanTimeout`] when the scan budget runs out,
    /// [`AuthError::TicketRejected`] when validation answers non-200, and
    /// transport/session/IO errors from the individual steps.
    #[instrument(skip(self))]
    pub async fn ensure_logged_in(&self) -> Result<AuthState, AuthError> {
        debug!(state = %AuthState::CheckingExistingSession, "probing stored session");
        if self.session_is_valid().await {
            info!("stored session is still valid");
            self.store.persist()?;
            return Ok(AuthState::Authenticated);
        }

        info!(state = %AuthState::NeedsLogin, "stored session rejected, starting challenge login");
        self.store.clean();
        self.load_login_page().await?;
        self.issue_challenge().await?;

        debug!(state = %AuthState::AwaitingScan, "polling scan status");
        let ticket = self.wait_for_scan().await?;
        debug!(state = %AuthState::TokenIssued, "exchanging ticket");

        self.validate_ticket(&ticket).await?;
        self.store.persist()?;
        info!(state = %AuthState::Validated, "login succeeded");
        Ok(AuthState::Validated)
    }

    async fn session_is_valid(&self) -> bool {
        let url = match build_url(&self.endpoints.session_probe, &[]) {
            Ok(url) => url,
            Err(e) => {
                warn!(error = %e, "session probe URL is invalid");
                return false;
            }
        };
        match self.transport.probe_status(&url).await {
            Ok(status) => status == 200,
            Err(e) => {
                debug!(error = %e, "session probe failed");
                false
            }
        }
    }

    async fn load_login_page(&self) -> Result<(), AuthError> {
        let url = build_url(&self.endpoints.login_page, &[])?;
        let response = self.transport.get_raw(&url, None).await?;
        if !response.is_success() {
            warn!(status = response.status, "login page answered with an error status");
        }
        Ok(())
    }

    async fn issue_challenge(&self) -> Result<(), AuthError> {
        let now = unix_millis();
        let url = build_url(
            &self.endpoints.challenge_image,
            &[
                ("appid", LOGIN_APP_ID),
                ("size", CHALLENGE_IMAGE_SIZE),
                ("t", now.as_str()),
            ],
        )?;
        let response = self.transport.get_raw(&url, None).await?;
        if !response.is_success() {
            return Err(TransportError::http_status(url.as_str(), response.status).into());
        }

        let path = challenge::write_challenge_image(
            &self.challenge,
            response.content_type.as_deref(),
            &response.body,
        )?;
        info!(path = %path.display(), "scan the challenge code with the storefront's mobile app");
        self.notifier.challenge_ready(&path);
        Ok(())
    }

    async fn wait_for_scan(&self) -> Result<String, AuthError> {
        let token = self.store.get(SCAN_TOKEN_COOKIE).unwrap_or_else(|| {
            warn!(cookie = SCAN_TOKEN_COOKIE, "scan token cookie missing, polling without it");
            String::new()
        });
        let now = unix_millis();
        let url = build_url(
            &self.endpoints.scan_status,
            &[
                ("callback", SCAN_CALLBACK),
                ("appid", LOGIN_APP_ID),
                ("token", token.as_str()),
                ("_", now.as_str()),
            ],
        )?;

        for attempt in 1..=self.scan.max_attempts {
            let response = self
                .transport
                .get_raw(&url, Some(&self.endpoints.login_page))
                .await?;

            if response.is_success() {
                let body = String::from_utf8_lossy(&response.body);
                let reply = scan::parse_scan_reply(&body)?;
                if let Some(ticket) = reply.confirmed_ticket() {
                    info!(attempt, "challenge code scanned");
                    return Ok(ticket.to_string());
                }
                info!(
                    attempt,
                    code = reply.code,
                    msg = reply.msg.as_deref().unwrap_or(""),
                    "waiting for scan"
                );
            } else {
                debug!(attempt, status = response.status, "scan status unavailable");
            }

            if attempt < self.scan.max_attempts {
                tokio::time::sleep(self.scan.interval).await;
            }
        }

        Err(AuthError::ScanTimeout {
            attempts: self.scan.max_attempts,
        })
    }

    async fn validate_ticket(&self, ticket: &str) -> Result<(), AuthError> {
        let url = build_url(&self.endpoints.ticket_validation, &[("t", ticket)])?;
        let response = self.transport.get_raw(&url, None).await?;
        if response.status == 200 {
            Ok(())
        } else {
            warn!(status = response.status, "ticket validation refused");
            Err(AuthError::TicketRejected {
                status: response.status,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_terminal_success_states_are_logged_in() {
        assert!(AuthState::Authenticated.is_logged_in());
        assert!(AuthState::Validated.is_logged_in());
        assert!(!AuthState::NeedsLogin.is_logged_in());
        assert!(!AuthState::TokenIssued.is_logged_in());
    }

    #[test]
    fn test_state_display_is_readable() {
        assert_eq!(AuthState::AwaitingScan.to_string(), "awaiting scan");
        assert_eq!(
            AuthState::CheckingExistingSession.to_string(),
            "checking existing session"
        );
    }
}
