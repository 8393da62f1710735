use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use crate::routes::Route;
use crate::utils::format_countdown;

use super::{SessionToken, TokenStore};

/// Remaining time below which the countdown is shown as a warning.
const EXPIRY_WARNING_MINUTES: i64 = 5;

/// Session lifecycle: unauthenticated -> active -> expired -> unauthenticated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Active(SessionToken),
    Expired,
}

/// Why the last session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// The countdown reached zero
    Expired,
    /// The backend answered 401
    Unauthorized,
    /// The user logged out
    Logout,
}

impl EndReason {
    /// Message shown on the login page after a redirect.
    pub fn message(&self) -> &'static str {
        match self {
            EndReason::Expired => "Your session has expired. Please log in again.",
            EndReason::Unauthorized => "Your session is no longer valid. Please log in again.",
            EndReason::Logout => "You have been logged out.",
        }
    }
}

/// The one session check shared by every guarded page.
///
/// Countdown expiry (`tick`) and 401 responses (`invalidate`) both end the
/// session through `end`, so they clear the same store and redirect to the
/// same route.
pub struct SessionGuard {
    store: Arc<dyn TokenStore>,
    state: SessionState,
    ended_by: Option<EndReason>,
}

impl SessionGuard {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self {
            store,
            state: SessionState::Unauthenticated,
            ended_by: None,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, SessionState::Active(_))
    }

    /// Reason the most recent session ended, if one has
    pub fn ended_by(&self) -> Option<EndReason> {
        self.ended_by
    }

    /// Run the session check for a guarded page.
    ///
    /// Returns the bearer token to call the API with, or the route to
    /// redirect to. A redirect never comes with a token, so a page that gets
    /// `Err` cannot issue a request.
    pub fn mount(&mut self, now: DateTime<Utc>) -> Result<String, Route> {
        // An ended session is acknowledged before a stored token can reactivate it
        self.enter_login();

        let raw = match self.store.load() {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("No stored token");
                self.drop_to_unauthenticated();
                return Err(Route::Login);
            }
            Err(e) => {
                warn!(error = %e, "Failed to read stored token");
                self.drop_to_unauthenticated();
                return Err(Route::Login);
            }
        };

        let token = match SessionToken::parse(&raw) {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Stored token is unusable, discarding it");
                self.clear_store();
                self.drop_to_unauthenticated();
                return Err(Route::Login);
            }
        };

        let bearer = token.as_str().to_string();
        self.state = SessionState::Active(token);
        match self.tick(now) {
            Some(redirect) => Err(redirect),
            None => Ok(bearer),
        }
    }

    /// Start a session with a freshly issued token.
    pub fn begin(&mut self, raw: &str, now: DateTime<Utc>) -> Result<()> {
        let token = SessionToken::parse(raw).context("Login returned an unusable token")?;
        if token.is_expired(now) {
            anyhow::bail!("Login returned a token that has already expired");
        }
        self.store.save(token.as_str()).context("Failed to persist token")?;
        info!(expires_at = %token.expires_at(), "Session started");
        self.enter_login();
        self.state = SessionState::Active(token);
        self.ended_by = None;
        Ok(())
    }

    /// Countdown step. Returns the redirect exactly once, the first time
    /// `expires_at - now <= 0`.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<Route> {
        let expired = matches!(&self.state, SessionState::Active(token) if token.is_expired(now));
        if expired {
            Some(self.end(EndReason::Expired))
        } else {
            None
        }
    }

    /// The backend rejected the token. Same cleanup and target as expiry.
    /// Once the session has already ended only the store is cleared.
    pub fn invalidate(&mut self) -> Option<Route> {
        if self.is_authenticated() {
            Some(self.end(EndReason::Unauthorized))
        } else {
            self.clear_store();
            None
        }
    }

    /// User-initiated logout.
    pub fn logout(&mut self) -> Route {
        if self.is_authenticated() {
            self.end(EndReason::Logout)
        } else {
            self.clear_store();
            Route::Login
        }
    }

    /// The login page acknowledges an ended session.
    pub fn enter_login(&mut self) {
        if self.state == SessionState::Expired {
            debug!("Ended session acknowledged");
            self.state = SessionState::Unauthenticated;
        }
    }

    /// Whether `bearer` is the token of the active session
    pub fn is_current(&self, bearer: &str) -> bool {
        matches!(&self.state, SessionState::Active(token) if token.as_str() == bearer)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        match &self.state {
            SessionState::Active(token) => Some(token.expires_at()),
            _ => None,
        }
    }

    /// Time left in the session, floored at zero
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        match &self.state {
            SessionState::Active(token) => Some(token.remaining(now).max(Duration::zero())),
            _ => None,
        }
    }

    pub fn is_expiring_soon(&self, now: DateTime<Utc>) -> bool {
        self.remaining(now)
            .map(|left| left < Duration::minutes(EXPIRY_WARNING_MINUTES))
            .unwrap_or(false)
    }

    /// Countdown text for the title bar, e.g. `29:41`
    pub fn countdown_label(&self, now: DateTime<Utc>) -> Option<String> {
        self.remaining(now).map(format_countdown)
    }

    fn end(&mut self, reason: EndReason) -> Route {
        self.clear_store();
        self.state = SessionState::Expired;
        self.ended_by = Some(reason);
        info!(?reason, "Session ended");
        Route::Login
    }

    fn drop_to_unauthenticated(&mut self) {
        self.state = match self.state {
            SessionState::Active(_) => SessionState::Expired,
            _ => SessionState::Unauthenticated,
        };
    }

    fn clear_store(&self) {
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear stored token");
        }
    }
}
