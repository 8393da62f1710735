//! Authentication module for managing the bearer token and session lifecycle.
//!
//! This module provides:
//! - `SessionToken`: a bearer token with its decoded expiry
//! - `TokenStore`: persisted token storage (file, OS keychain, or memory)
//! - `SessionGuard`: the single session check every guarded page runs
//!
//! The session ends the same way whether the countdown runs out or the
//! backend answers 401: the stored token is cleared and the login route is
//! returned as the redirect target.

pub mod credentials;
pub mod session;
pub mod store;
pub mod token;

pub use credentials::KeyringTokenStore;
pub use session::{EndReason, SessionGuard, SessionState};
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore};
pub use token::{SessionToken, TokenError};
