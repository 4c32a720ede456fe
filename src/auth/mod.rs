//! Authentication module: token pair ownership and lifecycle.
//!
//! This module provides:
//! - `TokenManager`: the credential store and refresh scheduler
//! - `claims`: JWT payload decoding for expiry checks
//! - `TokenFile`: file-backed persistence for the token pair
//!
//! The backend issues a short-lived access token (~30 minutes) and a
//! rotating refresh token (7 days). `TokenManager` keeps the access token
//! fresh proactively and on demand, and broadcasts `AuthEvent`s when the
//! session changes underneath the application.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod claims;
pub mod manager;
pub mod storage;

pub use claims::{Claims, TokenDecodeError};
pub use manager::TokenManager;
pub use storage::TokenFile;

/// The access/refresh token pair. Always stored and cleared together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Session lifecycle notifications for subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    /// A refresh replaced the token pair.
    Refreshed,
    /// Credentials were cleared after a terminal auth failure; the
    /// application should route the user to sign-in.
    SignInRequired,
}

/// Terminal authentication state surfaced to callers.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// The session could not be kept alive; credentials were cleared and
    /// the user has to sign in again.
    #[error("Session expired - sign in required")]
    SessionExpired,
}
