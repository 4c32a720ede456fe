//! Account and session endpoints.
//!
//! `login`, `register`, and the OAuth callback are the only places a
//! token pair enters the client; all of them store it through the shared
//! `TokenManager`, which also starts the refresh schedule.

use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::auth::TokenPair;
use crate::models::{AuthConfig, NewAccount, UserProfile, VerificationCodeStatus};

use super::client::ApiClient;
use super::ApiError;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
}

#[derive(Debug, Deserialize)]
struct Message {
    message: String,
}

impl ApiClient {
    /// Sign in with a username and password. The returned pair is stored,
    /// which also starts the background refresh schedule.
    ///
    /// A 401 here means the credentials were wrong, so the request opts
    /// out of the refresh-and-retry cycle.
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenPair, ApiError> {
        let token: TokenResponse = self
            .request_json(
                self.request(Method::POST, "/auth/login")
                    .json(json!({ "username": username, "password": password }))
                    .no_retry(),
            )
            .await?;

        let pair = TokenPair {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
        };
        self.tokens().store(pair.clone());
        debug!(username, "Signed in");
        Ok(pair)
    }

    /// Register an account. The backend signs the new user in immediately;
    /// the returned pair is stored like a login.
    pub async fn register(&self, account: &NewAccount) -> Result<TokenPair, ApiError> {
        let token: TokenResponse = self
            .request_json(
                self.request(Method::POST, "/auth/register")
                    .json(json!(account))
                    .no_retry(),
            )
            .await?;

        let pair = TokenPair {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
        };
        self.tokens().store(pair.clone());
        debug!(username = %account.username, "Registered and signed in");
        Ok(pair)
    }

    /// The signed-in user's profile.
    pub async fn me(&self) -> Result<UserProfile, ApiError> {
        self.request_json(self.request(Method::GET, "/auth/me")).await
    }

    /// Sign out: ask the backend to blacklist the access token, then drop
    /// local credentials whether or not that call went through.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let result = match self.tokens().access_token() {
            Some(access_token) => {
                self.request_unit(
                    self.request(Method::POST, "/auth/logout")
                        .json(json!({ "access_token": access_token })),
                )
                .await
            }
            None => Ok(()),
        };
        self.tokens().clear();
        result
    }

    /// Which sign-in features (email verification, OAuth) the deployment
    /// has enabled.
    pub async fn auth_config(&self) -> Result<AuthConfig, ApiError> {
        self.request_json(self.request(Method::GET, "/auth/config")).await
    }

    /// Email a registration verification code to `email`.
    pub async fn send_verification_code(&self, email: &str) -> Result<String, ApiError> {
        let message: Message = self
            .request_json(
                self.request(Method::POST, "/auth/send-verification-code")
                    .json(json!({ "email": email })),
            )
            .await?;
        Ok(message.message)
    }

    /// Start a password reset. The backend answers the same whether or
    /// not the email exists.
    pub async fn forgot_password(&self, email: &str) -> Result<String, ApiError> {
        let message: Message = self
            .request_json(
                self.request(Method::POST, "/auth/forgot-password")
                    .json(json!({ "email": email })),
            )
            .await?;
        Ok(message.message)
    }

    /// Finish a password reset with the token from the reset email. A 401
    /// means the reset token was bad, not the session, so no retry.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<String, ApiError> {
        let message: Message = self
            .request_json(
                self.request(Method::POST, "/auth/reset-password")
                    .json(json!({ "token": token, "new_password": new_password }))
                    .no_retry(),
            )
            .await?;
        Ok(message.message)
    }

    /// Change the signed-in user's password. `verification_code` is
    /// required when the deployment has email verification enabled; the
    /// backend expects an empty string otherwise.
    pub async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
        verification_code: Option<&str>,
    ) -> Result<String, ApiError> {
        let message: Message = self
            .request_json(
                self.request(Method::POST, "/auth/change-password").json(json!({
                    "current_password": current_password,
                    "new_password": new_password,
                    "verification_code": verification_code.unwrap_or_default(),
                })),
            )
            .await?;
        Ok(message.message)
    }

    /// Email a verification code for a password change. A terminal auth
    /// failure here stays quiet by default (see
    /// `ClientConfig::notice_paths`), because this is called from inside
    /// the change-password form where a redirect would eat user input.
    pub async fn send_change_password_code(&self) -> Result<VerificationCodeStatus, ApiError> {
        self.request_json(self.request(Method::POST, "/auth/send-change-password-code"))
            .await
    }
}
