//! OAuth account endpoints.
//!
//! The browser does the provider dance: the backend redirects to the
//! frontend callback URL with the freshly minted token pair in the query
//! string. This module's job is the hand-off at the end of that redirect
//! plus the provider/account listings.

use reqwest::{Method, Url};
use serde::Deserialize;
use tracing::debug;

use crate::auth::TokenPair;
use crate::models::{OAuthAccount, OAuthProvider, OAuthProviderInfo};

use super::client::ApiClient;
use super::ApiError;

#[derive(Debug, Deserialize)]
struct ProvidersResponse {
    providers: Vec<OAuthProviderInfo>,
}

#[derive(Debug, Deserialize)]
struct AccountsResponse {
    accounts: Vec<OAuthAccount>,
}

impl ApiClient {
    /// Providers the deployment has configured, with backend-probed
    /// reachability.
    pub async fn oauth_providers(&self) -> Result<Vec<OAuthProviderInfo>, ApiError> {
        let response: ProvidersResponse = self
            .request_json(self.request(Method::GET, "/oauth/providers"))
            .await?;
        Ok(response.providers)
    }

    /// Third-party accounts linked to the signed-in user.
    pub async fn linked_accounts(&self) -> Result<Vec<OAuthAccount>, ApiError> {
        let response: AccountsResponse = self
            .request_json(self.request(Method::GET, "/oauth/accounts"))
            .await?;
        Ok(response.accounts)
    }

    /// Unlink a provider. The backend refuses when it is the user's only
    /// way to sign in.
    pub async fn unbind_oauth(&self, provider: OAuthProvider) -> Result<(), ApiError> {
        self.request_unit(self.request(Method::DELETE, &format!("/oauth/unbind/{provider}")))
            .await
    }

    /// Finish an OAuth sign-in: pull the token pair out of the callback
    /// redirect URL's query string and store it. No network call is made;
    /// the backend already minted the tokens before redirecting.
    pub fn complete_oauth_callback(&self, redirect_url: &str) -> Result<TokenPair, ApiError> {
        let url = Url::parse(redirect_url).map_err(|err| {
            ApiError::InvalidResponse(format!("OAuth callback URL did not parse: {err}"))
        })?;

        let mut access_token = None;
        let mut refresh_token = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "access_token" => access_token = Some(value.into_owned()),
                "refresh_token" => refresh_token = Some(value.into_owned()),
                _ => {}
            }
        }

        let (Some(access_token), Some(refresh_token)) = (access_token, refresh_token) else {
            return Err(ApiError::InvalidResponse(
                "OAuth callback URL is missing token parameters".to_string(),
            ));
        };

        let pair = TokenPair { access_token, refresh_token };
        self.tokens().store(pair.clone());
        debug!("OAuth sign-in completed");
        Ok(pair)
    }
}
