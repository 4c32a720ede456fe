//! Client library for the Inkpost blogging platform.
//!
//! The crate wraps the platform's REST API and owns the full token
//! lifecycle: a [`TokenPair`](auth::TokenPair) is stored when the user
//! signs in, kept fresh by a background schedule and an on-demand
//! single-flight refresh, attached to every request, and cleared (with a
//! [`SignInRequired`](auth::AuthEvent::SignInRequired) broadcast) when
//! the session dies for good.
//!
//! ```no_run
//! use inkpost_client::api::ApiClient;
//! use inkpost_client::auth::{AuthEvent, TokenManager};
//! use inkpost_client::config::ClientConfig;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = ClientConfig::load()?;
//! let tokens = TokenManager::new(&config)?;
//! let client = ApiClient::new(config, tokens)?;
//!
//! let mut events = client.tokens().subscribe();
//! tokio::spawn(async move {
//!     while let Ok(event) = events.recv().await {
//!         if event == AuthEvent::SignInRequired {
//!             // route the user to the sign-in screen
//!         }
//!     }
//! });
//!
//! client.login("ada", "hunter2").await?;
//! let articles = client.list_articles(&Default::default()).await?;
//! # Ok(())
//! # }
//! ```

// Credential store, JWT expiry decoding, refresh scheduler
pub mod auth;

// ApiClient, request pipeline, endpoint methods
pub mod api;

// Wire and disk data models
pub mod models;

// Client configuration
pub mod config;
