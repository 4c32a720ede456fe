//! REST API client module for the Inkpost platform.
//!
//! This module provides the `ApiClient` for communicating with the
//! backend: articles, comments, tags, search, media, donations, and the
//! account endpoints.
//!
//! Every request runs through the auth pipeline in `client`: the current
//! access token is attached as a bearer header, auth failures trigger one
//! refresh-and-retry through the shared `TokenManager`, and terminal
//! failures clear credentials and (policy permitting) broadcast
//! `AuthEvent::SignInRequired`.

pub mod client;
pub mod error;

mod articles;
mod auth;
mod comments;
mod donations;
mod media;
mod oauth;
mod search;
mod tags;

pub use articles::ArticleQuery;
pub use client::{ApiClient, AuthFailureAction, RequestPolicy};
pub use error::ApiError;
pub use search::SearchQuery;
