//! Data models for the Inkpost platform API.
//!
//! This module contains all the data structures used to represent
//! platform data including:
//!
//! - `UserProfile`, `UserRef`, `UserRole`: Accounts and attribution
//! - `ArticleSummary`, `ArticleDetail`, `ArticleDraft`: Articles
//! - `Comment`, `CommentPreview`: Threaded comments
//! - `Tag`, `TagWithCount`: Tags and usage counts
//! - `MediaItem`, `UploadedFile`: Uploaded media
//! - Donation types: `DonationRecord`, `DonationGoal`, `DonationConfig`
//! - OAuth types: `OAuthProvider`, `OAuthProviderInfo`, `OAuthAccount`
//!
//! Timestamps use `chrono::NaiveDateTime` because the backend emits
//! timezone-less UTC datetimes.

pub mod article;
pub mod comment;
pub mod donation;
pub mod media;
pub mod oauth;
pub mod search;
pub mod tag;
pub mod user;

pub use article::{
    Article, ArticleDetail, ArticleDraft, ArticleStatus, ArticleSummary, ArticleUpdate, TagRef,
};
pub use comment::{Comment, CommentPreview};
pub use donation::{
    DonationConfig, DonationGoal, DonationRecord, DonationStatus, NewDonation, PaymentMethod,
    PublicDonationStats,
};
pub use media::{MediaItem, MediaKind, UploadedFile};
pub use oauth::{OAuthAccount, OAuthProvider, OAuthProviderInfo};
pub use search::{PopularSearches, SearchSuggestions};
pub use tag::{Tag, TagWithCount};
pub use user::{AuthConfig, NewAccount, UserProfile, UserRef, UserRole, VerificationCodeStatus};
