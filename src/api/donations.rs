//! Donation endpoints. Payment data (QR codes, gateway forms) is opaque
//! to the client; the backend renders it and the application displays it.

use reqwest::Method;
use serde_json::json;

use crate::models::{DonationConfig, DonationGoal, DonationRecord, NewDonation, PublicDonationStats};

use super::client::ApiClient;
use super::ApiError;

impl ApiClient {
    /// The deployment's donation settings: whether donations are enabled,
    /// which payment methods are available, and the suggested amounts.
    pub async fn donation_config(&self) -> Result<DonationConfig, ApiError> {
        self.request_json(self.request(Method::GET, "/donation/config"))
            .await
    }

    /// Start a donation. The response carries the gateway artifacts for
    /// the chosen payment method (QR code URL, form HTML, or redirect).
    pub async fn create_donation(&self, donation: &NewDonation) -> Result<DonationRecord, ApiError> {
        self.request_json(
            self.request(Method::POST, "/donation/create")
                .json(json!(donation)),
        )
        .await
    }

    /// The signed-in user's donations, newest first.
    pub async fn my_donations(&self) -> Result<Vec<DonationRecord>, ApiError> {
        self.request_json(self.request(Method::GET, "/donation/records/my"))
            .await
    }

    /// Donation goals, either active ones or all of them.
    pub async fn donation_goals(&self, active_only: bool) -> Result<Vec<DonationGoal>, ApiError> {
        self.request_json(
            self.request(Method::GET, "/donation/goals")
                .query("active_only", active_only),
        )
        .await
    }

    /// Aggregate numbers for the public donation page. No auth required.
    pub async fn public_donation_stats(&self) -> Result<PublicDonationStats, ApiError> {
        self.request_json(self.request(Method::GET, "/donation/public-stats"))
            .await
    }
}
