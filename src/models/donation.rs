//! Donation types. Payment artifacts (QR URLs, form HTML, gateway ids)
//! are opaque strings rendered by the backend; the client only carries
//! them.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentMethod {
    Alipay,
    Wechat,
    Paypal,
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::Alipay => write!(f, "Alipay"),
            PaymentMethod::Wechat => write!(f, "WeChat Pay"),
            PaymentMethod::Paypal => write!(f, "PayPal"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DonationStatus {
    Pending,
    Success,
    Failed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonationConfig {
    pub id: i64,
    pub is_enabled: bool,
    pub title: String,
    pub description: String,
    pub alipay_enabled: bool,
    pub wechat_enabled: bool,
    pub paypal_enabled: bool,
    /// JSON-encoded list of suggested amounts, e.g. `"[5, 10, 20]"`.
    pub preset_amounts: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl DonationConfig {
    /// The suggested amounts, or an empty list when the stored value is
    /// not parseable.
    pub fn preset_values(&self) -> Vec<f64> {
        serde_json::from_str(&self.preset_amounts).unwrap_or_default()
    }
}

/// Payload for starting a donation.
#[derive(Debug, Clone, Serialize)]
pub struct NewDonation {
    pub donor_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub donor_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub donor_message: Option<String>,
    pub is_anonymous: bool,
    pub amount: f64,
    pub currency: String,
    pub payment_method: PaymentMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal_id: Option<i64>,
}

impl NewDonation {
    pub fn new(donor_name: impl Into<String>, amount: f64, method: PaymentMethod) -> Self {
        Self {
            donor_name: donor_name.into(),
            donor_email: None,
            donor_message: None,
            is_anonymous: false,
            amount,
            currency: "CNY".to_string(),
            payment_method: method,
            goal_id: None,
        }
    }
}

/// A donation record. The gateway fields are only populated on the
/// response to the create call that started the payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonationRecord {
    pub id: i64,
    pub donor_name: String,
    pub donor_email: Option<String>,
    pub donor_message: Option<String>,
    pub is_anonymous: bool,
    pub amount: f64,
    pub currency: String,
    pub payment_method: PaymentMethod,
    pub payment_status: DonationStatus,
    pub transaction_id: Option<String>,
    pub user_id: Option<i64>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub paid_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub alipay_form_html: Option<String>,
    #[serde(default)]
    pub alipay_qr: Option<String>,
    #[serde(default)]
    pub wechat_qr: Option<String>,
    #[serde(default)]
    pub wechat_prepay_id: Option<String>,
    #[serde(default)]
    pub wechat_trade_type: Option<String>,
    #[serde(default)]
    pub wechat_error: Option<String>,
    #[serde(default)]
    pub paypal_url: Option<String>,
    #[serde(default)]
    pub paypal_order_id: Option<String>,
    #[serde(default)]
    pub paypal_error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonationGoal {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub target_amount: f64,
    pub current_amount: f64,
    pub currency: String,
    pub start_date: NaiveDateTime,
    pub end_date: Option<NaiveDateTime>,
    pub is_active: bool,
    pub is_completed: bool,
    pub progress_percentage: f64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Aggregate donation numbers shown on the public donation page.
#[derive(Debug, Clone, Deserialize)]
pub struct PublicDonationStats {
    pub total_donations: i64,
    pub total_amount: f64,
    pub currency: String,
    pub active_goals: i64,
}
