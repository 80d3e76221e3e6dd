//! Wire shapes exchanged with the merchant caller and the EPP processor.
//!
//! Sale payloads travel in the PascalCase format the hosted checkout expects;
//! callback and acknowledgment payloads use camelCase. Numeric identifier
//! fields default to 0 because EPP rejects nulls there.

use crate::domain::transaction::{Status, Transaction};
use crate::error::{PaymentError, Result};
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid email pattern")
});

const MAX_ORDER_KEY_LEN: usize = 200;
const MAX_ITEM_COUNT: u32 = 99_999;
const MAX_ITEM_DESCRIPTION_LEN: usize = 200;
const MAX_ITEM_KEY_LEN: usize = 500;

/// A single line item within a sale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SaleItem {
    pub sale_item_id: i32,
    pub count: u32,
    pub description: String,
    pub amount: Decimal,
    /// Must equal the order key per Commerce Hub requirements; defaulted
    /// during initiation when left blank.
    pub item_key: String,
}

/// Inbound sale request forwarded to the hosted checkout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SaleRequest {
    pub sale_detail_id: i32,
    pub application_code: String,
    /// Caller-assigned order identifier, stable across initiate and callback.
    pub order_key: String,
    pub first_name: String,
    pub last_name: String,
    pub address1: String,
    pub address2: Option<String>,
    pub city: String,
    pub state_code: String,
    pub zip_code: String,
    pub total_amount: Option<Decimal>,
    pub items: Vec<SaleItem>,
    pub application_unique_id: Option<String>,
    pub payment_account_type: Option<String>,
    pub email: String,
}

fn require_non_blank(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(PaymentError::Validation(format!("{field} is required")));
    }
    Ok(())
}

fn require_max_len(value: &str, max: usize, field: &str) -> Result<()> {
    if value.trim().len() > max {
        return Err(PaymentError::Validation(format!(
            "{field} exceeds maximum length of {max}"
        )));
    }
    Ok(())
}

impl SaleRequest {
    /// Validates the request against the EPP field constraints.
    pub fn validate(&self) -> Result<()> {
        require_non_blank(&self.order_key, "order key")?;
        require_max_len(&self.order_key, MAX_ORDER_KEY_LEN, "order key")?;

        match self.total_amount {
            Some(amount) if amount > Decimal::ZERO => {}
            _ => {
                return Err(PaymentError::Validation(
                    "total amount must be greater than zero".into(),
                ));
            }
        }

        require_non_blank(&self.first_name, "first name")?;
        require_max_len(&self.first_name, 20, "first name")?;
        require_non_blank(&self.last_name, "last name")?;
        require_max_len(&self.last_name, 20, "last name")?;
        require_non_blank(&self.address1, "address1")?;
        require_max_len(&self.address1, 100, "address1")?;
        if let Some(address2) = &self.address2 {
            require_max_len(address2, 100, "address2")?;
        }
        require_non_blank(&self.city, "city")?;
        require_max_len(&self.city, 100, "city")?;
        require_non_blank(&self.state_code, "state code")?;
        require_max_len(&self.state_code, 2, "state code")?;
        require_non_blank(&self.zip_code, "zip code")?;
        require_max_len(&self.zip_code, 10, "zip code")?;

        require_non_blank(&self.email, "email")?;
        require_max_len(&self.email, 100, "email")?;
        if !EMAIL_PATTERN.is_match(self.email.trim()) {
            return Err(PaymentError::Validation("email format is invalid".into()));
        }

        if self.items.is_empty() {
            return Err(PaymentError::Validation(
                "at least one sale item is required".into(),
            ));
        }
        for item in &self.items {
            if item.count > MAX_ITEM_COUNT {
                return Err(PaymentError::Validation(format!(
                    "item count exceeds maximum of {MAX_ITEM_COUNT}"
                )));
            }
            require_max_len(&item.description, MAX_ITEM_DESCRIPTION_LEN, "item description")?;
            require_max_len(&item.item_key, MAX_ITEM_KEY_LEN, "item key")?;
            if item.amount < Decimal::ZERO {
                return Err(PaymentError::Validation(
                    "item amount must not be negative".into(),
                ));
            }
        }

        Ok(())
    }

    /// Fills derived fields: a blank application code takes the configured
    /// default, and a blank item key takes the order key (Commerce Hub
    /// requires item key == order key).
    pub fn apply_defaults(&mut self, default_application_code: &str) {
        if self.application_code.trim().is_empty() {
            self.application_code = default_application_code.to_string();
        }
        let order_key = self.order_key.clone();
        for item in &mut self.items {
            if item.item_key.trim().is_empty() {
                item.item_key = order_key.clone();
            }
        }
    }
}

/// Asynchronous result callback posted by the processor after checkout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CallbackPayload {
    pub order_key: String,
    pub application_unique_id: Option<String>,
    pub application_code: Option<String>,
    /// Final status of the transaction, as a raw wire code.
    pub status: String,
    pub error_message: Option<String>,
    pub card_holder_name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state_code: Option<String>,
    pub zip_code: Option<String>,
    pub total_amount: Option<Decimal>,
    pub email_id: Option<String>,
    pub reference_number: Option<String>,
    pub payment_account_type: Option<String>,
    pub auth_code: Option<String>,
    pub reference_no: Option<String>,
}

impl CallbackPayload {
    /// Validates the callback and resolves its status code.
    pub fn validate(&self) -> Result<Status> {
        require_non_blank(&self.order_key, "order key")?;
        require_non_blank(&self.status, "status")?;
        self.status.parse()
    }

    pub fn is_cancellation(&self) -> bool {
        self.status.trim().eq_ignore_ascii_case(Status::Can.as_str())
    }
}

/// Status codes this system reports back to the processor. `RET` asks the
/// processor to re-deliver the callback and never appears on a stored
/// transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AckStatus {
    #[serde(rename = "APP")]
    App,
    #[serde(rename = "COM")]
    Com,
    #[serde(rename = "CAN")]
    Can,
    #[serde(rename = "DEC")]
    Dec,
    #[serde(rename = "PEN")]
    Pen,
    #[serde(rename = "SEN")]
    Sen,
    #[serde(rename = "RET")]
    Ret,
}

impl From<Status> for AckStatus {
    fn from(status: Status) -> Self {
        match status {
            Status::App => Self::App,
            Status::Com => Self::Com,
            Status::Can => Self::Can,
            Status::Dec => Self::Dec,
            Status::Pen => Self::Pen,
            Status::Sen => Self::Sen,
        }
    }
}

/// The response returned to the processor's callback. The processor always
/// expects one of these, even when processing failed internally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Acknowledgment {
    pub order_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_unique_id: Option<String>,
    pub status: AckStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Custom message shown on the EPP payment receipt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_message: Option<String>,
    /// Additional HTML for the EPP payment receipt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_markup: Option<String>,
    /// Legacy free-text field kept for older integrations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Acknowledgment {
    /// Maps a post-write transaction to the caller-facing acknowledgment.
    pub fn from_transaction(tx: &Transaction) -> Self {
        Self {
            order_key: tx.order_key.clone(),
            application_unique_id: tx.application_unique_id.clone(),
            status: tx.status.into(),
            error_message: None,
            header_message: None,
            html_markup: None,
            message: None,
        }
    }
}
