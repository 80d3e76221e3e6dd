use crate::domain::ports::TransactionUpsert;
use crate::error::PaymentError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;

/// Transaction status codes as defined by the EPP wire protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    /// Applied: payment initiated locally, no processor result yet.
    #[serde(rename = "APP")]
    App,
    /// Completed.
    #[serde(rename = "COM")]
    Com,
    /// Cancelled by the payer.
    #[serde(rename = "CAN")]
    Can,
    /// Declined by the processor.
    #[serde(rename = "DEC")]
    Dec,
    /// Pending.
    #[serde(rename = "PEN")]
    Pen,
    /// Sent to the processor.
    #[serde(rename = "SEN")]
    Sen,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::App => "APP",
            Self::Com => "COM",
            Self::Can => "CAN",
            Self::Dec => "DEC",
            Self::Pen => "PEN",
            Self::Sen => "SEN",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "APP" => Ok(Self::App),
            "COM" => Ok(Self::Com),
            "CAN" => Ok(Self::Can),
            "DEC" => Ok(Self::Dec),
            "PEN" => Ok(Self::Pen),
            "SEN" => Ok(Self::Sen),
            other => Err(PaymentError::Validation(format!(
                "unknown status code: {other}"
            ))),
        }
    }
}

/// The persisted record of a payment attempt, keyed by
/// `(order_key, application_unique_id)`.
///
/// Created with status `APP` when a payment is initiated and mutated when the
/// processor callback arrives. Rows are never deleted by this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub order_key: String,
    pub application_unique_id: Option<String>,
    pub status: Status,
    pub amount: Option<Decimal>,
    pub email: Option<String>,
    /// Serialized inbound sale request, captured for audit.
    pub raw_request: Option<String>,
    /// Serialized processor callback, captured for audit.
    pub raw_response: Option<String>,
    pub auth_code: Option<String>,
    pub reference_no: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Transaction {
    /// Materializes a fresh row from an upsert. Absent fields stay `None`.
    pub fn from_upsert(upsert: TransactionUpsert, now: OffsetDateTime) -> Self {
        Self {
            order_key: upsert.order_key,
            application_unique_id: upsert.application_unique_id,
            status: upsert.status,
            amount: upsert.amount,
            email: upsert.email,
            raw_request: upsert.raw_request,
            raw_response: upsert.raw_response,
            auth_code: upsert.auth_code,
            reference_no: upsert.reference_no,
            created_at: now,
            updated_at: now,
        }
    }

    /// Merges an upsert into an existing row: `status` is overwritten
    /// unconditionally, every other field only when the upsert supplies a
    /// value. A populated field never regresses to `None`.
    pub fn merge(&mut self, upsert: TransactionUpsert, now: OffsetDateTime) {
        self.status = upsert.status;
        if let Some(amount) = upsert.amount {
            self.amount = Some(amount);
        }
        if let Some(email) = upsert.email {
            self.email = Some(email);
        }
        if let Some(raw_request) = upsert.raw_request {
            self.raw_request = Some(raw_request);
        }
        if let Some(raw_response) = upsert.raw_response {
            self.raw_response = Some(raw_response);
        }
        if let Some(auth_code) = upsert.auth_code {
            self.auth_code = Some(auth_code);
        }
        if let Some(reference_no) = upsert.reference_no {
            self.reference_no = Some(reference_no);
        }
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn upsert(status: Status) -> TransactionUpsert {
        TransactionUpsert {
            order_key: "ORD1".into(),
            application_unique_id: Some("APP1".into()),
            status,
            amount: None,
            email: None,
            raw_request: None,
            raw_response: None,
            auth_code: None,
            reference_no: None,
        }
    }

    #[test]
    fn test_status_round_trip() {
        for code in ["APP", "COM", "CAN", "DEC", "PEN", "SEN"] {
            let status: Status = code.parse().unwrap();
            assert_eq!(status.as_str(), code);
        }
    }

    #[test]
    fn test_status_parse_normalizes_case_and_whitespace() {
        assert_eq!(" com ".parse::<Status>().unwrap(), Status::Com);
    }

    #[test]
    fn test_status_rejects_unknown_code() {
        assert!("RET".parse::<Status>().is_err());
        assert!("".parse::<Status>().is_err());
    }

    #[test]
    fn test_merge_overwrites_status_unconditionally() {
        let now = OffsetDateTime::now_utc();
        let mut tx = Transaction::from_upsert(
            TransactionUpsert {
                amount: Some(dec!(10.00)),
                email: Some("a@b.com".into()),
                ..upsert(Status::App)
            },
            now,
        );

        tx.merge(upsert(Status::Com), now);

        assert_eq!(tx.status, Status::Com);
        // Fields not supplied by the merge keep their prior values.
        assert_eq!(tx.amount, Some(dec!(10.00)));
        assert_eq!(tx.email, Some("a@b.com".to_string()));
    }

    #[test]
    fn test_merge_overwrites_supplied_fields_only() {
        let now = OffsetDateTime::now_utc();
        let mut tx = Transaction::from_upsert(
            TransactionUpsert {
                amount: Some(dec!(10.00)),
                raw_request: Some("{}".into()),
                ..upsert(Status::App)
            },
            now,
        );

        tx.merge(
            TransactionUpsert {
                amount: Some(dec!(25.00)),
                auth_code: Some("AUTH9".into()),
                ..upsert(Status::Com)
            },
            now,
        );

        assert_eq!(tx.amount, Some(dec!(25.00)));
        assert_eq!(tx.auth_code, Some("AUTH9".to_string()));
        assert_eq!(tx.raw_request, Some("{}".to_string()));
    }
}
