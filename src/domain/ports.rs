use crate::domain::transaction::{Status, Transaction};
use crate::error::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;

/// Field set for a create-or-update write. `status` always applies; every
/// `Option` field is written only when `Some`, so existing data is never
/// regressed to null by a partial update.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionUpsert {
    pub order_key: String,
    pub application_unique_id: Option<String>,
    pub status: Status,
    pub amount: Option<Decimal>,
    pub email: Option<String>,
    pub raw_request: Option<String>,
    pub raw_response: Option<String>,
    pub auth_code: Option<String>,
    pub reference_no: Option<String>,
}

/// Persistence port for payment transactions, keyed by the composite
/// `(order_key, application_unique_id)` pair.
///
/// Implementations must make `upsert` atomic per key: concurrent writers for
/// the same pair may not interleave partial writes.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Looks up the row for the composite key. A miss is `Ok(None)`, not an
    /// error.
    async fn find(
        &self,
        order_key: &str,
        application_unique_id: Option<&str>,
    ) -> Result<Option<Transaction>>;

    /// Creates the row if absent, otherwise merges per the
    /// [`TransactionUpsert`] semantics. Returns the fully materialized
    /// post-write row.
    async fn upsert(&self, upsert: TransactionUpsert) -> Result<Transaction>;
}

pub type TransactionStoreBox = Box<dyn TransactionStore>;
