use crate::domain::ports::{TransactionStoreBox, TransactionUpsert};
use crate::domain::transaction::{Status, Transaction};
use crate::error::Result;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

/// Outcome of the best-effort prior-record lookup during callback
/// reconciliation. `Absent` and `LookupFailed` are distinct states that both
/// collapse into "proceed with null amount/email"; the collapse happens in
/// [`TransactionReconciler::record_callback`], not inside the store.
#[derive(Debug)]
pub enum PriorRecord {
    Found(Transaction),
    Absent,
    LookupFailed,
}

/// Idempotent create-or-update reconciliation over the transaction store,
/// keyed by `(order_key, application_unique_id)`.
pub struct TransactionReconciler {
    store: TransactionStoreBox,
}

impl TransactionReconciler {
    pub fn new(store: TransactionStoreBox) -> Self {
        Self { store }
    }

    /// Records a payment initiation with status `APP`. Response-side fields
    /// stay null until the processor calls back.
    pub async fn record_initiation(
        &self,
        order_key: &str,
        application_unique_id: Option<&str>,
        amount: Decimal,
        email: Option<&str>,
        raw_request: &str,
    ) -> Result<Transaction> {
        debug!(order_key, ?application_unique_id, "recording initiation");

        let tx = self
            .store
            .upsert(TransactionUpsert {
                order_key: order_key.to_string(),
                application_unique_id: application_unique_id.map(str::to_string),
                status: Status::App,
                amount: Some(amount),
                email: email.map(str::to_string),
                raw_request: Some(raw_request.to_string()),
                raw_response: None,
                auth_code: None,
                reference_no: None,
            })
            .await?;

        info!(order_key, status = %tx.status, "initiation recorded");
        Ok(tx)
    }

    /// Reconciles a processor callback against the local record. The prior
    /// row's amount, email, and raw request are carried forward when one
    /// exists; a missing or unreadable prior record degrades to null fields
    /// and never fails the callback.
    pub async fn record_callback(
        &self,
        order_key: &str,
        application_unique_id: Option<&str>,
        status: Status,
        raw_response: &str,
        auth_code: Option<&str>,
        reference_no: Option<&str>,
    ) -> Result<Transaction> {
        debug!(order_key, ?application_unique_id, %status, "recording callback");

        let (amount, email, raw_request) =
            match self.prior_record(order_key, application_unique_id).await {
                PriorRecord::Found(prior) => (prior.amount, prior.email, prior.raw_request),
                PriorRecord::Absent | PriorRecord::LookupFailed => (None, None, None),
            };

        let tx = self
            .store
            .upsert(TransactionUpsert {
                order_key: order_key.to_string(),
                application_unique_id: application_unique_id.map(str::to_string),
                status,
                amount,
                email,
                raw_request,
                raw_response: Some(raw_response.to_string()),
                auth_code: auth_code.map(str::to_string),
                reference_no: reference_no.map(str::to_string),
            })
            .await?;

        info!(order_key, status = %tx.status, "callback recorded");
        Ok(tx)
    }

    /// Best-effort lookup of the prior initiation record. A store failure is
    /// swallowed into [`PriorRecord::LookupFailed`].
    pub async fn prior_record(
        &self,
        order_key: &str,
        application_unique_id: Option<&str>,
    ) -> PriorRecord {
        match self.store.find(order_key, application_unique_id).await {
            Ok(Some(tx)) => PriorRecord::Found(tx),
            Ok(None) => {
                debug!(order_key, "no prior initiation record");
                PriorRecord::Absent
            }
            Err(err) => {
                warn!(order_key, %err, "prior-record lookup failed, continuing with null fields");
                PriorRecord::LookupFailed
            }
        }
    }
}
