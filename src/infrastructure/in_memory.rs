use crate::domain::ports::{TransactionStore, TransactionUpsert};
use crate::domain::transaction::Transaction;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::RwLock;

type CompositeKey = (String, Option<String>);

/// A thread-safe in-memory transaction store.
///
/// Uses `Arc<RwLock<HashMap>>` for shared concurrent access. The write lock
/// is held across the whole read-merge-write of an upsert, so writers for the
/// same composite key serialize. Ideal for tests and the default CLI mode.
#[derive(Default, Clone)]
pub struct InMemoryTransactionStore {
    transactions: Arc<RwLock<HashMap<CompositeKey, Transaction>>>,
}

impl InMemoryTransactionStore {
    /// Creates a new, empty in-memory transaction store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn find(
        &self,
        order_key: &str,
        application_unique_id: Option<&str>,
    ) -> Result<Option<Transaction>> {
        let transactions = self.transactions.read().await;
        let key = (
            order_key.to_string(),
            application_unique_id.map(str::to_string),
        );
        Ok(transactions.get(&key).cloned())
    }

    async fn upsert(&self, upsert: TransactionUpsert) -> Result<Transaction> {
        let mut transactions = self.transactions.write().await;
        let key = (upsert.order_key.clone(), upsert.application_unique_id.clone());
        let now = OffsetDateTime::now_utc();

        let tx = match transactions.entry(key) {
            Entry::Occupied(mut entry) => {
                let existing = entry.get_mut();
                existing.merge(upsert, now);
                existing.clone()
            }
            Entry::Vacant(entry) => entry.insert(Transaction::from_upsert(upsert, now)).clone(),
        };
        Ok(tx)
    }
}
