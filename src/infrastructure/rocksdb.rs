use crate::domain::ports::{TransactionStore, TransactionUpsert};
use crate::domain::transaction::Transaction;
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, DB, Options};
use std::path::Path;
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::Mutex;

/// Column Family for storing transaction rows.
pub const CF_TRANSACTIONS: &str = "transactions";

/// A persistent transaction store backed by RocksDB.
///
/// Rows are JSON-encoded under a composite `order_key / application_unique_id`
/// key. RocksDB offers no multi-operation transaction in this configuration,
/// so the store serializes upserts through a mutex held across the
/// read-merge-write.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDbTransactionStore {
    db: Arc<DB>,
    upsert_lock: Arc<Mutex<()>>,
}

impl RocksDbTransactionStore {
    /// Opens or creates a RocksDB instance at the specified path, ensuring
    /// the transactions column family exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_transactions = ColumnFamilyDescriptor::new(CF_TRANSACTIONS, Options::default());
        let db = DB::open_cf_descriptors(&opts, path, vec![cf_transactions])?;

        Ok(Self {
            db: Arc::new(db),
            upsert_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Encodes the composite key with an explicit component boundary: the
    /// order key is length-prefixed and the unique id carries a presence
    /// flag, so a missing unique id, an empty one, and any order-key byte
    /// content all map to distinct slots.
    fn key(order_key: &str, application_unique_id: Option<&str>) -> Vec<u8> {
        let order_key = order_key.as_bytes();
        let mut key = Vec::with_capacity(
            4 + order_key.len() + 1 + application_unique_id.map_or(0, str::len),
        );
        key.extend_from_slice(&(order_key.len() as u32).to_be_bytes());
        key.extend_from_slice(order_key);
        match application_unique_id {
            Some(unique_id) => {
                key.push(1);
                key.extend_from_slice(unique_id.as_bytes());
            }
            None => key.push(0),
        }
        key
    }

    fn read(&self, key: &[u8]) -> Result<Option<Transaction>> {
        let cf = self.db.cf_handle(CF_TRANSACTIONS).ok_or_else(|| {
            PaymentError::Store("transactions column family not found".to_string())
        })?;

        match self.db.get_cf(&cf, key)? {
            Some(bytes) => {
                let tx = serde_json::from_slice(&bytes)
                    .map_err(|e| PaymentError::Store(format!("deserialization error: {e}")))?;
                Ok(Some(tx))
            }
            None => Ok(None),
        }
    }

    fn write(&self, key: &[u8], tx: &Transaction) -> Result<()> {
        let cf = self.db.cf_handle(CF_TRANSACTIONS).ok_or_else(|| {
            PaymentError::Store("transactions column family not found".to_string())
        })?;

        let value = serde_json::to_vec(tx)
            .map_err(|e| PaymentError::Store(format!("serialization error: {e}")))?;
        self.db.put_cf(&cf, key, value)?;
        Ok(())
    }
}

#[async_trait]
impl TransactionStore for RocksDbTransactionStore {
    async fn find(
        &self,
        order_key: &str,
        application_unique_id: Option<&str>,
    ) -> Result<Option<Transaction>> {
        self.read(&Self::key(order_key, application_unique_id))
    }

    async fn upsert(&self, upsert: TransactionUpsert) -> Result<Transaction> {
        let _guard = self.upsert_lock.lock().await;

        let key = Self::key(
            &upsert.order_key,
            upsert.application_unique_id.as_deref(),
        );
        let now = OffsetDateTime::now_utc();

        let tx = match self.read(&key)? {
            Some(mut existing) => {
                existing.merge(upsert, now);
                existing
            }
            None => Transaction::from_upsert(upsert, now),
        };
        self.write(&key, &tx)?;
        Ok(tx)
    }
}
