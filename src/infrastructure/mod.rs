//! Storage adapters implementing the [`TransactionStore`] port.
//!
//! [`TransactionStore`]: crate::domain::ports::TransactionStore

pub mod in_memory;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
