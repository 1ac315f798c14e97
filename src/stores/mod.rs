//! Contains the trait and implementations for objects that store [transactions](crate::Transaction).

mod memory;
mod realtime_database;
mod transaction;

pub use memory::InMemoryTransactionStore;
pub use realtime_database::{COLLECTION, RealtimeDatabaseStore};
pub use transaction::TransactionStore;
