//! The API endpoints URIs.

/// The route to list and create transactions.
pub const TRANSACTIONS_API: &str = "/api/transactions";
