//! Ledger RPC response shapes and safe access helpers.
//!
//! The shapes are externally defined by the ledger platform (object queries
//! and transaction block queries); they are modeled here as a contract, not
//! redesigned. Every collection or optional field defaults to empty so a
//! partially-filled response never fails to deserialize.

pub mod path;
mod types;

pub use types::{
    BalanceChange, CreatedObject, EventEnvelope, EventId, ExecutionStatus, MoveContent,
    ObjectData, ObjectRef, ObjectResponse, TransactionBlockResponse, TransactionData,
    TransactionEffects, TransactionEnvelope,
};

/// Parse the RPC's decimal-string millisecond timestamp. `None` on absence or garbage.
pub fn timestamp_ms_i64(timestamp_ms: Option<&str>) -> Option<i64> {
    timestamp_ms.and_then(|t| t.trim().parse::<i64>().ok())
}
