//! Ledger-object decoding and domain indexing for the DPP demo.
//!
//! Turns already-fetched ledger RPC JSON (object queries, transaction block
//! queries) into typed, indexed, immutable snapshots: federation governance,
//! reward vault balances, reward transaction indices, service history.
//! Read-only; no network; no signing.

// Deeply nested json! fixtures in the federation tests exceed the default
// macro recursion limit.
#![recursion_limit = "256"]

pub mod decode;
pub mod dpp;
pub mod rpc;

pub use decode::{decode_object, decode_value, DecodeConfig, DecodeError, DecodedObject};
pub use dpp::config::LedgerIds;
pub use dpp::federation::{extract_federation_data, Accreditation, FederationData, RootAuthority};
pub use dpp::history::{extract_service_transactions, ServiceEntry};
pub use dpp::rewards::{
    index_reward_transactions, ProductEntryEvent, RewardBalanceChange, RewardDistributionStats,
    RewardTransaction, RewardVaultTransactionData,
};
pub use dpp::vault::{extract_reward_vault, RewardVaultData, TokenBalance};
pub use dpp::ExtractError;
pub use rpc::{ObjectData, ObjectResponse, TransactionBlockResponse};
