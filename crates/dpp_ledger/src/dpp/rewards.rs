//! Reward transaction indexing: cross-reference indices over the
//! reward-granting transactions of one product.
//!
//! A transaction block is retained only when one of its product-entry events
//! references the target product; everything else is dropped wholesale,
//! including any reward balance changes it carried. The four indices share
//! the retained transactions through `Arc`, so one transaction appearing
//! under several keys is the same allocation.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use tracing::debug;

use crate::dpp::config::LedgerIds;
use crate::rpc::{timestamp_ms_i64, TransactionBlockResponse};

/// A product-entry-logged event, flattened from the event envelope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductEntryEvent {
    pub tx_digest: String,
    pub event_seq: String,
    pub package_id: String,
    pub sender: String,
    pub entry_addr: String,
    pub product_addr: String,
    /// Variant name of the issuer role enum, `"unknown"` when absent.
    pub issuer_role: String,
    pub timestamp_ms: Option<i64>,
    pub checkpoint: Option<String>,
}

/// A reward-token balance delta with a resolvable address owner.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardBalanceChange {
    pub owner: String,
    pub coin_type: String,
    /// Signed amount in smallest units, kept as the raw decimal string.
    pub amount: String,
    pub tx_digest: String,
    pub timestamp_ms: Option<i64>,
    pub checkpoint: Option<String>,
}

impl RewardBalanceChange {
    /// Signed amount; 0 when the raw string is malformed.
    pub fn amount_value(&self) -> i128 {
        self.amount.parse().unwrap_or(0)
    }
}

/// One retained transaction with its events and reward deltas.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardTransaction {
    pub digest: String,
    pub status: String,
    pub executed_epoch: String,
    pub product_entries: Vec<ProductEntryEvent>,
    pub reward_changes: Vec<RewardBalanceChange>,
    pub timestamp_ms: Option<i64>,
    pub checkpoint: Option<String>,
}

/// Observed time span of the retained transactions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub earliest: OffsetDateTime,
    pub latest: OffsetDateTime,
}

/// The indexed view: one retained list, four indices over it.
#[derive(Clone, Debug, Default)]
pub struct RewardVaultTransactionData {
    pub transaction_count: usize,
    /// Retained transactions, newest first.
    pub transactions: Vec<Arc<RewardTransaction>>,
    pub by_digest: HashMap<String, Arc<RewardTransaction>>,
    pub by_recipient: HashMap<String, Vec<Arc<RewardTransaction>>>,
    pub by_product: HashMap<String, Vec<Arc<RewardTransaction>>>,
    pub by_role: HashMap<String, Vec<Arc<RewardTransaction>>>,
    /// Sum of positive reward deltas across all retained transactions.
    pub total_distributed: u128,
    pub date_range: Option<DateRange>,
}

/// On-demand aggregate figures; never cached on the index.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardDistributionStats {
    pub total_distributed: String,
    pub transaction_count: usize,
    pub unique_recipients: usize,
    /// Recipient with the largest positive-delta sum, with that sum.
    pub top_recipient: Option<(String, u128)>,
    /// Product with the most retained transactions, with the count.
    pub top_product: Option<(String, usize)>,
    /// Issuer role with the most retained transactions, with the count.
    pub most_active_role: Option<(String, usize)>,
}

/// Index the transaction blocks that grant rewards against `product_id`.
pub fn index_reward_transactions(
    blocks: &[TransactionBlockResponse],
    product_id: &str,
    ids: &LedgerIds,
) -> RewardVaultTransactionData {
    let mut retained: Vec<RewardTransaction> = Vec::new();
    let mut total_distributed: u128 = 0;

    for block in blocks {
        let timestamp_ms = timestamp_ms_i64(block.timestamp_ms.as_deref());
        let product_entries: Vec<ProductEntryEvent> = block
            .events
            .iter()
            .filter(|event| event.event_type.ends_with(&ids.product_entry_event_suffix))
            .map(|event| ProductEntryEvent {
                tx_digest: block.digest.clone(),
                event_seq: event.id.event_seq.clone(),
                package_id: event.package_id.clone(),
                sender: event.sender.clone(),
                entry_addr: json_str(&event.parsed_json, "entry_addr"),
                product_addr: json_str(&event.parsed_json, "product_addr"),
                issuer_role: role_variant(event.parsed_json.get("issuer_role")),
                timestamp_ms,
                checkpoint: block.checkpoint.clone(),
            })
            .collect();

        // Wholesale drop: an unrelated transaction contributes nothing, not
        // even its reward deltas.
        if !product_entries
            .iter()
            .any(|entry| entry.product_addr == product_id)
        {
            continue;
        }

        let mut reward_changes = Vec::new();
        for change in &block.balance_changes {
            if !change.coin_type.ends_with(&ids.reward_coin_suffix) {
                continue;
            }
            let Some(owner) = change.address_owner() else {
                continue;
            };
            let reward = RewardBalanceChange {
                owner: owner.to_string(),
                coin_type: change.coin_type.clone(),
                amount: change.amount.clone(),
                tx_digest: block.digest.clone(),
                timestamp_ms,
                checkpoint: block.checkpoint.clone(),
            };
            let amount = reward.amount_value();
            if amount > 0 {
                total_distributed += amount.unsigned_abs();
            }
            reward_changes.push(reward);
        }

        retained.push(RewardTransaction {
            digest: block.digest.clone(),
            status: block
                .effects
                .as_ref()
                .and_then(|e| e.status.as_ref())
                .map_or_else(|| "unknown".to_string(), |s| s.status.clone()),
            executed_epoch: block
                .effects
                .as_ref()
                .and_then(|e| e.executed_epoch.clone())
                .unwrap_or_else(|| "0".to_string()),
            product_entries,
            reward_changes,
            timestamp_ms,
            checkpoint: block.checkpoint.clone(),
        });
    }

    retained.sort_by_key(|tx| std::cmp::Reverse(tx.timestamp_ms.unwrap_or(0)));

    let mut data = RewardVaultTransactionData {
        transaction_count: retained.len(),
        total_distributed,
        date_range: date_range_of(&retained),
        ..RewardVaultTransactionData::default()
    };
    for tx in retained {
        let tx = Arc::new(tx);
        data.by_digest.insert(tx.digest.clone(), Arc::clone(&tx));
        for change in &tx.reward_changes {
            data.by_recipient
                .entry(change.owner.clone())
                .or_default()
                .push(Arc::clone(&tx));
        }
        for entry in &tx.product_entries {
            data.by_product
                .entry(entry.product_addr.clone())
                .or_default()
                .push(Arc::clone(&tx));
            data.by_role
                .entry(entry.issuer_role.clone())
                .or_default()
                .push(Arc::clone(&tx));
        }
        data.transactions.push(tx);
    }
    debug!(
        product = product_id,
        retained = data.transaction_count,
        distributed = data.total_distributed,
        "indexed reward transactions"
    );
    data
}

fn json_str(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Role enums arrive either as `{"variant": "Manufacturer", ..}` or as a bare
/// string, depending on the node version.
fn role_variant(role: Option<&Value>) -> String {
    role.and_then(|r| {
        r.get("variant")
            .and_then(Value::as_str)
            .or_else(|| r.as_str())
    })
    .unwrap_or("unknown")
    .to_string()
}

fn date_range_of(retained: &[RewardTransaction]) -> Option<DateRange> {
    let mut timestamps = retained.iter().filter_map(|tx| tx.timestamp_ms);
    let first = timestamps.next()?;
    let (min, max) = timestamps.fold((first, first), |(min, max), ts| {
        (min.min(ts), max.max(ts))
    });
    let earliest = OffsetDateTime::from_unix_timestamp_nanos(i128::from(min) * 1_000_000).ok()?;
    let latest = OffsetDateTime::from_unix_timestamp_nanos(i128::from(max) * 1_000_000).ok()?;
    Some(DateRange { earliest, latest })
}

impl RewardVaultTransactionData {
    pub fn transaction_by_digest(&self, digest: &str) -> Option<&Arc<RewardTransaction>> {
        self.by_digest.get(digest)
    }

    pub fn transactions_by_recipient(&self, address: &str) -> &[Arc<RewardTransaction>] {
        self.by_recipient.get(address).map_or(&[], Vec::as_slice)
    }

    pub fn transactions_by_product(&self, product_addr: &str) -> &[Arc<RewardTransaction>] {
        self.by_product.get(product_addr).map_or(&[], Vec::as_slice)
    }

    pub fn transactions_by_role(&self, role: &str) -> &[Arc<RewardTransaction>] {
        self.by_role.get(role).map_or(&[], Vec::as_slice)
    }

    /// The most recent retained transaction.
    pub fn latest_transaction(&self) -> Option<&Arc<RewardTransaction>> {
        self.transactions.first()
    }

    /// Recompute aggregate figures from the indexed transactions. Ties on a
    /// maximum break toward the lexicographically smaller key.
    pub fn reward_distribution_stats(&self) -> RewardDistributionStats {
        let mut by_recipient: HashMap<&str, u128> = HashMap::new();
        for tx in &self.transactions {
            for change in &tx.reward_changes {
                let amount = change.amount_value();
                if amount > 0 {
                    *by_recipient.entry(change.owner.as_str()).or_default() +=
                        amount.unsigned_abs();
                }
            }
        }
        let top_recipient = max_entry(
            by_recipient
                .iter()
                .map(|(recipient, total)| (*recipient, *total)),
        );
        let top_product = max_entry(
            self.by_product
                .iter()
                .map(|(product, txs)| (product.as_str(), txs.len())),
        );
        let most_active_role = max_entry(
            self.by_role
                .iter()
                .map(|(role, txs)| (role.as_str(), txs.len())),
        );
        RewardDistributionStats {
            total_distributed: self.total_distributed.to_string(),
            transaction_count: self.transaction_count,
            unique_recipients: self.by_recipient.len(),
            top_recipient,
            top_product,
            most_active_role,
        }
    }
}

fn max_entry<'a, T: Ord + Copy>(
    entries: impl Iterator<Item = (&'a str, T)>,
) -> Option<(String, T)> {
    entries
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))
        .map(|(key, value)| (key.to_string(), value))
}
