//! Reward vault: per-address token balances and aggregate totals.
//!
//! Balances live on the ledger as a `VecMap<address, Coin<T>>`; amounts are
//! fixed-point strings with 9 implied decimal digits in the smallest unit.
//! All arithmetic here is exact `u128`, never floating point.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dpp::ExtractError;
use crate::rpc::{path, ObjectResponse};

/// Implied decimal digits of the reward token.
const TOKEN_DECIMALS: u32 = 9;

/// One address's held coin inside the vault.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBalance {
    pub address: String,
    /// Amount in smallest units, kept as the raw decimal string.
    pub balance: String,
    /// Object id of the coin holding this balance.
    pub balance_id: String,
    pub package_id: String,
    pub module: String,
    pub type_name: String,
}

impl TokenBalance {
    /// Amount in smallest units; 0 when the raw string is malformed.
    pub fn amount(&self) -> u128 {
        self.balance.parse().unwrap_or(0)
    }
}

/// Vault snapshot: balance index plus token identity and exact total.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RewardVaultData {
    pub vault_id: String,
    pub version: String,
    pub digest: String,
    /// Token package, recorded from the first balance entry seen. Entries are
    /// assumed homogeneous in token type; this is not re-validated.
    pub token_package_id: String,
    pub token_type_name: String,
    pub balances_by_address: HashMap<String, TokenBalance>,
    pub address_count: usize,
    pub total_balance: u128,
}

/// Aggregate distribution figures, recomputed from the balance index.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultDistributionStats {
    pub total_distributed: String,
    pub average_balance: String,
    pub median_balance: String,
    pub address_count: usize,
}

/// Extract the vault's balance map from an object response.
pub fn extract_reward_vault(response: &ObjectResponse) -> Result<RewardVaultData, ExtractError> {
    let data = response
        .data
        .as_ref()
        .ok_or(ExtractError::MissingObjectData)?;
    let content = data
        .content
        .as_ref()
        .ok_or_else(|| ExtractError::MissingContent(data.object_id.clone()))?;

    let mut vault = RewardVaultData {
        vault_id: data.object_id.clone(),
        version: data.version.clone(),
        digest: data.digest.clone(),
        ..RewardVaultData::default()
    };

    for entry in path::array_at(&content.fields, &["balances", "fields", "contents"]) {
        let Some(address) = path::str_at(entry, &["fields", "key"]) else {
            continue;
        };
        let coin_type = path::str_at(entry, &["fields", "value", "type"]).unwrap_or("");
        let (package_id, module, type_name) =
            parse_coin_definition(extract_coin_definition(coin_type).unwrap_or(""));
        if vault.token_package_id.is_empty() {
            vault.token_package_id = package_id.to_string();
            vault.token_type_name = type_name.to_string();
        }
        let balance = TokenBalance {
            address: address.to_string(),
            balance: path::str_at(entry, &["fields", "value", "fields", "balance"])
                .unwrap_or("0")
                .to_string(),
            balance_id: path::str_at(entry, &["fields", "value", "fields", "id", "id"])
                .unwrap_or_default()
                .to_string(),
            package_id: package_id.to_string(),
            module: module.to_string(),
            type_name: type_name.to_string(),
        };
        vault.total_balance += balance.amount();
        vault.balances_by_address.insert(address.to_string(), balance);
    }
    vault.address_count = vault.balances_by_address.len();
    debug!(
        vault = %vault.vault_id,
        addresses = vault.address_count,
        total = vault.total_balance,
        "extracted reward vault"
    );
    Ok(vault)
}

/// Inner type of a `Coin<T>` type string: everything inside the generic
/// bracket, provided the outer type really is the coin wrapper.
pub fn extract_coin_definition(coin_type: &str) -> Option<&str> {
    let inner = coin_type.strip_suffix('>')?;
    let open = inner.find('<')?;
    if !inner[..open].ends_with("::coin::Coin") {
        return None;
    }
    Some(&inner[open + 1..])
}

/// Split `package::module::type` into its components; missing parts are empty.
pub fn parse_coin_definition(definition: &str) -> (&str, &str, &str) {
    let mut parts = definition.splitn(3, "::");
    (
        parts.next().unwrap_or(""),
        parts.next().unwrap_or(""),
        parts.next().unwrap_or(""),
    )
}

/// Human-readable form of a smallest-unit amount: whole tokens only,
/// truncated (never rounded), thousands separated by commas.
pub fn format_token_balance(balance: &str) -> String {
    let amount: u128 = balance.parse().unwrap_or(0);
    let whole = (amount / 10u128.pow(TOKEN_DECIMALS)).to_string();
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

/// Banded usage ratio of a vault: how much of `total_supply` has left the
/// vault given its `remaining` balance. Near-zero ratios render as ceiling
/// labels instead of a misleadingly precise figure; ratios of 1% and up
/// render as the floored integer percentage.
pub fn usage_percentage(total_supply: u128, remaining: u128) -> String {
    if total_supply == 0 {
        return "0%".to_string();
    }
    let used = total_supply.saturating_sub(remaining);
    for (scale, label) in [
        (1_000_000, "<0.0001%"),
        (100_000, "<0.001%"),
        (10_000, "<0.01%"),
        (1_000, "<0.1%"),
        (100, "<1%"),
    ] {
        if used.saturating_mul(scale) < total_supply {
            return label.to_string();
        }
    }
    format!("{}%", used * 100 / total_supply)
}

impl RewardVaultData {
    /// Balance held by one address, if any.
    pub fn balance_by_address(&self, address: &str) -> Option<&TokenBalance> {
        self.balances_by_address.get(address)
    }

    /// Every address with an entry in the vault.
    pub fn all_reward_addresses(&self) -> Vec<&str> {
        self.balances_by_address.keys().map(String::as_str).collect()
    }

    /// Balances ordered highest first.
    pub fn balances_sorted_by_amount(&self) -> Vec<&TokenBalance> {
        let mut balances: Vec<&TokenBalance> = self.balances_by_address.values().collect();
        balances.sort_by(|a, b| b.amount().cmp(&a.amount()));
        balances
    }

    /// True iff the address holds a strictly positive balance.
    pub fn address_has_rewards(&self, address: &str) -> bool {
        self.balances_by_address
            .get(address)
            .is_some_and(|balance| balance.amount() > 0)
    }

    /// Addresses holding at least `min_balance` smallest units.
    pub fn addresses_above_threshold(&self, min_balance: u128) -> Vec<&str> {
        self.balances_by_address
            .iter()
            .filter(|(_, balance)| balance.amount() >= min_balance)
            .map(|(address, _)| address.as_str())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.address_count == 0
    }

    /// Formatted total with the token name appended.
    pub fn total_value(&self) -> String {
        format!(
            "{} {}",
            format_token_balance(&self.total_balance.to_string()),
            self.token_type_name
        )
    }

    /// Total, mean, and median across the held balances. Median is the upper
    /// middle element of the ascending order.
    pub fn distribution_stats(&self) -> VaultDistributionStats {
        let mut amounts: Vec<u128> = self
            .balances_by_address
            .values()
            .map(TokenBalance::amount)
            .collect();
        amounts.sort_unstable();
        let average = if amounts.is_empty() {
            0
        } else {
            self.total_balance / amounts.len() as u128
        };
        let median = amounts.get(amounts.len() / 2).copied().unwrap_or(0);
        VaultDistributionStats {
            total_distributed: self.total_balance.to_string(),
            average_balance: average.to_string(),
            median_balance: median.to_string(),
            address_count: amounts.len(),
        }
    }
}
