//! Service history: the audit trail of service events logged against one
//! product.
//!
//! A transaction contributes an entry only when it executed successfully,
//! its final command invokes the service-logging entry point, and its
//! product-entry event references the target product. Entry metadata comes
//! from three places at once: the created object (version, digest), the
//! event (addresses, role, package), and the call inputs (service fields).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::dpp::config::LedgerIds;
use crate::rpc::{path, timestamp_ms_i64, TransactionBlockResponse};

/// One logged service event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEntry {
    /// Object id of the created product entry.
    pub entry_id: String,
    pub version: String,
    pub digest: String,
    /// Digest of the transaction block that logged the entry.
    pub tx_block: String,
    pub service_type: String,
    pub service_description: String,
    pub health_score: Option<String>,
    pub findings: Option<String>,
    pub issuer_address: String,
    /// Lowercased issuer role, `"unknown"` when the event lacks one.
    pub issuer_role: String,
    pub timestamp_ms: Option<i64>,
    pub package_id: String,
    pub status: String,
    /// Reward granted by this transaction in smallest units, `"0"` when no
    /// package-scoped reward change is present.
    pub reward_amount: String,
}

/// Extract the service entries logged against `product_id` from a batch of
/// transaction blocks. Non-qualifying transactions are skipped silently,
/// qualifying ones with a missing created object are skipped with a warning.
pub fn extract_service_transactions(
    blocks: &[TransactionBlockResponse],
    product_id: &str,
    ids: &LedgerIds,
) -> Vec<ServiceEntry> {
    let mut entries = Vec::new();
    for block in blocks {
        if !block.is_success() {
            debug!(digest = %block.digest, "skipping non-success transaction");
            continue;
        }
        let calls_entry_point = block
            .last_command()
            .and_then(TransactionBlockResponse::move_call_target)
            .is_some_and(|(module, function)| {
                module == ids.entry_module && function == ids.entry_function
            });
        if !calls_entry_point {
            continue;
        }
        let Some(event) = block.events.iter().find(|event| {
            event.event_type.ends_with(&ids.product_entry_event_suffix)
                && path::str_at(&event.parsed_json, &["product_addr"]) == Some(product_id)
        }) else {
            continue;
        };
        let entry_id = path::str_at(&event.parsed_json, &["entry_addr"]).unwrap_or_default();

        let Some(created) = block
            .effects
            .as_ref()
            .and_then(|e| e.created.iter().find(|c| c.reference.object_id == entry_id))
        else {
            warn!(
                digest = %block.digest,
                entry = entry_id,
                "logged entry object missing from created effects"
            );
            continue;
        };

        let inputs = block.call_inputs();
        // The description and health score share one input slot: both read
        // the first element of the fifth argument's value vector, findings
        // the second.
        let service_type = input_value_at(inputs, 3, 0);
        let service_description = input_value_at(inputs, 4, 0);
        let health_score = Some(input_value_at(inputs, 4, 0)).filter(|v| !v.is_empty());
        let findings = Some(input_value_at(inputs, 4, 1)).filter(|v| !v.is_empty());

        entries.push(ServiceEntry {
            entry_id: entry_id.to_string(),
            version: created.reference.version_string(),
            digest: created.reference.digest.clone(),
            tx_block: block.digest.clone(),
            service_type,
            service_description,
            health_score,
            findings,
            issuer_address: event.sender.clone(),
            issuer_role: issuer_role(&event.parsed_json),
            timestamp_ms: timestamp_ms_i64(block.timestamp_ms.as_deref()),
            package_id: event.package_id.clone(),
            status: "success".to_string(),
            reward_amount: reward_amount(block, &event.package_id, ids),
        });
    }
    debug!(product = product_id, entries = entries.len(), "extracted service history");
    entries
}

/// Element `index` of call input `slot`'s value vector, empty when absent.
fn input_value_at(inputs: &[Value], slot: usize, index: usize) -> String {
    inputs
        .get(slot)
        .and_then(|input| path::array_at(input, &["value"]).get(index))
        .and_then(path::plain_string)
        .unwrap_or_default()
}

fn issuer_role(parsed_json: &Value) -> String {
    path::str_at(parsed_json, &["issuer_role", "variant"])
        .map_or_else(|| "unknown".to_string(), str::to_lowercase)
}

/// Amount of the reward change whose coin belongs to the event's package,
/// `"0"` when none exists.
fn reward_amount(block: &TransactionBlockResponse, package_id: &str, ids: &LedgerIds) -> String {
    block
        .balance_changes
        .iter()
        .find(|change| {
            change.coin_type.starts_with(package_id)
                && change.coin_type.ends_with(&ids.reward_coin_suffix)
        })
        .map_or_else(|| "0".to_string(), |change| change.amount.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PRODUCT: &str = "0xproduct";
    const PACKAGE: &str = "0x1d0b";

    fn service_block(digest: &str, overrides: impl FnOnce(&mut Value)) -> TransactionBlockResponse {
        let mut raw = json!({
            "digest": digest,
            "effects": {
                "status": { "status": "success" },
                "created": [{
                    "reference": { "objectId": "0xentry", "version": 7, "digest": "EntryDigest" },
                    "owner": { "Shared": { "initial_shared_version": 7 } }
                }]
            },
            "events": [{
                "id": { "txDigest": digest, "eventSeq": "0" },
                "packageId": PACKAGE,
                "transactionModule": "app",
                "sender": "0xissuer",
                "type": "0x1d0b::app::ProductEntryLogged",
                "parsedJson": {
                    "entry_addr": "0xentry",
                    "product_addr": PRODUCT,
                    "issuer_role": { "variant": "Repairer", "fields": {} }
                }
            }],
            "balanceChanges": [{
                "owner": { "AddressOwner": "0xissuer" },
                "coinType": "0x1d0b::LCC::LCC",
                "amount": "1000000000"
            }],
            "timestampMs": "1756128614445",
            "checkpoint": "900",
            "transaction": { "data": { "sender": "0xissuer", "transaction": {
                "inputs": [
                    { "type": "object", "objectType": "sharedObject", "objectId": PRODUCT },
                    { "type": "object", "objectType": "sharedObject", "objectId": "0xfed" },
                    { "type": "object", "objectType": "sharedObject", "objectId": "0x6" },
                    { "type": "pure", "valueType": "vector<0x1::string::String>",
                      "value": ["Inspection"] },
                    { "type": "pure", "valueType": "vector<0x1::string::String>",
                      "value": ["85", "No visible damage"] }
                ],
                "transactions": [
                    { "SplitCoins": ["GasCoin", []] },
                    { "MoveCall": { "package": PACKAGE, "module": "app", "function": "log_entry_data" } }
                ]
            }}}
        });
        overrides(&mut raw);
        serde_json::from_value(raw).unwrap()
    }

    #[test]
    fn extracts_a_qualifying_transaction() {
        let blocks = vec![service_block("D1", |_| {})];
        let entries = extract_service_transactions(&blocks, PRODUCT, &LedgerIds::default());
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.entry_id, "0xentry");
        assert_eq!(entry.version, "7");
        assert_eq!(entry.digest, "EntryDigest");
        assert_eq!(entry.tx_block, "D1");
        assert_eq!(entry.service_type, "Inspection");
        assert_eq!(entry.issuer_address, "0xissuer");
        assert_eq!(entry.issuer_role, "repairer");
        assert_eq!(entry.timestamp_ms, Some(1_756_128_614_445));
        assert_eq!(entry.package_id, PACKAGE);
        assert_eq!(entry.status, "success");
        assert_eq!(entry.reward_amount, "1000000000");
    }

    #[test]
    fn description_and_health_score_share_a_slot() {
        let blocks = vec![service_block("D1", |_| {})];
        let entry = &extract_service_transactions(&blocks, PRODUCT, &LedgerIds::default())[0];
        assert_eq!(entry.service_description, "85");
        assert_eq!(entry.health_score.as_deref(), Some("85"));
        assert_eq!(entry.findings.as_deref(), Some("No visible damage"));
    }

    #[test]
    fn non_success_transactions_are_excluded() {
        let blocks = vec![service_block("D1", |raw| {
            raw["effects"]["status"]["status"] = json!("failure");
        })];
        assert!(extract_service_transactions(&blocks, PRODUCT, &LedgerIds::default()).is_empty());
    }

    #[test]
    fn wrong_entry_point_is_excluded() {
        let blocks = vec![service_block("D1", |raw| {
            raw["transaction"]["data"]["transaction"]["transactions"][1]["MoveCall"]["function"] =
                json!("update_metadata");
        })];
        assert!(extract_service_transactions(&blocks, PRODUCT, &LedgerIds::default()).is_empty());
    }

    #[test]
    fn only_the_last_command_counts() {
        // The entry-point call is not the final command, so the block is not
        // a service-logging transaction.
        let blocks = vec![service_block("D1", |raw| {
            let commands = raw["transaction"]["data"]["transaction"]["transactions"]
                .as_array_mut()
                .unwrap();
            commands.reverse();
        })];
        assert!(extract_service_transactions(&blocks, PRODUCT, &LedgerIds::default()).is_empty());
    }

    #[test]
    fn other_products_are_excluded() {
        let blocks = vec![service_block("D1", |raw| {
            raw["events"][0]["parsedJson"]["product_addr"] = json!("0xother");
        })];
        assert!(extract_service_transactions(&blocks, PRODUCT, &LedgerIds::default()).is_empty());
    }

    #[test]
    fn missing_created_object_skips_with_warning() {
        let blocks = vec![service_block("D1", |raw| {
            raw["effects"]["created"] = json!([]);
        })];
        assert!(extract_service_transactions(&blocks, PRODUCT, &LedgerIds::default()).is_empty());
    }

    #[test]
    fn reward_defaults_to_zero_without_package_scoped_change() {
        let blocks = vec![service_block("D1", |raw| {
            raw["balanceChanges"] = json!([{
                "owner": { "AddressOwner": "0xissuer" },
                "coinType": "0x2::iota::IOTA",
                "amount": "-5000"
            }]);
        })];
        let entry = &extract_service_transactions(&blocks, PRODUCT, &LedgerIds::default())[0];
        assert_eq!(entry.reward_amount, "0");
    }

    #[test]
    fn missing_role_variant_is_unknown() {
        let blocks = vec![service_block("D1", |raw| {
            raw["events"][0]["parsedJson"]["issuer_role"] = json!(null);
        })];
        let entry = &extract_service_transactions(&blocks, PRODUCT, &LedgerIds::default())[0];
        assert_eq!(entry.issuer_role, "unknown");
    }

    #[test]
    fn missing_input_slots_decay_to_empty() {
        let blocks = vec![service_block("D1", |raw| {
            raw["transaction"]["data"]["transaction"]["inputs"] = json!([]);
        })];
        let entry = &extract_service_transactions(&blocks, PRODUCT, &LedgerIds::default())[0];
        assert_eq!(entry.service_type, "");
        assert_eq!(entry.service_description, "");
        assert!(entry.health_score.is_none());
        assert!(entry.findings.is_none());
    }

    #[test]
    fn extraction_is_idempotent() {
        let blocks = vec![service_block("D1", |_| {}), service_block("D2", |_| {})];
        let first = extract_service_transactions(&blocks, PRODUCT, &LedgerIds::default());
        let second = extract_service_transactions(&blocks, PRODUCT, &LedgerIds::default());
        assert_eq!(first, second);
    }
}
