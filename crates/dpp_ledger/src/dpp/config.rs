//! On-chain identifiers for the DPP deployment.
//!
//! The demo's object IDs (federation, vault, product) and the app package
//! live here instead of being repeated as literals at call sites; the
//! protocol-level markers (entry module/function, event and coin type
//! suffixes) carry defaults that match the deployed Move package.
//!
//! Load from: env `DPP_LEDGER_IDS_PATH`, or `./config/ledger_ids.json`, or
//! `./ledger_ids.json`.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Deployment identifiers and type markers, passed into the extractors.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerIds {
    /// DPP app package (smart contract address).
    pub package_id: String,
    /// Federation governance object.
    pub federation_id: String,
    /// Reward vault object.
    pub vault_id: String,
    /// Tracked product (DPP object).
    pub product_id: String,
    /// Module of the service-logging entry point.
    pub entry_module: String,
    /// Function name of the service-logging entry point.
    pub entry_function: String,
    /// Type suffix of the product-entry-logged event.
    pub product_entry_event_suffix: String,
    /// Type suffix of the reward token coin.
    pub reward_coin_suffix: String,
}

impl Default for LedgerIds {
    fn default() -> Self {
        Self {
            package_id: String::new(),
            federation_id: String::new(),
            vault_id: String::new(),
            product_id: String::new(),
            entry_module: "app".to_string(),
            entry_function: "log_entry_data".to_string(),
            product_entry_event_suffix: "::app::ProductEntryLogged".to_string(),
            reward_coin_suffix: "::LCC::LCC".to_string(),
        }
    }
}

impl LedgerIds {
    /// Load from path. Returns defaults on error or missing file.
    pub fn load_from_path(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    /// Load: env `DPP_LEDGER_IDS_PATH`, then `./config/ledger_ids.json`, then
    /// `./ledger_ids.json`.
    pub fn load() -> Self {
        if let Ok(path) = std::env::var("DPP_LEDGER_IDS_PATH") {
            let p = Path::new(&path);
            if p.exists() {
                return Self::load_from_path(p);
            }
        }
        for candidate in [
            Path::new("./config/ledger_ids.json"),
            Path::new("./ledger_ids.json"),
        ] {
            if candidate.exists() {
                return Self::load_from_path(candidate);
            }
        }
        Self::default()
    }
}
