//! Serde models for the "get object" and "query transaction blocks" responses.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::rpc::path;

/// Envelope of an object query (`result` of a get-object call).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ObjectResponse {
    #[serde(default)]
    pub data: Option<ObjectData>,
}

/// Object metadata plus its Move content.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ObjectData {
    pub object_id: String,
    pub version: String,
    pub digest: String,
    pub content: Option<MoveContent>,
}

/// Move object content: a `type` discriminator and an untyped `fields` tree.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MoveContent {
    pub data_type: String,
    #[serde(rename = "type")]
    pub object_type: String,
    pub fields: Value,
}

/// One element of a transaction block query result.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransactionBlockResponse {
    pub digest: String,
    pub effects: Option<TransactionEffects>,
    pub events: Vec<EventEnvelope>,
    pub balance_changes: Vec<BalanceChange>,
    pub timestamp_ms: Option<String>,
    pub checkpoint: Option<String>,
    pub transaction: Option<TransactionEnvelope>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransactionEffects {
    pub status: Option<ExecutionStatus>,
    pub executed_epoch: Option<String>,
    pub created: Vec<CreatedObject>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionStatus {
    pub status: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreatedObject {
    pub reference: ObjectRef,
    pub owner: Value,
}

/// Object reference in effects. `version` is numeric here but a string on
/// object queries, so it is kept raw and rendered via [`path::plain_string`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ObjectRef {
    pub object_id: String,
    pub version: Value,
    pub digest: String,
}

impl ObjectRef {
    pub fn version_string(&self) -> String {
        path::plain_string(&self.version).unwrap_or_default()
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventEnvelope {
    pub id: EventId,
    pub package_id: String,
    pub transaction_module: String,
    pub sender: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub parsed_json: Value,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventId {
    pub tx_digest: String,
    pub event_seq: String,
}

/// A per-transaction coin balance delta. `owner` stays raw because it is a
/// tagged union (`{"AddressOwner": ..}`, `"Immutable"`, shared-object forms).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BalanceChange {
    pub owner: Value,
    pub coin_type: String,
    pub amount: String,
}

impl BalanceChange {
    /// The owning address, when the owner is a plain address.
    pub fn address_owner(&self) -> Option<&str> {
        self.owner.get("AddressOwner").and_then(Value::as_str)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionEnvelope {
    pub data: TransactionData,
}

/// Transaction payload. The programmable part (`inputs`, command list) varies
/// by transaction kind and is kept untyped; use the accessors below.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionData {
    pub sender: String,
    pub transaction: Value,
}

impl TransactionBlockResponse {
    /// True iff the execution status is reported as `success`.
    pub fn is_success(&self) -> bool {
        self.effects
            .as_ref()
            .and_then(|e| e.status.as_ref())
            .is_some_and(|s| s.status == "success")
    }

    /// Call inputs of the programmable transaction, empty when absent.
    pub fn call_inputs(&self) -> &[Value] {
        self.transaction
            .as_ref()
            .map(|t| path::array_at(&t.data.transaction, &["inputs"]))
            .unwrap_or(&[])
    }

    /// The last command of the programmable transaction, if any.
    pub fn last_command(&self) -> Option<&Value> {
        self.transaction
            .as_ref()
            .and_then(|t| path::array_at(&t.data.transaction, &["transactions"]).last())
    }

    /// `(module, function)` of a command when it is a MoveCall.
    pub fn move_call_target(command: &Value) -> Option<(&str, &str)> {
        let call = command.get("MoveCall")?;
        let module = call.get("module").and_then(Value::as_str)?;
        let function = call.get("function").and_then(Value::as_str)?;
        Some((module, function))
    }
}
