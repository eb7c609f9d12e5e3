//! Federation governance: root authorities, accreditations, role indices.
//!
//! Two raw schemas for the same concept exist on the ledger. The current one
//! keys accreditation grants under `governance.accreditations_to_attest`; the
//! legacy one keys permission grants under `governance.attesters` with
//! `trusted_constraints`. Both normalize into one canonical
//! [`FederationData`], selected by inspecting the governance fields.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::dpp::ExtractError;
use crate::rpc::{path, ObjectResponse};

const UNKNOWN_ROLE: &str = "unknown";

/// An entity allowed to issue accreditations. Can be revoked.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootAuthority {
    pub account_id: String,
    pub id: String,
}

/// A single role grant issued by a root authority to an entity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Accreditation {
    pub id: String,
    pub accredited_by: String,
    pub role: String,
    pub entity_id: String,
}

/// Canonical federation snapshot. `roles_by_entity` is derived from
/// `accreditations` in the same pass (unique roles per entity, no entry for
/// an entity without accreditations).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FederationData {
    pub federation_id: String,
    pub version: String,
    pub digest: String,
    pub root_authorities: Vec<RootAuthority>,
    pub revoked_root_authorities: Vec<RootAuthority>,
    pub accreditations: HashMap<String, Vec<Accreditation>>,
    pub roles_by_entity: HashMap<String, Vec<String>>,
    pub allowed_roles: Vec<String>,
}

/// Extract federation data from an object response, normalizing whichever
/// governance schema the object carries.
pub fn extract_federation_data(response: &ObjectResponse) -> Result<FederationData, ExtractError> {
    let data = response
        .data
        .as_ref()
        .ok_or(ExtractError::MissingObjectData)?;
    let content = data
        .content
        .as_ref()
        .ok_or_else(|| ExtractError::MissingContent(data.object_id.clone()))?;
    let fields = &content.fields;
    let governance = path::at(fields, &["governance", "fields"]).unwrap_or(&Value::Null);

    let mut federation = if governance.get("attesters").is_some() {
        parse_attester_schema(fields, governance)
    } else {
        parse_attest_schema(fields, governance)
    };
    federation.federation_id = data.object_id.clone();
    federation.version = data.version.clone();
    federation.digest = data.digest.clone();
    debug!(
        federation = %federation.federation_id,
        entities = federation.accreditations.len(),
        roles = federation.allowed_roles.len(),
        "extracted federation"
    );
    Ok(federation)
}

/// Current schema: `accreditations_to_attest` VecMap, role properties with
/// `Text`-variant allowed values.
fn parse_attest_schema(fields: &Value, governance: &Value) -> FederationData {
    let mut federation = FederationData {
        root_authorities: parse_authorities(path::array_at(fields, &["root_authorities"])),
        revoked_root_authorities: parse_authorities(path::array_at(
            fields,
            &["revoked_root_authorities"],
        )),
        ..FederationData::default()
    };

    // The governance property whose name tag includes "role" lists the roles
    // this federation allows.
    let properties = path::array_at(governance, &["properties", "fields", "data", "fields", "contents"]);
    if let Some(role_property) = properties.iter().find(|prop| {
        path::array_at(prop, &["fields", "key", "fields", "names"])
            .iter()
            .any(|name| name.as_str() == Some("role"))
    }) {
        federation.allowed_roles = path::array_at(
            role_property,
            &["fields", "value", "fields", "allowed_values", "fields", "contents"],
        )
        .iter()
        .filter_map(|value| path::str_at(value, &["fields", "pos0"]))
        .map(str::to_string)
        .collect();
    }

    for entry in path::array_at(governance, &["accreditations_to_attest", "fields", "contents"]) {
        let Some(entity_id) = path::str_at(entry, &["fields", "key"]) else {
            continue;
        };
        let grants: Vec<Accreditation> =
            path::array_at(entry, &["fields", "value", "fields", "accreditations"])
                .iter()
                .map(|accred| Accreditation {
                    id: path::str_at(accred, &["fields", "id", "id"])
                        .unwrap_or_default()
                        .to_string(),
                    accredited_by: path::str_at(accred, &["fields", "accredited_by"])
                        .unwrap_or_default()
                        .to_string(),
                    role: attest_role(accred),
                    entity_id: entity_id.to_string(),
                })
                .collect();
        federation.insert_entity(entity_id, grants);
    }
    federation
}

/// Role of one accreditation: first property entry, first allowed value,
/// position 0. `"unknown"` when any link is missing.
fn attest_role(accreditation: &Value) -> String {
    path::array_at(accreditation, &["fields", "properties", "fields", "contents"])
        .first()
        .and_then(|prop| {
            path::array_at(
                prop,
                &["fields", "value", "fields", "allowed_values", "fields", "contents"],
            )
            .first()
            .and_then(|value| path::str_at(value, &["fields", "pos0"]))
        })
        .unwrap_or(UNKNOWN_ROLE)
        .to_string()
}

/// Legacy schema: per-entity `permissions` under `attesters`, roles in
/// constraint entries whose allowed values carry a `text` field, allowed
/// roles under `trusted_constraints`.
fn parse_attester_schema(fields: &Value, governance: &Value) -> FederationData {
    let mut federation = FederationData {
        root_authorities: parse_authorities(path::array_at(fields, &["root_authorities"])),
        // The legacy schema has no revocation list.
        revoked_root_authorities: Vec::new(),
        ..FederationData::default()
    };

    federation.allowed_roles = path::array_at(
        governance,
        &["trusted_constraints", "fields", "data", "fields", "contents"],
    )
    .iter()
    .filter(|entry| constraint_key_is_role(entry))
    .flat_map(|entry| {
        path::array_at(entry, &["fields", "value", "fields", "allowed_values", "fields", "contents"])
            .iter()
            .filter_map(|value| path::str_at(value, &["fields", "text"]))
            .map(str::to_string)
    })
    .collect();

    for entry in path::array_at(governance, &["attesters", "fields", "contents"]) {
        let Some(entity_id) = path::str_at(entry, &["fields", "key"]) else {
            continue;
        };
        let grants: Vec<Accreditation> =
            path::array_at(entry, &["fields", "value", "fields", "permissions"])
                .iter()
                .map(|permission| Accreditation {
                    id: path::str_at(permission, &["fields", "id", "id"])
                        .unwrap_or_default()
                        .to_string(),
                    accredited_by: path::str_at(permission, &["fields", "created_by"])
                        .unwrap_or_default()
                        .to_string(),
                    role: attester_role(permission),
                    entity_id: entity_id.to_string(),
                })
                .collect();
        federation.insert_entity(entity_id, grants);
    }
    federation
}

fn constraint_key_is_role(entry: &Value) -> bool {
    path::array_at(entry, &["fields", "key", "fields", "names"])
        .first()
        .and_then(Value::as_str)
        == Some("role")
}

fn attester_role(permission: &Value) -> String {
    path::array_at(permission, &["fields", "constraints", "fields", "contents"])
        .iter()
        .find(|entry| constraint_key_is_role(entry))
        .and_then(|entry| {
            path::array_at(entry, &["fields", "value", "fields", "allowed_values", "fields", "contents"])
                .first()
                .and_then(|value| path::str_at(value, &["fields", "text"]))
        })
        .unwrap_or(UNKNOWN_ROLE)
        .to_string()
}

fn parse_authorities(raw: &[Value]) -> Vec<RootAuthority> {
    raw.iter()
        .map(|auth| RootAuthority {
            account_id: path::str_at(auth, &["fields", "account_id"])
                .unwrap_or_default()
                .to_string(),
            id: path::str_at(auth, &["fields", "id", "id"])
                .unwrap_or_default()
                .to_string(),
        })
        .collect()
}

impl FederationData {
    /// Store an entity's grants and its deduplicated role set. Entities with
    /// no grants are emitted in neither map.
    fn insert_entity(&mut self, entity_id: &str, grants: Vec<Accreditation>) {
        if grants.is_empty() {
            return;
        }
        let mut roles: Vec<String> = Vec::new();
        for grant in &grants {
            if !roles.contains(&grant.role) {
                roles.push(grant.role.clone());
            }
        }
        self.roles_by_entity.insert(entity_id.to_string(), roles);
        self.accreditations.insert(entity_id.to_string(), grants);
    }

    /// Roles assigned to an entity; empty when unknown.
    pub fn roles_by_entity(&self, entity_id: &str) -> &[String] {
        self.roles_by_entity
            .get(entity_id)
            .map_or(&[], Vec::as_slice)
    }

    /// Accreditations held by an entity; empty when unknown.
    pub fn accreditations_by_entity(&self, entity_id: &str) -> &[Accreditation] {
        self.accreditations
            .get(entity_id)
            .map_or(&[], Vec::as_slice)
    }

    /// All entities holding a given role. Linear scan over entities.
    pub fn entities_by_role(&self, role: &str) -> Vec<&str> {
        self.roles_by_entity
            .iter()
            .filter(|(_, roles)| roles.iter().any(|r| r == role))
            .map(|(entity, _)| entity.as_str())
            .collect()
    }

    /// True iff the governance allows the role.
    pub fn is_role_allowed(&self, role: &str) -> bool {
        self.allowed_roles.iter().any(|r| r == role)
    }

    /// True iff the account appears in the revoked root authority list.
    pub fn is_authority_revoked(&self, account_id: &str) -> bool {
        self.revoked_root_authorities
            .iter()
            .any(|auth| auth.account_id == account_id)
    }

    /// True iff the entity has at least one accreditation and none of its
    /// issuers is revoked. Revocation never removes the accreditation itself.
    pub fn has_valid_accreditations(&self, entity_id: &str) -> bool {
        let grants = self.accreditations_by_entity(entity_id);
        !grants.is_empty()
            && !grants
                .iter()
                .any(|grant| self.is_authority_revoked(&grant.accredited_by))
    }

    /// Entities holding at least one accreditation from a revoked issuer.
    pub fn entities_with_invalid_accreditations(&self) -> Vec<&str> {
        self.accreditations
            .iter()
            .filter(|(_, grants)| {
                grants
                    .iter()
                    .any(|grant| self.is_authority_revoked(&grant.accredited_by))
            })
            .map(|(entity, _)| entity.as_str())
            .collect()
    }

    /// First role granted to the address. Address comparison is
    /// case-insensitive; role names keep their case.
    pub fn role_for_address(&self, address: &str) -> Option<&str> {
        self.accreditations
            .iter()
            .find(|(entity, _)| entity.eq_ignore_ascii_case(address))
            .and_then(|(_, grants)| grants.first())
            .map(|grant| grant.role.as_str())
    }
}
