//! DPP-domain extractors over the raw ledger schemas.
//!
//! Each extractor is an independent, pure function from fetched RPC JSON to a
//! typed snapshot; none calls another and every invocation builds a brand-new
//! value with no carried-over state.

pub mod config;
pub mod federation;
pub mod history;
pub mod rewards;
pub mod vault;

use thiserror::Error;

/// Errors at the decode boundary of an object response. Inside an extractor
/// nothing fails: missing collections decay to empty, malformed entries are
/// skipped.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("object response has no data")]
    MissingObjectData,
    #[error("object {0} has no move content")]
    MissingContent(String),
}
