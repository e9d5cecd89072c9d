//! Jamf Pro API client

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

pub mod auth;
pub mod jamf;
#[cfg(test)]
pub mod mock;
pub mod models;
pub mod parallel;

pub use jamf::{ClientOptions, JamfClient};
#[cfg(test)]
pub use mock::MockInventoryClient;
pub use models::{InventoryObject, ObjectKind};
pub use parallel::{DEFAULT_CONCURRENCY, FetchOutcome, fetch_all};

/// Inventory operations the audit engine consumes.
///
/// Listing and detail payloads are returned as raw JSON; their shape varies
/// across server versions.
#[async_trait]
pub trait InventoryApi: Send + Sync {
    /// Raw listing payload for every object of `kind`
    async fn list_raw(&self, kind: ObjectKind) -> Result<Value>;

    /// Raw detail payload for one object
    async fn get_detail(&self, kind: ObjectKind, id: i64) -> Result<Value>;

    /// Scope subset of one object, as XML text
    async fn get_scope_xml(&self, kind: ObjectKind, id: i64) -> Result<String>;

    /// Apply a partial XML update to one object
    async fn put_xml(&self, kind: ObjectKind, id: i64, body: &str) -> Result<()>;
}
