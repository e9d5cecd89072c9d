//! Mock Jamf Pro client for testing
//!
//! Provides an in-memory implementation of [`InventoryApi`] so the audit
//! engine can be exercised without a server.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use super::{InventoryApi, ObjectKind};
use crate::error::{ApiError, Result};

type ObjectKey = (ObjectKind, i64);

/// Mock API client for testing.
///
/// Configure responses via builder methods, then use in tests.
///
/// # Example
/// ```ignore
/// let mock = MockInventoryClient::new()
///     .with_listing(ObjectKind::Script, json!({"scripts": [{"id": 1, "name": "a"}]}))
///     .await;
/// ```
#[derive(Default)]
pub struct MockInventoryClient {
    /// Listing payloads per kind
    listings: Arc<Mutex<HashMap<ObjectKind, Value>>>,
    /// Detail payloads per object
    details: Arc<Mutex<HashMap<ObjectKey, Value>>>,
    /// Scope XML per object
    scopes: Arc<Mutex<HashMap<ObjectKey, String>>>,
    /// Objects whose detail/scope fetches fail
    failing: Arc<Mutex<HashSet<ObjectKey>>>,
    /// Objects whose updates fail
    failing_updates: Arc<Mutex<HashSet<ObjectKey>>>,
    /// Objects that only accept legacy category bodies
    legacy_only: Arc<Mutex<HashSet<ObjectKey>>>,
    /// Every request fails with 401 when set
    unauthorized: Arc<Mutex<bool>>,
    /// Detail/scope fetches fail with 401 when set; listings still succeed
    unauthorized_fetches: Arc<Mutex<bool>>,
    /// Objects touched by detail/scope fetches, in call order
    fetched: Arc<Mutex<Vec<ObjectKey>>>,
    /// Current category per object, updated by successful PUTs
    categories: Arc<Mutex<HashMap<ObjectKey, String>>>,
    /// Accepted PUT bodies, in order
    updates: Arc<Mutex<Vec<(ObjectKind, i64, String)>>>,
    /// Track number of calls for verification
    call_count: Arc<Mutex<CallCounts>>,
}

/// Tracks API call counts for test verification
#[derive(Default, Debug, Clone)]
pub struct CallCounts {
    pub list_raw: usize,
    pub get_detail: usize,
    pub get_scope_xml: usize,
    pub put_xml: usize,
}

impl MockInventoryClient {
    /// Create a new mock client with default (empty) responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the listing payload returned for `kind`.
    pub async fn with_listing(self, kind: ObjectKind, payload: Value) -> Self {
        self.listings.lock().await.insert(kind, payload);
        self
    }

    /// Configure the detail payload for one object.
    pub async fn with_detail(self, kind: ObjectKind, id: i64, payload: Value) -> Self {
        self.details.lock().await.insert((kind, id), payload);
        self
    }

    /// Configure the scope XML for one object.
    pub async fn with_scope(self, kind: ObjectKind, id: i64, xml: &str) -> Self {
        self.scopes.lock().await.insert((kind, id), xml.to_string());
        self
    }

    /// Make every detail/scope fetch for one object fail.
    pub async fn with_failing(self, kind: ObjectKind, id: i64) -> Self {
        self.failing.lock().await.insert((kind, id));
        self
    }

    /// Make every update of one object fail.
    pub async fn with_failing_update(self, kind: ObjectKind, id: i64) -> Self {
        self.failing_updates.lock().await.insert((kind, id));
        self
    }

    /// Reject the `<category><name>` body for one object.
    pub async fn with_legacy_only(self, kind: ObjectKind, id: i64) -> Self {
        self.legacy_only.lock().await.insert((kind, id));
        self
    }

    /// Set the current category of one object.
    pub async fn with_category(self, kind: ObjectKind, id: i64, category: &str) -> Self {
        self.categories
            .lock()
            .await
            .insert((kind, id), category.to_string());
        self
    }

    /// Fail every call with 401 after the refresh-and-retry has been exhausted.
    pub async fn with_unauthorized(self) -> Self {
        *self.unauthorized.lock().await = true;
        self
    }

    /// Fail detail and scope fetches with 401 while listings keep working.
    pub async fn with_unauthorized_fetches(self) -> Self {
        *self.unauthorized_fetches.lock().await = true;
        self
    }

    /// Objects passed to detail/scope fetches, in call order
    pub async fn fetched(&self) -> Vec<ObjectKey> {
        self.fetched.lock().await.clone()
    }

    /// Current call counts
    pub async fn call_counts(&self) -> CallCounts {
        self.call_count.lock().await.clone()
    }

    /// Accepted update bodies
    pub async fn updates(&self) -> Vec<(ObjectKind, i64, String)> {
        self.updates.lock().await.clone()
    }

    /// Category currently recorded for an object
    pub async fn category(&self, kind: ObjectKind, id: i64) -> Option<String> {
        self.categories.lock().await.get(&(kind, id)).cloned()
    }

    async fn check_fetch(&self, kind: ObjectKind, id: i64) -> Result<()> {
        self.fetched.lock().await.push((kind, id));
        if *self.unauthorized.lock().await || *self.unauthorized_fetches.lock().await {
            return Err(ApiError::Unauthorized.into());
        }
        if self.failing.lock().await.contains(&(kind, id)) {
            return Err(ApiError::ServerError(format!("{} {} unavailable", kind, id)).into());
        }
        Ok(())
    }
}

/// Category name carried by either body shape
fn category_from_body(body: &str) -> Option<String> {
    let between = |open: &str, close: &str| -> Option<String> {
        let start = body.find(open)? + open.len();
        let end = body[start..].find(close)? + start;
        Some(body[start..end].to_string())
    };
    between("<category><name>", "</name></category>")
        .or_else(|| between("<category_name>", "</category_name>"))
        .or_else(|| between("<category>", "</category>"))
}

#[async_trait]
impl InventoryApi for MockInventoryClient {
    async fn list_raw(&self, kind: ObjectKind) -> Result<Value> {
        self.call_count.lock().await.list_raw += 1;
        if *self.unauthorized.lock().await {
            return Err(ApiError::Unauthorized.into());
        }
        Ok(self
            .listings
            .lock()
            .await
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| Value::Array(Vec::new())))
    }

    async fn get_detail(&self, kind: ObjectKind, id: i64) -> Result<Value> {
        self.call_count.lock().await.get_detail += 1;
        self.check_fetch(kind, id).await?;
        self.details
            .lock()
            .await
            .get(&(kind, id))
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("{} {}", kind, id)).into())
    }

    async fn get_scope_xml(&self, kind: ObjectKind, id: i64) -> Result<String> {
        self.call_count.lock().await.get_scope_xml += 1;
        self.check_fetch(kind, id).await?;
        self.scopes
            .lock()
            .await
            .get(&(kind, id))
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("{} {} scope", kind, id)).into())
    }

    async fn put_xml(&self, kind: ObjectKind, id: i64, body: &str) -> Result<()> {
        self.call_count.lock().await.put_xml += 1;
        if *self.unauthorized.lock().await {
            return Err(ApiError::Unauthorized.into());
        }
        if self.failing_updates.lock().await.contains(&(kind, id)) {
            return Err(ApiError::ServerError(format!("{} {} update failed", kind, id)).into());
        }
        if self.legacy_only.lock().await.contains(&(kind, id)) && body.contains("<category><name>")
        {
            return Err(ApiError::BadRequest("unsupported category element".to_string()).into());
        }

        let category = category_from_body(body)
            .ok_or_else(|| ApiError::BadRequest("no category in body".to_string()))?;
        self.categories.lock().await.insert((kind, id), category);
        self.updates
            .lock()
            .await
            .push((kind, id, body.to_string()));
        Ok(())
    }
}
