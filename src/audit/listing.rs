//! Listing normalization
//!
//! Classic API listings come in three shapes depending on server version and
//! object kind:
//!
//! - a flat list under the collection key (`{"scripts": [{...}, ...]}`)
//! - a singular wrapper under the collection key
//!   (`{"policies": {"policy": [{...}]}}` or `{"policies": {"policy": {...}}}`)
//! - a bare list, or a collection under an unexpected top-level key
//!
//! All of them normalize to the same `InventoryObject` sequence.

use log::debug;
use serde_json::{Map, Value};

use crate::client::{InventoryApi, InventoryObject, ObjectKind};
use crate::error::Result;

/// Per-item keys that wrap the actual record one level down
const ITEM_WRAPPERS: [&str; 7] = [
    "policy",
    "configuration_profile",
    "os_x_configuration_profile",
    "profile",
    "script",
    "package",
    "computer_group",
];

/// Fetch and normalize every object of `kind`.
pub async fn list_objects<A>(api: &A, kind: ObjectKind) -> Result<Vec<InventoryObject>>
where
    A: InventoryApi + ?Sized,
{
    let payload = api.list_raw(kind).await?;
    let objects = normalize_listing(kind, &payload);
    debug!("[list] {} -> {} objects", kind.collection_key(), objects.len());
    Ok(objects)
}

/// Normalize a raw listing payload into inventory records.
///
/// Items without an integer-coercible `id` are dropped.
pub fn normalize_listing(kind: ObjectKind, payload: &Value) -> Vec<InventoryObject> {
    collection_items(kind, payload)
        .into_iter()
        .filter_map(|item| to_object(kind, item))
        .collect()
}

fn collection_items(kind: ObjectKind, payload: &Value) -> Vec<&Map<String, Value>> {
    match payload {
        Value::Array(items) => objects_in(items),
        Value::Object(top) => match top.get(kind.collection_key()) {
            Some(Value::Array(items)) => objects_in(items),
            Some(Value::Object(wrapper)) => match wrapper.get(kind.item_key()) {
                Some(Value::Array(items)) => objects_in(items),
                Some(Value::Object(single)) => vec![single],
                _ => Vec::new(),
            },
            Some(_) => Vec::new(),
            None => top
                .values()
                .find_map(|v| match v {
                    Value::Array(items) if first_has_id(items) => Some(objects_in(items)),
                    _ => None,
                })
                .unwrap_or_default(),
        },
        _ => Vec::new(),
    }
}

fn objects_in(items: &[Value]) -> Vec<&Map<String, Value>> {
    items.iter().filter_map(Value::as_object).collect()
}

fn first_has_id(items: &[Value]) -> bool {
    items
        .first()
        .and_then(Value::as_object)
        .is_some_and(|first| first.contains_key("id"))
}

fn to_object(kind: ObjectKind, item: &Map<String, Value>) -> Option<InventoryObject> {
    let record = ITEM_WRAPPERS
        .iter()
        .find_map(|key| item.get(*key).and_then(Value::as_object))
        .unwrap_or(item);

    let id = coerce_id(record.get("id")?)?;
    let name = match record.get("name") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };
    let is_smart = record.get("is_smart").map(|v| match v {
        Value::Bool(b) => *b,
        Value::String(s) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    });

    Some(InventoryObject {
        id,
        name,
        kind,
        is_smart,
    })
}

/// Coerce a JSON identifier (number or numeric string) to an integer.
pub fn coerce_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
