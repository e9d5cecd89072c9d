//! Jamf Pro data models
//!
//! Domain types shared by the HTTP client and the audit engine.

mod auth;
mod object;

pub use auth::BearerToken;
pub use object::{InventoryObject, ObjectKind};
