//! Inventory audit engine
//!
//! Normalizes listings, evaluates scopes, collects script and package
//! references from policy details, reconciles them into an [`AuditReport`]
//! and optionally moves flagged objects into an archive category.

pub mod archive;
pub mod flags;
pub mod listing;
pub mod reconcile;
pub mod references;
pub mod runner;
pub mod scope;

pub use archive::{DEFAULT_ARCHIVE_CATEGORY, archive_all};
pub use reconcile::{AuditReport, GroupSummary, ObjectSummary, PolicySummary};
pub use runner::{AuditOptions, AuditRun, inspect_policy, inspect_profile, run_audit};
