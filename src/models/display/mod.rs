//! Display model implementations for table and JSON output
//!
//! Display models transform report entries into CLI-friendly formats
//! with appropriate column names and serialization.

mod common;
mod inventory;

pub use inventory::{GroupDisplay, ObjectDisplay, PolicyDisplay};
