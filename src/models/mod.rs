//! Display models for CLI output
//!
//! This module provides shared display model abstractions for converting
//! audit report entries into CLI-friendly display formats.

pub mod display;

pub use display::{GroupDisplay, ObjectDisplay, PolicyDisplay};
