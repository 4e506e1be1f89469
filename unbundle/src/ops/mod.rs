//! Core operations.
//!
//! This module contains the business logic for unbundle,
//! separated from CLI argument parsing and output rendering.

pub mod split;

pub use split::{CleanupPolicy, SplitOpOptions, check_root, split};
