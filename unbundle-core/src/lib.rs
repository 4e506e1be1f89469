//! Core utilities and types for the unbundle Go source splitter.
//!
//! This crate provides the naming rules and file persistence helpers shared
//! by the splitting engine and the command line.

mod file;
mod utils;

// File operations
pub use file::File;
// String utilities
pub use utils::{is_exported, to_snake_case};
