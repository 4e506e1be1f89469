//! Declaration partitioning and file synthesis.
//!
//! Splits a Go compilation unit into buckets of related declarations and
//! renders each bucket as a self-contained source file.
//!
//! # Module Organization
//!
//! - [`imports`] - Standard/external import classification
//! - [`header`] - Package clause and import block synthesis
//! - [`classify`] - Declaration to bucket assignment
//! - [`bundle`] - Buckets and the bundle that holds them
//! - [`collision`] - Case-insensitive name collision handling
//! - [`formatter`] - Formatting pass contract and implementations
//! - [`output`] - File name derivation and formatting of a bundle

pub mod bundle;
pub mod classify;
pub mod collision;
mod error;
pub mod formatter;
pub mod header;
pub mod imports;
pub mod output;

pub use bundle::{Bucket, BucketKey, Bundle};
pub use classify::{BucketNames, Partitioner, SplitOptions};
pub use collision::{Collision, resolve_collisions};
pub use error::{Error, Result};
pub use formatter::{BuiltinFormatter, CommandFormatter, FormatError, SourceFormatter};
pub use imports::{ClassifiedImports, ImportClassifier, ImportOrder};
pub use output::{RenderedFile, render_files};
use unbundle_syntax::CompilationUnit;

/// Result of splitting a unit.
#[derive(Debug, Clone)]
pub struct Split {
    pub bundle: Bundle,
    /// Buckets renamed to avoid collisions.
    pub collisions: Vec<Collision>,
}

/// Classify every declaration of `unit` and resolve bucket name collisions.
pub fn split(unit: &CompilationUnit, opts: &SplitOptions) -> Result<Split> {
    let mut bundle = Partitioner::new(unit, opts).partition()?;
    let collisions = resolve_collisions(&mut bundle);
    Ok(Split { bundle, collisions })
}
