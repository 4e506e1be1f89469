//! Go source loading for unbundle.
//!
//! Parses Go files with tree-sitter and exposes their top-level declarations,
//! imports and package clause, for a single file or a whole package.

// Miette's derive macro generates code that triggers these warnings
#![allow(unused_assignments)]

mod constraint;
mod decl;
mod error;
mod source;
mod unit;

pub use constraint::{BuildContext, Constraint, ConstraintError};
pub use decl::{CgoImport, DeclKind, Declaration, ImportSpec, OtherKind, Receiver};
pub use error::{Error, Result};
pub use source::SourceFile;
pub use unit::{CompilationUnit, UnitKind, find_package, search_roots};
