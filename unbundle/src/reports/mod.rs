//! Report data structures for commands.
//!
//! This module provides data structures that separate data collection from rendering.
//! Operations build reports, then render them to an Output target.

mod output;
mod split;

pub use output::{Report, TerminalOutput};
pub use split::{PreviewFile, SplitReport, SplitResult, WrittenFile};
