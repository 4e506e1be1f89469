//! Per-bucket preamble: package clause and import block.

use std::fmt::Write;

use crate::imports::ClassifiedImports;

/// Package name that cannot be used as is, because `type` is a Go keyword.
pub const RESERVED_PACKAGE_NAME: &str = "type";

/// Get a usable package name, pluralizing the reserved one.
pub fn package_name(name: &str) -> &str {
    if name == RESERVED_PACKAGE_NAME {
        "types"
    } else {
        name
    }
}

/// Render the header shared by every output file of a run.
///
/// Standard imports come first; a blank line precedes the external ones when
/// there are any. The import block is left out when the unit imports nothing.
/// A cgo unit gets its own `import "C"` after the block, under its preamble.
pub fn render_header(package: &str, imports: &ClassifiedImports) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "package {}", package_name(package));
    out.push('\n');

    if !imports.standard.is_empty() || !imports.external.is_empty() {
        render_import_block(&mut out, imports);
    }
    if let Some(preamble) = &imports.cgo {
        if !preamble.is_empty() {
            out.push_str(preamble);
            out.push('\n');
        }
        out.push_str("import \"C\"\n\n");
    }
    out
}

fn render_import_block(out: &mut String, imports: &ClassifiedImports) {
    out.push_str("import (\n");
    for spec in &imports.standard {
        let _ = writeln!(out, "\t{}", spec);
    }
    if !imports.external.is_empty() {
        out.push('\n');
    }
    for spec in &imports.external {
        let _ = writeln!(out, "\t{}", spec);
    }
    out.push_str(")\n\n");
}
