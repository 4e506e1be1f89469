//! Final formatting pass applied to every synthesized file.

use std::{
    io::Write,
    ops::Range,
    process::{Command, Stdio},
};

use thiserror::Error;
use unbundle_syntax::{ImportSpec, SourceFile};

use crate::imports::is_standard_import_path;

/// Error from a formatting pass.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("synthesized source is not valid Go")]
    Invalid(#[source] Box<unbundle_syntax::Error>),

    #[error("failed to run {tool}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} failed:\n{output}")]
    Tool { tool: String, output: String },
}

/// Turns raw synthesized source into its final form.
///
/// Implementations must reject content that is not syntactically valid.
pub trait SourceFormatter {
    /// Format `source`, which is about to be written as `file_name`.
    fn format(&self, file_name: &str, source: &str) -> Result<String, FormatError>;
}

/// In-process formatter.
///
/// Validates the file by parsing it, drops imports whose package name is never
/// used as a qualifier, and ends the file with exactly one newline. Imports
/// whose package name cannot be guessed from the path are kept, as are blank
/// and dot imports.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinFormatter;

impl SourceFormatter for BuiltinFormatter {
    fn format(&self, file_name: &str, source: &str) -> Result<String, FormatError> {
        let file = SourceFile::parse(file_name, source).map_err(FormatError::Invalid)?;

        let kept: Vec<&ImportSpec> = file
            .imports
            .iter()
            .filter(|import| is_used(import, &file))
            .collect();
        let block = render_import_block(&kept);

        // Byte ranges to replace, in source order. Empty replacements also eat
        // the newlines after the range.
        let mut edits: Vec<(Range<usize>, &str)> = file
            .import_ranges
            .iter()
            .enumerate()
            .map(|(i, range)| (range.clone(), if i == 0 { block.as_str() } else { "" }))
            .collect();
        if !file.qualifiers.contains("C") {
            edits.extend(file.cgo.iter().map(|cgo| (cgo.range.clone(), "")));
        }
        edits.sort_by_key(|(range, _)| range.start);

        let mut out = String::with_capacity(source.len());
        let mut cursor = 0;
        for (range, replacement) in edits {
            out.push_str(&source[cursor..range.start]);
            cursor = range.end;
            if replacement.is_empty() {
                cursor += source[cursor..].len() - source[cursor..].trim_start_matches('\n').len();
            } else {
                out.push_str(replacement);
            }
        }
        out.push_str(&source[cursor..]);

        let trimmed = out.trim_end();
        let mut result = String::with_capacity(trimmed.len() + 1);
        result.push_str(trimmed);
        result.push('\n');
        Ok(result)
    }
}

fn is_used(import: &ImportSpec, file: &SourceFile) -> bool {
    match import.alias.as_deref() {
        Some("_") | Some(".") => true,
        _ => match import.local_name() {
            Some(name) => file.qualifiers.contains(&name),
            None => true,
        },
    }
}

fn render_import_block(imports: &[&ImportSpec]) -> String {
    if imports.is_empty() {
        return String::new();
    }
    let (standard, external): (Vec<&&ImportSpec>, Vec<&&ImportSpec>) = imports
        .iter()
        .partition(|import| is_standard_import_path(&import.path));

    let mut out = String::from("import (\n");
    for import in &standard {
        out.push_str(&format!("\t{}\n", import));
    }
    if !standard.is_empty() && !external.is_empty() {
        out.push('\n');
    }
    for import in &external {
        out.push_str(&format!("\t{}\n", import));
    }
    out.push(')');
    out
}

/// Formatter that pipes the source through an external tool such as `gofmt`.
#[derive(Debug, Clone)]
pub struct CommandFormatter {
    program: String,
    args: Vec<String>,
}

impl CommandFormatter {
    /// Create a formatter running `program` with `args`, source on stdin.
    pub fn new(program: impl Into<String>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// `gofmt`, formatting only.
    pub fn gofmt() -> Self {
        Self::new("gofmt", Vec::<String>::new())
    }

    /// `goimports`, formatting and import pruning.
    pub fn goimports() -> Self {
        Self::new("goimports", Vec::<String>::new())
    }
}

impl SourceFormatter for CommandFormatter {
    fn format(&self, file_name: &str, source: &str) -> Result<String, FormatError> {
        let spawn_error = |source: std::io::Error| FormatError::Spawn {
            tool: self.program.clone(),
            source,
        };

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_error)?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(source.as_bytes()).map_err(spawn_error)?;
        }
        let output = child.wait_with_output().map_err(spawn_error)?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(FormatError::Tool {
                tool: self.program.clone(),
                output: stderr.replace("<standard input>", file_name),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_prunes_unused_imports() {
        let source = "package shapes\n\nimport (\n\t\"fmt\"\n\t\"os\"\n\n\t\"github.com/x/y\"\n)\n\nfunc A() { fmt.Println(y.Z) }\n\n";

        let formatted = BuiltinFormatter.format("a.go", source).unwrap();

        assert_eq!(
            formatted,
            "package shapes\n\nimport (\n\t\"fmt\"\n\n\t\"github.com/x/y\"\n)\n\nfunc A() { fmt.Println(y.Z) }\n"
        );
    }

    #[test]
    fn test_builtin_removes_empty_import_block() {
        let source = "package shapes\n\nimport (\n\t\"fmt\"\n)\n\nconst X = 1\n\n";

        let formatted = BuiltinFormatter.format("defs.go", source).unwrap();

        assert_eq!(formatted, "package shapes\n\nconst X = 1\n");
    }

    #[test]
    fn test_builtin_keeps_blank_and_unknown_imports() {
        let source = "package shapes\n\nimport (\n\t_ \"embed\"\n\n\t\"github.com/mattn/go-isatty\"\n)\n\nvar X = 1\n";

        let formatted = BuiltinFormatter.format("defs.go", source).unwrap();

        assert_eq!(formatted, source);
    }

    #[test]
    fn test_builtin_keeps_cgo_preamble_when_c_is_used() {
        let source = "package term\n\nimport (\n\t\"fmt\"\n)\n\n// #include <stdio.h>\nimport \"C\"\n\nfunc Puts() { C.puts(nil) }\n\n";

        let formatted = BuiltinFormatter.format("term.go", source).unwrap();

        assert_eq!(
            formatted,
            "package term\n\n// #include <stdio.h>\nimport \"C\"\n\nfunc Puts() { C.puts(nil) }\n"
        );
    }

    #[test]
    fn test_builtin_drops_unused_cgo_import() {
        let source = "package term\n\nimport (\n\t\"fmt\"\n)\n\n// #include <stdio.h>\nimport \"C\"\n\nfunc Print() { fmt.Println() }\n\n";

        let formatted = BuiltinFormatter.format("print.go", source).unwrap();

        assert_eq!(
            formatted,
            "package term\n\nimport (\n\t\"fmt\"\n)\n\nfunc Print() { fmt.Println() }\n"
        );
    }

    #[test]
    fn test_builtin_rejects_invalid_source() {
        let err = BuiltinFormatter
            .format("broken.go", "package shapes\n\nfunc {\n")
            .unwrap_err();
        assert!(matches!(err, FormatError::Invalid(_)));
    }

    #[test]
    fn test_missing_tool_is_an_error() {
        let formatter = CommandFormatter::new("unbundle-no-such-formatter", Vec::<String>::new());
        let err = formatter.format("a.go", "package a\n").unwrap_err();
        assert!(matches!(err, FormatError::Spawn { .. }));
    }
}
