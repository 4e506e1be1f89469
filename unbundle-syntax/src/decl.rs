//! Declaration and import types extracted from Go sources.

use std::{fmt, ops::Range};

/// A top-level declaration together with its original source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub kind: DeclKind,
    /// Original text, including the doc comment above it and a trailing comment on its last line.
    pub text: String,
    /// 1-based line of the declaration (or of its doc comment).
    pub line: usize,
}

/// Shape of a top-level declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclKind {
    /// A function; methods carry a receiver.
    Function {
        name: String,
        receiver: Option<Receiver>,
    },
    /// A single type spec. Grouped `type (...)` declarations yield one per spec.
    TypeDef { name: String },
    /// Any other declaration block.
    Other { kind: OtherKind },
}

impl DeclKind {
    /// Name of the declared function or type, if any.
    pub fn name(&self) -> Option<&str> {
        match self {
            DeclKind::Function { name, .. } | DeclKind::TypeDef { name } => Some(name),
            DeclKind::Other { .. } => None,
        }
    }
}

/// Receiver clause of a method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Receiver {
    /// `(r T)`, `(r *T)` or `(r *T[K])`; `type_name` is the base identifier.
    Named { type_name: String },
    /// Anything else, which a Go compiler would reject as a receiver.
    Malformed { reason: String },
}

/// Declaration keyword of an [`DeclKind::Other`] block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtherKind {
    Const,
    Var,
}

impl fmt::Display for OtherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OtherKind::Const => write!(f, "const"),
            OtherKind::Var => write!(f, "var"),
        }
    }
}

/// A standalone `import "C"` and the cgo preamble above it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CgoImport {
    /// Comment block directly above the import; empty if there is none.
    pub preamble: String,
    /// Byte range of the declaration, preamble included.
    pub range: Range<usize>,
}

/// One import of a source file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImportSpec {
    /// Explicit package name: an identifier, `_` or `.`.
    pub alias: Option<String>,
    /// Unquoted import path.
    pub path: String,
}

impl ImportSpec {
    pub fn new(alias: Option<&str>, path: impl Into<String>) -> Self {
        Self {
            alias: alias.map(str::to_string),
            path: path.into(),
        }
    }

    /// Name the package is referred to by in the importing file.
    ///
    /// Without an alias this guesses from the path: the last segment, skipping
    /// a trailing `vN` major version and dropping a `.vN` suffix. Returns `None`
    /// when the guess is not a valid identifier.
    pub fn local_name(&self) -> Option<String> {
        if let Some(alias) = &self.alias {
            return Some(alias.clone());
        }
        let mut segments = self.path.rsplit('/');
        let mut last = segments.next()?;
        if is_major_version(last) {
            last = segments.next()?;
        }
        let name = match last.rsplit_once(".v") {
            Some((base, version)) if version.chars().all(|c| c.is_ascii_digit()) => base,
            _ => last,
        };
        is_identifier(name).then(|| name.to_string())
    }
}

impl fmt::Display for ImportSpec {
    /// Renders the spec as it appears inside an import block: `alias "path"`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(alias) = &self.alias {
            write!(f, "{} ", alias)?;
        }
        write!(f, "\"{}\"", escape_path(&self.path))
    }
}

fn escape_path(path: &str) -> String {
    path.replace('\\', "\\\\").replace('"', "\\\"")
}

fn is_major_version(segment: &str) -> bool {
    segment
        .strip_prefix('v')
        .is_some_and(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}
