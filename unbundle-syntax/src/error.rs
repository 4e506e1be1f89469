use std::path::PathBuf;

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Result type for loading operations (boxed to reduce size on stack)
pub type Result<T> = std::result::Result<T, Box<Error>>;

/// Errors raised while loading a compilation unit.
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("failed to read '{path}'")]
    #[diagnostic(code(unbundle::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("syntax error in {filename}")]
    #[diagnostic(
        code(unbundle::syntax_error),
        help("the unit must parse cleanly before it can be split")
    )]
    Syntax {
        filename: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("{message}")]
        span: SourceSpan,
        message: String,
    },

    #[error("{filename} has no package clause")]
    #[diagnostic(code(unbundle::missing_package))]
    MissingPackageClause { filename: String },

    #[error("cannot find package '{name}'")]
    #[diagnostic(
        code(unbundle::package_not_found),
        help("searched: {searched}")
    )]
    PackageNotFound { name: String, searched: String },

    #[error("no buildable Go source files in '{path}'")]
    #[diagnostic(code(unbundle::no_sources))]
    NoSources { path: PathBuf },

    #[error("found packages '{first}' and '{second}' in '{path}'")]
    #[diagnostic(
        code(unbundle::multiple_packages),
        help("'{file}' declares package '{second}'; a unit must hold a single package")
    )]
    MultiplePackages {
        path: PathBuf,
        first: String,
        second: String,
        file: String,
    },

    #[error("failed to initialise the Go parser: {0}")]
    Parser(String),
}

impl Error {
    /// Create a syntax error pointing at `span` inside `src`
    pub fn syntax(
        filename: &str,
        src: &str,
        span: impl Into<SourceSpan>,
        message: impl Into<String>,
    ) -> Box<Self> {
        Box::new(Error::Syntax {
            filename: filename.to_string(),
            src: NamedSource::new(filename, src.to_string()),
            span: span.into(),
            message: message.into(),
        })
    }

    /// Create an I/O error for `path`
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Box<Self> {
        Box::new(Error::Io {
            path: path.into(),
            source,
        })
    }
}
