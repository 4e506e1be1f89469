//! Optional TOML configuration file.
//!
//! Every command-line option can also be set here; flags win over the file.
//!
//! ```toml
//! dst = "unbundled"
//! newpkg = "http"
//! formatter = "goimports"
//!
//! [rewrite]
//! "code.google.com/p/go.net/context" = "context"
//! ```

use std::path::{Path, PathBuf};

use eyre::{Context, Result};
use indexmap::IndexMap;
use serde::Deserialize;
use unbundle_split::{BuiltinFormatter, CommandFormatter, SourceFormatter};

/// Formatting pass applied to every output file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FormatterKind {
    /// Validate, prune unused imports, no external tools
    #[default]
    Builtin,
    /// Pipe through `gofmt`
    Gofmt,
    /// Pipe through `goimports`
    Goimports,
}

impl FormatterKind {
    /// Create the formatter.
    pub fn formatter(self) -> Box<dyn SourceFormatter> {
        match self {
            FormatterKind::Builtin => Box::new(BuiltinFormatter),
            FormatterKind::Gofmt => Box::new(CommandFormatter::gofmt()),
            FormatterKind::Goimports => Box::new(CommandFormatter::goimports()),
        }
    }
}

/// Contents of a configuration file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub dst: Option<PathBuf>,
    pub newpkg: Option<String>,
    pub pubfunc: Option<String>,
    pub privfunc: Option<String>,
    pub types: Option<String>,
    pub formatter: Option<FormatterKind>,
    pub sort_imports: Option<bool>,
    /// Import path rewrites, old path to new path.
    #[serde(default)]
    pub rewrite: IndexMap<String, String>,
}

impl ConfigFile {
    /// Read and parse a configuration file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read config {}", path.display()))?;
        content
            .parse()
            .wrap_err_with(|| format!("invalid config {}", path.display()))
    }
}

impl std::str::FromStr for ConfigFile {
    type Err = toml::de::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        toml::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config: ConfigFile = r#"
            dst = "out"
            newpkg = "http"
            pubfunc = "api"
            formatter = "goimports"
            sort_imports = true

            [rewrite]
            "code.google.com/p/go.net/context" = "context"
        "#
        .parse()
        .unwrap();

        assert_eq!(config.dst, Some(PathBuf::from("out")));
        assert_eq!(config.newpkg.as_deref(), Some("http"));
        assert_eq!(config.pubfunc.as_deref(), Some("api"));
        assert_eq!(config.privfunc, None);
        assert_eq!(config.formatter, Some(FormatterKind::Goimports));
        assert_eq!(config.sort_imports, Some(true));
        assert_eq!(
            config.rewrite.get("code.google.com/p/go.net/context").map(String::as_str),
            Some("context")
        );
    }

    #[test]
    fn test_empty_config() {
        let config: ConfigFile = "".parse().unwrap();
        assert!(config.dst.is_none());
        assert!(config.rewrite.is_empty());
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        assert!("destination = \"out\"".parse::<ConfigFile>().is_err());
    }
}
