use std::path::PathBuf;

use clap::{ArgAction, Parser};
use eyre::{Result, eyre};
use indexmap::IndexMap;
use tracing_subscriber::EnvFilter;
use unbundle_split::{BucketNames, ImportClassifier, ImportOrder, SplitOptions};
use unbundle_syntax::CompilationUnit;

use crate::{
    config::{ConfigFile, FormatterKind},
    ops::{self, CleanupPolicy, SplitOpOptions},
    reports::{Report, TerminalOutput},
};

const DEFAULT_DST: &str = "unbundled";

/// Extension trait for exiting on load errors with pretty formatting
pub(crate) trait UnwrapOrExit<T> {
    fn unwrap_or_exit(self) -> T;
}

impl<T> UnwrapOrExit<T> for unbundle_syntax::Result<T> {
    fn unwrap_or_exit(self) -> T {
        match self {
            Ok(v) => v,
            Err(e) => {
                eprintln!("{:?}", miette::Report::new(*e));
                std::process::exit(1);
            }
        }
    }
}

#[derive(Parser)]
#[command(name = "unbundle")]
#[command(version)]
#[command(about = "Split a Go file or package into one file per type")]
pub(crate) struct Cli {
    /// Go package (import path or directory) or a single .go file
    #[arg(value_name = "PACKAGE_OR_FILE")]
    pub unit: String,

    /// Destination root directory (must exist) [default: unbundled]
    #[arg(long)]
    pub dst: Option<PathBuf>,

    /// Package name of the output files (defaults to the unit's package)
    #[arg(long)]
    pub newpkg: Option<String>,

    /// Name of the public functions file [default: public_fns]
    #[arg(long)]
    pub pubfunc: Option<String>,

    /// Name of the private functions file [default: private_fns]
    #[arg(long)]
    pub privfunc: Option<String>,

    /// Name of the const and var definitions file [default: defs]
    #[arg(long)]
    pub types: Option<String>,

    /// Formatting pass applied to every output file [default: builtin]
    #[arg(long, value_enum)]
    pub formatter: Option<FormatterKind>,

    /// Replace an import path in the output headers
    #[arg(long = "rewrite-import", value_name = "OLD=NEW", value_parser = parse_rewrite)]
    pub rewrites: Vec<(String, String)>,

    /// Sort header imports lexicographically instead of by first appearance
    #[arg(long)]
    pub sort_imports: bool,

    /// Fail instead of deleting an existing destination package directory
    #[arg(long)]
    pub no_clobber: bool,

    /// Print the files instead of writing them
    #[arg(long)]
    pub dry_run: bool,

    /// Read options from a TOML file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// More logging (repeatable)
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    pub fn run(&self) -> Result<()> {
        self.init_tracing();

        let config = match &self.config {
            Some(path) => ConfigFile::open(path)?,
            None => ConfigFile::default(),
        };
        let settings = Settings::merge(self, config);

        if !self.dry_run {
            ops::check_root(&settings.dst)?;
        }

        let unit = CompilationUnit::load(&self.unit).unwrap_or_exit();
        tracing::info!(
            package = %unit.package,
            files = unit.files.len(),
            "loaded unit"
        );

        let formatter = settings.formatter.formatter();
        let report = ops::split(
            &self.unit,
            &unit,
            SplitOpOptions {
                dst: &settings.dst,
                split: settings.split,
                formatter: formatter.as_ref(),
                cleanup: settings.cleanup,
                dry_run: self.dry_run,
            },
        )?;

        report.render(&mut TerminalOutput::new());
        Ok(())
    }

    fn init_tracing(&self) {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(match (self.quiet, self.verbose) {
                (true, _) => "error",
                (false, 0) => "warn",
                (false, 1) => "info",
                (false, 2) => "debug",
                (false, _) => "trace",
            })
        });

        let subscriber = tracing_subscriber::FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .finish();

        if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
            eprintln!("failed to set tracing subscriber: {}", e);
        }
    }
}

/// Effective options: flags, then the config file, then defaults.
struct Settings {
    dst: PathBuf,
    split: SplitOptions,
    formatter: FormatterKind,
    cleanup: CleanupPolicy,
}

impl Settings {
    fn merge(cli: &Cli, config: ConfigFile) -> Self {
        let defaults = BucketNames::default();
        let names = BucketNames {
            public_functions: pick(&cli.pubfunc, config.pubfunc, defaults.public_functions),
            private_functions: pick(&cli.privfunc, config.privfunc, defaults.private_functions),
            definitions: pick(&cli.types, config.types, defaults.definitions),
        };

        let mut rewrites: IndexMap<String, String> = config.rewrite;
        for (old, new) in &cli.rewrites {
            rewrites.insert(old.clone(), new.clone());
        }

        let order = if cli.sort_imports || config.sort_imports.unwrap_or(false) {
            ImportOrder::Sorted
        } else {
            ImportOrder::Encounter
        };

        Self {
            dst: pick(&cli.dst, config.dst, PathBuf::from(DEFAULT_DST)),
            split: SplitOptions {
                package: cli.newpkg.clone().or(config.newpkg),
                names,
                imports: ImportClassifier::new()
                    .with_rewrites(rewrites)
                    .with_order(order),
            },
            formatter: cli.formatter.or(config.formatter).unwrap_or_default(),
            cleanup: if cli.no_clobber {
                CleanupPolicy::Refuse
            } else {
                CleanupPolicy::Replace
            },
        }
    }
}

fn pick<T: Clone>(flag: &Option<T>, config: Option<T>, default: T) -> T {
    flag.clone().or(config).unwrap_or(default)
}

/// Parse an `OLD=NEW` import rewrite.
fn parse_rewrite(s: &str) -> Result<(String, String)> {
    let (old, new) = s
        .split_once('=')
        .ok_or_else(|| eyre!("expected OLD=NEW, got {:?}", s))?;
    let (old, new) = (old.trim(), new.trim());
    if old.is_empty() || new.is_empty() {
        return Err(eyre!("import paths in {:?} must not be empty", s));
    }
    Ok((old.to_string(), new.to_string()))
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use tempfile::TempDir;

    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("unbundle").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_parse_rewrite() {
        assert_eq!(
            parse_rewrite("code.google.com/p/go.net/context=context").unwrap(),
            ("code.google.com/p/go.net/context".into(), "context".into())
        );
        assert!(parse_rewrite("context").is_err());
        assert!(parse_rewrite("=context").is_err());
    }

    #[test]
    fn test_unit_argument_is_required() {
        let err = Cli::try_parse_from(["unbundle"]).err().unwrap();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::merge(&cli(&["./shapes"]), ConfigFile::default());

        assert_eq!(settings.dst, Path::new("unbundled"));
        assert_eq!(settings.split.names, BucketNames::default());
        assert_eq!(settings.split.package, None);
        assert_eq!(settings.formatter, FormatterKind::Builtin);
        assert_eq!(settings.cleanup, CleanupPolicy::Replace);
    }

    #[test]
    fn test_flags_override_config() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("unbundle.toml");
        std::fs::write(
            &path,
            "dst = \"out\"\npubfunc = \"api\"\nprivfunc = \"helpers\"\nformatter = \"gofmt\"\n",
        )
        .unwrap();
        let config = ConfigFile::open(&path).unwrap();

        let settings = Settings::merge(
            &cli(&["./shapes", "--pubfunc", "exported", "--no-clobber"]),
            config,
        );

        assert_eq!(settings.dst, Path::new("out"));
        assert_eq!(settings.split.names.public_functions, "exported");
        assert_eq!(settings.split.names.private_functions, "helpers");
        assert_eq!(settings.split.names.definitions, "defs");
        assert_eq!(settings.formatter, FormatterKind::Gofmt);
        assert_eq!(settings.cleanup, CleanupPolicy::Refuse);
    }

    #[test]
    fn test_rewrites_merge_with_config() {
        let config: ConfigFile = "[rewrite]\n\"old/a\" = \"a\"\n\"old/b\" = \"b\"\n".parse().unwrap();

        let settings = Settings::merge(
            &cli(&["./shapes", "--rewrite-import", "old/b=new/b"]),
            config,
        );
        let spec = unbundle_syntax::ImportSpec::new(None, "old/b");
        let imports = settings.split.imports.classify([&spec]);

        assert_eq!(imports.standard.iter().collect::<Vec<_>>(), vec!["\"new/b\""]);
    }
}
