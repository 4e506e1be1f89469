//! Split operation - partition a unit and write one file per bucket.

use std::path::Path;

use eyre::{Context, Result, bail};
use unbundle_core::File;
use unbundle_split::{BucketNames, SourceFormatter, SplitOptions, header::package_name, render_files};
use unbundle_syntax::CompilationUnit;

use crate::reports::{PreviewFile, SplitReport, SplitResult, WrittenFile};

/// What to do with an existing destination package directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CleanupPolicy {
    /// Remove it and start over.
    #[default]
    Replace,
    /// Fail instead of deleting anything.
    Refuse,
}

/// Options for the split operation.
pub struct SplitOpOptions<'a> {
    /// Destination root; must already exist.
    pub dst: &'a Path,
    pub split: SplitOptions,
    pub formatter: &'a dyn SourceFormatter,
    pub cleanup: CleanupPolicy,
    /// Whether to preview without writing files.
    pub dry_run: bool,
}

/// Fail unless the destination root exists.
pub fn check_root(dst: &Path) -> Result<()> {
    if dst.is_dir() {
        return Ok(());
    }
    let cwd = std::env::current_dir().wrap_err("failed to read current directory")?;
    bail!(
        "destination directory {} does not exist (current directory: {})",
        dst.display(),
        cwd.display()
    )
}

/// Execute the split operation.
///
/// Every bucket is formatted before the destination is touched.
pub fn split(unit_id: &str, unit: &CompilationUnit, opts: SplitOpOptions) -> Result<SplitReport> {
    let target = opts
        .split
        .package
        .clone()
        .unwrap_or_else(|| unit.package.clone());

    let result = unbundle_split::split(unit, &opts.split)?;
    tracing::debug!(unit = unit_id, buckets = result.bundle.len(), "classified");
    let warnings = result.collisions.iter().map(ToString::to_string).collect();
    let files = render_files(&result.bundle, opts.formatter)?;

    let result = if opts.dry_run {
        SplitResult::Preview(
            files
                .into_iter()
                .map(|f| PreviewFile {
                    file_name: f.file_name,
                    content: f.content,
                })
                .collect(),
        )
    } else {
        let dir = opts.dst.join(package_name(&target));
        prepare_dir(&dir, opts.cleanup)?;

        let mut written = Vec::with_capacity(files.len());
        for file in files {
            File::new(dir.join(&file.file_name), file.content).write()?;
            tracing::info!(
                bucket = %file.bucket,
                file = %file.file_name,
                declarations = file.declarations,
                "wrote"
            );
            written.push(WrittenFile {
                bucket: file.bucket,
                file_name: file.file_name,
            });
        }
        SplitResult::Written {
            dir,
            files: written,
        }
    };

    let BucketNames {
        public_functions,
        private_functions,
        definitions,
    } = opts.split.names;

    Ok(SplitReport {
        unit: unit_id.to_string(),
        target_package: target,
        public_functions,
        private_functions,
        definitions,
        warnings,
        result,
    })
}

fn prepare_dir(dir: &Path, cleanup: CleanupPolicy) -> Result<()> {
    if dir.exists() {
        match cleanup {
            CleanupPolicy::Replace => {
                tracing::debug!(dir = %dir.display(), "removing existing destination");
                std::fs::remove_dir_all(dir)
                    .wrap_err_with(|| format!("failed to remove {}", dir.display()))?;
            }
            CleanupPolicy::Refuse => {
                bail!("{} already exists (remove it or drop --no-clobber)", dir.display())
            }
        }
    }
    std::fs::create_dir(dir).wrap_err_with(|| format!("failed to create {}", dir.display()))
}
