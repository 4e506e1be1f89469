//! Split command report data structures.

use std::path::PathBuf;

use super::output::{Output, Report};

/// Report data from splitting a unit.
#[derive(Debug)]
pub struct SplitReport {
    /// Package or file that was split.
    pub unit: String,
    /// Package name of the output files.
    pub target_package: String,
    /// Bucket names used for the fixed roles.
    pub public_functions: String,
    pub private_functions: String,
    pub definitions: String,
    /// Collision warnings.
    pub warnings: Vec<String>,
    pub result: SplitResult,
}

/// What happened to the rendered files.
#[derive(Debug)]
pub enum SplitResult {
    /// Files were written into `dir`.
    Written { dir: PathBuf, files: Vec<WrittenFile> },
    /// Dry-run preview.
    Preview(Vec<PreviewFile>),
}

/// A file written to disk.
#[derive(Debug)]
pub struct WrittenFile {
    /// Bucket the file came from.
    pub bucket: String,
    pub file_name: String,
}

/// A file in preview mode.
#[derive(Debug)]
pub struct PreviewFile {
    pub file_name: String,
    pub content: String,
}

impl Report for SplitReport {
    fn render(&self, out: &mut dyn Output) {
        out.key_value("Package/File", &self.unit);
        out.key_value("Target package", &self.target_package);
        out.key_value("Public functions file", &self.public_functions);
        out.key_value("Private functions file", &self.private_functions);
        out.key_value("Definitions file", &self.definitions);

        for warning in &self.warnings {
            out.warning(warning);
        }

        match &self.result {
            SplitResult::Written { dir, files } => {
                out.key_value("Destination", &dir.display().to_string());
                out.newline();
                out.section(&format!("Written ({})", files.len()));
                for file in files {
                    out.added_item(&format!("{:?} into {:?}", file.bucket, file.file_name));
                }
            }
            SplitResult::Preview(files) => {
                out.newline();
                for file in files {
                    out.divider(&file.file_name);
                    out.preformatted(&file.content);
                }
                out.divider("Summary");
                out.preformatted(&format!("{} files would be generated", files.len()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::output::BufferOutput;

    fn report(result: SplitResult) -> SplitReport {
        SplitReport {
            unit: "./shapes".into(),
            target_package: "shapes".into(),
            public_functions: "public_fns".into(),
            private_functions: "private_fns".into(),
            definitions: "defs".into(),
            warnings: vec!["duplicate key \"foo\"".into()],
            result,
        }
    }

    #[test]
    fn test_render_written() {
        let report = report(SplitResult::Written {
            dir: PathBuf::from("unbundled/shapes"),
            files: vec![WrittenFile {
                bucket: "HTTPServer".into(),
                file_name: "http_server.go".into(),
            }],
        });
        let mut out = BufferOutput::default();

        report.render(&mut out);

        assert!(out.lines.contains(&"warning: duplicate key \"foo\"".to_string()));
        assert!(out.lines.contains(&"Destination: unbundled/shapes".to_string()));
        assert_eq!(
            out.lines.last().unwrap(),
            "  + \"HTTPServer\" into \"http_server.go\""
        );
    }

    #[test]
    fn test_render_preview() {
        let report = report(SplitResult::Preview(vec![PreviewFile {
            file_name: "defs.go".into(),
            content: "package shapes\n".into(),
        }]));
        let mut out = BufferOutput::default();

        report.render(&mut out);

        assert!(out.lines.contains(&"── defs.go ──".to_string()));
        assert_eq!(out.lines.last().unwrap(), "1 files would be generated");
    }
}
