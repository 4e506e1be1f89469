//! Turning a finished bundle into file contents.

use crate::{Error, Result, bundle::Bundle, formatter::SourceFormatter};

/// A formatted file ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFile {
    /// Name of the bucket the file was produced from.
    pub bucket: String,
    /// File name inside the destination package directory.
    pub file_name: String,
    pub content: String,
    /// Number of declarations in the file.
    pub declarations: usize,
}

/// Format every bucket of the bundle, in bundle order.
///
/// Stops at the first formatting error.
pub fn render_files(bundle: &Bundle, formatter: &dyn SourceFormatter) -> Result<Vec<RenderedFile>> {
    bundle
        .iter()
        .map(|(_, bucket)| {
            let file_name = bucket.file_name();
            let content = formatter
                .format(&file_name, &bucket.render())
                .map_err(|source| Error::Formatting {
                    bucket: bucket.name().to_string(),
                    file_name: file_name.clone(),
                    source,
                })?;
            Ok(RenderedFile {
                bucket: bucket.name().to_string(),
                file_name,
                content,
                declarations: bucket.len(),
            })
        })
        .collect()
}
