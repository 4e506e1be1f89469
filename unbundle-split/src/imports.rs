//! Import classification and deduplication.

use indexmap::{IndexMap, IndexSet};
use unbundle_syntax::ImportSpec;

/// Whether an import path belongs to the standard library.
///
/// Standard paths have no `.` in their first segment, e.g. `fmt` or `net/http`,
/// as opposed to `github.com/x/y`.
pub fn is_standard_import_path(path: &str) -> bool {
    let first = path.split('/').next().unwrap_or(path);
    !first.contains('.')
}

/// Order of imports inside a synthesized header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ImportOrder {
    /// Order of first appearance across the unit's files.
    #[default]
    Encounter,
    /// Lexicographic by rendered spec.
    Sorted,
}

/// Splits the imports of a unit into standard and external sets.
///
/// The rewrite table maps deprecated import paths to their replacements; it is
/// applied before classification and deduplication.
#[derive(Debug, Clone, Default)]
pub struct ImportClassifier {
    rewrites: IndexMap<String, String>,
    order: ImportOrder,
}

impl ImportClassifier {
    /// Create a classifier with an empty rewrite table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the given path rewrite table.
    pub fn with_rewrites(mut self, rewrites: IndexMap<String, String>) -> Self {
        self.rewrites = rewrites;
        self
    }

    /// Set the order of the classified sets.
    pub fn with_order(mut self, order: ImportOrder) -> Self {
        self.order = order;
        self
    }

    /// Classify and deduplicate imports. Deduplication is keyed on the rendered `alias "path"`.
    pub fn classify<'a>(&self, imports: impl IntoIterator<Item = &'a ImportSpec>) -> ClassifiedImports {
        let mut classified = ClassifiedImports::default();
        for import in imports {
            let path = self
                .rewrites
                .get(&import.path)
                .cloned()
                .unwrap_or_else(|| import.path.clone());
            let standard = is_standard_import_path(&path);
            let spec = ImportSpec {
                alias: import.alias.clone(),
                path,
            }
            .to_string();
            if standard {
                classified.standard.insert(spec);
            } else {
                classified.external.insert(spec);
            }
        }
        if self.order == ImportOrder::Sorted {
            classified.standard.sort();
            classified.external.sort();
        }
        classified
    }
}

/// Deduplicated, rendered import specs of a unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifiedImports {
    pub standard: IndexSet<String>,
    pub external: IndexSet<String>,
    /// Preamble of `import "C"` when the unit uses cgo.
    pub cgo: Option<String>,
}

impl ClassifiedImports {
    /// Check if there are no imports at all.
    pub fn is_empty(&self) -> bool {
        self.standard.is_empty() && self.external.is_empty() && self.cgo.is_none()
    }

    /// Get the total number of imports.
    pub fn len(&self) -> usize {
        self.standard.len() + self.external.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn specs(list: &[(Option<&str>, &str)]) -> Vec<ImportSpec> {
        list.iter()
            .map(|(alias, path)| ImportSpec::new(*alias, *path))
            .collect()
    }

    #[test]
    fn test_is_standard_import_path() {
        assert!(is_standard_import_path("fmt"));
        assert!(is_standard_import_path("net/http"));
        assert!(is_standard_import_path("golang/x"));
        assert!(!is_standard_import_path("github.com/x/y"));
        assert!(!is_standard_import_path("gopkg.in/yaml.v3"));
        assert!(!is_standard_import_path("example.com"));
    }

    #[test]
    fn test_classify_deduplicates() {
        let imports = specs(&[
            (None, "fmt"),
            (None, "github.com/x/y"),
            (None, "fmt"),
            (Some("str"), "strings"),
            (None, "github.com/x/y"),
        ]);

        let classified = ImportClassifier::new().classify(&imports);

        assert_eq!(
            classified.standard.iter().collect::<Vec<_>>(),
            vec!["\"fmt\"", "str \"strings\""]
        );
        assert_eq!(
            classified.external.iter().collect::<Vec<_>>(),
            vec!["\"github.com/x/y\""]
        );
        assert_eq!(classified.len(), 3);
    }

    #[test]
    fn test_alias_is_part_of_the_key() {
        let imports = specs(&[(None, "strings"), (Some("str"), "strings")]);

        let classified = ImportClassifier::new().classify(&imports);

        assert_eq!(classified.standard.len(), 2);
    }

    #[test]
    fn test_rewrites_apply_before_classification() {
        let imports = specs(&[(None, "code.google.com/p/go.net/context"), (None, "context")]);
        let rewrites = IndexMap::from([(
            "code.google.com/p/go.net/context".to_string(),
            "context".to_string(),
        )]);

        let classified = ImportClassifier::new()
            .with_rewrites(rewrites)
            .classify(&imports);

        assert_eq!(
            classified.standard.iter().collect::<Vec<_>>(),
            vec!["\"context\""]
        );
        assert!(classified.external.is_empty());
    }

    #[test]
    fn test_sorted_order() {
        let imports = specs(&[(None, "os"), (None, "fmt"), (None, "bytes")]);

        let classified = ImportClassifier::new()
            .with_order(ImportOrder::Sorted)
            .classify(&imports);

        assert_eq!(
            classified.standard.iter().collect::<Vec<_>>(),
            vec!["\"bytes\"", "\"fmt\"", "\"os\""]
        );
    }
}
