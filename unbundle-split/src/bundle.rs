//! Output buckets and the bundle that collects them.

use indexmap::IndexMap;
use unbundle_core::to_snake_case;

/// Identity of a bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BucketKey {
    /// Exported free functions.
    PublicFunctions,
    /// Unexported free functions.
    PrivateFunctions,
    /// Constants and variables.
    Definitions,
    /// A type and its methods.
    Type(String),
}

/// One output unit: a header plus the declarations appended to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    pub(crate) name: String,
    header: String,
    body: String,
    declarations: usize,
}

impl Bucket {
    fn new(name: String, header: String) -> Self {
        Self {
            name,
            header,
            body: String::new(),
            declarations: 0,
        }
    }

    /// Final bucket name; the file name is derived from it.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the synthesized header
    pub fn header(&self) -> &str {
        &self.header
    }

    /// Get the appended declarations
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Number of declarations appended.
    pub fn len(&self) -> usize {
        self.declarations
    }

    /// File name for this bucket (e.g., "HTTPServer" -> "http_server.go").
    pub fn file_name(&self) -> String {
        format!("{}.go", to_snake_case(&self.name))
    }

    /// Full file content: header followed by body.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.header.len() + self.body.len());
        out.push_str(&self.header);
        out.push_str(&self.body);
        out
    }
}

/// All buckets of a run, in the order they were first created.
#[derive(Debug, Clone, Default)]
pub struct Bundle {
    buckets: IndexMap<BucketKey, Bucket>,
}

impl Bundle {
    /// Create an empty bundle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a declaration to a bucket.
    ///
    /// A missing bucket is created with the header returned by `header`, so the
    /// header is synthesized exactly once per bucket. Every declaration is
    /// followed by a blank line.
    pub fn append(
        &mut self,
        key: BucketKey,
        name: impl FnOnce() -> String,
        header: impl FnOnce() -> String,
        text: &str,
    ) {
        let bucket = self.buckets.entry(key).or_insert_with(|| {
            let name = name();
            tracing::debug!(bucket = %name, "creating bucket");
            Bucket::new(name, header())
        });
        bucket.body.push_str(text);
        bucket.body.push_str("\n\n");
        bucket.declarations += 1;
    }

    /// Get a bucket by key.
    pub fn get(&self, key: &BucketKey) -> Option<&Bucket> {
        self.buckets.get(key)
    }

    /// Get a bucket by its final name.
    pub fn by_name(&self, name: &str) -> Option<&Bucket> {
        self.buckets.values().find(|b| b.name == name)
    }

    /// Iterate over buckets in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (&BucketKey, &Bucket)> {
        self.buckets.iter()
    }

    /// Final bucket names in creation order.
    pub fn names(&self) -> Vec<&str> {
        self.buckets.values().map(|b| b.name.as_str()).collect()
    }

    pub(crate) fn buckets_mut(&mut self) -> impl Iterator<Item = &mut Bucket> {
        self.buckets.values_mut()
    }

    /// Get the number of buckets.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_is_created_once() {
        let mut bundle = Bundle::new();
        let mut headers = 0;
        for text in ["type Widget struct{}", "func (w *Widget) Speak() {}"] {
            bundle.append(
                BucketKey::Type("Widget".into()),
                || "Widget".into(),
                || {
                    headers += 1;
                    "package shapes\n\n".into()
                },
                text,
            );
        }

        assert_eq!(headers, 1);
        let bucket = bundle.get(&BucketKey::Type("Widget".into())).unwrap();
        assert_eq!(bucket.len(), 2);
        assert_eq!(
            bucket.render(),
            "package shapes\n\ntype Widget struct{}\n\nfunc (w *Widget) Speak() {}\n\n"
        );
    }

    #[test]
    fn test_creation_order_is_kept() {
        let mut bundle = Bundle::new();
        for name in ["b", "a", "c"] {
            bundle.append(
                BucketKey::Type(name.into()),
                || name.into(),
                String::new,
                "x",
            );
        }
        assert_eq!(bundle.names(), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_file_name() {
        let mut bundle = Bundle::new();
        bundle.append(
            BucketKey::Type("HTTPServer".into()),
            || "HTTPServer".into(),
            String::new,
            "type HTTPServer struct{}",
        );
        assert_eq!(bundle.by_name("HTTPServer").unwrap().file_name(), "http_server.go");
    }
}
