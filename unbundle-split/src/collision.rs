//! Renaming buckets that would overwrite each other on disk.

use std::{collections::HashMap, fmt};

use unbundle_core::to_snake_case;

use crate::bundle::Bundle;

/// A bucket renamed to avoid a file-name collision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collision {
    /// Name before renaming.
    pub original: String,
    /// Name after renaming.
    pub renamed: String,
    /// Earlier bucket that claimed the name.
    pub conflicts_with: String,
}

impl fmt::Display for Collision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "duplicate key {:?} (collides with {:?}), renamed to {:?}",
            self.original, self.conflicts_with, self.renamed
        )
    }
}

/// Rename buckets whose names collide case-insensitively or map to the same file.
///
/// Buckets are visited in creation order; the later one of a colliding pair is
/// prefixed with `_` until its name is free. Returns one entry per rename.
pub fn resolve_collisions(bundle: &mut Bundle) -> Vec<Collision> {
    let mut by_lowercase: HashMap<String, String> = HashMap::new();
    let mut by_stem: HashMap<String, String> = HashMap::new();
    let mut collisions = Vec::new();

    for bucket in bundle.buckets_mut() {
        let original = bucket.name.clone();
        let mut name = original.clone();
        let mut conflicts_with = None;
        loop {
            let owner = by_lowercase
                .get(&name.to_lowercase())
                .or_else(|| by_stem.get(&to_snake_case(&name)))
                .cloned();
            let Some(owner) = owner else { break };
            conflicts_with.get_or_insert(owner);
            name = format!("_{}", name);
        }

        by_lowercase.insert(name.to_lowercase(), name.clone());
        by_stem.insert(to_snake_case(&name), name.clone());

        if let Some(conflicts_with) = conflicts_with {
            tracing::warn!(
                original = %original,
                renamed = %name,
                conflicts_with = %conflicts_with,
                "bucket name collision"
            );
            bucket.name = name.clone();
            collisions.push(Collision {
                original,
                renamed: name,
                conflicts_with,
            });
        }
    }
    collisions
}

#[cfg(test)]
mod tests {
    use std::{
        io,
        sync::{Arc, Mutex},
    };

    use super::*;
    use crate::bundle::BucketKey;

    /// Log sink shared with a test subscriber.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn bundle(names: &[&str]) -> Bundle {
        let mut bundle = Bundle::new();
        for name in names {
            bundle.append(
                BucketKey::Type(name.to_string()),
                || name.to_string(),
                String::new,
                "x",
            );
        }
        bundle
    }

    #[test]
    fn test_case_collision_renames_later_bucket() {
        let mut bundle = bundle(&["Foo", "foo"]);

        let collisions = resolve_collisions(&mut bundle);

        assert_eq!(bundle.names(), vec!["Foo", "_foo"]);
        assert_eq!(
            collisions,
            vec![Collision {
                original: "foo".into(),
                renamed: "_foo".into(),
                conflicts_with: "Foo".into(),
            }]
        );
    }

    #[test]
    fn test_collision_is_logged_as_warning() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();
        let mut bundle = bundle(&["Node", "node"]);

        tracing::subscriber::with_default(subscriber, || resolve_collisions(&mut bundle));

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("WARN"), "{}", output);
        assert!(output.contains("bucket name collision"), "{}", output);
        assert!(output.contains("renamed=_node"), "{}", output);
    }

    #[test]
    fn test_renamed_name_is_rechecked() {
        let mut bundle = bundle(&["foo", "_foo", "FOO"]);

        resolve_collisions(&mut bundle);

        assert_eq!(bundle.names(), vec!["foo", "_foo", "__FOO"]);
    }

    #[test]
    fn test_same_file_stem_collides() {
        let mut bundle = bundle(&["FooBar", "Foo_bar"]);

        let collisions = resolve_collisions(&mut bundle);

        assert_eq!(collisions.len(), 1);
        assert_eq!(bundle.names(), vec!["FooBar", "_Foo_bar"]);
    }

    #[test]
    fn test_distinct_names_untouched() {
        let mut bundle = bundle(&["Widget", "Gadget", "public_fns"]);

        assert!(resolve_collisions(&mut bundle).is_empty());
        assert_eq!(bundle.names(), vec!["Widget", "Gadget", "public_fns"]);
    }

    #[test]
    fn test_collision_display() {
        let collision = Collision {
            original: "foo".into(),
            renamed: "_foo".into(),
            conflicts_with: "Foo".into(),
        };
        assert_eq!(
            collision.to_string(),
            "duplicate key \"foo\" (collides with \"Foo\"), renamed to \"_foo\""
        );
    }
}
