//! Assigning declarations to buckets.

use unbundle_core::is_exported;
use unbundle_syntax::{CompilationUnit, DeclKind, Declaration, Receiver, UnitKind};

use crate::{
    Error, Result,
    bundle::{BucketKey, Bundle},
    header::render_header,
    imports::ImportClassifier,
};

/// Names of the fixed-role buckets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketNames {
    pub public_functions: String,
    pub private_functions: String,
    pub definitions: String,
}

impl Default for BucketNames {
    fn default() -> Self {
        Self {
            public_functions: "public_fns".into(),
            private_functions: "private_fns".into(),
            definitions: "defs".into(),
        }
    }
}

/// Options for splitting a unit.
#[derive(Debug, Clone, Default)]
pub struct SplitOptions {
    /// Destination package name; defaults to the unit's own package.
    pub package: Option<String>,
    pub names: BucketNames,
    pub imports: ImportClassifier,
}

/// Classifies the declarations of one unit into a [`Bundle`].
pub struct Partitioner<'a> {
    unit: &'a CompilationUnit,
    names: &'a BucketNames,
    header: String,
}

impl<'a> Partitioner<'a> {
    /// Prepare a partitioner; the header is computed from every import of the unit.
    pub fn new(unit: &'a CompilationUnit, opts: &'a SplitOptions) -> Self {
        let package = opts.package.as_deref().unwrap_or(&unit.package);
        let mut imports = opts.imports.classify(unit.imports());
        imports.cgo = unit.cgo_preamble();
        Self {
            unit,
            names: &opts.names,
            header: render_header(package, &imports),
        }
    }

    /// Header shared by every bucket.
    pub fn header(&self) -> &str {
        &self.header
    }

    /// Bucket key and name for a declaration.
    ///
    /// Fails on a method whose receiver clause is malformed.
    pub fn bucket_for(&self, decl: &Declaration, file: &str) -> Result<(BucketKey, String)> {
        let bucket = match &decl.kind {
            DeclKind::Function {
                name,
                receiver: None,
            } => {
                if is_exported(name) {
                    self.role(BucketKey::PublicFunctions, &self.names.public_functions)
                } else {
                    self.role(BucketKey::PrivateFunctions, &self.names.private_functions)
                }
            }
            DeclKind::Function {
                receiver: Some(Receiver::Named { type_name, .. }),
                ..
            } => (BucketKey::Type(type_name.clone()), type_name.clone()),
            DeclKind::Function {
                name,
                receiver: Some(Receiver::Malformed { reason }),
            } => {
                return Err(Error::MalformedReceiver {
                    file: file.to_string(),
                    line: decl.line,
                    method: name.clone(),
                    reason: reason.clone(),
                });
            }
            DeclKind::TypeDef { name } => (BucketKey::Type(name.clone()), name.clone()),
            DeclKind::Other { .. } => self.role(BucketKey::Definitions, &self.names.definitions),
        };
        Ok(bucket)
    }

    /// Single-file units get the file stem appended to role bucket names.
    fn role(&self, key: BucketKey, name: &str) -> (BucketKey, String) {
        match &self.unit.kind {
            UnitKind::Package => (key, name.to_string()),
            UnitKind::File { stem } => (key, format!("{}_{}", name, stem)),
        }
    }

    /// Classify every declaration, in file order then source order.
    pub fn partition(&self) -> Result<Bundle> {
        let mut bundle = Bundle::new();
        for file in &self.unit.files {
            let filename = file.path.display().to_string();
            for decl in &file.declarations {
                let (key, name) = self.bucket_for(decl, &filename)?;
                let label = match &decl.kind {
                    DeclKind::Other { kind } => kind.to_string(),
                    other => other.name().unwrap_or_default().to_string(),
                };
                tracing::trace!(declaration = %label, line = decl.line, bucket = %name, "classified");
                bundle.append(key, || name, || self.header.clone(), &decl.text);
            }
        }
        Ok(bundle)
    }
}
