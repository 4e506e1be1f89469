//! Resolving a unit identifier into a set of parsed source files.

use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

use crate::{
    Error, Result,
    constraint::BuildContext,
    decl::{Declaration, ImportSpec},
    source::SourceFile,
};

/// What the unit was loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitKind {
    /// Every buildable file of a package directory.
    Package,
    /// A single file; `stem` is its base name without extension.
    File { stem: String },
}

/// The file or package being split.
#[derive(Debug, Clone)]
pub struct CompilationUnit {
    /// Package name shared by all files.
    pub package: String,
    pub kind: UnitKind,
    /// Files in load order (sorted by name for packages).
    pub files: Vec<SourceFile>,
}

impl CompilationUnit {
    /// Load a unit from a command-line identifier.
    ///
    /// Identifiers ending in `.go` are files; anything else is a package,
    /// given either as a directory or as an import path.
    pub fn load(id: &str) -> Result<Self> {
        if id.ends_with(".go") {
            Self::load_file(id)
        } else {
            let dir = find_package(id, &search_roots_from_env())?;
            Self::load_dir(dir, &BuildContext::from_env())
        }
    }

    /// Load a single source file.
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = SourceFile::read(path)?;
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self {
            package: file.package.clone(),
            kind: UnitKind::File { stem },
            files: vec![file],
        })
    }

    /// Load every file of a package directory that builds on `ctx`.
    ///
    /// Test files, files starting with `.` or `_`, files whose `_GOOS`/`_GOARCH`
    /// suffix names another platform, and files whose build constraint does not
    /// hold are skipped.
    pub fn load_dir(dir: impl AsRef<Path>, ctx: &BuildContext) -> Result<Self> {
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir).map_err(|e| Error::io(dir, e))?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::io(dir, e))?;
            let path = entry.path();
            let name = entry.file_name();
            if !path.is_file() || !is_buildable_name(&name) {
                continue;
            }
            if !ctx.matches_file_name(&name.to_string_lossy()) {
                tracing::debug!(
                    file = %path.display(),
                    goos = %ctx.goos,
                    goarch = %ctx.goarch,
                    "skipping file for another platform"
                );
                continue;
            }
            paths.push(path);
        }
        paths.sort();

        let mut files: Vec<SourceFile> = Vec::new();
        for path in paths {
            let file = SourceFile::read(&path)?;
            if let Some(constraint) = &file.constraint {
                if !ctx.matches(constraint) {
                    tracing::debug!(
                        file = %path.display(),
                        "skipping file excluded by build constraint"
                    );
                    continue;
                }
            }
            if let Some(first) = files.first() {
                if first.package != file.package {
                    return Err(Box::new(Error::MultiplePackages {
                        path: dir.to_path_buf(),
                        first: first.package.clone(),
                        second: file.package.clone(),
                        file: path.display().to_string(),
                    }));
                }
            }
            files.push(file);
        }

        let Some(first) = files.first() else {
            return Err(Box::new(Error::NoSources {
                path: dir.to_path_buf(),
            }));
        };
        Ok(Self {
            package: first.package.clone(),
            kind: UnitKind::Package,
            files,
        })
    }

    /// Whether the unit is a whole package.
    pub fn is_package(&self) -> bool {
        matches!(self.kind, UnitKind::Package)
    }

    /// Imports of every file, in file order.
    pub fn imports(&self) -> impl Iterator<Item = &ImportSpec> {
        self.files.iter().flat_map(|f| f.imports.iter())
    }

    /// Preamble to emit above `import "C"`, or `None` when no file uses cgo.
    ///
    /// Distinct non-empty preambles are joined in file order.
    pub fn cgo_preamble(&self) -> Option<String> {
        let mut imports = self.files.iter().flat_map(|f| f.cgo.iter()).peekable();
        imports.peek()?;
        let mut preambles: Vec<&str> = Vec::new();
        for import in imports {
            let preamble = import.preamble.as_str();
            if !preamble.is_empty() && !preambles.contains(&preamble) {
                preambles.push(preamble);
            }
        }
        Some(preambles.join("\n"))
    }

    /// Declarations of every file, in file order.
    pub fn declarations(&self) -> impl Iterator<Item = &Declaration> {
        self.files.iter().flat_map(|f| f.declarations.iter())
    }
}

fn is_buildable_name(name: &OsString) -> bool {
    let name = name.to_string_lossy();
    name.ends_with(".go")
        && !name.ends_with("_test.go")
        && !name.starts_with('.')
        && !name.starts_with('_')
}

/// Directories that may hold a package given by import path.
///
/// Mirrors the default Go build context: `$GOROOT/src`, then `src` under every
/// `$GOPATH` entry, with `$HOME/go` standing in for an unset `$GOPATH`.
pub fn search_roots(
    goroot: Option<OsString>,
    gopath: Option<OsString>,
    home: Option<OsString>,
) -> Vec<PathBuf> {
    let mut roots = Vec::new();
    if let Some(goroot) = goroot.filter(|v| !v.is_empty()) {
        roots.push(PathBuf::from(goroot).join("src"));
    }
    match gopath.filter(|v| !v.is_empty()) {
        Some(gopath) => {
            roots.extend(std::env::split_paths(&gopath).map(|p| p.join("src")));
        }
        None => {
            if let Some(home) = home {
                roots.push(PathBuf::from(home).join("go").join("src"));
            }
        }
    }
    roots
}

fn search_roots_from_env() -> Vec<PathBuf> {
    search_roots(
        std::env::var_os("GOROOT"),
        std::env::var_os("GOPATH"),
        std::env::var_os("HOME"),
    )
}

/// Resolve a package identifier to its directory.
pub fn find_package(id: &str, roots: &[PathBuf]) -> Result<PathBuf> {
    let direct = Path::new(id);
    if direct.is_dir() {
        return Ok(direct.to_path_buf());
    }
    if let Some(dir) = roots.iter().map(|root| root.join(id)).find(|dir| dir.is_dir()) {
        return Ok(dir);
    }

    let mut searched = vec![direct.display().to_string()];
    searched.extend(roots.iter().map(|root| root.join(id).display().to_string()));
    Err(Box::new(Error::PackageNotFound {
        name: id.to_string(),
        searched: searched.join(", "),
    }))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn write(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    fn linux() -> BuildContext {
        BuildContext::new("linux", "amd64")
    }

    fn file_names(unit: &CompilationUnit) -> Vec<String> {
        unit.files
            .iter()
            .map(|f| f.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_load_dir_skips_tests_and_ignored_files() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "b.go", "package shapes\n\nfunc B() {}\n");
        write(temp.path(), "a.go", "package shapes\n\nfunc A() {}\n");
        write(temp.path(), "a_test.go", "package shapes_test\n");
        write(temp.path(), "_scratch.go", "package scratch\n");
        write(temp.path(), "gen.go", "//go:build ignore\n\npackage main\n\nfunc main() {}\n");
        write(temp.path(), "notes.txt", "not go");

        let unit = CompilationUnit::load_dir(temp.path(), &linux()).unwrap();

        assert_eq!(unit.package, "shapes");
        assert!(unit.is_package());
        assert_eq!(file_names(&unit), vec!["a.go", "b.go"]);
        assert_eq!(unit.declarations().count(), 2);
    }

    #[test]
    fn test_load_dir_keeps_only_host_platform_files() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "open.go", "package sys\n\nfunc Open() int { return open() }\n");
        write(temp.path(), "open_linux.go", "package sys\n\nfunc open() int { return 1 }\n");
        write(temp.path(), "open_windows.go", "package sys\n\nfunc open() int { return 2 }\n");
        write(temp.path(), "page_linux_arm64.go", "package sys\n\nconst page = 16384\n");
        write(temp.path(), "tagged.go", "//go:build plan9\n\npackage sys\n\nfunc close() {}\n");
        write(
            temp.path(),
            "either.go",
            "//go:build ignore || linux\n\npackage sys\n\nfunc either() {}\n",
        );
        write(
            temp.path(),
            "legacy.go",
            "// +build darwin,cgo freebsd\n\npackage sys\n\nfunc legacy() {}\n",
        );

        let unit = CompilationUnit::load_dir(temp.path(), &linux()).unwrap();

        assert_eq!(file_names(&unit), vec!["either.go", "open.go", "open_linux.go"]);
        let texts: Vec<_> = unit.declarations().map(|d| d.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "func either() {}",
                "func Open() int { return open() }",
                "func open() int { return 1 }",
            ]
        );
    }

    #[test]
    fn test_load_dir_for_another_platform() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "open_linux.go", "package sys\n\nfunc open() int { return 1 }\n");
        write(temp.path(), "open_windows.go", "package sys\n\nfunc open() int { return 2 }\n");
        write(temp.path(), "unix.go", "//go:build unix\n\npackage sys\n\nfunc unixOnly() {}\n");

        let unit = CompilationUnit::load_dir(temp.path(), &BuildContext::new("windows", "amd64")).unwrap();

        assert_eq!(file_names(&unit), vec!["open_windows.go"]);
    }

    #[test]
    fn test_cgo_preamble_is_merged_across_files() {
        let temp = TempDir::new().unwrap();
        write(
            temp.path(),
            "a.go",
            "package term\n\n// #include <stdio.h>\nimport \"C\"\n\nfunc A() { C.puts(nil) }\n",
        );
        write(
            temp.path(),
            "b.go",
            "package term\n\n// #include <stdio.h>\nimport \"C\"\n\nfunc B() { C.fflush(nil) }\n",
        );
        write(temp.path(), "c.go", "package term\n\nfunc c() {}\n");

        let unit = CompilationUnit::load_dir(temp.path(), &linux()).unwrap();

        assert_eq!(unit.cgo_preamble().as_deref(), Some("// #include <stdio.h>"));
        assert_eq!(unit.imports().count(), 0);
    }

    #[test]
    fn test_no_cgo_preamble_without_import_c() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "a.go", "package term\n\nimport \"fmt\"\n\nvar x = fmt.Sprint()\n");

        let unit = CompilationUnit::load_dir(temp.path(), &linux()).unwrap();

        assert_eq!(unit.cgo_preamble(), None);
    }

    #[test]
    fn test_load_dir_rejects_mixed_packages() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "a.go", "package shapes\n");
        write(temp.path(), "b.go", "package colors\n");

        let err = CompilationUnit::load_dir(temp.path(), &linux()).unwrap_err();
        assert!(matches!(*err, Error::MultiplePackages { .. }));
    }

    #[test]
    fn test_load_dir_without_sources() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "a_test.go", "package shapes\n");

        let err = CompilationUnit::load_dir(temp.path(), &linux()).unwrap_err();
        assert!(matches!(*err, Error::NoSources { .. }));
    }

    #[test]
    fn test_load_file() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "server.go", "package http\n\nimport \"fmt\"\n\nvar x = fmt.Sprint(1)\n");

        let unit = CompilationUnit::load_file(temp.path().join("server.go")).unwrap();

        assert_eq!(unit.package, "http");
        assert_eq!(
            unit.kind,
            UnitKind::File {
                stem: "server".into()
            }
        );
        assert_eq!(unit.imports().count(), 1);
    }

    #[test]
    fn test_load_missing_file() {
        let err = CompilationUnit::load("/definitely/not/here.go").unwrap_err();
        assert!(matches!(*err, Error::Io { .. }));
    }

    #[test]
    fn test_search_roots() {
        let roots = search_roots(
            Some("/usr/lib/go".into()),
            None,
            Some("/home/gopher".into()),
        );
        assert_eq!(
            roots,
            vec![
                PathBuf::from("/usr/lib/go/src"),
                PathBuf::from("/home/gopher/go/src"),
            ]
        );

        let roots = search_roots(None, Some("/work".into()), Some("/home/gopher".into()));
        assert_eq!(roots, vec![PathBuf::from("/work/src")]);
    }

    #[test]
    fn test_find_package_in_roots() {
        let temp = TempDir::new().unwrap();
        let pkg = temp.path().join("src").join("example.com").join("shapes");
        fs::create_dir_all(&pkg).unwrap();

        let found = find_package("example.com/shapes", &[temp.path().join("src")]).unwrap();
        assert_eq!(found, pkg);

        let err = find_package("example.com/missing", &[temp.path().join("src")]).unwrap_err();
        assert!(matches!(*err, Error::PackageNotFound { .. }));
    }
}
