//! Parsing a single Go source file with tree-sitter.

use std::{
    collections::HashSet,
    ops::Range,
    path::{Path, PathBuf},
};

use tree_sitter::{Node, Parser};

use crate::{
    Error, Result,
    constraint::{Constraint, file_constraint},
    decl::{CgoImport, DeclKind, Declaration, ImportSpec, OtherKind, Receiver},
};

/// A parsed Go source file.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Name from the package clause.
    pub package: String,
    /// Imports in source order, `import "C"` excluded.
    pub imports: Vec<ImportSpec>,
    /// Standalone `import "C"` declarations.
    pub cgo: Vec<CgoImport>,
    /// Top-level declarations in source order, imports excluded.
    pub declarations: Vec<Declaration>,
    /// Byte ranges of the import declarations, including attached comments.
    pub import_ranges: Vec<Range<usize>>,
    /// Identifiers used as package qualifiers, as in `fmt.Println` or `http.Client`.
    pub qualifiers: HashSet<String>,
    /// `//go:build` or `// +build` constraint from the file header.
    pub constraint: Option<Constraint>,
}

impl SourceFile {
    /// Read and parse a file from disk.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let src = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let mut file = Self::parse(&path.display().to_string(), &src)?;
        file.path = path.to_path_buf();
        Ok(file)
    }

    /// Parse source text. `filename` is only used for diagnostics.
    pub fn parse(filename: &str, src: &str) -> Result<Self> {
        let mut parser = go_parser()?;
        let tree = parser
            .parse(src, None)
            .ok_or_else(|| Box::new(Error::Parser("parsing was cancelled".into())))?;
        let root = tree.root_node();

        if root.has_error() {
            let node = first_error(root).unwrap_or(root);
            let message = if node.is_missing() {
                format!("expected `{}`", node.kind())
            } else {
                "unexpected syntax".to_string()
            };
            return Err(Error::syntax(
                filename,
                src,
                node.start_byte()..node.end_byte(),
                message,
            ));
        }

        let mut file = SourceFile {
            path: PathBuf::from(filename),
            package: String::new(),
            imports: Vec::new(),
            cgo: Vec::new(),
            declarations: Vec::new(),
            import_ranges: Vec::new(),
            qualifiers: collect_qualifiers(root, src),
            constraint: header_constraint(root, filename, src)?,
        };

        let mut cursor = root.walk();
        let items = attach_comments(root.named_children(&mut cursor));
        for item in &items {
            let node = item.node;
            match node.kind() {
                "package_clause" => {
                    file.package = node
                        .named_child(0)
                        .map(|n| text(n, src).to_string())
                        .unwrap_or_default();
                }
                "import_declaration" => {
                    let mut specs = Vec::new();
                    collect_imports(node, src, &mut specs);
                    if is_cgo_import(node, &specs) {
                        file.cgo.push(CgoImport {
                            preamble: item.doc.clone().map(|doc| src[doc].to_string()).unwrap_or_default(),
                            range: item.range(),
                        });
                    } else {
                        file.import_ranges.push(item.range());
                        file.imports.extend(specs);
                    }
                }
                "function_declaration" | "method_declaration" => {
                    let name = node
                        .child_by_field_name("name")
                        .map(|n| text(n, src).to_string())
                        .unwrap_or_default();
                    let receiver = (node.kind() == "method_declaration").then(|| receiver(node, src));
                    file.declarations.push(item.declaration(
                        DeclKind::Function { name, receiver },
                        src,
                    ));
                }
                "type_declaration" => type_declaration(item, src, &mut file.declarations),
                "const_declaration" => file.declarations.push(item.declaration(
                    DeclKind::Other {
                        kind: OtherKind::Const,
                    },
                    src,
                )),
                "var_declaration" => file.declarations.push(item.declaration(
                    DeclKind::Other {
                        kind: OtherKind::Var,
                    },
                    src,
                )),
                other => {
                    return Err(Error::syntax(
                        filename,
                        src,
                        node.start_byte()..node.end_byte(),
                        format!("unexpected top-level {}", other.replace('_', " ")),
                    ));
                }
            }
        }

        if file.package.is_empty() {
            return Err(Box::new(Error::MissingPackageClause {
                filename: filename.to_string(),
            }));
        }
        tracing::debug!(
            file = filename,
            declarations = file.declarations.len(),
            imports = file.imports.len(),
            "parsed source file"
        );
        Ok(file)
    }
}

fn go_parser() -> Result<Parser> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_go::LANGUAGE.into())
        .map_err(|e| Box::new(Error::Parser(e.to_string())))?;
    Ok(parser)
}

fn text<'s>(node: Node, src: &'s str) -> &'s str {
    &src[node.start_byte()..node.end_byte()]
}

fn first_error(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).find_map(first_error);
    found
}

/// A declaration-level node with the comments that belong to it.
struct Attached<'t> {
    node: Node<'t>,
    /// Adjacent comment block directly above the node.
    doc: Option<Range<usize>>,
    /// End of the node, extended over comments on its last line.
    end: usize,
    /// Every comment seen before this node that was not attached to anything.
    comments_before: Vec<Node<'t>>,
}

impl Attached<'_> {
    fn start(&self) -> usize {
        self.doc
            .as_ref()
            .map_or(self.node.start_byte(), |doc| doc.start)
    }

    fn range(&self) -> Range<usize> {
        self.start()..self.end
    }

    fn line(&self, src: &str) -> usize {
        src[..self.start()].matches('\n').count() + 1
    }

    fn declaration(&self, kind: DeclKind, src: &str) -> Declaration {
        Declaration {
            kind,
            text: src[self.range()].to_string(),
            line: self.line(src),
        }
    }
}

/// Pair nodes with their doc comments and trailing line comments.
///
/// A doc comment is a run of comments on consecutive lines that ends on the
/// line right above the node. A comment starting on the line where the
/// previous node ends is a trailing comment of that node.
fn attach_comments<'t>(children: impl Iterator<Item = Node<'t>>) -> Vec<Attached<'t>> {
    let mut items: Vec<Attached<'t>> = Vec::new();
    let mut pending: Vec<Node<'t>> = Vec::new();
    let mut loose: Vec<Node<'t>> = Vec::new();

    for child in children {
        if child.kind() == "comment" {
            if let Some(last) = items.last_mut() {
                if pending.is_empty() && child.start_position().row == last_row(last) {
                    last.end = child.end_byte();
                    continue;
                }
            }
            let adjacent = pending
                .last()
                .is_none_or(|prev| prev.end_position().row + 1 == child.start_position().row);
            if !adjacent {
                loose.append(&mut pending);
            }
            pending.push(child);
            continue;
        }

        let doc = match (pending.first(), pending.last()) {
            (Some(first), Some(last)) if last.end_position().row + 1 == child.start_position().row => {
                Some(first.start_byte()..last.end_byte())
            }
            _ => {
                loose.append(&mut pending);
                None
            }
        };
        pending.clear();
        items.push(Attached {
            node: child,
            doc,
            end: child.end_byte(),
            comments_before: std::mem::take(&mut loose),
        });
    }
    items
}

fn last_row(item: &Attached) -> usize {
    item.node.end_position().row
}

/// Build constraint from the line comments above the package clause.
fn header_constraint(root: Node, filename: &str, src: &str) -> Result<Option<Constraint>> {
    let mut cursor = root.walk();
    let comments: Vec<Node> = root
        .named_children(&mut cursor)
        .take_while(|n| n.kind() != "package_clause")
        .filter(|n| n.kind() == "comment")
        .collect();
    let (Some(first), Some(last)) = (comments.first(), comments.last()) else {
        return Ok(None);
    };
    file_constraint(comments.iter().map(|c| text(*c, src))).map_err(|e| {
        Error::syntax(filename, src, first.start_byte()..last.end_byte(), e.to_string())
    })
}

/// A lone `import "C"`, which cgo pairs with the comment above it.
fn is_cgo_import(node: Node, specs: &[ImportSpec]) -> bool {
    let mut cursor = node.walk();
    let grouped = node
        .named_children(&mut cursor)
        .any(|c| c.kind() == "import_spec_list");
    !grouped && matches!(specs, [spec] if spec.alias.is_none() && spec.path == "C")
}

fn collect_imports(node: Node, src: &str, out: &mut Vec<ImportSpec>) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "import_spec" => {
                let alias = child.child_by_field_name("name").map(|n| text(n, src));
                if let Some(path) = child.child_by_field_name("path") {
                    out.push(ImportSpec::new(alias, unquote(text(path, src))));
                }
            }
            "import_spec_list" => collect_imports(child, src, out),
            _ => {}
        }
    }
}

fn unquote(literal: &str) -> String {
    if let Some(raw) = literal
        .strip_prefix('`')
        .and_then(|s| s.strip_suffix('`'))
    {
        return raw.to_string();
    }
    let inner = literal
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(literal);
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn receiver(method: Node, src: &str) -> Receiver {
    let malformed = |reason: String| Receiver::Malformed { reason };

    let Some(list) = method.child_by_field_name("receiver") else {
        return malformed("missing receiver clause".into());
    };
    let mut cursor = list.walk();
    let params: Vec<Node> = list
        .named_children(&mut cursor)
        .filter(|n| n.kind() != "comment")
        .collect();
    let [param] = params.as_slice() else {
        return malformed(format!(
            "expected exactly one receiver, found {}",
            params.len()
        ));
    };
    if param.kind() != "parameter_declaration" {
        return malformed(format!("`{}` is not a valid receiver", text(*param, src)));
    }
    let mut cursor = param.walk();
    let names = param.children_by_field_name("name", &mut cursor).count();
    if names > 1 {
        return malformed(format!("`{}` declares {} receivers", text(*param, src), names));
    }
    let Some(ty) = param.child_by_field_name("type") else {
        return malformed(format!("`{}` has no type", text(*param, src)));
    };

    let ty = unparen(ty);
    let base = if ty.kind() == "pointer_type" {
        match ty.named_child(0) {
            Some(inner) => unparen(inner),
            None => return malformed(format!("`{}` is not a named type", text(ty, src))),
        }
    } else {
        ty
    };
    match base_type_name(base, src) {
        Some(type_name) => Receiver::Named { type_name },
        None => malformed(format!("`{}` is not a named type", text(ty, src))),
    }
}

fn unparen(mut node: Node) -> Node {
    while node.kind() == "parenthesized_type" {
        match node.named_child(0) {
            Some(inner) => node = inner,
            None => break,
        }
    }
    node
}

fn base_type_name(node: Node, src: &str) -> Option<String> {
    match node.kind() {
        "type_identifier" => Some(text(node, src).to_string()),
        "generic_type" => node
            .child_by_field_name("type")
            .filter(|n| n.kind() == "type_identifier")
            .map(|n| text(n, src).to_string()),
        _ => None,
    }
}

/// Emit one [`DeclKind::TypeDef`] per type spec.
///
/// A grouped `type ( ... )` is split so that every spec becomes a standalone
/// `type Name ...` declaration, keeping its own comments. The group's doc comment
/// goes to the first spec.
fn type_declaration(item: &Attached, src: &str, out: &mut Vec<Declaration>) {
    let node = item.node;
    let mut cursor = node.walk();
    let grouped = node.children(&mut cursor).any(|c| c.kind() == "(");

    if !grouped {
        if let Some(spec) = node.named_children(&mut cursor).find(|n| is_type_spec(*n)) {
            let name = type_spec_name(spec, src);
            out.push(item.declaration(DeclKind::TypeDef { name }, src));
        }
        return;
    }

    let specs = attach_comments(node.named_children(&mut cursor));
    let mut group_doc = item
        .doc
        .as_ref()
        .map(|doc| format!("{}\n", &src[doc.clone()]));
    let mut emitted = 0;
    for spec in specs.iter().filter(|s| is_type_spec(s.node)) {
        let mut rendered = group_doc.take().unwrap_or_default();
        rendered.push_str(&dedent_continuation(&src[spec.start()..spec.node.start_byte()]));
        rendered.push_str("type ");
        rendered.push_str(&dedent_continuation(&src[spec.node.start_byte()..spec.end]));

        let line = if emitted == 0 { item.line(src) } else { spec.line(src) };
        out.push(Declaration {
            kind: DeclKind::TypeDef {
                name: type_spec_name(spec.node, src),
            },
            text: rendered,
            line,
        });
        emitted += 1;
    }
    if emitted == 0 {
        tracing::debug!(line = item.line(src), "dropping empty type group");
    }
}

fn is_type_spec(node: Node) -> bool {
    matches!(node.kind(), "type_spec" | "type_alias")
}

fn type_spec_name(spec: Node, src: &str) -> String {
    spec.child_by_field_name("name")
        .map(|n| text(n, src).to_string())
        .unwrap_or_default()
}

/// Remove one level of tab indentation from every line after the first.
fn dedent_continuation(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for (i, line) in s.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
            out.push_str(line.strip_prefix('\t').unwrap_or(line));
        } else {
            out.push_str(line);
        }
    }
    out
}

fn collect_qualifiers(root: Node, src: &str) -> HashSet<String> {
    let mut found = HashSet::new();
    let mut cursor = root.walk();
    loop {
        let node = cursor.node();
        let descend = match node.kind() {
            "import_declaration" => false,
            "selector_expression" => {
                if let Some(operand) = node.child_by_field_name("operand") {
                    if operand.kind() == "identifier" {
                        found.insert(text(operand, src).to_string());
                    }
                }
                true
            }
            "qualified_type" => {
                if let Some(package) = node.child_by_field_name("package") {
                    found.insert(text(package, src).to_string());
                }
                true
            }
            _ => true,
        };
        if descend && cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return found;
            }
        }
    }
}
