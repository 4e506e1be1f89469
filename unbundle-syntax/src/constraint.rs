//! Go build constraints: `//go:build` expressions, `// +build` lines and
//! `_GOOS`/`_GOARCH` file name suffixes.

use thiserror::Error;

/// Operating systems known to the Go toolchain.
const KNOWN_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "js", "linux",
    "nacl", "netbsd", "openbsd", "plan9", "solaris", "wasip1", "windows", "zos",
];

/// Architectures known to the Go toolchain.
const KNOWN_ARCH: &[&str] = &[
    "386", "amd64", "amd64p32", "arm", "armbe", "arm64", "arm64be", "loong64", "mips", "mipsle",
    "mips64", "mips64le", "mips64p32", "mips64p32le", "ppc", "ppc64", "ppc64le", "riscv",
    "riscv64", "s390", "s390x", "sparc", "sparc64", "wasm",
];

/// Operating systems satisfying the `unix` tag.
const UNIX_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "linux",
    "netbsd", "openbsd", "solaris",
];

/// Malformed constraint line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid build constraint: {0}")]
pub struct ConstraintError(String);

/// A parsed build constraint expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    Tag(String),
    Not(Box<Constraint>),
    And(Box<Constraint>, Box<Constraint>),
    Or(Box<Constraint>, Box<Constraint>),
}

impl Constraint {
    /// Parse the expression of a `//go:build` line.
    pub fn parse(expr: &str) -> Result<Self, ConstraintError> {
        let tokens = tokenize(expr)?;
        let mut parser = ExprParser { tokens, pos: 0 };
        let constraint = parser.or()?;
        match parser.tokens.get(parser.pos) {
            None => Ok(constraint),
            Some(token) => Err(ConstraintError(format!("unexpected {} in {:?}", token, expr))),
        }
    }

    /// Parse the options of one `// +build` line.
    ///
    /// Space-separated options are alternatives, comma-separated terms must all hold.
    pub fn parse_plus_build(line: &str) -> Result<Self, ConstraintError> {
        let mut any: Option<Constraint> = None;
        for option in line.split_whitespace() {
            let mut all: Option<Constraint> = None;
            for term in option.split(',') {
                let (negated, tag) = match term.strip_prefix('!') {
                    Some(tag) => (true, tag),
                    None => (false, term),
                };
                if !is_valid_tag(tag) {
                    return Err(ConstraintError(format!("bad +build term {:?}", term)));
                }
                let mut term = Constraint::Tag(tag.to_string());
                if negated {
                    term = Constraint::Not(Box::new(term));
                }
                all = Some(match all {
                    Some(prev) => Constraint::And(Box::new(prev), Box::new(term)),
                    None => term,
                });
            }
            if let Some(all) = all {
                any = Some(match any {
                    Some(prev) => Constraint::Or(Box::new(prev), Box::new(all)),
                    None => all,
                });
            }
        }
        any.ok_or_else(|| ConstraintError("empty +build line".into()))
    }

    /// Evaluate with `has_tag` deciding which tags are set.
    pub fn eval(&self, has_tag: &impl Fn(&str) -> bool) -> bool {
        match self {
            Constraint::Tag(tag) => has_tag(tag.as_str()),
            Constraint::Not(inner) => !inner.eval(has_tag),
            Constraint::And(a, b) => a.eval(has_tag) && b.eval(has_tag),
            Constraint::Or(a, b) => a.eval(has_tag) || b.eval(has_tag),
        }
    }
}

/// Combine the constraint comments of a file header.
///
/// A `//go:build` line wins over `// +build` lines; several `// +build` lines
/// must all hold. Returns `None` for an unconstrained file.
pub fn file_constraint<'a>(
    comments: impl IntoIterator<Item = &'a str>,
) -> Result<Option<Constraint>, ConstraintError> {
    let mut plus_build: Option<Constraint> = None;
    for comment in comments {
        if let Some(expr) = comment.strip_prefix("//go:build") {
            if expr.starts_with(char::is_whitespace) {
                return Constraint::parse(expr).map(Some);
            }
        } else if let Some(line) = comment.strip_prefix("// +build") {
            if line.is_empty() || line.starts_with(char::is_whitespace) {
                let line = Constraint::parse_plus_build(line)?;
                plus_build = Some(match plus_build {
                    Some(prev) => Constraint::And(Box::new(prev), Box::new(line)),
                    None => line,
                });
            }
        }
    }
    Ok(plus_build)
}

fn is_valid_tag(tag: &str) -> bool {
    !tag.is_empty()
        && tag
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '.')
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Tag(String),
    Not,
    And,
    Or,
    Open,
    Close,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Tag(tag) => write!(f, "tag {:?}", tag),
            Token::Not => write!(f, "`!`"),
            Token::And => write!(f, "`&&`"),
            Token::Or => write!(f, "`||`"),
            Token::Open => write!(f, "`(`"),
            Token::Close => write!(f, "`)`"),
        }
    }
}

fn tokenize(expr: &str) -> Result<Vec<Token>, ConstraintError> {
    let mut tokens = Vec::new();
    let mut chars = expr.char_indices().peekable();
    while let Some((start, c)) = chars.next() {
        match c {
            c if c.is_whitespace() => {}
            '!' => tokens.push(Token::Not),
            '(' => tokens.push(Token::Open),
            ')' => tokens.push(Token::Close),
            '&' | '|' => {
                if chars.next_if(|&(_, next)| next == c).is_none() {
                    return Err(ConstraintError(format!("expected `{c}{c}` in {:?}", expr)));
                }
                tokens.push(if c == '&' { Token::And } else { Token::Or });
            }
            c if c.is_alphanumeric() || c == '_' || c == '.' => {
                let mut end = start + c.len_utf8();
                while let Some((i, next)) =
                    chars.next_if(|&(_, next)| next.is_alphanumeric() || next == '_' || next == '.')
                {
                    end = i + next.len_utf8();
                }
                tokens.push(Token::Tag(expr[start..end].to_string()));
            }
            other => {
                return Err(ConstraintError(format!("unexpected {:?} in {:?}", other, expr)));
            }
        }
    }
    Ok(tokens)
}

struct ExprParser {
    tokens: Vec<Token>,
    pos: usize,
}

impl ExprParser {
    fn next_is(&mut self, token: &Token) -> bool {
        if self.tokens.get(self.pos) == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn or(&mut self) -> Result<Constraint, ConstraintError> {
        let mut left = self.and()?;
        while self.next_is(&Token::Or) {
            left = Constraint::Or(Box::new(left), Box::new(self.and()?));
        }
        Ok(left)
    }

    fn and(&mut self) -> Result<Constraint, ConstraintError> {
        let mut left = self.not()?;
        while self.next_is(&Token::And) {
            left = Constraint::And(Box::new(left), Box::new(self.not()?));
        }
        Ok(left)
    }

    fn not(&mut self) -> Result<Constraint, ConstraintError> {
        if self.next_is(&Token::Not) {
            return Ok(Constraint::Not(Box::new(self.not()?)));
        }
        if self.next_is(&Token::Open) {
            let inner = self.or()?;
            if !self.next_is(&Token::Close) {
                return Err(ConstraintError("missing `)`".into()));
            }
            return Ok(inner);
        }
        match self.tokens.get(self.pos).cloned() {
            Some(Token::Tag(tag)) => {
                self.pos += 1;
                Ok(Constraint::Tag(tag))
            }
            Some(token) => Err(ConstraintError(format!("unexpected {}", token))),
            None => Err(ConstraintError("unexpected end of expression".into())),
        }
    }
}

/// Target platform that build constraints are evaluated against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildContext {
    pub goos: String,
    pub goarch: String,
    pub cgo: bool,
}

impl BuildContext {
    pub fn new(goos: impl Into<String>, goarch: impl Into<String>) -> Self {
        Self {
            goos: goos.into(),
            goarch: goarch.into(),
            cgo: true,
        }
    }

    /// The host platform, overridden by `$GOOS`, `$GOARCH` and `$CGO_ENABLED`.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        let mut ctx = Self::new(
            var("GOOS").unwrap_or_else(|| host_os().to_string()),
            var("GOARCH").unwrap_or_else(|| host_arch().to_string()),
        );
        ctx.cgo = var("CGO_ENABLED").as_deref() != Some("0");
        ctx
    }

    /// Whether a build tag is satisfied.
    ///
    /// Besides the OS and architecture, `unix`, `gc`, `cgo` and every `go1.N`
    /// release tag are set. `ignore` never is.
    pub fn has_tag(&self, tag: &str) -> bool {
        let goos = self.goos.as_str();
        tag == goos
            || tag == self.goarch
            || tag == "gc"
            || (tag == "cgo" && self.cgo)
            || (tag == "unix" && UNIX_OS.contains(&goos))
            || (tag == "linux" && goos == "android")
            || (tag == "solaris" && goos == "illumos")
            || (tag == "darwin" && goos == "ios")
            || is_release_tag(tag)
    }

    /// Whether a constraint holds for this platform.
    pub fn matches(&self, constraint: &Constraint) -> bool {
        constraint.eval(&|tag: &str| self.has_tag(tag))
    }

    /// Whether the `_GOOS`, `_GOARCH` or `_GOOS_GOARCH` suffix of a file name,
    /// if any, matches this platform.
    pub fn matches_file_name(&self, name: &str) -> bool {
        let name = name.split('.').next().unwrap_or(name);
        let Some(underscore) = name.find('_') else {
            return true;
        };
        let mut parts: Vec<&str> = name[underscore..].split('_').collect();
        if parts.last() == Some(&"test") {
            parts.pop();
        }
        match parts.as_slice() {
            [.., os, arch] if KNOWN_OS.contains(os) && KNOWN_ARCH.contains(arch) => {
                self.has_tag(os) && self.has_tag(arch)
            }
            [.., last] if KNOWN_OS.contains(last) || KNOWN_ARCH.contains(last) => {
                self.has_tag(last)
            }
            _ => true,
        }
    }
}

fn is_release_tag(tag: &str) -> bool {
    tag.strip_prefix("go1.")
        .is_some_and(|minor| !minor.is_empty() && minor.chars().all(|c| c.is_ascii_digit()))
}

fn host_os() -> &'static str {
    match std::env::consts::OS {
        "macos" => "darwin",
        os => os,
    }
}

fn host_arch() -> &'static str {
    let little = cfg!(target_endian = "little");
    match std::env::consts::ARCH {
        "x86_64" => "amd64",
        "x86" => "386",
        "aarch64" => "arm64",
        "loongarch64" => "loong64",
        "powerpc" => "ppc",
        "powerpc64" if little => "ppc64le",
        "powerpc64" => "ppc64",
        "mips" if little => "mipsle",
        "mips64" if little => "mips64le",
        "wasm32" => "wasm",
        arch => arch,
    }
}
