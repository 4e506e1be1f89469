//! Shared naming rules.

/// Convert a Go identifier to a snake_case file stem (e.g., "HTTPServer" -> "http_server").
///
/// An upper-case letter gets a separator when it follows a lower-case letter or
/// precedes one, so acronyms stay in one piece. A digit following a non-digit
/// also gets a separator. No separator is ever added right after an existing `_`.
pub fn to_snake_case(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let is_lower = |idx: usize| chars.get(idx).is_some_and(|c| c.is_lowercase());

    let mut out = String::with_capacity(chars.len() + chars.len() / 2);
    for (i, &c) in chars.iter().enumerate() {
        let at_boundary = i == 0 || chars[i - 1] == '_';
        if c.is_uppercase() {
            if !at_boundary && (is_lower(i - 1) || is_lower(i + 1)) {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            if !at_boundary && c.is_numeric() && !chars[i - 1].is_numeric() {
                out.push('_');
            }
            out.push(c);
        }
    }
    out
}

/// Whether a Go identifier is exported, i.e. starts with an upper-case letter.
pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}
