//! Recipe parser (C3): pulls dependency-ish array fields out of a PKGBUILD
//! body without a shell. Grounded in `cower`'s `parse_bash_array`/
//! `pkgbuild_get_extinfo` (original_source/cower.c): recognize a fixed set
//! of `name=(...)` array assignments, find the matching close paren by
//! tracking nesting depth (arrays can embed a `$(...)` command
//! substitution and can span multiple lines), then tokenize the array body.
//!
//! `optdepends` gets its own tokenizer: unlike the other arrays its entries
//! are `name: free-form description` pairs, which only survive intact when
//! quoted, so it does not go through the whitespace-split path the rest use.
use std::collections::HashSet;

const FIELDS: &[(&str, Field)] = &[
    ("depends=(", Field::Depends),
    ("makedepends=(", Field::Makedepends),
    ("optdepends=(", Field::Optdepends),
    ("provides=(", Field::Provides),
    ("conflicts=(", Field::Conflicts),
    ("replaces=(", Field::Replaces),
];

#[derive(Clone, Copy, PartialEq, Eq)]
enum Field {
    Depends,
    Makedepends,
    Optdepends,
    Provides,
    Conflicts,
    Replaces,
}

#[derive(Clone, Debug, Default)]
pub struct RecipeFields {
    pub depends: Vec<String>,
    pub makedepends: Vec<String>,
    pub optdepends: Vec<String>,
    pub provides: Vec<String>,
    pub conflicts: Vec<String>,
    pub replaces: Vec<String>,
}

/// Scan a PKGBUILD body for the six array assignments this client cares
/// about and tokenize each one found. Arrays that never appear are left
/// empty; arrays that appear more than once (unusual, but not forbidden)
/// have their entries accumulated in file order.
pub fn parse_recipe(body: &str) -> RecipeFields {
    let mut out = RecipeFields::default();
    for &(prefix, field) in FIELDS {
        for array_body in find_array_bodies(body, prefix) {
            let tokens = if field == Field::Optdepends {
                tokenize_optdepends(&array_body)
            } else {
                tokenize_words(&array_body)
            };
            let dst = match field {
                Field::Depends => &mut out.depends,
                Field::Makedepends => &mut out.makedepends,
                Field::Optdepends => &mut out.optdepends,
                Field::Provides => &mut out.provides,
                Field::Conflicts => &mut out.conflicts,
                Field::Replaces => &mut out.replaces,
            };
            dst.extend(tokens);
        }
    }
    out
}

/// Find every occurrence of `prefix` (e.g. `"depends=("`) that begins a
/// trimmed line, and return the text between its opening paren and the
/// matching close, tracking nesting depth so an embedded `$(...)` doesn't
/// end the array early.
fn find_array_bodies(body: &str, prefix: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut search_from = 0;
    while let Some(rel) = body[search_from..].find(prefix) {
        let start = search_from + rel;
        let line_start = body[..start].rfind('\n').map(|i| i + 1).unwrap_or(0);
        if !body[line_start..start].trim().is_empty() {
            search_from = start + prefix.len();
            continue;
        }

        let paren_start = start + prefix.len() - 1;
        let bytes = body.as_bytes();
        let mut depth = 0i32;
        let mut i = paren_start;
        let mut close = None;
        while i < bytes.len() {
            match bytes[i] {
                b'(' => depth += 1,
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        close = Some(i);
                        break;
                    }
                }
                _ => {}
            }
            i += 1;
        }

        match close {
            Some(end) => {
                out.push(body[paren_start + 1..end].to_string());
                search_from = end + 1;
            }
            None => break,
        }
    }
    out
}

/// Split on whitespace, treat a `#`-leading word as starting a
/// comment that runs to end of line, unquote the remaining words, drop
/// anything under two characters or starting with `$` (unexpandable
/// variable references), and dedupe in first-seen order.
fn tokenize_words(array_body: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    for line in array_body.split('\n') {
        for word in line.split_whitespace() {
            if word.starts_with('#') {
                break;
            }
            let token = unquote(word);
            if token.chars().count() < 2 || token.starts_with('$') {
                continue;
            }
            if seen.insert(token.to_string()) {
                out.push(token.to_string());
            }
        }
    }
    out
}

fn unquote(word: &str) -> &str {
    let mut chars = word.chars();
    match chars.next() {
        Some(q @ ('\'' | '"')) => word[1..].rfind(q).map(|pos| &word[1..1 + pos]).unwrap_or(word),
        _ => word,
    }
}

/// `optdepends` entries are either a quoted `name: description` string or a
/// bare word with no description; neither form is dedup'd, matching the
/// original's append-only handling of this one array.
fn tokenize_optdepends(array_body: &str) -> Vec<String> {
    let mut out = Vec::new();
    let bytes = array_body.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i] as char;
        if c == '\'' || c == '"' {
            let start = i + 1;
            match array_body[start..].find(c) {
                Some(rel) => {
                    let token = array_body[start..start + rel].trim();
                    if !token.is_empty() {
                        out.push(token.to_string());
                    }
                    i = start + rel + 1;
                }
                None => break,
            }
        } else if c.is_alphabetic() {
            let start = i;
            while i < bytes.len() && !(bytes[i] as char).is_whitespace() {
                i += 1;
            }
            let token = array_body[start..i].trim();
            if !token.is_empty() {
                out.push(token.to_string());
            }
        } else {
            i += 1;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_arrays() {
        let pkgbuild = r#"
pkgname=foo
pkgver=1.0
depends=('glibc' 'openssl>=1.1')
makedepends=(cmake ninja)
provides=('foo=1.0')
"#;
        let fields = parse_recipe(pkgbuild);
        assert_eq!(fields.depends, vec!["glibc", "openssl>=1.1"]);
        assert_eq!(fields.makedepends, vec!["cmake", "ninja"]);
        assert_eq!(fields.provides, vec!["foo=1.0"]);
        assert!(fields.conflicts.is_empty());
    }

    #[test]
    fn skips_comments_short_and_variable_tokens() {
        let pkgbuild = "depends=(glibc # a comment with bar baz\n  a '$foo' 'zlib')\n";
        let fields = parse_recipe(pkgbuild);
        assert_eq!(fields.depends, vec!["glibc", "zlib"]);
    }

    #[test]
    fn handles_multiline_array() {
        let pkgbuild = "depends=(\n  'glibc'\n  'zlib'\n)\n";
        let fields = parse_recipe(pkgbuild);
        assert_eq!(fields.depends, vec!["glibc", "zlib"]);
    }

    #[test]
    fn optdepends_keeps_descriptions() {
        let pkgbuild =
            "optdepends=('foo: needed for bar support' 'baz: optional plugin'\n  qux)\n";
        let fields = parse_recipe(pkgbuild);
        assert_eq!(
            fields.optdepends,
            vec![
                "foo: needed for bar support",
                "baz: optional plugin",
                "qux",
            ]
        );
    }

    #[test]
    fn deduplicates_repeated_entries() {
        let pkgbuild = "depends=('glibc' 'glibc' 'zlib')\n";
        let fields = parse_recipe(pkgbuild);
        assert_eq!(fields.depends, vec!["glibc", "zlib"]);
    }
}
