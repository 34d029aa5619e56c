//! Literal glob-style pattern matching and query normalization.

use regex::{Regex, RegexBuilder};

const WILDCARD_CHARS: [char; 4] = ['*', '?', '[', ']'];

/// Returns true when `pattern` contains glob wildcard characters.
///
/// Wildcard patterns always take the literal filter path; only wildcard-free
/// queries are eligible for fuzzy matching.
pub fn has_wildcard(pattern: &str) -> bool {
    pattern.contains(WILDCARD_CHARS)
}

/// Normalizes a raw query: trims it, strips backslash escapes, and defaults
/// an empty query to the match-all wildcard.
pub fn normalize_pattern(pattern: &str) -> String {
    let unescaped = unescape(pattern.trim());
    if unescaped.is_empty() {
        "*".to_string()
    } else {
        unescaped
    }
}

fn unescape(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some(escaped) => out.push(escaped),
                None => out.push('\\'),
            }
        } else {
            out.push(ch);
        }
    }
    out
}

/// Case-insensitive glob filter with "contains" semantics: the pattern may
/// match anywhere in a path instead of anchoring to either end.
///
/// Supported syntax:
/// - `*` matches any sequence of characters except `/`
/// - `**` matches any sequence including `/` (`**/` matches zero or more
///   whole path segments)
/// - `?` matches a single character except `/`
/// - `[abc]` / `[!abc]` match a character set or its complement
#[derive(Debug)]
pub struct GlobFilter {
    regex: Regex,
}

impl GlobFilter {
    /// Compiles a filter for `pattern`. A pattern that does not translate to
    /// a valid expression degrades to literal matching of its text.
    pub fn new(pattern: &str) -> Self {
        let translated = glob_to_regex(pattern);
        let regex = match RegexBuilder::new(&translated).case_insensitive(true).build() {
            Ok(regex) => regex,
            Err(_) => RegexBuilder::new(&regex::escape(pattern))
                .case_insensitive(true)
                .build()
                .expect("escaped literal pattern is a valid regex"),
        };
        Self { regex }
    }

    /// Returns true when `path` contains a match for the pattern.
    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }
}

fn glob_to_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut chars = pattern.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '*' => {
                if chars.peek() == Some(&'*') {
                    chars.next();
                    if chars.peek() == Some(&'/') {
                        chars.next();
                        out.push_str("(?:[^/]*/)*");
                    } else {
                        out.push_str(".*");
                    }
                } else {
                    out.push_str("[^/]*");
                }
            }
            '?' => out.push_str("[^/]"),
            '[' => {
                let mut raw = String::new();
                let mut closed = false;
                for inner in chars.by_ref() {
                    if inner == ']' {
                        closed = true;
                        break;
                    }
                    raw.push(inner);
                }
                if closed && !raw.is_empty() {
                    let (negated, body) = match raw.strip_prefix('!').or_else(|| raw.strip_prefix('^')) {
                        Some(rest) => (true, rest),
                        None => (false, raw.as_str()),
                    };
                    out.push('[');
                    if negated {
                        out.push('^');
                    }
                    out.push_str(&body.replace('\\', "\\\\"));
                    out.push(']');
                } else {
                    // Unclosed or empty class matches its text literally.
                    out.push_str(&regex::escape("["));
                    out.push_str(&regex::escape(&raw));
                    if closed {
                        out.push_str(&regex::escape("]"));
                    }
                }
            }
            other => out.push_str(&regex::escape(&other.to_string())),
        }
    }
    out
}

/// Sorts directories (trailing `/`) before files; ties break in ascending
/// lexicographic byte order.
pub fn sort_paths(paths: &mut [String]) {
    paths.sort_unstable_by(|a, b| {
        let a_dir = a.ends_with('/');
        let b_dir = b.ends_with('/');
        b_dir
            .cmp(&a_dir)
            .then_with(|| a.as_bytes().cmp(b.as_bytes()))
    });
}
