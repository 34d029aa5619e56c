//! Gitignore-style exclusion rules compiled into directory and file predicates.

use std::path::Path;

use ignore::gitignore::{Gitignore, GitignoreBuilder};

/// Compiled ignore rules.
///
/// Pattern lines are classified when added. A line is directory-excluding
/// when it is directory-only (trailing `/`, not negated) or when its final
/// path segment contains no extension-like dot. The dot heuristic is an
/// approximation: it prunes likely-directory names early without
/// mis-handling dotted file patterns, and the file predicate remains the
/// correctness backstop for anything it misclassifies. Negated lines follow
/// the same classification, so whitelisting is encoded into the directory
/// predicate itself rather than checked after the fact.
#[derive(Debug, Clone)]
pub struct IgnoreRules {
    patterns: Vec<String>,
    dir_lines: Vec<String>,
    file_lines: Vec<String>,
    dir_matcher: Gitignore,
    file_matcher: Gitignore,
}

impl Default for IgnoreRules {
    fn default() -> Self {
        Self::new()
    }
}

impl IgnoreRules {
    /// Creates an empty rule set.
    pub fn new() -> Self {
        Self {
            patterns: Vec::new(),
            dir_lines: Vec::new(),
            file_lines: Vec::new(),
            dir_matcher: Gitignore::empty(),
            file_matcher: Gitignore::empty(),
        }
    }

    /// Adds one pattern or raw multi-line ignore file text.
    ///
    /// Lines are trimmed; blank lines and `#` comments are dropped. Surviving
    /// lines are kept in insertion order, so later patterns (including
    /// negations) override earlier ones.
    pub fn add(&mut self, text: &str) -> &mut Self {
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            self.patterns.push(line.to_string());
            if is_directory_excluding(line) {
                self.dir_lines.push(line.to_string());
            }
            let directory_only = line.ends_with('/') && !line.starts_with('!');
            if !directory_only {
                self.file_lines.push(line.to_string());
            }
        }
        self.dir_matcher = compile(&self.dir_lines);
        self.file_matcher = compile(&self.file_lines);
        self
    }

    /// Returns true when a directory should be pruned from a crawl.
    ///
    /// `path` is relative to the project root and qualified with a trailing
    /// slash, e.g. `build/` or `src/generated/`.
    pub fn matches_dir(&self, path: &str) -> bool {
        let path = path.strip_suffix('/').unwrap_or(path);
        if path.is_empty() {
            return false;
        }
        self.dir_matcher.matched(Path::new(path), true).is_ignore()
    }

    /// Returns true when a file should be dropped from search results.
    pub fn matches_file(&self, path: &str) -> bool {
        if path.is_empty() {
            return false;
        }
        self.file_matcher
            .matched(Path::new(path), false)
            .is_ignore()
    }

    /// Order-sensitive serialization of all active patterns.
    ///
    /// Two rule sets are interchangeable for caching purposes iff their
    /// fingerprints are byte-identical.
    pub fn fingerprint(&self) -> String {
        self.patterns.join("\n")
    }

    /// Returns the number of active patterns.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Returns whether no patterns have been added.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

fn is_directory_excluding(line: &str) -> bool {
    let body = line.strip_prefix('!').unwrap_or(line);
    if body.ends_with('/') {
        return true;
    }
    let last_segment = body.rsplit('/').next().unwrap_or(body);
    !last_segment.contains('.')
}

fn compile(lines: &[String]) -> Gitignore {
    let mut builder = GitignoreBuilder::new("");
    for line in lines {
        if let Err(err) = builder.add_line(None, line) {
            tracing::warn!("invalid ignore pattern '{}': {}", line, err);
        }
    }
    match builder.build() {
        Ok(matcher) => matcher,
        Err(err) => {
            tracing::warn!("failed to compile ignore rules: {}", err);
            Gitignore::empty()
        }
    }
}
