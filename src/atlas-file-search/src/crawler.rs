//! Pruned, depth-bounded directory walk with crawl-result caching.

use std::path::{Path, PathBuf};
use std::time::Duration;

use ignore::WalkBuilder;
use path_absolutize::Absolutize;

use crate::cache::{CrawlCache, CrawlKey};
use crate::ignore_rules::IgnoreRules;

/// Options for one crawl invocation.
#[derive(Debug)]
pub struct CrawlOptions<'a> {
    /// Directory to walk.
    pub root: &'a Path,

    /// Output paths are re-expressed relative to this directory, which may
    /// be an ancestor of `root`.
    pub cwd: &'a Path,

    /// Compiled exclusion rules. Directories matching the directory
    /// predicate are pruned without ever being traversed.
    pub rules: &'a IgnoreRules,

    /// Maximum number of directory levels to descend below `root`.
    /// Depth 0 yields only `root` and its immediate children.
    pub max_depth: Option<usize>,

    /// Crawl-result cache, or `None` to disable caching.
    pub cache: Option<&'a CrawlCache>,

    /// TTL for the cache entry written after a successful walk.
    pub cache_ttl: Duration,
}

/// Walks `root` and returns forward-slash paths relative to `cwd`.
///
/// Directories carry a trailing `/`; the crawl root itself is the `.`
/// sentinel. A missing or unreadable root yields an empty list rather than
/// an error. On a cache hit all filesystem I/O is skipped.
pub async fn crawl(options: CrawlOptions<'_>) -> Vec<String> {
    let abs_root = absolutize(options.root);
    let abs_cwd = absolutize(options.cwd);

    let key = CrawlKey {
        root: abs_root.clone(),
        fingerprint: options.rules.fingerprint(),
        max_depth: options.max_depth,
    };

    if let Some(cache) = options.cache {
        if let Some(hit) = cache.read(&key) {
            tracing::debug!(root = %abs_root.display(), entries = hit.len(), "crawl cache hit");
            return (*hit).clone();
        }
    }

    let results = walk(&abs_root, &abs_cwd, options.rules, options.max_depth).await;

    if let Some(cache) = options.cache {
        cache.write(key, results.clone(), options.cache_ttl);
    }

    results
}

fn absolutize(path: &Path) -> PathBuf {
    path.absolutize()
        .map(|absolute| absolute.into_owned())
        .unwrap_or_else(|_| path.to_path_buf())
}

async fn walk(root: &Path, cwd: &Path, rules: &IgnoreRules, max_depth: Option<usize>) -> Vec<String> {
    // A missing or unreadable root is an empty result, never an error.
    if std::fs::read_dir(root).is_err() {
        return Vec::new();
    }

    let started = std::time::Instant::now();

    let mut builder = WalkBuilder::new(root);
    builder
        .standard_filters(false)
        .follow_links(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .max_depth(max_depth.map(|depth| depth.saturating_add(1)));

    let prune_rules = rules.clone();
    let prune_root = root.to_path_buf();
    builder.filter_entry(move |entry| {
        if !entry.file_type().is_some_and(|kind| kind.is_dir()) {
            return true;
        }
        let Ok(relative) = entry.path().strip_prefix(&prune_root) else {
            return true;
        };
        if relative.as_os_str().is_empty() {
            return true;
        }
        let qualified = format!("{}/", slashify(relative));
        !prune_rules.matches_dir(&qualified)
    });

    let mut results = Vec::new();
    for (processed, entry) in builder.build().enumerate() {
        if processed % crate::YIELD_INTERVAL == 0 {
            tokio::task::yield_now().await;
        }
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::debug!("error walking directory: {}", err);
                continue;
            }
        };
        let is_dir = entry.file_type().is_some_and(|kind| kind.is_dir());
        let Some(relative) = pathdiff::diff_paths(entry.path(), cwd) else {
            continue;
        };
        let mut path = slashify(&relative);
        if path.is_empty() {
            path.push('.');
        } else if is_dir {
            path.push('/');
        }
        results.push(path);
    }

    tracing::debug!(
        root = %root.display(),
        entries = results.len(),
        elapsed = ?started.elapsed(),
        "crawl complete"
    );

    results
}

fn slashify(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
