//! Search engine orchestration: the full-index and lazy directory variants.

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::cache::CrawlCache;
use crate::config::{ATLAS_IGNORE_FILE, SearchConfig};
use crate::crawler::{CrawlOptions, crawl};
use crate::error::{SearchError, SearchResult};
use crate::fuzzy::FuzzyIndex;
use crate::ignore_rules::IgnoreRules;
use crate::matcher::{self, GlobFilter};
use crate::result_cache::ResultCache;

/// Per-call options for [`FileSearchEngine::search`].
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    /// Cooperative cancellation token, observed at fixed scan intervals.
    pub cancel: Option<CancellationToken>,

    /// Stop accumulating results once this many entries are collected.
    pub max_results: Option<usize>,
}

/// File path search engine.
///
/// The recursive variant indexes the whole tree once at initialize time and
/// answers every query from that index; the directory variant skips whole-
/// tree indexing and lists a single directory lazily per query.
#[derive(Debug)]
pub enum FileSearchEngine {
    /// Full-index engine.
    Recursive(RecursiveSearch),
    /// Lazy per-directory engine.
    Directory(DirectorySearch),
}

impl FileSearchEngine {
    /// Creates the engine variant selected by the configuration.
    pub fn new(config: SearchConfig, crawl_cache: CrawlCache) -> Self {
        if config.enable_recursive_search {
            Self::Recursive(RecursiveSearch::new(config, crawl_cache))
        } else {
            Self::Directory(DirectorySearch::new(config, crawl_cache))
        }
    }

    /// Builds the engine state. Must complete before any `search` call.
    pub async fn initialize(&mut self) -> SearchResult<()> {
        match self {
            Self::Recursive(engine) => engine.initialize().await,
            Self::Directory(engine) => engine.initialize().await,
        }
    }

    /// Searches for paths matching `pattern`.
    ///
    /// Fails with [`SearchError::NotInitialized`] before `initialize`, and
    /// with [`SearchError::Cancelled`] when the cancellation token is
    /// observed mid-scan; a cancelled search never returns partial results.
    pub async fn search(
        &self,
        pattern: &str,
        options: SearchOptions,
    ) -> SearchResult<Vec<String>> {
        match self {
            Self::Recursive(engine) => engine.search(pattern, options).await,
            Self::Directory(engine) => engine.search(pattern, options).await,
        }
    }
}

struct Ready {
    rules: IgnoreRules,
    result_cache: RwLock<ResultCache>,
    fuzzy: Option<FuzzyIndex>,
}

impl std::fmt::Debug for Ready {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ready")
            .field("rules", &self.rules.len())
            .field("fuzzy", &self.fuzzy.is_some())
            .finish()
    }
}

/// Full-index engine: one crawl at initialize time, every query answered
/// from the resulting index through the result cache.
#[derive(Debug)]
pub struct RecursiveSearch {
    config: SearchConfig,
    crawl_cache: CrawlCache,
    state: Option<Ready>,
}

impl RecursiveSearch {
    /// Creates an uninitialized engine.
    pub fn new(config: SearchConfig, crawl_cache: CrawlCache) -> Self {
        Self {
            config,
            crawl_cache,
            state: None,
        }
    }

    /// Compiles ignore rules, crawls the project tree into the file index,
    /// and builds the result cache and (unless disabled) the fuzzy index.
    pub async fn initialize(&mut self) -> SearchResult<()> {
        let rules = load_ignore_rules(&self.config);
        let index = crawl(CrawlOptions {
            root: &self.config.project_root,
            cwd: &self.config.project_root,
            rules: &rules,
            max_depth: self.config.max_depth,
            cache: self.config.cache.then_some(&self.crawl_cache),
            cache_ttl: Duration::from_secs(self.config.cache_ttl_seconds),
        })
        .await;
        let index = Arc::new(index);

        let fuzzy = self
            .config
            .enable_fuzzy_search
            .then(|| FuzzyIndex::build(index.clone()));

        self.state = Some(Ready {
            rules,
            result_cache: RwLock::new(ResultCache::new(index)),
            fuzzy,
        });
        Ok(())
    }

    /// Searches the file index for `pattern`.
    pub async fn search(
        &self,
        pattern: &str,
        options: SearchOptions,
    ) -> SearchResult<Vec<String>> {
        let ready = self.state.as_ref().ok_or(SearchError::NotInitialized)?;
        let cancel = options.cancel.as_ref();
        let pattern = matcher::normalize_pattern(pattern);

        let (candidates, exact) = ready.result_cache.read().await.get(&pattern);

        let chosen = if exact {
            candidates
        } else {
            match &ready.fuzzy {
                Some(fuzzy) if !matcher::has_wildcard(&pattern) => {
                    match fuzzy.search(&pattern, cancel).await {
                        Ok(matched) => {
                            let matched = Arc::new(matched);
                            ready
                                .result_cache
                                .write()
                                .await
                                .set(&pattern, matched.clone());
                            matched
                        }
                        Err(SearchError::Cancelled) => return Err(SearchError::Cancelled),
                        Err(err) => {
                            // Degraded to an empty result for this call only;
                            // the failure is never cached.
                            tracing::debug!("fuzzy match failed for '{}': {}", pattern, err);
                            Arc::new(Vec::new())
                        }
                    }
                }
                _ => {
                    let matched =
                        Arc::new(literal_filter(&candidates, &pattern, cancel).await?);
                    ready
                        .result_cache
                        .write()
                        .await
                        .set(&pattern, matched.clone());
                    matched
                }
            }
        };

        post_process(&chosen, &ready.rules, &options).await
    }
}

/// Lazy engine: compiles ignore rules only, then lists one directory per
/// query with a depth-0 crawl instead of indexing the whole tree.
#[derive(Debug)]
pub struct DirectorySearch {
    config: SearchConfig,
    crawl_cache: CrawlCache,
    rules: Option<IgnoreRules>,
}

impl DirectorySearch {
    /// Creates an uninitialized engine.
    pub fn new(config: SearchConfig, crawl_cache: CrawlCache) -> Self {
        Self {
            config,
            crawl_cache,
            rules: None,
        }
    }

    /// Compiles ignore rules. No index is built in this variant.
    pub async fn initialize(&mut self) -> SearchResult<()> {
        self.rules = Some(load_ignore_rules(&self.config));
        Ok(())
    }

    /// Lists the directory derived from `pattern` and filters it.
    pub async fn search(
        &self,
        pattern: &str,
        options: SearchOptions,
    ) -> SearchResult<Vec<String>> {
        let rules = self.rules.as_ref().ok_or(SearchError::NotInitialized)?;
        let cancel = options.cancel.as_ref();
        let pattern = matcher::normalize_pattern(pattern);

        // The target is the pattern's own directory: its trailing-slash form,
        // or the parent of a non-slash-terminated pattern.
        let dir_part = match pattern.rfind('/') {
            Some(end) => &pattern[..=end],
            None => "",
        };
        let target = self.config.project_root.join(dir_part);

        let listing = crawl(CrawlOptions {
            root: &target,
            cwd: &self.config.project_root,
            rules,
            max_depth: Some(0),
            cache: self.config.cache.then_some(&self.crawl_cache),
            cache_ttl: Duration::from_secs(self.config.cache_ttl_seconds),
        })
        .await;

        let matched = literal_filter(&listing, &pattern, cancel).await?;
        post_process(&matched, rules, &options).await
    }
}

/// Loads the configured ignore sources into one compiled rule set.
///
/// `.git/` and caller-supplied directories are always excluded, independent
/// of any loaded ignore file.
fn load_ignore_rules(config: &SearchConfig) -> IgnoreRules {
    let mut rules = IgnoreRules::new();
    if config.use_gitignore {
        if let Ok(text) = fs::read_to_string(config.project_root.join(".gitignore")) {
            rules.add(&text);
        }
    }
    if config.use_custom_ignore_file {
        if let Ok(text) = fs::read_to_string(config.project_root.join(ATLAS_IGNORE_FILE)) {
            rules.add(&text);
        }
    }
    rules.add(".git/");
    for dir in &config.ignore_dirs {
        if dir.ends_with('/') {
            rules.add(dir);
        } else {
            rules.add(&format!("{dir}/"));
        }
    }
    rules
}

/// Applies the case-insensitive contains glob over `candidates` and sorts
/// the matches directories-first.
async fn literal_filter(
    candidates: &[String],
    pattern: &str,
    cancel: Option<&CancellationToken>,
) -> SearchResult<Vec<String>> {
    let filter = GlobFilter::new(pattern);
    let mut matched = Vec::new();
    for (processed, path) in candidates.iter().enumerate() {
        crate::checkpoint(processed, cancel).await?;
        if filter.is_match(path) {
            matched.push(path.clone());
        }
    }
    matcher::sort_paths(&mut matched);
    Ok(matched)
}

/// Streams the chosen result set to the caller's list: drops the root
/// sentinel, drops file entries matching the file-exclude predicate
/// (directories were already pruned at crawl time), and stops accumulating
/// at the result cap rather than truncating afterwards.
async fn post_process(
    candidates: &[String],
    rules: &IgnoreRules,
    options: &SearchOptions,
) -> SearchResult<Vec<String>> {
    let max_results = options.max_results.unwrap_or(usize::MAX);
    let cancel = options.cancel.as_ref();

    let mut results = Vec::new();
    for (processed, path) in candidates.iter().enumerate() {
        crate::checkpoint(processed, cancel).await?;
        if results.len() >= max_results {
            break;
        }
        if path == "." {
            continue;
        }
        if !path.ends_with('/') && rules.matches_file(path) {
            continue;
        }
        results.push(path.clone());
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn project() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::create_dir_all(root.join("tests")).unwrap();
        fs::write(root.join("Cargo.toml"), "[package]").unwrap();
        fs::write(root.join("src/main.rs"), "fn main() {}").unwrap();
        fs::write(root.join("src/lib.rs"), "").unwrap();
        fs::write(root.join("tests/smoke.rs"), "").unwrap();
        dir
    }

    async fn engine_for(root: &Path) -> FileSearchEngine {
        let mut engine =
            FileSearchEngine::new(SearchConfig::new(root), CrawlCache::new());
        engine.initialize().await.unwrap();
        engine
    }

    #[tokio::test]
    async fn test_search_before_initialize_is_an_error() {
        let dir = project();
        let engine =
            FileSearchEngine::new(SearchConfig::new(dir.path()), CrawlCache::new());
        let err = engine
            .search("main", SearchOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::NotInitialized));

        let config = SearchConfig::builder(dir.path())
            .enable_recursive_search(false)
            .build();
        let engine = FileSearchEngine::new(config, CrawlCache::new());
        let err = engine
            .search("main", SearchOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::NotInitialized));
    }

    #[tokio::test]
    async fn test_empty_query_lists_everything_directories_first() {
        let dir = project();
        let engine = engine_for(dir.path()).await;
        let results = engine.search("", SearchOptions::default()).await.unwrap();

        assert_eq!(
            results,
            vec![
                "src/".to_string(),
                "tests/".to_string(),
                "Cargo.toml".to_string(),
                "src/lib.rs".to_string(),
                "src/main.rs".to_string(),
                "tests/smoke.rs".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_literal_match_is_case_insensitive() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("File1.Js"), "").unwrap();
        fs::write(dir.path().join("file2.js"), "").unwrap();
        fs::write(dir.path().join("FILE3.JS"), "").unwrap();

        let engine = engine_for(dir.path()).await;
        let results = engine
            .search("FILE*.JS", SearchOptions::default())
            .await
            .unwrap();

        assert_eq!(
            results,
            vec![
                "FILE3.JS".to_string(),
                "File1.Js".to_string(),
                "file2.js".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_max_results_caps_cached_exact_hits() {
        let dir = project();
        let engine = engine_for(dir.path()).await;

        let full = engine.search("", SearchOptions::default()).await.unwrap();
        assert!(full.len() > 2);

        // The second identical query is an exact cache hit; the cap still
        // applies after the lookup.
        let capped = engine
            .search(
                "",
                SearchOptions {
                    max_results: Some(2),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(capped, full[..2].to_vec());
    }

    #[tokio::test]
    async fn test_cancellation_is_a_distinct_outcome() {
        let dir = project();
        let engine = engine_for(dir.path()).await;

        let token = CancellationToken::new();
        token.cancel();
        let err = engine
            .search(
                "",
                SearchOptions {
                    cancel: Some(token),
                    max_results: None,
                },
            )
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn test_layered_ignore_files_are_honored() {
        let dir = project();
        let root = dir.path();
        fs::create_dir_all(root.join("dist")).unwrap();
        fs::create_dir_all(root.join("build")).unwrap();
        fs::write(root.join("dist/ignored.js"), "").unwrap();
        fs::write(root.join("build/ignored.js"), "").unwrap();
        fs::write(root.join("src/kept.js"), "").unwrap();
        fs::write(root.join(".gitignore"), "dist/\n").unwrap();
        fs::write(root.join(ATLAS_IGNORE_FILE), "build/\n").unwrap();

        let engine = engine_for(root).await;
        let results = engine.search("", SearchOptions::default()).await.unwrap();

        assert!(results.contains(&"src/kept.js".to_string()));
        assert!(!results.contains(&"dist/ignored.js".to_string()));
        assert!(!results.contains(&"build/ignored.js".to_string()));
        assert!(!results.contains(&"dist/".to_string()));
        assert!(!results.contains(&"build/".to_string()));
    }

    #[tokio::test]
    async fn test_negated_patterns_restore_whitelisted_subtrees() {
        let dir = project();
        let root = dir.path();
        fs::create_dir_all(root.join("build/public")).unwrap();
        fs::create_dir_all(root.join("build/other")).unwrap();
        fs::write(root.join("build/public/app.js"), "").unwrap();
        fs::write(root.join("build/other/out.js"), "").unwrap();
        fs::write(root.join("build/stray.js"), "").unwrap();
        fs::write(
            root.join(".gitignore"),
            "build/**\n!build/public\n!build/public/**\n",
        )
        .unwrap();

        let engine = engine_for(root).await;
        let results = engine.search("", SearchOptions::default()).await.unwrap();

        assert!(results.contains(&"build/public/".to_string()));
        assert!(results.contains(&"build/public/app.js".to_string()));
        assert!(!results.contains(&"build/other/".to_string()));
        assert!(!results.contains(&"build/other/out.js".to_string()));
        assert!(!results.contains(&"build/stray.js".to_string()));
    }

    #[tokio::test]
    async fn test_git_directory_is_always_excluded() {
        let dir = project();
        let root = dir.path();
        fs::create_dir_all(root.join(".git/objects")).unwrap();
        fs::write(root.join(".git/HEAD"), "").unwrap();

        let engine = engine_for(root).await;
        let results = engine.search("", SearchOptions::default()).await.unwrap();

        assert!(results.iter().all(|path| !path.starts_with(".git/")));
    }

    #[tokio::test]
    async fn test_ignore_dirs_are_appended_to_the_rules() {
        let dir = project();
        let root = dir.path();
        fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        fs::write(root.join("node_modules/pkg/index.js"), "").unwrap();

        let config = SearchConfig::builder(root)
            .ignore_dirs(["node_modules"])
            .build();
        let mut engine = FileSearchEngine::new(config, CrawlCache::new());
        engine.initialize().await.unwrap();
        let results = engine.search("", SearchOptions::default()).await.unwrap();

        assert!(results.iter().all(|path| !path.starts_with("node_modules")));
    }

    #[tokio::test]
    async fn test_fuzzy_search_matches_subsequences() {
        let dir = project();
        let engine = engine_for(dir.path()).await;

        let results = engine.search("mn", SearchOptions::default()).await.unwrap();
        assert!(results.contains(&"src/main.rs".to_string()));
    }

    #[tokio::test]
    async fn test_fuzzy_disabled_falls_back_to_literal_contains() {
        let dir = project();
        let config = SearchConfig::builder(dir.path())
            .enable_fuzzy_search(false)
            .build();
        let mut engine = FileSearchEngine::new(config, CrawlCache::new());
        engine.initialize().await.unwrap();

        let results = engine
            .search("main", SearchOptions::default())
            .await
            .unwrap();
        assert_eq!(results, vec!["src/main.rs".to_string()]);

        let results = engine.search("mn", SearchOptions::default()).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_narrowing_a_query_reuses_cached_results() {
        let dir = project();
        let config = SearchConfig::builder(dir.path())
            .enable_fuzzy_search(false)
            .build();
        let mut engine = FileSearchEngine::new(config, CrawlCache::new());
        engine.initialize().await.unwrap();

        let broad = engine.search("src", SearchOptions::default()).await.unwrap();
        assert_eq!(broad.len(), 3);

        let narrow = engine
            .search("src/ma", SearchOptions::default())
            .await
            .unwrap();
        assert_eq!(narrow, vec!["src/main.rs".to_string()]);
    }

    #[tokio::test]
    async fn test_max_depth_bounds_the_index() {
        let dir = project();
        let config = SearchConfig::builder(dir.path()).max_depth(0).build();
        let mut engine = FileSearchEngine::new(config, CrawlCache::new());
        engine.initialize().await.unwrap();

        let results = engine.search("", SearchOptions::default()).await.unwrap();
        assert_eq!(
            results,
            vec![
                "src/".to_string(),
                "tests/".to_string(),
                "Cargo.toml".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_directory_variant_lists_one_directory_per_query() {
        let dir = project();
        let config = SearchConfig::builder(dir.path())
            .enable_recursive_search(false)
            .build();
        let mut engine = FileSearchEngine::new(config, CrawlCache::new());
        engine.initialize().await.unwrap();

        let results = engine
            .search("src/", SearchOptions::default())
            .await
            .unwrap();
        assert!(results.contains(&"src/lib.rs".to_string()));
        assert!(results.contains(&"src/main.rs".to_string()));
        assert!(!results.contains(&"tests/smoke.rs".to_string()));

        let results = engine
            .search("src/ma", SearchOptions::default())
            .await
            .unwrap();
        assert_eq!(results, vec!["src/main.rs".to_string()]);

        // An empty query lists the project root without descending.
        let results = engine.search("", SearchOptions::default()).await.unwrap();
        assert!(results.contains(&"src/".to_string()));
        assert!(!results.contains(&"src/main.rs".to_string()));
    }

    #[tokio::test]
    async fn test_directory_variant_honors_ignore_rules() {
        let dir = project();
        let root = dir.path();
        fs::create_dir_all(root.join("dist")).unwrap();
        fs::write(root.join("dist/bundle.js"), "").unwrap();
        fs::write(root.join(".gitignore"), "dist/\n*.log\n").unwrap();
        fs::write(root.join("debug.log"), "").unwrap();

        let config = SearchConfig::builder(root)
            .enable_recursive_search(false)
            .build();
        let mut engine = FileSearchEngine::new(config, CrawlCache::new());
        engine.initialize().await.unwrap();

        let results = engine.search("", SearchOptions::default()).await.unwrap();
        assert!(!results.contains(&"dist/".to_string()));
        assert!(!results.contains(&"debug.log".to_string()));
        assert!(results.contains(&"Cargo.toml".to_string()));
    }

    #[tokio::test]
    async fn test_engines_share_one_crawl_cache() {
        let dir = project();
        let cache = CrawlCache::new();

        let mut first =
            FileSearchEngine::new(SearchConfig::new(dir.path()), cache.clone());
        first.initialize().await.unwrap();
        assert_eq!(cache.len(), 1);

        fs::write(dir.path().join("added-later.txt"), "").unwrap();

        // Same root, rules and depth: the second engine reuses the cached
        // crawl and never sees the new file.
        let mut second =
            FileSearchEngine::new(SearchConfig::new(dir.path()), cache.clone());
        second.initialize().await.unwrap();
        let results = second.search("", SearchOptions::default()).await.unwrap();
        assert!(!results.contains(&"added-later.txt".to_string()));
    }
}
