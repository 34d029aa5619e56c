//! Configuration types for file search.

use std::path::PathBuf;

/// Name of the Atlas-specific ignore file read from the project root.
pub const ATLAS_IGNORE_FILE: &str = ".atlasignore";

/// Configuration for a file search engine.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Root directory of the project being searched.
    pub project_root: PathBuf,

    /// Extra directories to exclude, in addition to any loaded ignore files.
    pub ignore_dirs: Vec<String>,

    /// Whether to load `.gitignore` from the project root.
    pub use_gitignore: bool,

    /// Whether to load [`ATLAS_IGNORE_FILE`] from the project root.
    pub use_custom_ignore_file: bool,

    /// Whether crawl results are stored in the shared crawl cache.
    pub cache: bool,

    /// Time-to-live for crawl cache entries, in seconds.
    pub cache_ttl_seconds: u64,

    /// Whether to build a fuzzy index for approximate matching.
    pub enable_fuzzy_search: bool,

    /// Whether to index the whole tree up front. When disabled, the engine
    /// lists one directory lazily per query instead.
    pub enable_recursive_search: bool,

    /// Maximum number of directory levels to descend below the root.
    /// `None` means unlimited depth.
    pub max_depth: Option<usize>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            ignore_dirs: Vec::new(),
            use_gitignore: true,
            use_custom_ignore_file: true,
            cache: true,
            cache_ttl_seconds: 10,
            enable_fuzzy_search: true,
            enable_recursive_search: true,
            max_depth: None,
        }
    }
}

impl SearchConfig {
    /// Creates a new configuration with the specified project root.
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            ..Default::default()
        }
    }

    /// Creates a builder for constructing a configuration.
    pub fn builder(project_root: impl Into<PathBuf>) -> SearchConfigBuilder {
        SearchConfigBuilder::new(project_root)
    }
}

/// Builder for creating `SearchConfig` instances.
#[derive(Debug)]
pub struct SearchConfigBuilder {
    config: SearchConfig,
}

impl SearchConfigBuilder {
    /// Creates a new builder with the specified project root.
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            config: SearchConfig::new(project_root),
        }
    }

    /// Sets extra directories to exclude.
    pub fn ignore_dirs(mut self, dirs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.config.ignore_dirs = dirs.into_iter().map(Into::into).collect();
        self
    }

    /// Sets whether to load `.gitignore`.
    pub fn use_gitignore(mut self, use_gitignore: bool) -> Self {
        self.config.use_gitignore = use_gitignore;
        self
    }

    /// Sets whether to load the Atlas ignore file.
    pub fn use_custom_ignore_file(mut self, use_custom: bool) -> Self {
        self.config.use_custom_ignore_file = use_custom;
        self
    }

    /// Enables or disables the crawl cache.
    pub fn cache(mut self, cache: bool) -> Self {
        self.config.cache = cache;
        self
    }

    /// Sets the crawl cache TTL in seconds.
    pub fn cache_ttl_seconds(mut self, seconds: u64) -> Self {
        self.config.cache_ttl_seconds = seconds;
        self
    }

    /// Enables or disables fuzzy matching.
    pub fn enable_fuzzy_search(mut self, enable: bool) -> Self {
        self.config.enable_fuzzy_search = enable;
        self
    }

    /// Selects between the full-index and lazy directory engine variants.
    pub fn enable_recursive_search(mut self, enable: bool) -> Self {
        self.config.enable_recursive_search = enable;
        self
    }

    /// Sets the maximum traversal depth.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.config.max_depth = Some(depth);
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> SearchConfig {
        self.config
    }
}
