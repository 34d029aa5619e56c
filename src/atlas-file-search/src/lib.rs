#![allow(clippy::missing_errors_doc, clippy::uninlined_format_args)]
//! Atlas File Search - file path search engine for interactive completion.
//!
//! This crate answers rapid, successive, cancellable path queries over a
//! project tree without re-scanning the filesystem per keystroke:
//!
//! - Gitignore-style exclusion rules compiled into directory and file
//!   predicates, with excluded subtrees pruned during the walk
//! - A shared, TTL-evicting crawl cache keyed by root, rule fingerprint
//!   and depth bound
//! - A per-engine result cache that reuses a broader query's results as
//!   the search space for incremental refinements
//! - Literal glob filtering and fuzzy matching (via nucleo-matcher),
//!   selected per query, with the fuzzy variant chosen by corpus size
//! - Cooperative cancellation observed at fixed scan intervals
//!
//! # Example
//!
//! ```no_run
//! use atlas_file_search::{CrawlCache, FileSearchEngine, SearchConfig, SearchOptions};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = SearchConfig::builder("/path/to/project").build();
//!     let mut engine = FileSearchEngine::new(config, CrawlCache::new());
//!     engine.initialize().await?;
//!
//!     let results = engine.search("src/ma", SearchOptions::default()).await?;
//!     for path in results {
//!         println!("{path}");
//!     }
//!     Ok(())
//! }
//! ```

mod cache;
mod config;
mod crawler;
mod engine;
mod error;
mod fuzzy;
mod ignore_rules;
mod matcher;
mod result_cache;

pub use cache::{CrawlCache, CrawlKey};
pub use config::{ATLAS_IGNORE_FILE, SearchConfig, SearchConfigBuilder};
pub use crawler::{CrawlOptions, crawl};
pub use engine::{DirectorySearch, FileSearchEngine, RecursiveSearch, SearchOptions};
pub use error::{SearchError, SearchResult};
pub use fuzzy::{FuzzyAlgorithm, FuzzyIndex, GREEDY_THRESHOLD};
pub use ignore_rules::IgnoreRules;
pub use matcher::GlobFilter;
pub use result_cache::ResultCache;

/// Re-export anyhow for convenience
pub use anyhow;

use tokio_util::sync::CancellationToken;

/// Entries processed between cooperative yield points.
pub(crate) const YIELD_INTERVAL: usize = 1000;

/// Yields to the scheduler and observes the cancellation token once every
/// [`YIELD_INTERVAL`] processed entries.
///
/// Cancellation only takes effect at these checkpoints; a request arriving
/// between them completes the in-flight stride first.
pub(crate) async fn checkpoint(
    processed: usize,
    cancel: Option<&CancellationToken>,
) -> SearchResult<()> {
    if processed % YIELD_INTERVAL != 0 {
        return Ok(());
    }
    if let Some(token) = cancel {
        if token.is_cancelled() {
            return Err(SearchError::Cancelled);
        }
    }
    tokio::task::yield_now().await;
    Ok(())
}
