//! Approximate path matching over the file index.

use std::sync::Arc;

use nucleo_matcher::{Config, Matcher, Utf32String};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::error::SearchResult;

/// Corpus size at which index construction switches to the greedy variant.
pub const GREEDY_THRESHOLD: usize = 20_000;

/// Matching algorithm variant, chosen once per index by corpus size.
///
/// The greedy variant trades match quality for speed on large corpora; the
/// optimal variant runs the full alignment below the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuzzyAlgorithm {
    /// Full alignment scoring.
    Optimal,
    /// Faster, lower-quality scoring for large corpora.
    Greedy,
}

impl FuzzyAlgorithm {
    /// Selects the variant for a corpus of `len` entries.
    pub fn for_corpus_size(len: usize) -> Self {
        if len >= GREEDY_THRESHOLD {
            Self::Greedy
        } else {
            Self::Optimal
        }
    }
}

/// Approximate-matching structure built once over the full file index.
///
/// Haystacks are converted to UTF-32 up front: a one-time build cost traded
/// against per-keystroke match latency.
#[derive(Debug)]
pub struct FuzzyIndex {
    paths: Arc<Vec<String>>,
    haystacks: Vec<Utf32String>,
    algorithm: FuzzyAlgorithm,
    matcher: Mutex<Matcher>,
}

impl FuzzyIndex {
    /// Builds the index over `paths`.
    pub fn build(paths: Arc<Vec<String>>) -> Self {
        let haystacks = paths
            .iter()
            .map(|path| Utf32String::from(path.as_str()))
            .collect();
        let algorithm = FuzzyAlgorithm::for_corpus_size(paths.len());

        let mut config = Config::DEFAULT;
        config.ignore_case = true;
        config.normalize = true;

        Self {
            paths,
            haystacks,
            algorithm,
            matcher: Mutex::new(Matcher::new(config)),
        }
    }

    /// Returns the algorithm variant selected at build time.
    pub fn algorithm(&self) -> FuzzyAlgorithm {
        self.algorithm
    }

    /// Scores every index entry against `pattern` and returns the matching
    /// paths in descending score order.
    ///
    /// The scan always covers the full corpus: fuzzy relevance ranking is
    /// not prefix-monotonic, so narrowed candidate sets from the result
    /// cache are not applicable here.
    pub async fn search(
        &self,
        pattern: &str,
        cancel: Option<&CancellationToken>,
    ) -> SearchResult<Vec<String>> {
        let needle = Utf32String::from(pattern);
        let mut matcher = self.matcher.lock().await;

        let mut scored: Vec<(u16, usize)> = Vec::new();
        for (processed, haystack) in self.haystacks.iter().enumerate() {
            crate::checkpoint(processed, cancel).await?;
            let score = match self.algorithm {
                FuzzyAlgorithm::Optimal => {
                    matcher.fuzzy_match(haystack.slice(..), needle.slice(..))
                }
                FuzzyAlgorithm::Greedy => {
                    matcher.fuzzy_match_greedy(haystack.slice(..), needle.slice(..))
                }
            };
            if let Some(score) = score {
                scored.push((score, processed));
            }
        }

        scored.sort_unstable_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
        Ok(scored
            .into_iter()
            .map(|(_, index)| self.paths[index].clone())
            .collect())
    }
}
