//! Per-engine query result cache with prefix reuse.

use std::collections::HashMap;
use std::sync::Arc;

/// Maps a query string to its filtered result list.
///
/// One cache is built per engine initialization over one immutable file
/// index. Prefix reuse is only sound while the corpus and ignore rules stay
/// fixed: literal filtering is monotonic under query refinement, so
/// narrowing a query can only remove matches from a broader query's result,
/// never add new ones outside it. A corpus or rule change requires a new
/// engine instance, which invalidates all reuse.
#[derive(Debug)]
pub struct ResultCache {
    index: Arc<Vec<String>>,
    entries: HashMap<String, Arc<Vec<String>>>,
}

impl ResultCache {
    /// Creates an empty cache over `index`.
    pub fn new(index: Arc<Vec<String>>) -> Self {
        Self {
            index,
            entries: HashMap::new(),
        }
    }

    /// Returns the candidate set for `query` and whether it is an exact hit.
    ///
    /// On a miss, the result of the longest previously cached query that is
    /// a strict prefix of `query` narrows the search space; with no such
    /// prefix the full index is returned.
    pub fn get(&self, query: &str) -> (Arc<Vec<String>>, bool) {
        if let Some(exact) = self.entries.get(query) {
            return (exact.clone(), true);
        }

        let mut best: Option<(&str, &Arc<Vec<String>>)> = None;
        for (cached, results) in &self.entries {
            if query.starts_with(cached.as_str())
                && best.is_none_or(|(longest, _)| cached.len() > longest.len())
            {
                best = Some((cached, results));
            }
        }

        match best {
            Some((_, results)) => (results.clone(), false),
            None => (self.index.clone(), false),
        }
    }

    /// Caches the filtered results for `query`.
    pub fn set(&mut self, query: &str, results: Arc<Vec<String>>) {
        self.entries.insert(query.to_string(), results);
    }

    /// Returns the number of cached queries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether no queries have been cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
