// Compiled-pattern cache keyed by pattern source.
//
// Entries are handed out as `Arc<Pattern>` and never mutated after insertion.

use std::sync::{Arc, RwLock};

use ahash::AHashMap;

use crate::error::PatternResult;
use crate::option::MatchOption;
use crate::parser::Pattern;

pub struct PatternCache {
    option: MatchOption,
    entries: RwLock<AHashMap<Box<[u8]>, Arc<Pattern>>>,
}

impl Default for PatternCache {
    fn default() -> Self {
        Self::new(MatchOption::default())
    }
}

impl PatternCache {
    /// Patterns are compiled with `option`'s capture ceiling.
    pub fn new(option: MatchOption) -> Self {
        Self {
            option,
            entries: RwLock::new(AHashMap::new()),
        }
    }

    /// Shared compiled pattern for `source`, compiling it on first use.
    /// Malformed patterns are reported and not cached.
    pub fn get_or_compile(&self, source: &[u8]) -> PatternResult<Arc<Pattern>> {
        if let Some(hit) = self.read(|entries| entries.get(source).cloned()) {
            tracing::trace!(len = source.len(), "pattern cache hit");
            return Ok(hit);
        }

        tracing::trace!(len = source.len(), "pattern cache miss");
        let compiled = Arc::new(Pattern::with_option(source, &self.option)?);
        let mut entries = self.entries.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        // a racing thread may have inserted first; keep its entry
        let entry = entries.entry(source.into()).or_insert(compiled);
        Ok(entry.clone())
    }

    pub fn len(&self) -> usize {
        self.read(|entries| entries.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }

    fn read<R>(&self, f: impl FnOnce(&AHashMap<Box<[u8]>, Arc<Pattern>>) -> R) -> R {
        let entries = self.entries.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&entries)
    }
}
