// Script-level string functions: string.find, string.match, string.gmatch,
// string.gsub. Positions follow the language conventions (1-based, inclusive
// ends, negative `init` counts from the end); the drivers below them work on
// 0-based offsets.

use std::sync::Arc;

use smallvec::SmallVec;

use crate::cache::PatternCache;
use crate::error::PatternResult;
use crate::gmatch::GMatch;
use crate::gsub;
use crate::option::MatchOption;
use crate::parser::Pattern;
use crate::search::{Searcher, find_plain};
use crate::value::{CaptureValue, Replacement};

pub type Values<'s> = SmallVec<[CaptureValue<'s>; 4]>;

/// Result of `string.find`: 1-based start, inclusive end, captures.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Found<'s> {
    pub start: usize,
    pub end: usize,
    pub captures: Values<'s>,
}

/// Entry point for the string functions, carrying the match options and an
/// optional compiled-pattern cache.
#[derive(Default)]
pub struct PatternLib {
    option: MatchOption,
    cache: Option<PatternCache>,
}

impl PatternLib {
    pub fn new(option: MatchOption) -> Self {
        Self { option, cache: None }
    }

    /// Keep compiled patterns around between calls.
    pub fn with_cache(mut self) -> Self {
        self.cache = Some(PatternCache::new(self.option.clone()));
        self
    }

    pub fn option(&self) -> &MatchOption {
        &self.option
    }

    pub fn cache(&self) -> Option<&PatternCache> {
        self.cache.as_ref()
    }

    pub fn compile(&self, pattern: &[u8]) -> PatternResult<Arc<Pattern>> {
        match &self.cache {
            Some(cache) => cache.get_or_compile(pattern),
            None => Ok(Arc::new(Pattern::with_option(pattern, &self.option)?)),
        }
    }

    /// string.find(s, pattern [, init [, plain]])
    pub fn str_find<'s>(
        &self,
        s: &'s [u8],
        pattern: &[u8],
        init: Option<i64>,
        plain: bool,
    ) -> PatternResult<Option<Found<'s>>> {
        let Some(init) = start_offset(init, s.len()) else {
            return Ok(None);
        };
        if plain {
            return Ok(find_plain(s, pattern, init).map(|(start, end)| Found {
                start: start + 1,
                end,
                captures: SmallVec::new(),
            }));
        }
        let compiled = self.compile(pattern)?;
        let found = Searcher::new(&compiled, s, &self.option).find_at(init)?;
        Ok(found.map(|m| Found {
            start: m.start + 1,
            end: m.end,
            captures: m.captures.iter().map(|cap| cap.value(s)).collect(),
        }))
    }

    /// string.match(s, pattern [, init]): the captures, or the whole match.
    pub fn str_match<'s>(&self, s: &'s [u8], pattern: &[u8], init: Option<i64>) -> PatternResult<Option<Values<'s>>> {
        let Some(init) = start_offset(init, s.len()) else {
            return Ok(None);
        };
        let compiled = self.compile(pattern)?;
        let found = Searcher::new(&compiled, s, &self.option).find_at(init)?;
        Ok(found.map(|m| m.values(s)))
    }

    /// The matches behind `string.gmatch`, with their offsets.
    /// An `init` past `len + 1` yields nothing.
    pub fn gmatch<'s>(&self, s: &'s [u8], pattern: &[u8], init: Option<i64>) -> PatternResult<GMatch<'s, Arc<Pattern>>> {
        // no search ever succeeds from len + 1
        let init = start_offset(init, s.len()).unwrap_or(s.len() + 1);
        let compiled = self.compile(pattern)?;
        Ok(GMatch::new(compiled, s, init, &self.option))
    }

    /// string.gmatch(s, pattern [, init])
    pub fn str_gmatch<'s>(&self, s: &'s [u8], pattern: &[u8], init: Option<i64>) -> PatternResult<GMatchValues<'s>> {
        Ok(GMatchValues {
            inner: self.gmatch(s, pattern, init)?,
        })
    }

    /// string.gsub(s, pattern, repl [, n]); a negative `n` replaces nothing.
    pub fn str_gsub(
        &self,
        s: &[u8],
        pattern: &[u8],
        mut repl: Replacement<'_>,
        max_count: Option<i64>,
    ) -> PatternResult<(Vec<u8>, usize)> {
        let compiled = self.compile(pattern)?;
        let max_count = max_count.map(|n| n.max(0) as usize);
        gsub::gsub(&compiled, s, &mut repl, max_count, &self.option)
    }
}

/// Iterator returned by `str_gmatch`: one set of values per match.
pub struct GMatchValues<'s> {
    inner: GMatch<'s, Arc<Pattern>>,
}

impl<'s> Iterator for GMatchValues<'s> {
    type Item = PatternResult<Values<'s>>;

    fn next(&mut self) -> Option<Self::Item> {
        let subject = self.inner.subject();
        self.inner.next().map(|m| m.map(|m| m.values(subject)))
    }
}

/// Convert a 1-based `init` (default 1, negative from the end) into a 0-based
/// offset. `None` when it lies past `len + 1`.
pub fn start_offset(init: Option<i64>, len: usize) -> Option<usize> {
    let len = len as u64;
    let pos = match init.unwrap_or(1) {
        i if i > 0 => i as u64,
        0 => 1,
        i if i.unsigned_abs() > len => 1,
        i => len - i.unsigned_abs() + 1,
    };
    if pos > len + 1 {
        None
    } else {
        Some((pos - 1) as usize)
    }
}

thread_local! {
    static DEFAULT_LIB: PatternLib = PatternLib::default();
}

/// string.find with default options.
pub fn str_find<'s>(s: &'s [u8], pattern: &[u8], init: Option<i64>, plain: bool) -> PatternResult<Option<Found<'s>>> {
    DEFAULT_LIB.with(|lib| lib.str_find(s, pattern, init, plain))
}

/// string.match with default options.
pub fn str_match<'s>(s: &'s [u8], pattern: &[u8], init: Option<i64>) -> PatternResult<Option<Values<'s>>> {
    DEFAULT_LIB.with(|lib| lib.str_match(s, pattern, init))
}

/// string.gmatch with default options.
pub fn str_gmatch<'s>(s: &'s [u8], pattern: &[u8], init: Option<i64>) -> PatternResult<GMatchValues<'s>> {
    DEFAULT_LIB.with(|lib| lib.str_gmatch(s, pattern, init))
}

/// string.gsub with default options.
pub fn str_gsub(s: &[u8], pattern: &[u8], repl: Replacement<'_>, max_count: Option<i64>) -> PatternResult<(Vec<u8>, usize)> {
    DEFAULT_LIB.with(|lib| lib.str_gsub(s, pattern, repl, max_count))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_offset() {
        assert_eq!(start_offset(None, 5), Some(0));
        assert_eq!(start_offset(Some(1), 5), Some(0));
        assert_eq!(start_offset(Some(0), 5), Some(0));
        assert_eq!(start_offset(Some(3), 5), Some(2));
        assert_eq!(start_offset(Some(6), 5), Some(5));
        assert_eq!(start_offset(Some(7), 5), None);
        assert_eq!(start_offset(Some(-1), 5), Some(4));
        assert_eq!(start_offset(Some(-5), 5), Some(0));
        assert_eq!(start_offset(Some(-100), 5), Some(0));
        assert_eq!(start_offset(Some(i64::MIN), 5), Some(0));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_found_serializes_as_script_values() {
        let found = str_find(b"key=42", b"(%a+)=()", None, false).unwrap().unwrap();
        assert_eq!(
            serde_json::to_string(&found).unwrap(),
            r#"{"start":1,"end":4,"captures":["key",5]}"#
        );
    }
}
