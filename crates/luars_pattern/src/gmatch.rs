// Iteration driver: successive non-overlapping matches over one subject.

use std::ops::Deref;

use crate::error::PatternResult;
use crate::matcher::Match;
use crate::option::MatchOption;
use crate::parser::Pattern;
use crate::search::Searcher;

/// Lazy, forward-only sequence of matches. After a match `s..e` the next
/// search starts at `max(e, s + 1)`, so empty matches cannot repeat.
///
/// An anchored pattern yields at most one match, at the starting offset.
/// The iterator is fused: once it returns `None` or an error it stays done.
///
/// `P` is any handle to a compiled pattern: `&Pattern` or a cached `Arc<Pattern>`.
pub struct GMatch<'s, P> {
    pattern: P,
    subject: &'s [u8],
    option: MatchOption,
    pos: usize,
    done: bool,
}

impl<'s, P: Deref<Target = Pattern>> GMatch<'s, P> {
    pub fn new(pattern: P, subject: &'s [u8], init: usize, option: &MatchOption) -> Self {
        Self {
            pattern,
            subject,
            option: option.clone(),
            pos: init,
            done: false,
        }
    }

    pub fn subject(&self) -> &'s [u8] {
        self.subject
    }
}

impl<P: Deref<Target = Pattern>> Iterator for GMatch<'_, P> {
    type Item = PatternResult<Match>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let pattern: &Pattern = &self.pattern;
        let found = Searcher::new(pattern, self.subject, &self.option).find_at(self.pos);
        match found {
            Ok(Some(m)) => {
                self.pos = m.end.max(m.start + 1);
                self.done = pattern.is_anchored();
                Some(Ok(m))
            }
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl<P: Deref<Target = Pattern>> std::iter::FusedIterator for GMatch<'_, P> {}

pub fn gmatch<'s, 'p>(
    pattern: &'p Pattern,
    subject: &'s [u8],
    init: usize,
    option: &MatchOption,
) -> GMatch<'s, &'p Pattern> {
    GMatch::new(pattern, subject, init, option)
}
