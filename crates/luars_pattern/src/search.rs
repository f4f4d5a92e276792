// Search driver: leftmost match from a start offset.
//
// Plain patterns go through a substring search; everything else tries each
// start offset in turn (only `init` for anchored patterns).

use memchr::memmem;

use crate::class::ClassToken;
use crate::error::PatternResult;
use crate::matcher::{Match, MatchState};
use crate::option::MatchOption;
use crate::parser::{Item, Pattern, Quantifier};

/// A reusable search over one subject/pattern pair.
pub struct Searcher<'a> {
    state: MatchState<'a>,
    // literal first byte every match must start with
    first_byte: Option<u8>,
}

impl<'a> Searcher<'a> {
    pub fn new(pattern: &'a Pattern, subject: &'a [u8], option: &MatchOption) -> Self {
        let first_byte = match pattern.items().first() {
            Some(Item::Single {
                token: ClassToken::Byte(b),
                quantifier: Quantifier::One | Quantifier::OneOrMore,
            }) => Some(*b),
            _ => None,
        };
        Self {
            state: MatchState::new(subject, pattern, option),
            first_byte,
        }
    }

    pub fn pattern(&self) -> &'a Pattern {
        self.state.pattern()
    }

    pub fn subject(&self) -> &'a [u8] {
        self.state.subject()
    }

    /// Steps spent by the last search.
    pub fn steps(&self) -> usize {
        self.state.steps()
    }

    /// Leftmost match starting at or after `init` (a 0-based offset).
    /// An anchored pattern is only tried at `init`.
    pub fn find_at(&mut self, init: usize) -> PatternResult<Option<Match>> {
        let subject = self.subject();
        let pattern = self.pattern();
        if init > subject.len() {
            return Ok(None);
        }
        self.state.reset_steps();

        if pattern.is_plain() {
            return Ok(memmem::find(&subject[init..], pattern.source()).map(|pos| {
                let start = init + pos;
                Match {
                    start,
                    end: start + pattern.source().len(),
                    captures: Default::default(),
                }
            }));
        }

        if pattern.is_anchored() {
            return self.attempt(init);
        }

        let mut si = init;
        loop {
            if let Some(b) = self.first_byte {
                match memchr::memchr(b, &subject[si..]) {
                    Some(skip) => si += skip,
                    None => return Ok(None),
                }
            }
            if let Some(m) = self.attempt(si)? {
                return Ok(Some(m));
            }
            if si >= subject.len() {
                return Ok(None);
            }
            si += 1;
        }
    }

    #[inline]
    fn attempt(&mut self, si: usize) -> PatternResult<Option<Match>> {
        Ok(self.state.try_match(si)?.map(|end| Match {
            start: si,
            end,
            captures: self.state.captures(),
        }))
    }
}

/// One-shot search.
pub fn search(
    pattern: &Pattern,
    subject: &[u8],
    init: usize,
    option: &MatchOption,
) -> PatternResult<Option<Match>> {
    Searcher::new(pattern, subject, option).find_at(init)
}

/// Literal substring search, bypassing pattern compilation entirely.
pub fn find_plain(subject: &[u8], needle: &[u8], init: usize) -> Option<(usize, usize)> {
    if init > subject.len() {
        return None;
    }
    memmem::find(&subject[init..], needle).map(|pos| (init + pos, init + pos + needle.len()))
}
