// Core pattern matching engine: iterative backtracking over compiled items
//
// - MatchState holds subject, pattern, fixed capture slots
// - Alternatives live on an explicit choice stack, never on the call stack
// - Capture writes are logged on a trail so backtracking can undo them
// - One MatchState per search; nothing is shared between searches

use smallvec::SmallVec;

use crate::class::ClassToken;
use crate::error::{PatternError, PatternResult};
use crate::limits::{CAP_POSITION, CAP_UNFINISHED, CHOICE_STACK_INLINE, LUA_MAXCAPTURES};
use crate::option::MatchOption;
use crate::parser::{Item, Pattern, Quantifier};
use crate::value::CaptureValue;

/// A capture of a successful match, in subject byte offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Capture {
    /// `(...)`: `start..end`
    Substring { start: usize, end: usize },
    /// `()`: the 0-based offset it was taken at
    Position(usize),
}

impl Capture {
    /// Resolve against the subject the match was taken from.
    #[inline]
    pub fn value<'s>(&self, subject: &'s [u8]) -> CaptureValue<'s> {
        match *self {
            Capture::Substring { start, end } => CaptureValue::Str(&subject[start..end]),
            Capture::Position(offset) => CaptureValue::Position(offset + 1),
        }
    }
}

/// A successful match: `start..end` in the subject plus the captures in
/// the order their `(` appeared in the pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Match {
    pub start: usize,
    pub end: usize,
    pub captures: SmallVec<[Capture; 4]>,
}

impl Match {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    #[inline]
    pub fn as_bytes<'s>(&self, subject: &'s [u8]) -> &'s [u8] {
        &subject[self.start..self.end]
    }

    /// The values a caller sees: the captures, or the whole match when the
    /// pattern has no captures.
    pub fn values<'s>(&self, subject: &'s [u8]) -> SmallVec<[CaptureValue<'s>; 4]> {
        if self.captures.is_empty() {
            let mut values = SmallVec::new();
            values.push(CaptureValue::Str(self.as_bytes(subject)));
            values
        } else {
            self.captures.iter().map(|cap| cap.value(subject)).collect()
        }
    }

    /// First capture value, or the whole match; the key of keyed replacement.
    pub fn first_value<'s>(&self, subject: &'s [u8]) -> CaptureValue<'s> {
        match self.captures.first() {
            Some(cap) => cap.value(subject),
            None => CaptureValue::Str(self.as_bytes(subject)),
        }
    }
}

/// One capture slot: `len` is a byte count or one of the sentinels.
#[derive(Debug, Clone, Copy)]
struct Slot {
    start: usize,
    len: usize,
}

const EMPTY_SLOT: Slot = Slot {
    start: 0,
    len: CAP_UNFINISHED,
};

/// A pending alternative. `trail` is the trail length to unwind to first.
#[derive(Debug, Clone, Copy)]
enum Choice {
    /// Greedy run of item `pc` starting at `start`; `count` repetitions are
    /// being tried, fewer (down to `min`) remain.
    Greedy {
        pc: usize,
        start: usize,
        count: usize,
        min: usize,
        trail: usize,
    },
    /// Lazy run of item `pc`; the continuation was tried at `si`, the next
    /// alternative consumes one more byte there.
    Lazy { pc: usize, si: usize, trail: usize },
    /// Plain resume point (the zero branch of `?`).
    Resume { pc: usize, si: usize, trail: usize },
}

/// All matching context for one search.
pub struct MatchState<'a> {
    subject: &'a [u8],
    pattern: &'a Pattern,
    slots: [Slot; LUA_MAXCAPTURES],
    trail: SmallVec<[(usize, Slot); 16]>,
    choices: SmallVec<[Choice; CHOICE_STACK_INLINE]>,
    steps: usize,
    step_limit: Option<usize>,
}

impl<'a> MatchState<'a> {
    pub fn new(subject: &'a [u8], pattern: &'a Pattern, option: &MatchOption) -> Self {
        Self {
            subject,
            pattern,
            slots: [EMPTY_SLOT; LUA_MAXCAPTURES],
            trail: SmallVec::new(),
            choices: SmallVec::new(),
            steps: 0,
            step_limit: option.step_limit,
        }
    }

    pub fn subject(&self) -> &'a [u8] {
        self.subject
    }

    pub fn pattern(&self) -> &'a Pattern {
        self.pattern
    }

    /// Steps spent since the last `reset_steps`.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Start a fresh budget; drivers call this once per search.
    pub fn reset_steps(&mut self) {
        self.steps = 0;
    }

    /// Attempt a match starting exactly at `start`.
    /// Returns the end offset on success, `None` when every alternative failed.
    pub fn try_match(&mut self, start: usize) -> PatternResult<Option<usize>> {
        self.trail.clear();
        self.choices.clear();

        let pattern = self.pattern;
        let items = pattern.items();
        let s = self.subject;
        let mut si = start;
        let mut pc = 0;

        loop {
            if pc == items.len() {
                return Ok(Some(si));
            }
            self.tick()?;

            let advanced = match &items[pc] {
                Item::Single { token, quantifier } => match quantifier {
                    Quantifier::One => {
                        if si < s.len() && token.matches(s[si]) {
                            si += 1;
                            true
                        } else {
                            false
                        }
                    }
                    Quantifier::ZeroOrMore | Quantifier::OneOrMore => {
                        let min = usize::from(*quantifier == Quantifier::OneOrMore);
                        let count = self.max_expand(si, token);
                        if count < min {
                            false
                        } else {
                            if count > min {
                                self.choices.push(Choice::Greedy {
                                    pc,
                                    start: si,
                                    count,
                                    min,
                                    trail: self.trail.len(),
                                });
                            }
                            si += count;
                            true
                        }
                    }
                    Quantifier::Lazy => {
                        self.choices.push(Choice::Lazy {
                            pc,
                            si,
                            trail: self.trail.len(),
                        });
                        true
                    }
                    Quantifier::ZeroOrOne => {
                        if si < s.len() && token.matches(s[si]) {
                            self.choices.push(Choice::Resume {
                                pc: pc + 1,
                                si,
                                trail: self.trail.len(),
                            });
                            si += 1;
                        }
                        true
                    }
                },
                Item::OpenCapture(idx) => {
                    self.set_slot(*idx, Slot {
                        start: si,
                        len: CAP_UNFINISHED,
                    });
                    true
                }
                Item::CloseCapture(idx) => {
                    let start = self.slots[*idx].start;
                    self.set_slot(*idx, Slot {
                        start,
                        len: si - start,
                    });
                    true
                }
                Item::PositionCapture(idx) => {
                    self.set_slot(*idx, Slot {
                        start: si,
                        len: CAP_POSITION,
                    });
                    true
                }
                Item::Balanced { open, close } => match self.match_balance(si, *open, *close) {
                    Some(end) => {
                        si = end;
                        true
                    }
                    None => false,
                },
                Item::BackRef(idx) => {
                    let slot = self.slots[*idx];
                    let captured = &s[slot.start..slot.start + slot.len];
                    if s[si..].starts_with(captured) {
                        si += captured.len();
                        true
                    } else {
                        false
                    }
                }
                Item::Frontier(set) => {
                    let prev = if si == 0 { 0 } else { s[si - 1] };
                    let curr = s.get(si).copied().unwrap_or(0);
                    !set.contains(prev) && set.contains(curr)
                }
                Item::EndAnchor => si == s.len(),
            };

            if advanced {
                pc += 1;
                continue;
            }
            match self.backtrack()? {
                Some((next_si, next_pc)) => {
                    si = next_si;
                    pc = next_pc;
                }
                None => return Ok(None),
            }
        }
    }

    /// Captures of the last successful `try_match`.
    pub fn captures(&self) -> SmallVec<[Capture; 4]> {
        self.slots[..self.pattern.capture_count()]
            .iter()
            .map(|slot| match slot.len {
                CAP_POSITION => Capture::Position(slot.start),
                len => Capture::Substring {
                    start: slot.start,
                    end: slot.start + len,
                },
            })
            .collect()
    }

    /// Pop alternatives until one can be resumed.
    fn backtrack(&mut self) -> PatternResult<Option<(usize, usize)>> {
        let pattern = self.pattern;
        let items = pattern.items();
        while let Some(choice) = self.choices.pop() {
            self.tick()?;
            match choice {
                Choice::Greedy {
                    pc,
                    start,
                    count,
                    min,
                    trail,
                } => {
                    self.unwind(trail);
                    let count = count - 1;
                    if count > min {
                        self.choices.push(Choice::Greedy {
                            pc,
                            start,
                            count,
                            min,
                            trail,
                        });
                    }
                    return Ok(Some((start + count, pc + 1)));
                }
                Choice::Lazy { pc, si, trail } => {
                    self.unwind(trail);
                    let Item::Single { token, .. } = &items[pc] else {
                        continue;
                    };
                    if si < self.subject.len() && token.matches(self.subject[si]) {
                        self.choices.push(Choice::Lazy {
                            pc,
                            si: si + 1,
                            trail,
                        });
                        return Ok(Some((si + 1, pc + 1)));
                    }
                }
                Choice::Resume { pc, si, trail } => {
                    self.unwind(trail);
                    return Ok(Some((si, pc)));
                }
            }
        }
        Ok(None)
    }

    #[inline]
    fn tick(&mut self) -> PatternResult<()> {
        self.steps += 1;
        if let Some(limit) = self.step_limit
            && self.steps > limit
        {
            tracing::warn!(limit, "pattern step budget exceeded");
            return Err(PatternError::BudgetExceeded { limit });
        }
        Ok(())
    }

    #[inline]
    fn set_slot(&mut self, idx: usize, slot: Slot) {
        self.trail.push((idx, self.slots[idx]));
        self.slots[idx] = slot;
    }

    #[inline]
    fn unwind(&mut self, len: usize) {
        while self.trail.len() > len {
            if let Some((idx, old)) = self.trail.pop() {
                self.slots[idx] = old;
            }
        }
    }

    /// Longest run of bytes matching `token` starting at `si`.
    #[inline]
    fn max_expand(&self, si: usize, token: &ClassToken) -> usize {
        self.subject[si.min(self.subject.len())..]
            .iter()
            .take_while(|&&c| token.matches(c))
            .count()
    }

    /// `%bxy` at `si`: end offset past the balancing `close`.
    fn match_balance(&self, si: usize, open: u8, close: u8) -> Option<usize> {
        let s = self.subject;
        if s.get(si) != Some(&open) {
            return None;
        }
        let mut depth = 1usize;
        for (i, &c) in s.iter().enumerate().skip(si + 1) {
            if c == close {
                depth -= 1;
                if depth == 0 {
                    return Some(i + 1);
                }
            } else if c == open {
                depth += 1;
            }
        }
        None
    }
}
