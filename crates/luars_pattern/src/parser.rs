// Lua pattern compiler
// Parses a pattern once into a flat list of items that the matcher walks by index.
// Malformed patterns are rejected here, never during matching.

use smallvec::SmallVec;

use crate::class::{ByteSet, CharClass, ClassToken, SetItem};
use crate::error::{PatternError, PatternResult};
use crate::limits::{L_ESC, SPECIALS};
use crate::option::MatchOption;

/// Repetition suffix of a single-character item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantifier {
    /// no suffix: exactly one
    One,
    /// `*`
    ZeroOrMore,
    /// `+`
    OneOrMore,
    /// `-` (shortest first)
    Lazy,
    /// `?`
    ZeroOrOne,
}

impl Quantifier {
    fn from_byte(b: u8) -> Option<Self> {
        match b {
            b'*' => Some(Quantifier::ZeroOrMore),
            b'+' => Some(Quantifier::OneOrMore),
            b'-' => Some(Quantifier::Lazy),
            b'?' => Some(Quantifier::ZeroOrOne),
            _ => None,
        }
    }
}

/// One matching unit of a compiled pattern. Capture indices are 0-based slots.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Single {
        token: ClassToken,
        quantifier: Quantifier,
    },
    OpenCapture(usize),
    CloseCapture(usize),
    PositionCapture(usize),
    /// `%bxy`
    Balanced { open: u8, close: u8 },
    /// `%1`..`%9`
    BackRef(usize),
    /// `%f[set]`
    Frontier(ByteSet),
    /// trailing `$`
    EndAnchor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureKind {
    Substring,
    Position,
}

/// A compiled pattern. Immutable once built and free of per-match state,
/// so one instance can be shared by any number of concurrent searches.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: Box<[u8]>,
    items: Box<[Item]>,
    captures: SmallVec<[CaptureKind; 8]>,
    anchored: bool,
    plain: bool,
}

/// Check if pattern has no special characters (can be matched as plain text).
#[inline]
pub fn is_plain_pattern(pat: &[u8]) -> bool {
    !pat.iter().any(|c| SPECIALS.contains(c))
}

impl Pattern {
    /// Compile with the default options.
    pub fn new(source: &[u8]) -> PatternResult<Self> {
        Self::with_option(source, &MatchOption::default())
    }

    pub fn with_option(source: &[u8], option: &MatchOption) -> PatternResult<Self> {
        let pattern = Compiler::new(source, option.capture_ceiling()).compile()?;
        tracing::debug!(
            items = pattern.items.len(),
            captures = pattern.captures.len(),
            anchored = pattern.anchored,
            plain = pattern.plain,
            "compiled pattern"
        );
        Ok(pattern)
    }

    pub fn source(&self) -> &[u8] {
        &self.source
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Number of explicit captures, position captures included.
    pub fn capture_count(&self) -> usize {
        self.captures.len()
    }

    pub fn capture_kind(&self, index: usize) -> Option<CaptureKind> {
        self.captures.get(index).copied()
    }

    /// True when the pattern began with `^`.
    pub fn is_anchored(&self) -> bool {
        self.anchored
    }

    /// True when the source contains no special bytes; such a pattern
    /// matches exactly its own text.
    pub fn is_plain(&self) -> bool {
        self.plain
    }
}

struct Compiler<'a> {
    src: &'a [u8],
    pos: usize,
    max_captures: usize,
    items: Vec<Item>,
    captures: SmallVec<[CaptureKind; 8]>,
    closed: SmallVec<[bool; 8]>,
    // open captures with the source offset of their '('
    open: SmallVec<[(usize, usize); 8]>,
    // the previous item ended with a quantifier suffix
    after_quantifier: bool,
}

impl<'a> Compiler<'a> {
    fn new(src: &'a [u8], max_captures: usize) -> Self {
        Self {
            src,
            pos: 0,
            max_captures,
            items: Vec::with_capacity(src.len()),
            captures: SmallVec::new(),
            closed: SmallVec::new(),
            open: SmallVec::new(),
            after_quantifier: false,
        }
    }

    fn compile(mut self) -> PatternResult<Pattern> {
        let anchored = self.src.first() == Some(&b'^');
        if anchored {
            self.pos = 1;
        }

        while self.pos < self.src.len() {
            let c = self.src[self.pos];
            let after_quantifier = std::mem::take(&mut self.after_quantifier);
            match c {
                b'(' => {
                    if self.src.get(self.pos + 1) == Some(&b')') {
                        let idx = self.new_capture(CaptureKind::Position)?;
                        self.closed[idx] = true;
                        self.items.push(Item::PositionCapture(idx));
                        self.pos += 2;
                    } else {
                        let idx = self.new_capture(CaptureKind::Substring)?;
                        self.open.push((idx, self.pos));
                        self.items.push(Item::OpenCapture(idx));
                        self.pos += 1;
                    }
                }
                b')' => {
                    let Some((idx, _)) = self.open.pop() else {
                        return Err(PatternError::malformed("invalid pattern capture", self.pos));
                    };
                    self.closed[idx] = true;
                    self.items.push(Item::CloseCapture(idx));
                    self.pos += 1;
                }
                b'$' if self.pos + 1 == self.src.len() => {
                    self.items.push(Item::EndAnchor);
                    self.pos += 1;
                }
                b'*' | b'+' | b'?' if after_quantifier || (anchored && self.pos == 1) => {
                    let what = if after_quantifier { "another quantifier" } else { "'^'" };
                    return Err(PatternError::malformed(
                        format!("quantifier '{}' follows {}", c as char, what),
                        self.pos,
                    ));
                }
                L_ESC => match self.src.get(self.pos + 1).copied() {
                    None => {
                        return Err(PatternError::malformed("ends with '%'", self.pos));
                    }
                    Some(b'b') => self.balanced()?,
                    Some(b'f') => self.frontier()?,
                    Some(d) if d.is_ascii_digit() => self.back_reference(d)?,
                    Some(_) => self.single()?,
                },
                _ => self.single()?,
            }
        }

        if let Some(&(_, offset)) = self.open.last() {
            return Err(PatternError::malformed("unfinished capture", offset));
        }

        Ok(Pattern {
            plain: is_plain_pattern(self.src),
            source: self.src.into(),
            items: self.items.into_boxed_slice(),
            captures: self.captures,
            anchored,
        })
    }

    fn new_capture(&mut self, kind: CaptureKind) -> PatternResult<usize> {
        if self.captures.len() >= self.max_captures {
            return Err(PatternError::malformed("too many captures", self.pos));
        }
        self.captures.push(kind);
        self.closed.push(false);
        Ok(self.captures.len() - 1)
    }

    /// `%bxy`
    fn balanced(&mut self) -> PatternResult<()> {
        let (Some(&open), Some(&close)) = (self.src.get(self.pos + 2), self.src.get(self.pos + 3))
        else {
            return Err(PatternError::malformed("missing arguments to '%b'", self.pos));
        };
        self.items.push(Item::Balanced { open, close });
        self.pos += 4;
        Ok(())
    }

    /// `%f[set]`
    fn frontier(&mut self) -> PatternResult<()> {
        let set_start = self.pos + 2;
        if self.src.get(set_start) != Some(&b'[') {
            return Err(PatternError::malformed("missing '[' after '%f' in pattern", self.pos));
        }
        let (set, next) = parse_set(self.src, set_start)?;
        self.items.push(Item::Frontier(set));
        self.pos = next;
        Ok(())
    }

    /// `%1`..`%9`
    fn back_reference(&mut self, digit: u8) -> PatternResult<()> {
        let n = (digit - b'0') as usize;
        let invalid = || PatternError::malformed(format!("invalid capture index %{}", n), self.pos);
        if n == 0 {
            return Err(invalid());
        }
        let idx = n - 1;
        match (self.captures.get(idx), self.closed.get(idx)) {
            (Some(CaptureKind::Substring), Some(true)) => {}
            _ => return Err(invalid()),
        }
        self.items.push(Item::BackRef(idx));
        self.pos += 2;
        Ok(())
    }

    /// Literal, `.`, `%class` or `[set]`, plus an optional quantifier suffix.
    fn single(&mut self) -> PatternResult<()> {
        let (token, mut next) = parse_single(self.src, self.pos)?;
        let quantifier = match self.src.get(next).copied().and_then(Quantifier::from_byte) {
            Some(q) => {
                next += 1;
                self.after_quantifier = true;
                q
            }
            None => Quantifier::One,
        };
        self.items.push(Item::Single { token, quantifier });
        self.pos = next;
        Ok(())
    }
}

/// Parse the single-character element at `src[pos]`.
/// Returns the token and the index past it (quantifier not consumed).
fn parse_single(src: &[u8], pos: usize) -> PatternResult<(ClassToken, usize)> {
    match src[pos] {
        b'.' => Ok((ClassToken::Any, pos + 1)),
        L_ESC => {
            let Some(&e) = src.get(pos + 1) else {
                return Err(PatternError::malformed("ends with '%'", pos));
            };
            let token = match CharClass::from_letter(e) {
                Some((class, negated)) => ClassToken::Class { class, negated },
                None => ClassToken::Byte(e),
            };
            Ok((token, pos + 2))
        }
        b'[' => {
            let (set, next) = parse_set(src, pos)?;
            Ok((ClassToken::Set(set), next))
        }
        c => Ok((ClassToken::Byte(c), pos + 1)),
    }
}

/// Parse `[set]` with `src[start] == '['`. Returns the set and the index past `]`.
fn parse_set(src: &[u8], start: usize) -> PatternResult<(ByteSet, usize)> {
    let mut i = start + 1;
    let negated = src.get(i) == Some(&b'^');
    if negated {
        i += 1;
    }
    let first = i;
    let mut items: SmallVec<[SetItem; 8]> = SmallVec::new();

    loop {
        let Some(&c) = src.get(i) else {
            return Err(PatternError::malformed("missing ']'", start));
        };
        // ']' right after '[' or '[^' is a member, not the terminator
        if c == b']' && i != first {
            return Ok((ByteSet::from_items(&items, negated), i + 1));
        }
        if c == L_ESC {
            let Some(&e) = src.get(i + 1) else {
                return Err(PatternError::malformed("missing ']'", start));
            };
            items.push(match CharClass::from_letter(e) {
                Some((class, negated)) => SetItem::Class { class, negated },
                None => SetItem::Byte(e),
            });
            i += 2;
        } else if src.get(i + 1) == Some(&b'-') && src.get(i + 2).is_some_and(|&hi| hi != b']') {
            items.push(SetItem::Range(c, src[i + 2]));
            i += 3;
        } else {
            items.push(SetItem::Byte(c));
            i += 1;
        }
    }
}
