// Character class evaluation for Lua patterns
// Handles %a, %c, %d, %g, %l, %p, %s, %u, %w, %x, %z and their uppercase complements,
// [set] membership and the `.` wildcard.
//
// Categories follow the C locale: only ASCII bytes belong to a category.

/// A `%`-class letter (lowercase form).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    Letter,   // %a
    Control,  // %c
    Digit,    // %d
    Graph,    // %g
    Lower,    // %l
    Punct,    // %p
    Space,    // %s
    Upper,    // %u
    AlphaNum, // %w
    Hex,      // %x
    Nul,      // %z
}

impl CharClass {
    /// Decode a class letter. Returns the class and whether it is the
    /// complemented (uppercase) form, or `None` when `letter` names no class.
    pub fn from_letter(letter: u8) -> Option<(CharClass, bool)> {
        let class = match letter.to_ascii_lowercase() {
            b'a' => CharClass::Letter,
            b'c' => CharClass::Control,
            b'd' => CharClass::Digit,
            b'g' => CharClass::Graph,
            b'l' => CharClass::Lower,
            b'p' => CharClass::Punct,
            b's' => CharClass::Space,
            b'u' => CharClass::Upper,
            b'w' => CharClass::AlphaNum,
            b'x' => CharClass::Hex,
            b'z' => CharClass::Nul,
            _ => return None,
        };
        Some((class, letter.is_ascii_uppercase()))
    }

    #[inline(always)]
    pub fn matches(self, c: u8) -> bool {
        match self {
            CharClass::Letter => c.is_ascii_alphabetic(),
            CharClass::Control => c.is_ascii_control(),
            CharClass::Digit => c.is_ascii_digit(),
            CharClass::Graph => c.is_ascii_graphic(),
            CharClass::Lower => c.is_ascii_lowercase(),
            CharClass::Punct => c.is_ascii_punctuation(),
            // C isspace: also matches vertical tab, which is_ascii_whitespace does not
            CharClass::Space => matches!(c, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c),
            CharClass::Upper => c.is_ascii_uppercase(),
            CharClass::AlphaNum => c.is_ascii_alphanumeric(),
            CharClass::Hex => c.is_ascii_hexdigit(),
            CharClass::Nul => c == 0,
        }
    }
}

/// One member of a bracketed `[set]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetItem {
    Byte(u8),
    Range(u8, u8),
    Class { class: CharClass, negated: bool },
}

impl SetItem {
    #[inline]
    pub fn matches(&self, c: u8) -> bool {
        match *self {
            SetItem::Byte(b) => c == b,
            SetItem::Range(lo, hi) => lo <= c && c <= hi,
            SetItem::Class { class, negated } => class.matches(c) != negated,
        }
    }
}

/// 256-bit membership table for a compiled `[set]`.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ByteSet {
    bits: [u64; 4],
}

impl ByteSet {
    pub const fn empty() -> Self {
        Self { bits: [0; 4] }
    }

    /// Union of all member tests, complemented when `negated`.
    pub fn from_items(items: &[SetItem], negated: bool) -> Self {
        let mut set = Self::empty();
        for c in 0..=u8::MAX {
            if items.iter().any(|item| item.matches(c)) != negated {
                set.insert(c);
            }
        }
        set
    }

    #[inline(always)]
    pub fn insert(&mut self, c: u8) {
        self.bits[(c >> 6) as usize] |= 1u64 << (c & 63);
    }

    #[inline(always)]
    pub fn contains(&self, c: u8) -> bool {
        self.bits[(c >> 6) as usize] & (1u64 << (c & 63)) != 0
    }

    pub fn len(&self) -> usize {
        self.bits.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.iter().all(|&w| w == 0)
    }
}

impl std::fmt::Debug for ByteSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ByteSet({} members)", self.len())
    }
}

/// The single-character part of a pattern item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassToken {
    /// Literal byte (including `%`-escaped punctuation).
    Byte(u8),
    /// `.`
    Any,
    /// `%a`, `%D`, ...
    Class { class: CharClass, negated: bool },
    /// `[...]` or `[^...]`
    Set(ByteSet),
}

impl ClassToken {
    /// Does `c` satisfy this token?
    #[inline(always)]
    pub fn matches(&self, c: u8) -> bool {
        match self {
            ClassToken::Byte(b) => c == *b,
            ClassToken::Any => true,
            ClassToken::Class { class, negated } => class.matches(c) != *negated,
            ClassToken::Set(set) => set.contains(c),
        }
    }
}
