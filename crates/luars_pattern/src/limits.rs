// Limits and fixed constants of the pattern engine.

// ===== Captures =====

/// Maximum number of captures in a single pattern.
/// Matches Lua 5.5's LUA_MAXCAPTURES.
pub const LUA_MAXCAPTURES: usize = 32;

/// Length sentinel marking a position capture `()`.
pub const CAP_POSITION: usize = usize::MAX;

/// Length sentinel marking a capture whose `)` has not been reached yet.
pub const CAP_UNFINISHED: usize = usize::MAX - 1;

// ===== Pattern syntax =====

/// The escape byte that introduces classes, back-references, `%b` and `%f`.
pub const L_ESC: u8 = b'%';

/// Bytes that make a pattern non-plain. A pattern without any of them
/// can be searched with a literal substring search.
pub const SPECIALS: &[u8] = b"^$*+?.()[%-";

/// Initial inline capacity of the matcher's choice stack.
pub const CHOICE_STACK_INLINE: usize = 16;
