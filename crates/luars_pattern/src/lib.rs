// Lua pattern matching for luars
// A byte-oriented engine for the string.find / string.match / string.gmatch /
// string.gsub family: compile once, match with an iterative backtracking matcher.

#[cfg(test)]
mod test;

pub mod cache;
pub mod class;
pub mod error;
pub mod gmatch;
pub mod gsub;
pub mod limits;
pub mod matcher;
pub mod option;
pub mod parser;
pub mod search;
pub mod strlib;
pub mod value;

pub use cache::PatternCache;
pub use error::{PatternError, PatternResult};
pub use gmatch::{GMatch, gmatch};
pub use gsub::gsub;
pub use matcher::{Capture, Match, MatchState};
pub use option::MatchOption;
pub use parser::{Pattern, is_plain_pattern};
pub use search::{Searcher, find_plain, search};
pub use strlib::{Found, PatternLib, str_find, str_gmatch, str_gsub, str_match};
pub use value::{Callback, CaptureValue, Lookup, ReplValue, Replacement};
