// Boundary types shared with the host value system.
//
// The engine never owns a script value. Captures go out as `CaptureValue`,
// replacement results come back as `ReplValue`, and callbacks / keyed lookups
// are reached through the `Callback` and `Lookup` traits.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::{BuildHasher, Hash};

use crate::error::PatternResult;

/// A capture as seen by callers: a substring of the subject, or the
/// 1-based position recorded by a `()` capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureValue<'s> {
    Str(&'s [u8]),
    Position(usize),
}

// Serialized the way a script sees it: text (lossily decoded) or an integer.
#[cfg(feature = "serde")]
impl serde::Serialize for CaptureValue<'_> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CaptureValue::Str(bytes) => serializer.serialize_str(&String::from_utf8_lossy(bytes)),
            CaptureValue::Position(p) => serializer.serialize_u64(*p as u64),
        }
    }
}

impl CaptureValue<'_> {
    /// Append the textual form: the bytes, or the position in decimal.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        match self {
            CaptureValue::Str(bytes) => out.extend_from_slice(bytes),
            CaptureValue::Position(p) => {
                let mut buf = itoa::Buffer::new();
                out.extend_from_slice(buf.format(*p).as_bytes());
            }
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            CaptureValue::Str(bytes) => Some(*bytes),
            CaptureValue::Position(_) => None,
        }
    }
}

/// A value returned by a replacement callback or lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplValue {
    Nil,
    Boolean(bool),
    Integer(i64),
    Number(f64),
    Str(Vec<u8>),
    /// Any other host value; carries its type name for error messages.
    Other(&'static str),
}

impl ReplValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            ReplValue::Nil => "nil",
            ReplValue::Boolean(_) => "boolean",
            ReplValue::Integer(_) | ReplValue::Number(_) => "number",
            ReplValue::Str(_) => "string",
            ReplValue::Other(name) => *name,
        }
    }

    /// `nil` and `false` keep the original match text.
    #[inline]
    pub fn keeps_original(&self) -> bool {
        matches!(self, ReplValue::Nil | ReplValue::Boolean(false))
    }

    /// Append the textual form. Returns `false` when the value has none.
    pub fn write_to(&self, out: &mut Vec<u8>) -> bool {
        match self {
            ReplValue::Str(bytes) => out.extend_from_slice(bytes),
            ReplValue::Integer(i) => {
                let mut buf = itoa::Buffer::new();
                out.extend_from_slice(buf.format(*i).as_bytes());
            }
            ReplValue::Number(n) => format_number(*n, out),
            _ => return false,
        }
        true
    }
}

impl From<&str> for ReplValue {
    fn from(s: &str) -> Self {
        ReplValue::Str(s.as_bytes().to_vec())
    }
}

impl From<String> for ReplValue {
    fn from(s: String) -> Self {
        ReplValue::Str(s.into_bytes())
    }
}

impl From<&[u8]> for ReplValue {
    fn from(s: &[u8]) -> Self {
        ReplValue::Str(s.to_vec())
    }
}

impl From<Vec<u8>> for ReplValue {
    fn from(s: Vec<u8>) -> Self {
        ReplValue::Str(s)
    }
}

impl From<i64> for ReplValue {
    fn from(i: i64) -> Self {
        ReplValue::Integer(i)
    }
}

impl From<f64> for ReplValue {
    fn from(n: f64) -> Self {
        ReplValue::Number(n)
    }
}

impl From<bool> for ReplValue {
    fn from(b: bool) -> Self {
        ReplValue::Boolean(b)
    }
}

impl<T: Into<ReplValue>> From<Option<T>> for ReplValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(ReplValue::Nil, Into::into)
    }
}

/// A callable replacement: receives the captures (or the whole match).
pub trait Callback {
    fn call(&mut self, args: &[CaptureValue<'_>]) -> PatternResult<ReplValue>;
}

impl<F> Callback for F
where
    F: FnMut(&[CaptureValue<'_>]) -> PatternResult<ReplValue>,
{
    fn call(&mut self, args: &[CaptureValue<'_>]) -> PatternResult<ReplValue> {
        self(args)
    }
}

/// A keyed replacement: looked up by the first capture (or the whole match).
pub trait Lookup {
    fn lookup(&self, key: &CaptureValue<'_>) -> PatternResult<ReplValue>;
}

// Maps keyed by text have no entry for position captures.
impl<K, S> Lookup for HashMap<K, ReplValue, S>
where
    K: Borrow<[u8]> + Hash + Eq,
    S: BuildHasher,
{
    fn lookup(&self, key: &CaptureValue<'_>) -> PatternResult<ReplValue> {
        Ok(key
            .as_bytes()
            .and_then(|k| self.get(k))
            .cloned()
            .unwrap_or(ReplValue::Nil))
    }
}

impl<K> Lookup for ahash::AHashMap<K, ReplValue>
where
    K: Borrow<[u8]> + Hash + Eq,
{
    fn lookup(&self, key: &CaptureValue<'_>) -> PatternResult<ReplValue> {
        let map: &HashMap<K, ReplValue, ahash::RandomState> = self;
        map.lookup(key)
    }
}

/// How `gsub` computes the text for each match.
pub enum Replacement<'a> {
    /// `%0`..`%9` and `%%` are expanded, everything else is copied.
    Template(&'a [u8]),
    Function(&'a mut dyn Callback),
    Table(&'a dyn Lookup),
}

impl std::fmt::Debug for Replacement<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Replacement::Template(t) => f
                .debug_tuple("Template")
                .field(&String::from_utf8_lossy(t))
                .finish(),
            Replacement::Function(_) => f.write_str("Function(..)"),
            Replacement::Table(_) => f.write_str("Table(..)"),
        }
    }
}

/// Format a float the way Lua's `tostring` does (`%.14g`, plus `.0` when
/// the result would read as an integer).
pub fn format_number(n: f64, out: &mut Vec<u8>) {
    if n.is_nan() {
        out.extend_from_slice(if n.is_sign_negative() { &b"-nan"[..] } else { &b"nan"[..] });
        return;
    }
    if n.is_infinite() {
        out.extend_from_slice(if n < 0.0 { &b"-inf"[..] } else { &b"inf"[..] });
        return;
    }

    let sci = format!("{:.13e}", n);
    let (mantissa, exp) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or(0);

    let text = if !(-4..14).contains(&exp) {
        let mantissa = trim_fraction(mantissa);
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", mantissa, sign, exp.abs())
    } else {
        let fixed = format!("{:.*}", (13 - exp) as usize, n);
        trim_fraction(&fixed).to_string()
    };

    out.extend_from_slice(text.as_bytes());
    if !text.contains(['.', 'e']) {
        out.extend_from_slice(b".0");
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}
