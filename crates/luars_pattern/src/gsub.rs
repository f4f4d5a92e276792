// Substitution driver.
//
// The result is built in a fresh buffer from original subject offsets; the
// subject is never modified, so a failed call leaves nothing half-written.

use crate::error::{PatternError, PatternResult};
use crate::limits::L_ESC;
use crate::matcher::Match;
use crate::option::MatchOption;
use crate::parser::Pattern;
use crate::search::Searcher;
use crate::value::{CaptureValue, ReplValue, Replacement};

/// Replace up to `max_count` matches (all when `None`).
/// Returns the new text and the number of replacements made.
pub fn gsub(
    pattern: &Pattern,
    subject: &[u8],
    repl: &mut Replacement<'_>,
    max_count: Option<usize>,
    option: &MatchOption,
) -> PatternResult<(Vec<u8>, usize)> {
    let max_count = max_count.unwrap_or(usize::MAX);
    let mut searcher = Searcher::new(pattern, subject, option);
    let mut out = Vec::with_capacity(subject.len());
    let mut copied = 0;
    let mut pos = 0;
    let mut count = 0;

    while count < max_count && pos <= subject.len() {
        let Some(m) = searcher.find_at(pos)? else {
            break;
        };
        out.extend_from_slice(&subject[copied..m.start]);
        add_value(&mut out, subject, &m, repl)?;
        copied = m.end;
        count += 1;
        pos = m.end.max(m.start + 1);
        if pattern.is_anchored() {
            break;
        }
    }

    out.extend_from_slice(&subject[copied..]);
    tracing::trace!(count, len = out.len(), "gsub finished");
    Ok((out, count))
}

/// Append the replacement for one match.
fn add_value(out: &mut Vec<u8>, subject: &[u8], m: &Match, repl: &mut Replacement<'_>) -> PatternResult<()> {
    let value = match repl {
        Replacement::Template(template) => return expand_template(out, template, subject, m),
        Replacement::Function(callback) => callback.call(&m.values(subject))?,
        Replacement::Table(lookup) => lookup.lookup(&m.first_value(subject))?,
    };
    push_value(out, value, m.as_bytes(subject))
}

fn push_value(out: &mut Vec<u8>, value: ReplValue, original: &[u8]) -> PatternResult<()> {
    if value.keeps_original() {
        out.extend_from_slice(original);
        return Ok(());
    }
    if value.write_to(out) {
        Ok(())
    } else {
        Err(PatternError::InvalidReplacementValue {
            type_name: value.type_name(),
        })
    }
}

/// Expand `%0`..`%9` and `%%` in `template` for match `m`.
pub fn expand_template(out: &mut Vec<u8>, template: &[u8], subject: &[u8], m: &Match) -> PatternResult<()> {
    let mut rest = template;
    while let Some(i) = memchr::memchr(L_ESC, rest) {
        out.extend_from_slice(&rest[..i]);
        let Some(&d) = rest.get(i + 1) else {
            // trailing lone '%'
            out.push(L_ESC);
            return Ok(());
        };
        match d {
            L_ESC => out.push(L_ESC),
            b'0' => out.extend_from_slice(m.as_bytes(subject)),
            b'1'..=b'9' => capture_text(d - b'0', subject, m)?.write_to(out),
            _ => return Err(PatternError::InvalidReplacement),
        }
        rest = &rest[i + 2..];
    }
    out.extend_from_slice(rest);
    Ok(())
}

/// `%n` of a template: capture `n`, or the whole match for `%1` when the
/// pattern has no captures.
fn capture_text<'s>(n: u8, subject: &'s [u8], m: &Match) -> PatternResult<CaptureValue<'s>> {
    let n = n as usize;
    match m.captures.get(n - 1) {
        Some(cap) => Ok(cap.value(subject)),
        None if n == 1 && m.captures.is_empty() => Ok(CaptureValue::Str(m.as_bytes(subject))),
        None => Err(PatternError::BadCaptureIndex { index: n }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::Capture;
    use smallvec::smallvec;

    fn expand(template: &str, subject: &str, m: &Match) -> PatternResult<String> {
        let mut out = Vec::new();
        expand_template(&mut out, template.as_bytes(), subject.as_bytes(), m)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_template_escapes() {
        let m = Match {
            start: 0,
            end: 9,
            captures: smallvec![
                Capture::Substring { start: 0, end: 3 },
                Capture::Substring { start: 4, end: 9 },
                Capture::Position(3),
            ],
        };
        let subject = "key=value";
        assert_eq!(expand("%2=%1", subject, &m).unwrap(), "value=key");
        assert_eq!(expand("[%0]", subject, &m).unwrap(), "[key=value]");
        assert_eq!(expand("100%%", subject, &m).unwrap(), "100%");
        assert_eq!(expand("at %3", subject, &m).unwrap(), "at 4");
        assert_eq!(expand("tail %", subject, &m).unwrap(), "tail %");
        assert_eq!(expand("plain", subject, &m).unwrap(), "plain");
    }

    #[test]
    fn test_template_errors() {
        let m = Match {
            start: 0,
            end: 3,
            captures: smallvec![Capture::Substring { start: 0, end: 1 }],
        };
        assert_eq!(expand("%2", "abc", &m), Err(PatternError::BadCaptureIndex { index: 2 }));
        assert_eq!(expand("%x", "abc", &m), Err(PatternError::InvalidReplacement));
    }

    #[test]
    fn test_whole_match_as_first_capture() {
        let m = Match {
            start: 1,
            end: 3,
            captures: smallvec![],
        };
        assert_eq!(expand("<%1>", "abcd", &m).unwrap(), "<bc>");
        assert_eq!(expand("%2", "abcd", &m), Err(PatternError::BadCaptureIndex { index: 2 }));
    }
}
