// Tests for malformed patterns and error messages
use crate::limits::LUA_MAXCAPTURES;
use crate::*;

fn compile_error(p: &str) -> (String, usize) {
    match Pattern::new(p.as_bytes()) {
        Err(PatternError::MalformedPattern { message, offset }) => (message, offset),
        other => panic!("expected malformed pattern for {:?}, got {:?}", p, other.map(|_| ())),
    }
}

fn check(p: &str, message: &str, offset: usize) {
    assert_eq!(compile_error(p), (message.to_string(), offset), "pattern {:?}", p);
}

#[test]
fn test_unclosed_set() {
    check("[a", "missing ']'", 0);
    check("x[^", "missing ']'", 1);
    check("[%", "missing ']'", 0);
    check("%f[%w", "missing ']'", 2);
}

#[test]
fn test_trailing_escape() {
    check("abc%", "ends with '%'", 3);
    check("%", "ends with '%'", 0);
}

#[test]
fn test_capture_structure() {
    check("(a", "unfinished capture", 0);
    check("x(a(b)", "unfinished capture", 1);
    check("a)", "invalid pattern capture", 1);
    check("()b)", "invalid pattern capture", 3);
}

#[test]
fn test_balance_and_frontier() {
    check("%b(", "missing arguments to '%b'", 0);
    check("x%b", "missing arguments to '%b'", 1);
    check("%fa", "missing '[' after '%f' in pattern", 0);
}

#[test]
fn test_back_reference() {
    check("%1", "invalid capture index %1", 0);
    check("%0", "invalid capture index %0", 0);
    check("(a%1)", "invalid capture index %1", 2);
    check("()%1", "invalid capture index %1", 2);
    check("(a)%2", "invalid capture index %2", 3);
}

#[test]
fn test_misplaced_quantifiers() {
    check("a**", "quantifier '*' follows another quantifier", 2);
    check("a+?", "quantifier '?' follows another quantifier", 2);
    check("^*a", "quantifier '*' follows '^'", 1);
    check("^+", "quantifier '+' follows '^'", 1);
}

#[test]
fn test_too_many_captures() {
    let pattern = "()".repeat(LUA_MAXCAPTURES + 1);
    check(&pattern, "too many captures", LUA_MAXCAPTURES * 2);
    assert!(Pattern::new("()".repeat(LUA_MAXCAPTURES).as_bytes()).is_ok());

    let option = MatchOption::default().with_max_captures(2);
    assert!(matches!(
        Pattern::with_option(b"(a)(b)(c)", &option),
        Err(PatternError::MalformedPattern { offset: 6, .. })
    ));
}

#[test]
fn test_literal_specials_are_not_errors() {
    for p in ["*", "+a", "?", "-", "a$b", "a^b", "%]", "]"] {
        assert!(Pattern::new(p.as_bytes()).is_ok(), "pattern {:?}", p);
    }
}

#[test]
fn test_error_display() {
    let err = Pattern::new(b"[a").unwrap_err();
    assert_eq!(err.to_string(), "malformed pattern (missing ']') at offset 0");
    assert_eq!(
        PatternError::BadCaptureIndex { index: 3 }.to_string(),
        "invalid capture index %3 in replacement string"
    );
    assert_eq!(
        PatternError::InvalidReplacement.to_string(),
        "invalid use of '%' in replacement string"
    );
    assert_eq!(
        PatternError::InvalidReplacementValue { type_name: "table" }.to_string(),
        "invalid replacement value (a table)"
    );
    assert_eq!(
        PatternError::BudgetExceeded { limit: 100 }.to_string(),
        "pattern too complex (step budget of 100 exceeded)"
    );
    assert_eq!(PatternError::Host("boom".to_string()).to_string(), "boom");
}

#[test]
fn test_errors_surface_through_drivers() {
    assert!(str_find(b"abc", b"(", None, false).is_err());
    // the plain flag never compiles the pattern
    assert_eq!(str_find(b"a(b", b"(", None, true).unwrap().map(|f| f.start), Some(2));
    assert!(str_match(b"abc", b"%", None).is_err());
}
