// Tests for string.match
use crate::*;

fn match_all(s: &str, p: &str) -> Option<Vec<String>> {
    str_match(s.as_bytes(), p.as_bytes(), None)
        .unwrap()
        .map(|values| values.iter().map(text).collect())
}

fn match_one(s: &str, p: &str) -> Option<String> {
    match_all(s, p).map(|mut v| v.remove(0))
}

fn text(v: &CaptureValue<'_>) -> String {
    let mut out = Vec::new();
    v.write_to(&mut out);
    String::from_utf8(out).unwrap()
}

#[test]
fn test_match_digits() {
    assert_eq!(match_one("hello123world", "%d+").as_deref(), Some("123"));
    assert_eq!(match_one("hello", "%d+"), None);
}

#[test]
fn test_match_balanced() {
    assert_eq!(match_one("(foo(bar))baz", "%b()").as_deref(), Some("(foo(bar))"));
    assert_eq!(match_one("x = {a, {b}} y", "%b{}").as_deref(), Some("{a, {b}}"));
    assert_eq!(match_one("((unclosed", "%b()"), None);
}

#[test]
fn test_match_anchors() {
    assert_eq!(match_one("abc", "^b"), None);
    assert_eq!(match_one("abc", "^a").as_deref(), Some("a"));
    assert_eq!(match_one("hello", "l+o$").as_deref(), Some("llo"));
    assert_eq!(match_one("hello!", "o$"), None);
    assert_eq!(match_one("a$b", "a$b").as_deref(), Some("a$b"));
    assert_eq!(match_one("a^b", "a^b").as_deref(), Some("a^b"));
}

#[test]
fn test_match_capture_order() {
    assert_eq!(
        match_all("key=value", "(%a+)=(%a+)"),
        Some(vec!["key".to_string(), "value".to_string()])
    );
    assert_eq!(
        match_all("2024-01-15", "(%d+)-(%d+)-(%d+)"),
        Some(vec!["2024".to_string(), "01".to_string(), "15".to_string()])
    );
    // nested captures are numbered by their '('
    assert_eq!(
        match_all("abc", "((a)(b))"),
        Some(vec!["ab".to_string(), "a".to_string(), "b".to_string()])
    );
}

#[test]
fn test_match_back_reference() {
    let values = str_match(b"abab", b"(ab)%1", None).unwrap().unwrap();
    assert_eq!(values.as_slice(), &[CaptureValue::Str(b"ab")]);
    let found = str_find(b"abab", b"(ab)%1", None, false).unwrap().unwrap();
    assert_eq!((found.start, found.end), (1, 4));

    assert_eq!(
        match_one(r#"say "hi" or 'yo'"#, r#"(["'])(.-)%1"#).as_deref(),
        Some("\"")
    );
    assert_eq!(
        match_all(r#"x = 'it''s'"#, r#"(['"])(.-)%1"#),
        Some(vec!["'".to_string(), "it".to_string()])
    );
}

#[test]
fn test_match_quantifiers() {
    assert_eq!(match_one("<a><b>", "<.->").as_deref(), Some("<a>"));
    assert_eq!(match_one("<a><b>", "<.*>").as_deref(), Some("<a><b>"));
    assert_eq!(match_one("color", "colou?r").as_deref(), Some("color"));
    assert_eq!(match_one("colour", "colou?r").as_deref(), Some("colour"));
    assert_eq!(match_one("-42x", "^-?%d+").as_deref(), Some("-42"));
    assert_eq!(match_one("42x", "^-?%d+").as_deref(), Some("42"));
    assert_eq!(match_one("  trim me  ", "^%s*(.-)%s*$").as_deref(), Some("trim me"));
}

#[test]
fn test_match_sets() {
    assert_eq!(match_one("abc123", "[%d]+").as_deref(), Some("123"));
    assert_eq!(match_one("abc123", "[^%a]+").as_deref(), Some("123"));
    assert_eq!(match_one("x-y_z", "[a-z_%-]+").as_deref(), Some("x-y_z"));
    assert_eq!(match_one("a]b", "[]]").as_deref(), Some("]"));
    assert_eq!(match_one("0x1F", "0x(%x+)").as_deref(), Some("1F"));
}

#[test]
fn test_match_escapes() {
    assert_eq!(match_one("50% off", "%d+%%").as_deref(), Some("50%"));
    assert_eq!(match_one("a.b", "%.").as_deref(), Some("."));
    assert_eq!(match_one("f(x)", "%((%w)%)").as_deref(), Some("x"));
}

#[test]
fn test_match_frontier() {
    assert_eq!(match_one("THE (quick) fox", "%f[%a]%a+").as_deref(), Some("THE"));
    assert_eq!(match_one("foo bar", "%f[%w]bar").as_deref(), Some("bar"));
    assert_eq!(match_one("foobar", "%f[%w]bar"), None);
}

#[test]
fn test_match_position_capture() {
    let values = str_match(b"hello", b"()ll()", None).unwrap().unwrap();
    assert_eq!(
        values.as_slice(),
        &[CaptureValue::Position(3), CaptureValue::Position(5)]
    );
}

#[test]
fn test_match_init() {
    assert_eq!(
        str_match(b"aXbX", b"%u()", Some(3)).unwrap().unwrap().as_slice(),
        &[CaptureValue::Position(5)]
    );
    assert_eq!(str_match(b"abc", b"a", Some(10)).unwrap(), None);
}

#[test]
fn test_match_empty_pattern() {
    assert_eq!(match_one("abc", "").as_deref(), Some(""));
    assert_eq!(match_one("", "").as_deref(), Some(""));
}
