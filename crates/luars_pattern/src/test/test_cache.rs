// Tests for the compiled-pattern cache
use std::sync::Arc;

use crate::*;

#[test]
fn test_cache_reuses_compiled_patterns() {
    let cache = PatternCache::default();
    assert!(cache.is_empty());
    let a = cache.get_or_compile(b"%d+").unwrap();
    let b = cache.get_or_compile(b"%d+").unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(cache.len(), 1);

    cache.get_or_compile(b"%a+").unwrap();
    assert_eq!(cache.len(), 2);
}

#[test]
fn test_cache_skips_malformed() {
    let cache = PatternCache::default();
    assert!(cache.get_or_compile(b"[abc").is_err());
    assert!(cache.is_empty());
}

#[test]
fn test_cache_clear() {
    let cache = PatternCache::default();
    cache.get_or_compile(b"x").unwrap();
    cache.clear();
    assert!(cache.is_empty());
}

#[test]
fn test_cache_honors_capture_ceiling() {
    let cache = PatternCache::new(MatchOption::default().with_max_captures(1));
    assert!(cache.get_or_compile(b"(a)").is_ok());
    assert!(cache.get_or_compile(b"(a)(b)").is_err());
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_lib_with_cache() {
    let lib = PatternLib::default().with_cache();
    for _ in 0..3 {
        let found = lib.str_find(b"abc123", b"%d+", None, false).unwrap().unwrap();
        assert_eq!((found.start, found.end), (4, 6));
    }
    lib.str_gsub(b"abc", b"b", Replacement::Template(b"B"), None).unwrap();
    assert_eq!(lib.cache().map(|c| c.len()), Some(2));

    // plain finds bypass compilation
    lib.str_find(b"abc", b"(", None, true).unwrap();
    assert_eq!(lib.cache().map(|c| c.len()), Some(2));
}

#[test]
fn test_cache_shared_across_threads() {
    let cache = PatternCache::default();
    let subjects = ["a1", "bb22", "ccc333", "dddd4444"];
    std::thread::scope(|scope| {
        for subject in subjects {
            let cache = &cache;
            scope.spawn(move || {
                let pattern = cache.get_or_compile(b"%d+").unwrap();
                let m = search(&pattern, subject.as_bytes(), 0, &MatchOption::default())
                    .unwrap()
                    .unwrap();
                assert_eq!(m.end - m.start, subject.len() / 2);
            });
        }
    });
    assert_eq!(cache.len(), 1);
}
