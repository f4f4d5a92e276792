pub mod test_cache;
pub mod test_errors;
pub mod test_match;
