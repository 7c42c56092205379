//! Thread-local compilation cache for ast-grep C# patterns.
//!
//! Capped at 256 entries; the whole cache is dropped when the cap is hit.

use ast_grep_core::{Pattern, PatternError};
use ast_grep_language::SupportLang;
use std::cell::RefCell;
use std::collections::HashMap;

const MAX_CACHE_ENTRIES: usize = 256;

thread_local! {
    static PATTERN_CACHE: RefCell<HashMap<String, Pattern>> =
        RefCell::new(HashMap::new());
}

/// Get a compiled C# pattern from cache, or compile and cache it.
///
/// Patterns that fail to compile are not cached.
pub fn get_or_compile_pattern(pattern_str: &str) -> Result<Pattern, PatternError> {
    PATTERN_CACHE.with(|cache| {
        let mut cache = cache.borrow_mut();

        if let Some(p) = cache.get(pattern_str) {
            return Ok(p.clone());
        }

        if cache.len() >= MAX_CACHE_ENTRIES {
            cache.clear();
        }

        let compiled = Pattern::try_new(pattern_str, SupportLang::CSharp)?;
        cache.insert(pattern_str.to_string(), compiled.clone());
        Ok(compiled)
    })
}

pub fn clear_cache() {
    PATTERN_CACHE.with(|cache| cache.borrow_mut().clear());
}

pub fn cache_size() -> usize {
    PATTERN_CACHE.with(|cache| cache.borrow().len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_pattern_compiles_once() {
        clear_cache();
        let _ = get_or_compile_pattern("Console.WriteLine($MSG);");
        let _ = get_or_compile_pattern("Console.WriteLine($MSG);");
        assert_eq!(cache_size(), 1);

        let _ = get_or_compile_pattern("$A.Dispose();");
        assert_eq!(cache_size(), 2);
    }

    #[test]
    fn invalid_pattern_is_not_cached() {
        clear_cache();
        let err = get_or_compile_pattern("int a; int b;").unwrap_err();
        assert!(matches!(err, PatternError::MultipleNode(_)));
        assert_eq!(cache_size(), 0);
    }

    #[test]
    fn cache_is_cleared_at_capacity() {
        clear_cache();
        for i in 0..MAX_CACHE_ENTRIES {
            let _ = get_or_compile_pattern(&format!("Call{i}();"));
        }
        assert_eq!(cache_size(), MAX_CACHE_ENTRIES);

        let _ = get_or_compile_pattern("Overflow();");
        assert_eq!(cache_size(), 1);
    }
}
