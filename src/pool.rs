//! Thread-local parser pooling.
//!
//! Every operation re-parses its input, so a transformation pipeline parses
//! the same file many times. Each thread keeps one C# parser, created on first
//! use and reused afterwards. Nothing is shared across threads.

use crate::syntax::{CSharpParser, SyntaxError};
use std::cell::RefCell;

thread_local! {
    static CSHARP_PARSER: RefCell<Option<CSharpParser>> = const { RefCell::new(None) };
}

/// Execute function with pooled parser instance.
///
/// ```
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use csharp_refactor::pool::with_parser;
///
/// let tree = with_parser(|parser| parser.parse("class A {}"))??;
/// assert_eq!(tree.root_node().kind(), "compilation_unit");
/// # Ok(())
/// # }
/// ```
pub fn with_parser<F, R>(f: F) -> Result<R, SyntaxError>
where
    F: FnOnce(&mut CSharpParser) -> R,
{
    CSHARP_PARSER.with(|cell| {
        let mut slot = cell.borrow_mut();
        if slot.is_none() {
            *slot = Some(CSharpParser::new()?);
        }
        match slot.as_mut() {
            Some(parser) => Ok(f(parser)),
            None => Err(SyntaxError::LanguageSet),
        }
    })
}
