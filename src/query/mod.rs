//! Fluent, predicate-based search over a parsed C# file.
//!
//! ```
//! use csharp_refactor::query::SearchContext;
//!
//! let ctx = SearchContext::parse("class A { public int Get(int x) { return x; } }").unwrap();
//! let methods = ctx
//!     .find_methods()
//!     .is_public()
//!     .has_parameter_count(1)
//!     .execute();
//! assert_eq!(methods[0].name, "Get");
//! ```

pub mod class;
pub mod conditions;
pub mod context;
pub mod errors;
pub mod member;
pub mod method;
pub mod pattern;
pub mod returns;
pub mod statement;

pub use class::{ClassMatch, ClassQuery};
pub use conditions::{ConditionPath, StatementPath};
pub use context::{NodeMatch, Query, SearchContext, Selectable};
pub use errors::QueryError;
pub use member::{MemberKind, MemberMatch, MemberQuery};
pub use method::{MethodMatch, MethodQuery, ParameterInfo};
pub use pattern::PatternMatch;
pub use returns::{ReturnMatch, ReturnQuery};
pub use statement::{StatementMatch, StatementQuery};
