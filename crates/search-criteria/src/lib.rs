//! Search criteria - a URL-safe query mini-language for filtering records.
//!
//! A search string is a chain of field comparisons that fits in a single
//! query parameter (conventionally `search`) without escaping:
//!
//! ```text
//! status:open;|priority>3;team_core,infra
//! ```
//!
//! This crate provides:
//!
//! - [`CriteriaSequence::parse`] and [`CriteriaSequence::serialize`],
//!   converting between that string and an ordered list of [`Criterion`]
//! - a builder for constructing sequences in code
//! - [`Predicate`] and [`Filter`], which evaluate criteria against any record
//!   through an accessor function, independent of the storage layer
//!
//! # Quick Start
//!
//! ```rust
//! use search_criteria::{CriteriaSequence, Number, Value};
//!
//! struct User {
//!     name: String,
//!     age: u32,
//!     email: Option<String>,
//! }
//!
//! fn accessor<'a>(user: &'a User, key: &str) -> Option<Value<'a>> {
//!     match key {
//!         "name" => Some(Value::String(&user.name)),
//!         "age" => Some(Value::Number(Number::from(user.age))),
//!         "email" => Some(Value::from(user.email.as_deref())),
//!         _ => None,
//!     }
//! }
//!
//! let users = vec![
//!     User { name: "ann".into(), age: 31, email: None },
//!     User { name: "bob".into(), age: 17, email: Some("bob@example.com".into()) },
//!     User { name: "cy".into(), age: 45, email: Some("cy@example.com".into()) },
//! ];
//!
//! let seq = CriteriaSequence::new()
//!     .and_gte("age", 18i64)
//!     .and_null("email");
//! let search = seq.serialize();
//! assert_eq!(search, "age>18;email@null");
//!
//! // ... transmitted as ?search=age>18;email@null ...
//!
//! let filter = CriteriaSequence::parse(&search).unwrap().compile().unwrap();
//! let hits = filter.filter(&users, accessor).unwrap();
//! assert_eq!(hits.len(), 1);
//! assert_eq!(hits[0].name, "ann");
//! ```
//!
//! # Operations
//!
//! | Code | Operation | Test |
//! |------|-----------|------|
//! | `:` | `Equals` | `field == value` |
//! | `!` | `NotEquals` | `field != value` |
//! | `@` | `IsNull` | field is null, value ignored |
//! | `~` | `Like` | text field contains value |
//! | `<` | `LessThanOrEqual` | `field <= value` |
//! | `>` | `GreaterThanOrEqual` | `field >= value` |
//! | `_` | `In` | field equals one of a comma-separated list |
//!
//! # Chaining
//!
//! Fragments are joined by `;`. A fragment starting with `|` is ORed with
//! everything before it, any other fragment is ANDed. Evaluation is
//! strictly left to right with no precedence: `a:1;b:2;|c:3` means
//! `(a AND b) OR c`. There is no way to group.
//!
//! # Reserved characters
//!
//! Keys and values are limited to `[A-Za-z0-9_]`, with `,` separating list
//! elements. Nothing is escaped: values built in code must avoid `?`, `=`,
//! `&` and the grammar's own `; | , : ! @ ~ < > _`.
//!
//! # Dates
//!
//! Instants always travel as epoch milliseconds. A criterion built from a
//! [`Timestamp`], a `chrono::DateTime` or a `SystemTime` renders as its
//! millisecond count, and timestamp fields compare as integers.

mod criterion;
mod error;
mod filter;
mod op;
mod predicate;
mod sequence;
mod traits;
mod value;

pub use criterion::{Criterion, CriterionValue, Joiner, Scalar, LIST_SEPARATOR, OR_MARKER};
pub use error::{Result, SearchError};
pub use filter::Filter;
pub use op::{all_codes, code_for, operation_for, Operation};
pub use predicate::{translate, Predicate, LIKE_WILDCARD};
pub use sequence::{parse, serialize, CriteriaSequence, SEARCH_PARAM, SEPARATOR};
pub use traits::Searchable;
pub use value::{Number, Timestamp, Value};
