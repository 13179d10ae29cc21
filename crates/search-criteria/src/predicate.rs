//! Translation of one criterion into a boolean test over a field value.
//!
//! A [`Predicate`] is built once per criterion and then applied to the
//! value an accessor reports for each record. Building validates the value
//! shape; applying coerces the criterion's scalar to the field's runtime
//! type before comparing.

use std::borrow::Cow;
use std::cmp::Ordering;

use regex::Regex;

use crate::criterion::{Criterion, Scalar};
use crate::error::{Result, SearchError};
use crate::op::Operation;
use crate::value::{Number, Timestamp, Value};

/// Multi-character wildcard accepted in `Like` patterns.
pub const LIKE_WILDCARD: char = '%';

/// Compiled test for a single criterion.
///
/// # Example
///
/// ```
/// use search_criteria::{Criterion, Predicate, Value};
///
/// let criterion = Criterion::parse_one("name~ann").unwrap();
/// let predicate = Predicate::translate(&criterion).unwrap();
///
/// assert!(predicate.test(Some(Value::String("Joanna"))).unwrap());
/// assert!(!predicate.test(Some(Value::String("Bob"))).unwrap());
/// assert!(predicate.test(None).is_err()); // unknown field
/// ```
#[derive(Debug, Clone)]
pub struct Predicate {
    key: String,
    operation: Operation,
    test: Test,
}

#[derive(Debug, Clone)]
enum Test {
    /// Equals, NotEquals, LessThanOrEqual, GreaterThanOrEqual.
    Compare(Scalar),
    IsNull,
    Like(LikePattern),
    In(Vec<Scalar>),
}

#[derive(Debug, Clone)]
enum LikePattern {
    Contains(String),
    Wildcard(Regex),
}

impl LikePattern {
    fn new(pattern: &str) -> Result<Self> {
        if !pattern.contains(LIKE_WILDCARD) {
            return Ok(LikePattern::Contains(pattern.to_string()));
        }
        let body = pattern
            .split(LIKE_WILDCARD)
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(".*");
        Ok(LikePattern::Wildcard(Regex::new(&format!("(?s)^{body}$"))?))
    }

    fn is_match(&self, text: &str) -> bool {
        match self {
            LikePattern::Contains(needle) => text.contains(needle.as_str()),
            LikePattern::Wildcard(regex) => regex.is_match(text),
        }
    }
}

impl Predicate {
    /// Builds the predicate for `criterion`.
    ///
    /// Fails with [`SearchError::InvalidValue`] when an `In` criterion holds
    /// a scalar, or when any other comparison holds a list. `IsNull`
    /// accepts any value and ignores it.
    pub fn translate(criterion: &Criterion) -> Result<Self> {
        let key = criterion.key();
        let operation = criterion.operation();
        let invalid = |expected| SearchError::InvalidValue {
            key: key.to_string(),
            op: operation,
            expected,
        };

        let test = match operation {
            Operation::IsNull => Test::IsNull,
            Operation::In => {
                let items = criterion
                    .value()
                    .as_list()
                    .ok_or_else(|| invalid("needs a list value"))?;
                Test::In(items.to_vec())
            }
            Operation::Like => {
                let scalar = criterion
                    .value()
                    .as_scalar()
                    .ok_or_else(|| invalid("needs a single value"))?;
                Test::Like(LikePattern::new(&scalar.to_string())?)
            }
            Operation::Equals
            | Operation::NotEquals
            | Operation::LessThanOrEqual
            | Operation::GreaterThanOrEqual => {
                let scalar = criterion
                    .value()
                    .as_scalar()
                    .ok_or_else(|| invalid("needs a single value"))?;
                Test::Compare(scalar.clone())
            }
        };

        Ok(Predicate {
            key: key.to_string(),
            operation,
            test,
        })
    }

    /// The field key this predicate reads.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The operation this predicate applies.
    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Applies the predicate to a field value.
    ///
    /// `None` means the accessor does not know the field and yields
    /// [`SearchError::UnknownField`]. A null field only satisfies `IsNull`.
    pub fn test(&self, field: Option<Value<'_>>) -> Result<bool> {
        let field = field.ok_or_else(|| SearchError::UnknownField {
            key: self.key.clone(),
        })?;

        if field.is_null() {
            return Ok(matches!(self.test, Test::IsNull));
        }

        match &self.test {
            Test::IsNull => Ok(false),
            Test::Like(pattern) => match field {
                Value::String(s) => Ok(pattern.is_match(s)),
                other => Err(self.unsupported(&other)),
            },
            Test::Compare(scalar) => {
                if self.operation.needs_ordering() && matches!(field, Value::Bool(_)) {
                    return Err(self.unsupported(&field));
                }
                let ordering = self.compare(&field, scalar)?;
                Ok(ordering
                    .and_then(|o| self.operation.eval_ordering(o))
                    .unwrap_or(false))
            }
            Test::In(items) => {
                for item in items {
                    if self.compare(&field, item)? == Some(Ordering::Equal) {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }

    /// Reads the field from `item` through `accessor` and applies the test.
    pub fn evaluate<T, F>(&self, item: &T, accessor: F) -> Result<bool>
    where
        for<'a> F: Fn(&'a T, &str) -> Option<Value<'a>>,
    {
        self.test(accessor(item, &self.key))
    }

    /// Compares `field` against `scalar` coerced to the field's type.
    ///
    /// Returns `Ok(None)` when the values are unordered (NaN).
    fn compare(&self, field: &Value<'_>, scalar: &Scalar) -> Result<Option<Ordering>> {
        match field {
            Value::String(s) => Ok(Some(<str as Ord>::cmp(s, &scalar_text(scalar)))),
            Value::Number(n) => {
                let rhs = match scalar {
                    Scalar::Text(t) => Number::parse(t).ok_or_else(|| self.unsupported(field))?,
                    Scalar::Integer(i) => Number::I64(*i),
                    Scalar::Instant(t) => Number::I64(t.as_millis()),
                };
                Ok(n.compare(rhs))
            }
            Value::Timestamp(ts) => {
                let rhs = match scalar {
                    Scalar::Text(t) => t
                        .parse::<i64>()
                        .map(Timestamp)
                        .map_err(|_| self.unsupported(field))?,
                    Scalar::Integer(i) => Timestamp(*i),
                    Scalar::Instant(t) => *t,
                };
                Ok(Some(ts.cmp(&rhs)))
            }
            Value::Bool(b) => {
                let rhs = match scalar {
                    Scalar::Text(t) if t == "true" => true,
                    Scalar::Text(t) if t == "false" => false,
                    _ => return Err(self.unsupported(field)),
                };
                Ok(Some(b.cmp(&rhs)))
            }
            Value::Null => Ok(None),
        }
    }

    fn unsupported(&self, field: &Value<'_>) -> SearchError {
        SearchError::UnsupportedComparison {
            key: self.key.clone(),
            op: self.operation,
            value_type: field.type_name(),
        }
    }
}

fn scalar_text(scalar: &Scalar) -> Cow<'_, str> {
    match scalar {
        Scalar::Text(t) => Cow::Borrowed(t),
        other => Cow::Owned(other.to_string()),
    }
}

/// Builds the predicate for one criterion. See [`Predicate::translate`].
pub fn translate(criterion: &Criterion) -> Result<Predicate> {
    Predicate::translate(criterion)
}
