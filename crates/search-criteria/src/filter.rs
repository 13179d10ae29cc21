//! Composed predicate for a whole criteria sequence.
//!
//! A [`Filter`] chains the per-criterion predicates strictly left to right
//! using each criterion's joiner. There is no precedence and no grouping:
//!
//! ```text
//! a ; b ; |c      evaluates as      (a AND b) OR c
//! a ; |b ; c      evaluates as      (a OR b) AND c
//! ```
//!
//! Every predicate is evaluated for every record, so an unknown field or an
//! unsupported comparison is reported no matter how the chain would have
//! short-circuited.

use crate::criterion::Joiner;
use crate::error::Result;
use crate::predicate::Predicate;
use crate::sequence::CriteriaSequence;
use crate::value::Value;

/// Compiled, storage-agnostic form of a [`CriteriaSequence`].
///
/// # Example
///
/// ```
/// use search_criteria::{CriteriaSequence, Number, Value};
///
/// struct Task {
///     name: String,
///     priority: i64,
/// }
///
/// fn accessor<'a>(task: &'a Task, key: &str) -> Option<Value<'a>> {
///     match key {
///         "name" => Some(Value::String(&task.name)),
///         "priority" => Some(Value::Number(Number::I64(task.priority))),
///         _ => None,
///     }
/// }
///
/// let tasks = vec![
///     Task { name: "write docs".into(), priority: 1 },
///     Task { name: "fix bug".into(), priority: 5 },
///     Task { name: "fix typo".into(), priority: 2 },
/// ];
///
/// let filter = CriteriaSequence::parse("name~fix;priority>3").unwrap().compile().unwrap();
/// let hits = filter.filter(&tasks, accessor).unwrap();
/// assert_eq!(hits.len(), 1);
/// assert_eq!(hits[0].name, "fix bug");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Filter {
    steps: Vec<(Joiner, Predicate)>,
}

impl Filter {
    /// Translates every criterion of `seq`.
    ///
    /// Fails on the first criterion whose value shape does not fit its
    /// operation. An unset joiner counts as AND.
    pub fn compile(seq: &CriteriaSequence) -> Result<Self> {
        let steps = seq
            .iter()
            .map(|c| Ok((c.joiner().unwrap_or(Joiner::And), Predicate::translate(c)?)))
            .collect::<Result<Vec<_>>>()?;
        log::debug!("compiled filter with {} predicates", steps.len());
        Ok(Filter { steps })
    }

    /// The predicates in evaluation order.
    pub fn predicates(&self) -> impl Iterator<Item = &Predicate> {
        self.steps.iter().map(|(_, p)| p)
    }

    /// Returns `true` if there are no predicates (matches everything).
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    // ========================================================================
    // Execution
    // ========================================================================

    /// Tests a single record.
    pub fn matches<T, F>(&self, item: &T, accessor: F) -> Result<bool>
    where
        for<'a> F: Fn(&'a T, &str) -> Option<Value<'a>>,
    {
        let mut result: Option<bool> = None;
        for (joiner, predicate) in &self.steps {
            let current = predicate.evaluate(item, &accessor)?;
            result = Some(match (result, joiner) {
                (None, _) => current,
                (Some(acc), Joiner::And) => acc && current,
                (Some(acc), Joiner::Or) => acc || current,
            });
        }
        Ok(result.unwrap_or(true))
    }

    /// Returns references to the matching records, in input order.
    pub fn filter<'a, T, F>(&self, items: &'a [T], accessor: F) -> Result<Vec<&'a T>>
    where
        for<'b> F: Fn(&'b T, &str) -> Option<Value<'b>>,
    {
        let mut results = Vec::new();
        for item in items {
            if self.matches(item, &accessor)? {
                results.push(item);
            }
        }
        log::debug!("filter kept {} of {} records", results.len(), items.len());
        Ok(results)
    }

    /// Clones the matching records.
    pub fn filter_cloned<T, F>(&self, items: &[T], accessor: F) -> Result<Vec<T>>
    where
        T: Clone,
        for<'a> F: Fn(&'a T, &str) -> Option<Value<'a>>,
    {
        Ok(self
            .filter(items, accessor)?
            .into_iter()
            .cloned()
            .collect())
    }

    /// Counts the matching records.
    pub fn count<T, F>(&self, items: &[T], accessor: F) -> Result<usize>
    where
        for<'a> F: Fn(&'a T, &str) -> Option<Value<'a>>,
    {
        let mut n = 0;
        for item in items {
            if self.matches(item, &accessor)? {
                n += 1;
            }
        }
        Ok(n)
    }

    /// Returns `true` if any record matches.
    ///
    /// Stops at the first match; records after it are not checked for
    /// field errors.
    pub fn any<T, F>(&self, items: &[T], accessor: F) -> Result<bool>
    where
        for<'a> F: Fn(&'a T, &str) -> Option<Value<'a>>,
    {
        Ok(self.position(items, accessor)?.is_some())
    }

    /// Returns `true` if every record matches (vacuously true when empty).
    pub fn all<T, F>(&self, items: &[T], accessor: F) -> Result<bool>
    where
        for<'a> F: Fn(&'a T, &str) -> Option<Value<'a>>,
    {
        for item in items {
            if !self.matches(item, &accessor)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Finds the first matching record.
    pub fn find<'a, T, F>(&self, items: &'a [T], accessor: F) -> Result<Option<&'a T>>
    where
        for<'b> F: Fn(&'b T, &str) -> Option<Value<'b>>,
    {
        Ok(self.position(items, accessor)?.map(|i| &items[i]))
    }

    /// Finds the index of the first matching record.
    pub fn position<T, F>(&self, items: &[T], accessor: F) -> Result<Option<usize>>
    where
        for<'a> F: Fn(&'a T, &str) -> Option<Value<'a>>,
    {
        for (i, item) in items.iter().enumerate() {
            if self.matches(item, &accessor)? {
                return Ok(Some(i));
            }
        }
        Ok(None)
    }
}

impl CriteriaSequence {
    /// Compiles this sequence into a [`Filter`].
    pub fn compile(&self) -> Result<Filter> {
        Filter::compile(self)
    }
}
