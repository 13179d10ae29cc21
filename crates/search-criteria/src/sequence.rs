//! Ordered criteria lists and their canonical string form.
//!
//! A [`CriteriaSequence`] is the whole filter expression carried in the
//! `search` query parameter: fragments separated by `;`, evaluated left to
//! right.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserialize, Deserializer};
use serde::{Serialize, Serializer};

use crate::criterion::{Criterion, CriterionValue, Joiner, Scalar};
use crate::error::{Result, SearchError};
use crate::op::Operation;

/// Separator between fragments.
pub const SEPARATOR: char = ';';

/// Canonical query-parameter name carrying a serialized sequence.
pub const SEARCH_PARAM: &str = "search";

/// Ordered list of criteria.
///
/// Order is significant: it is both the evaluation chain and the emission
/// order. The first element's joiner is never written out.
///
/// # Example
///
/// ```
/// use search_criteria::{CriteriaSequence, Operation};
///
/// let seq = CriteriaSequence::new()
///     .and_eq("status", "open")
///     .or_gte("priority", 3i64)
///     .and_in("team", ["core", "infra"]);
///
/// assert_eq!(seq.serialize(), "status:open;|priority>3;team_core,infra");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CriteriaSequence {
    criteria: Vec<Criterion>,
}

impl CriteriaSequence {
    /// Creates an empty sequence.
    pub fn new() -> Self {
        CriteriaSequence::default()
    }

    /// Parses a `;`-separated criteria string.
    ///
    /// The first criterion's joiner is reset to unset, so a leading `|` is
    /// accepted and discarded. Empty segments are rejected.
    pub fn parse(text: &str) -> Result<Self> {
        let mut criteria = Vec::new();
        for segment in text.split(SEPARATOR) {
            if segment.is_empty() {
                return Err(SearchError::parse(text, "empty segment"));
            }
            let criterion = Criterion::parse_one(segment)?;
            let criterion = if criteria.is_empty() {
                criterion.with_joiner(None)
            } else {
                criterion
            };
            criteria.push(criterion);
        }
        log::debug!("parsed {} criteria from {text:?}", criteria.len());
        Ok(CriteriaSequence { criteria })
    }

    /// Serializes to the canonical string form.
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for (i, criterion) in self.criteria.iter().enumerate() {
            if i > 0 {
                out.push(SEPARATOR);
            }
            criterion.render_into(&mut out, i > 0);
        }
        out
    }

    // ========================================================================
    // Builders
    // ========================================================================

    /// Appends a copy of `criterion` joined with AND.
    pub fn and(mut self, criterion: &Criterion) -> Self {
        self.criteria
            .push(criterion.clone().with_joiner(Some(Joiner::And)));
        self
    }

    /// Appends a copy of `criterion` joined with OR.
    pub fn or(mut self, criterion: &Criterion) -> Self {
        self.criteria
            .push(criterion.clone().with_joiner(Some(Joiner::Or)));
        self
    }

    /// Appends `criterion` keeping its own joiner.
    pub fn push(&mut self, criterion: Criterion) {
        self.criteria.push(criterion);
    }

    fn append_scalar(
        mut self,
        joiner: Joiner,
        key: &str,
        operation: Operation,
        value: Scalar,
    ) -> Self {
        self.criteria
            .push(Criterion::from_parts(Some(joiner), key, operation, value.into()));
        self
    }

    fn append_list<I>(mut self, joiner: Joiner, key: &str, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Scalar>,
    {
        let list = values.into_iter().map(Into::into).collect();
        self.criteria.push(Criterion::from_parts(
            Some(joiner),
            key,
            Operation::In,
            CriterionValue::List(list),
        ));
        self
    }

    /// Appends an AND equality criterion.
    pub fn and_eq(self, key: &str, value: impl Into<Scalar>) -> Self {
        self.append_scalar(Joiner::And, key, Operation::Equals, value.into())
    }

    /// Appends an AND not-equal criterion.
    pub fn and_ne(self, key: &str, value: impl Into<Scalar>) -> Self {
        self.append_scalar(Joiner::And, key, Operation::NotEquals, value.into())
    }

    /// Appends an AND is-null criterion.
    ///
    /// The wire form needs a value token even though it is ignored, so the
    /// criterion carries `null`.
    pub fn and_null(self, key: &str) -> Self {
        self.append_scalar(Joiner::And, key, Operation::IsNull, "null".into())
    }

    /// Appends an AND like (substring) criterion.
    pub fn and_like(self, key: &str, value: impl Into<Scalar>) -> Self {
        self.append_scalar(Joiner::And, key, Operation::Like, value.into())
    }

    /// Appends an AND less-than-or-equal criterion.
    pub fn and_lte(self, key: &str, value: impl Into<Scalar>) -> Self {
        self.append_scalar(Joiner::And, key, Operation::LessThanOrEqual, value.into())
    }

    /// Appends an AND greater-than-or-equal criterion.
    pub fn and_gte(self, key: &str, value: impl Into<Scalar>) -> Self {
        self.append_scalar(Joiner::And, key, Operation::GreaterThanOrEqual, value.into())
    }

    /// Appends an AND in-list criterion.
    pub fn and_in<I>(self, key: &str, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Scalar>,
    {
        self.append_list(Joiner::And, key, values)
    }

    /// Appends an OR equality criterion.
    pub fn or_eq(self, key: &str, value: impl Into<Scalar>) -> Self {
        self.append_scalar(Joiner::Or, key, Operation::Equals, value.into())
    }

    /// Appends an OR not-equal criterion.
    pub fn or_ne(self, key: &str, value: impl Into<Scalar>) -> Self {
        self.append_scalar(Joiner::Or, key, Operation::NotEquals, value.into())
    }

    /// Appends an OR is-null criterion.
    pub fn or_null(self, key: &str) -> Self {
        self.append_scalar(Joiner::Or, key, Operation::IsNull, "null".into())
    }

    /// Appends an OR like criterion.
    pub fn or_like(self, key: &str, value: impl Into<Scalar>) -> Self {
        self.append_scalar(Joiner::Or, key, Operation::Like, value.into())
    }

    /// Appends an OR less-than-or-equal criterion.
    pub fn or_lte(self, key: &str, value: impl Into<Scalar>) -> Self {
        self.append_scalar(Joiner::Or, key, Operation::LessThanOrEqual, value.into())
    }

    /// Appends an OR greater-than-or-equal criterion.
    pub fn or_gte(self, key: &str, value: impl Into<Scalar>) -> Self {
        self.append_scalar(Joiner::Or, key, Operation::GreaterThanOrEqual, value.into())
    }

    /// Appends an OR in-list criterion.
    pub fn or_in<I>(self, key: &str, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Scalar>,
    {
        self.append_list(Joiner::Or, key, values)
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    /// Returns the criteria in order.
    pub fn criteria(&self) -> &[Criterion] {
        &self.criteria
    }

    /// Returns an iterator over the criteria.
    pub fn iter(&self) -> std::slice::Iter<'_, Criterion> {
        self.criteria.iter()
    }

    /// Number of criteria.
    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    /// Returns `true` if there are no criteria (matches everything).
    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }
}

/// Parses a criteria string. See [`CriteriaSequence::parse`].
pub fn parse(text: &str) -> Result<CriteriaSequence> {
    CriteriaSequence::parse(text)
}

/// Serializes a sequence. See [`CriteriaSequence::serialize`].
pub fn serialize(seq: &CriteriaSequence) -> String {
    seq.serialize()
}

impl<'a> IntoIterator for &'a CriteriaSequence {
    type Item = &'a Criterion;
    type IntoIter = std::slice::Iter<'a, Criterion>;

    fn into_iter(self) -> Self::IntoIter {
        self.criteria.iter()
    }
}

impl From<Vec<Criterion>> for CriteriaSequence {
    fn from(criteria: Vec<Criterion>) -> Self {
        CriteriaSequence { criteria }
    }
}

impl FromIterator<Criterion> for CriteriaSequence {
    fn from_iter<I: IntoIterator<Item = Criterion>>(iter: I) -> Self {
        CriteriaSequence {
            criteria: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for CriteriaSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}

impl FromStr for CriteriaSequence {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self> {
        CriteriaSequence::parse(s)
    }
}

impl Serialize for CriteriaSequence {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&CriteriaSequence::serialize(self))
    }
}

impl<'de> Deserialize<'de> for CriteriaSequence {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        CriteriaSequence::parse(&text).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Timestamp;

    #[test]
    fn chaining_scenario() {
        let seq = parse("a:b;|c>d").unwrap();
        assert_eq!(seq.len(), 2);

        let first = &seq.criteria()[0];
        assert_eq!(first.joiner(), None);
        assert_eq!(first.key(), "a");
        assert_eq!(first.operation(), Operation::Equals);
        assert_eq!(first.value(), &CriterionValue::from("b"));

        let second = &seq.criteria()[1];
        assert_eq!(second.joiner(), Some(Joiner::Or));
        assert_eq!(second.key(), "c");
        assert_eq!(second.operation(), Operation::GreaterThanOrEqual);
        assert_eq!(second.value(), &CriterionValue::from("d"));

        assert_eq!(serialize(&seq), "a:b;|c>d");
    }

    #[test]
    fn leading_or_is_discarded() {
        let seq = parse("|x:y").unwrap();
        assert_eq!(seq.criteria()[0].joiner(), None);
        assert_eq!(seq.serialize(), "x:y");
    }

    #[test]
    fn empty_input_and_segments_rejected() {
        for text in ["", ";", "a:b;", ";a:b", "a:b;;c:d"] {
            let err = parse(text).unwrap_err();
            assert!(err.is_parse(), "{text:?}: {err}");
        }
    }

    #[test]
    fn fragment_error_propagates() {
        let err = parse("a:b;c?d").unwrap_err();
        match err {
            SearchError::Parse { fragment, .. } => assert_eq!(fragment, "c?d"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn builder_first_joiner_suppressed() {
        let first = Criterion::with_or("a", Operation::Equals, "b").unwrap();
        let second = Criterion::with_and("c", Operation::Like, "d").unwrap();

        let seq = CriteriaSequence::new().or(&first).or(&second);
        assert_eq!(seq.serialize(), "a:b;|c~d");

        let seq = CriteriaSequence::new().and(&first).and(&second);
        assert_eq!(seq.serialize(), "a:b;c~d");
        // The source criteria are untouched.
        assert!(first.is_or());
    }

    #[test]
    fn builder_shorthands() {
        let seq = CriteriaSequence::new()
            .and_eq("a", "1")
            .and_ne("b", 2i64)
            .or_null("c")
            .and_like("d", "x")
            .or_lte("e", Timestamp(9))
            .and_gte("f", 0i32)
            .or_in("g", ["h", "i"])
            .or_eq("j", "k")
            .or_ne("l", "m")
            .and_null("n")
            .or_like("o", "p")
            .and_lte("q", 1u32)
            .or_gte("r", "s")
            .and_in("t", vec![1i64]);

        assert_eq!(
            seq.serialize(),
            "a:1;b!2;|c@null;d~x;|e<9;f>0;|g_h,i;|j:k;|l!m;n@null;|o~p;q<1;|r>s;t_1"
        );
        assert_eq!(seq.len(), 14);
    }

    #[test]
    fn normalize_is_idempotent() {
        let text = "|a:b;c_1,2;|d@null";
        let once = parse(text).unwrap();
        let twice = parse(&once.serialize()).unwrap();
        assert_eq!(once, twice);
        assert_eq!(once.serialize(), twice.serialize());
    }

    #[test]
    fn from_str_and_display() {
        let seq: CriteriaSequence = "a:b;|c_d,e".parse().unwrap();
        assert_eq!(seq.to_string(), "a:b;|c_d,e");
    }

    #[test]
    fn collects_from_iterator() {
        let seq: CriteriaSequence = ["a:b", "|c:d"]
            .into_iter()
            .map(|t| Criterion::parse_one(t).unwrap())
            .collect();
        assert_eq!(seq.serialize(), "a:b;|c:d");
    }
}
