//! A single field comparison and its wire fragment.
//!
//! A [`Criterion`] is one `key opcode value` comparison plus the
//! [`Joiner`] that links it to the criterion before it in a sequence.
//!
//! Fragment grammar:
//!
//! ```text
//! fragment = ["|"] key opcode value
//! key      = [A-Za-z0-9_]+
//! opcode   = ":" | "!" | "@" | "~" | "<" | ">" | "_"
//! value    = token ("," token)*
//! token    = [A-Za-z0-9_]+
//! ```
//!
//! The key is greedy, but only as far as the rest still forms a value:
//! `a__,b` reads as key `a`, `In`, `[_, b]`. Empty list elements are
//! rejected.

use std::fmt;
use std::str::FromStr;
use std::time::SystemTime;

use chrono::{DateTime, TimeZone};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::{self, Deserialize, Deserializer};
use serde::{Serialize, Serializer};

use crate::error::{Result, SearchError};
use crate::op::{all_codes, Operation};
use crate::value::Timestamp;

/// Wire marker for an OR joiner.
pub const OR_MARKER: char = '|';

/// Separator between list elements inside a value.
pub const LIST_SEPARATOR: char = ',';

static FRAGMENT: Lazy<Regex> = Lazy::new(|| {
    let pattern = format!(
        r"^(\|?)([A-Za-z0-9_]+)([{}])([A-Za-z0-9_]+(?:,[A-Za-z0-9_]+)*)$",
        regex::escape(&all_codes())
    );
    Regex::new(&pattern).expect("fragment pattern is valid")
});

/// Logical connective linking a criterion to its predecessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Joiner {
    And,
    Or,
}

impl Joiner {
    /// Maps the tri-state joiner flag: `None` stays unset, `Some(false)` is
    /// AND and `Some(true)` is OR.
    pub fn from_flag(flag: Option<bool>) -> Option<Joiner> {
        flag.map(|or| if or { Joiner::Or } else { Joiner::And })
    }

    /// Inverse of [`Joiner::from_flag`].
    pub fn to_flag(joiner: Option<Joiner>) -> Option<bool> {
        joiner.map(|j| j == Joiner::Or)
    }
}

/// One scalar criterion value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scalar {
    Text(String),
    Integer(i64),
    /// Always rendered as epoch milliseconds.
    Instant(Timestamp),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Text(s) => f.write_str(s),
            Scalar::Integer(n) => write!(f, "{n}"),
            Scalar::Instant(t) => write!(f, "{t}"),
        }
    }
}

/// Value of a criterion: a scalar, or a list of scalars for [`Operation::In`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CriterionValue {
    Scalar(Scalar),
    List(Vec<Scalar>),
}

impl CriterionValue {
    /// Returns `true` for list values.
    pub fn is_list(&self) -> bool {
        matches!(self, CriterionValue::List(_))
    }

    /// Returns the scalar, if this is not a list.
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            CriterionValue::Scalar(s) => Some(s),
            CriterionValue::List(_) => None,
        }
    }

    /// Returns the list elements, if this is a list.
    pub fn as_list(&self) -> Option<&[Scalar]> {
        match self {
            CriterionValue::List(items) => Some(items),
            CriterionValue::Scalar(_) => None,
        }
    }
}

impl fmt::Display for CriterionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CriterionValue::Scalar(s) => write!(f, "{s}"),
            CriterionValue::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, "{LIST_SEPARATOR}")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
        }
    }
}

macro_rules! scalar_from {
    ($($source:ty => |$v:ident| $body:expr),+ $(,)?) => {
        $(
            impl From<$source> for Scalar {
                fn from($v: $source) -> Self {
                    $body
                }
            }

            impl From<$source> for CriterionValue {
                fn from(v: $source) -> Self {
                    CriterionValue::Scalar(Scalar::from(v))
                }
            }
        )+
    };
}

scalar_from! {
    String => |s| Scalar::Text(s),
    &str => |s| Scalar::Text(s.to_string()),
    &String => |s| Scalar::Text(s.clone()),
    i64 => |n| Scalar::Integer(n),
    i32 => |n| Scalar::Integer(i64::from(n)),
    u32 => |n| Scalar::Integer(i64::from(n)),
    Timestamp => |t| Scalar::Instant(t),
    SystemTime => |t| Scalar::Instant(Timestamp::from(t)),
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Scalar {
    fn from(dt: DateTime<Tz>) -> Self {
        Scalar::Instant(Timestamp::from(dt))
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for CriterionValue {
    fn from(dt: DateTime<Tz>) -> Self {
        CriterionValue::Scalar(Scalar::from(dt))
    }
}

impl From<Scalar> for CriterionValue {
    fn from(s: Scalar) -> Self {
        CriterionValue::Scalar(s)
    }
}

impl<T: Into<Scalar>> From<Vec<T>> for CriterionValue {
    fn from(items: Vec<T>) -> Self {
        CriterionValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Scalar>, const N: usize> From<[T; N]> for CriterionValue {
    fn from(items: [T; N]) -> Self {
        CriterionValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Clone + Into<Scalar>> From<&[T]> for CriterionValue {
    fn from(items: &[T]) -> Self {
        CriterionValue::List(items.iter().cloned().map(Into::into).collect())
    }
}

/// One comparison: joiner, field key, operation and value.
///
/// # Example
///
/// ```
/// use search_criteria::{Criterion, Operation};
///
/// let c = Criterion::with_or("status", Operation::In, vec!["open", "held"]).unwrap();
/// assert_eq!(c.render(), "|status_open,held");
///
/// let parsed = Criterion::parse_one("|status_open,held").unwrap();
/// assert_eq!(parsed, c);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Criterion {
    joiner: Option<Joiner>,
    key: String,
    operation: Operation,
    value: CriterionValue,
}

impl Criterion {
    /// Creates a criterion.
    ///
    /// `joiner` is a tri-state flag: `None` (unset) and `Some(false)`
    /// both join with AND, `Some(true)` joins with OR. The distinction
    /// between unset and AND is preserved.
    ///
    /// Fails with [`SearchError::InvalidValue`] when `operation` is `In`
    /// and `value` is not a list.
    pub fn new(
        joiner: Option<bool>,
        key: impl Into<String>,
        operation: Operation,
        value: impl Into<CriterionValue>,
    ) -> Result<Self> {
        let key = key.into();
        let value = value.into();
        if operation == Operation::In && !value.is_list() {
            return Err(SearchError::InvalidValue {
                key,
                op: operation,
                expected: "needs a list value",
            });
        }
        Ok(Criterion {
            joiner: Joiner::from_flag(joiner),
            key,
            operation,
            value,
        })
    }

    /// Creates a criterion joined with AND.
    pub fn with_and(
        key: impl Into<String>,
        operation: Operation,
        value: impl Into<CriterionValue>,
    ) -> Result<Self> {
        Criterion::new(Some(false), key, operation, value)
    }

    /// Creates a criterion joined with OR.
    pub fn with_or(
        key: impl Into<String>,
        operation: Operation,
        value: impl Into<CriterionValue>,
    ) -> Result<Self> {
        Criterion::new(Some(true), key, operation, value)
    }

    /// Parses a single fragment such as `name:bob` or `|id_1,2,3`.
    ///
    /// A leading `|` yields an OR joiner, its absence an AND joiner. `In`
    /// always yields a list value; any other operation yields a list only
    /// when the value contains a comma.
    pub fn parse_one(text: &str) -> Result<Self> {
        let caps = FRAGMENT
            .captures(text)
            .ok_or_else(|| SearchError::parse(text, diagnose(text)))?;

        let joiner = if caps[1].is_empty() {
            Joiner::And
        } else {
            Joiner::Or
        };
        let operation = caps[3]
            .chars()
            .next()
            .and_then(Operation::from_code)
            .ok_or_else(|| SearchError::parse(text, "unknown operator code"))?;
        let value = parse_value(operation, &caps[4]);

        log::trace!("parsed fragment {text:?} as {operation} on '{}'", &caps[2]);
        Ok(Criterion {
            joiner: Some(joiner),
            key: caps[2].to_string(),
            operation,
            value,
        })
    }

    /// Renders this criterion as its canonical fragment, including the
    /// leading `|` when joined with OR.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out, true);
        out
    }

    pub(crate) fn render_into(&self, out: &mut String, with_joiner: bool) {
        if with_joiner && self.is_or() {
            out.push(OR_MARKER);
        }
        out.push_str(&self.key);
        out.push(self.operation.code());
        out.push_str(&self.value.to_string());
    }

    /// Returns the joiner, `None` when unset.
    pub fn joiner(&self) -> Option<Joiner> {
        self.joiner
    }

    /// Returns the joiner as its tri-state flag.
    pub fn joiner_flag(&self) -> Option<bool> {
        Joiner::to_flag(self.joiner)
    }

    /// Returns `true` when this criterion joins its predecessor with OR.
    pub fn is_or(&self) -> bool {
        self.joiner == Some(Joiner::Or)
    }

    /// Returns the field key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the operation.
    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Returns the value.
    pub fn value(&self) -> &CriterionValue {
        &self.value
    }

    /// Replaces the joiner.
    pub fn set_joiner(&mut self, joiner: Option<Joiner>) {
        self.joiner = joiner;
    }

    /// Replaces the field key.
    pub fn set_key(&mut self, key: impl Into<String>) {
        self.key = key.into();
    }

    /// Replaces the operation.
    ///
    /// The `In`-needs-a-list rule is not rechecked here; translation
    /// rejects an inconsistent criterion.
    pub fn set_operation(&mut self, operation: Operation) {
        self.operation = operation;
    }

    /// Replaces the value. Not rechecked, see [`Criterion::set_operation`].
    pub fn set_value(&mut self, value: impl Into<CriterionValue>) {
        self.value = value.into();
    }

    pub(crate) fn from_parts(
        joiner: Option<Joiner>,
        key: &str,
        operation: Operation,
        value: CriterionValue,
    ) -> Self {
        Criterion {
            joiner,
            key: key.to_string(),
            operation,
            value,
        }
    }

    pub(crate) fn with_joiner(mut self, joiner: Option<Joiner>) -> Self {
        self.joiner = joiner;
        self
    }
}

fn parse_value(operation: Operation, raw: &str) -> CriterionValue {
    if operation != Operation::In && !raw.contains(LIST_SEPARATOR) {
        return CriterionValue::Scalar(Scalar::Text(raw.to_string()));
    }
    CriterionValue::List(
        raw.split(LIST_SEPARATOR)
            .map(|token| Scalar::Text(token.to_string()))
            .collect(),
    )
}

/// Explains why `text` did not match the fragment grammar.
fn diagnose(text: &str) -> &'static str {
    let body = text.strip_prefix(OR_MARKER).unwrap_or(text);
    if body.is_empty() {
        return "empty fragment";
    }
    let is_key_char = |c: char| c.is_ascii_alphanumeric() || c == '_';
    let key_len = body.find(|c: char| !is_key_char(c)).unwrap_or(body.len());
    if key_len == 0 {
        return "missing key";
    }
    let rest = &body[key_len..];
    if rest.starts_with(LIST_SEPARATOR) || body.contains(",,") || body.ends_with(LIST_SEPARATOR) {
        return "empty list element";
    }
    let Some(code) = rest.chars().next() else {
        // `key_` is an In criterion without a value.
        return if body.ends_with('_') {
            "missing value"
        } else {
            "missing operator"
        };
    };
    if Operation::from_code(code).is_none() {
        return "unknown operator code";
    }
    let value = &rest[code.len_utf8()..];
    if value.is_empty() {
        return "missing value";
    }
    if value.starts_with(LIST_SEPARATOR) {
        return "empty list element";
    }
    "invalid character in value"
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl FromStr for Criterion {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self> {
        Criterion::parse_one(s)
    }
}

impl Serialize for Criterion {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.render())
    }
}

impl<'de> Deserialize<'de> for Criterion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Criterion::parse_one(&text).map_err(de::Error::custom)
    }
}
