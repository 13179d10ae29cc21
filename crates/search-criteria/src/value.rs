//! Runtime field values handed to the predicate translator.
//!
//! A [`Value`] is what an accessor reports for one field of one record. It
//! borrows from the record, so evaluating a filter allocates nothing for
//! text fields.

use std::cmp::Ordering;
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::{DateTime, TimeZone};

/// Runtime value of a record field, borrowed from the record.
///
/// # Example
///
/// ```
/// use search_criteria::{Number, Value};
///
/// struct Book {
///     title: String,
///     pages: u32,
///     subtitle: Option<String>,
/// }
///
/// fn accessor<'a>(book: &'a Book, key: &str) -> Option<Value<'a>> {
///     match key {
///         "title" => Some(Value::String(&book.title)),
///         "pages" => Some(Value::Number(Number::from(book.pages))),
///         "subtitle" => Some(book.subtitle.as_deref().map_or(Value::Null, Value::String)),
///         _ => None,
///     }
/// }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value<'a> {
    /// Text value (borrowed).
    String(&'a str),
    /// Numeric value.
    Number(Number),
    /// Instant as milliseconds since the Unix epoch.
    Timestamp(Timestamp),
    /// Boolean value.
    Bool(bool),
    /// The field exists but holds no value.
    Null,
}

impl<'a> Value<'a> {
    /// Returns `true` if this is a `Null` value.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Extracts the text, if present.
    pub fn as_str(&self) -> Option<&'a str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Extracts the number, if present.
    pub fn as_number(&self) -> Option<Number> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Extracts the timestamp, if present.
    pub fn as_timestamp(&self) -> Option<Timestamp> {
        match self {
            Value::Timestamp(t) => Some(*t),
            _ => None,
        }
    }

    /// Extracts the boolean, if present.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Short type name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::String(_) => "text",
            Value::Number(_) => "number",
            Value::Timestamp(_) => "timestamp",
            Value::Bool(_) => "boolean",
            Value::Null => "null",
        }
    }
}

impl<'a> From<&'a str> for Value<'a> {
    fn from(s: &'a str) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value<'_> {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Timestamp> for Value<'_> {
    fn from(t: Timestamp) -> Self {
        Value::Timestamp(t)
    }
}

impl<'a, T: Into<Value<'a>>> From<Option<T>> for Value<'a> {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Numeric value keeping the precision of its source type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    /// Signed 64-bit integer.
    I64(i64),
    /// Unsigned 64-bit integer.
    U64(u64),
    /// 64-bit floating point.
    F64(f64),
}

impl Number {
    /// Converts the number to f64 for mixed comparisons.
    pub fn to_f64(self) -> f64 {
        match self {
            Number::I64(n) => n as f64,
            Number::U64(n) => n as f64,
            Number::F64(n) => n,
        }
    }

    /// Compares two numbers, handling mixed types.
    ///
    /// Integer pairs compare exactly. Returns `None` when a NaN is involved.
    pub fn compare(self, other: Number) -> Option<Ordering> {
        match (self, other) {
            (Number::I64(a), Number::I64(b)) => Some(a.cmp(&b)),
            (Number::U64(a), Number::U64(b)) => Some(a.cmp(&b)),
            (Number::I64(a), Number::U64(b)) => Some(i128::from(a).cmp(&i128::from(b))),
            (Number::U64(a), Number::I64(b)) => Some(i128::from(a).cmp(&i128::from(b))),
            _ => self.to_f64().partial_cmp(&other.to_f64()),
        }
    }

    /// Reads a number from its decimal text form.
    ///
    /// Non-finite spellings such as `inf` or `NaN` are not numbers here.
    pub fn parse(text: &str) -> Option<Number> {
        if let Ok(n) = text.parse::<i64>() {
            return Some(Number::I64(n));
        }
        if let Ok(n) = text.parse::<u64>() {
            return Some(Number::U64(n));
        }
        text.parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(Number::F64)
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.compare(*other)
    }
}

macro_rules! number_from {
    ($variant:ident as $target:ty: $($source:ty),+) => {
        $(
            impl From<$source> for Number {
                fn from(n: $source) -> Self {
                    Number::$variant(n as $target)
                }
            }

            impl From<$source> for Value<'_> {
                fn from(n: $source) -> Self {
                    Value::Number(Number::from(n))
                }
            }
        )+
    };
}

number_from!(I64 as i64: i8, i16, i32, i64, isize);
number_from!(U64 as u64: u8, u16, u32, u64, usize);
number_from!(F64 as f64: f32, f64);

/// Instant represented as milliseconds since the Unix epoch.
///
/// Criteria never carry formatted dates: an instant always renders as its
/// millisecond count, and instants compare as integers.
///
/// ```
/// use search_criteria::Timestamp;
///
/// let ts = Timestamp::from_secs(1);
/// assert_eq!(ts.to_string(), "1000");
/// assert!(Timestamp(1000) < Timestamp(2000));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Creates a timestamp from milliseconds since the Unix epoch.
    pub fn from_millis(millis: i64) -> Self {
        Timestamp(millis)
    }

    /// Creates a timestamp from seconds since the Unix epoch.
    pub fn from_secs(secs: i64) -> Self {
        Timestamp(secs.saturating_mul(1000))
    }

    /// Returns milliseconds since the Unix epoch.
    pub fn as_millis(self) -> i64 {
        self.0
    }

    /// Returns whole seconds since the Unix epoch.
    pub fn as_secs(self) -> i64 {
        self.0.div_euclid(1000)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Timestamp {
    fn from(millis: i64) -> Self {
        Timestamp(millis)
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Timestamp {
    fn from(dt: DateTime<Tz>) -> Self {
        Timestamp(dt.timestamp_millis())
    }
}

impl From<SystemTime> for Timestamp {
    fn from(t: SystemTime) -> Self {
        let millis = match t.duration_since(UNIX_EPOCH) {
            Ok(after) => clamp_millis(after),
            Err(before) => -clamp_millis(before.duration()),
        };
        Timestamp(millis)
    }
}

fn clamp_millis(d: Duration) -> i64 {
    i64::try_from(d.as_millis()).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    #[test]
    fn value_extractors() {
        assert_eq!(Value::String("hello").as_str(), Some("hello"));
        assert_eq!(Value::Number(Number::I64(42)).as_number(), Some(Number::I64(42)));
        assert_eq!(Value::Timestamp(Timestamp(7)).as_timestamp(), Some(Timestamp(7)));
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert!(Value::Null.is_null());

        assert_eq!(Value::String("x").as_number(), None);
        assert_eq!(Value::Null.as_str(), None);
    }

    #[test]
    fn option_converts_to_null() {
        let missing: Option<&str> = None;
        assert_eq!(Value::from(missing), Value::Null);
        assert_eq!(Value::from(Some("a")), Value::String("a"));
        assert_eq!(Value::from(Some(3u8)), Value::Number(Number::U64(3)));
    }

    #[test]
    fn number_mixed_comparisons() {
        assert_eq!(Number::I64(-1).compare(Number::U64(0)), Some(Ordering::Less));
        assert_eq!(Number::U64(u64::MAX).compare(Number::I64(i64::MAX)), Some(Ordering::Greater));
        assert_eq!(Number::I64(5).compare(Number::F64(5.0)), Some(Ordering::Equal));
        assert_eq!(Number::F64(f64::NAN).compare(Number::F64(1.0)), None);
    }

    #[test]
    fn number_parse() {
        assert_eq!(Number::parse("42"), Some(Number::I64(42)));
        assert_eq!(Number::parse("-3"), Some(Number::I64(-3)));
        assert_eq!(Number::parse("18446744073709551615"), Some(Number::U64(u64::MAX)));
        assert_eq!(Number::parse("2.5"), Some(Number::F64(2.5)));
        assert_eq!(Number::parse("abc"), None);
        assert_eq!(Number::parse(""), None);
        assert_eq!(Number::parse("1e3"), Some(Number::F64(1000.0)));
    }

    #[test]
    fn number_parse_rejects_non_finite() {
        for text in ["inf", "infinity", "Infinity", "NaN", "nan", "1e999"] {
            assert_eq!(Number::parse(text), None, "{text:?}");
        }
    }

    #[test]
    fn timestamp_from_chrono() {
        let utc = Utc.timestamp_millis_opt(1_000).unwrap();
        assert_eq!(Timestamp::from(utc), Timestamp(1_000));

        let offset = FixedOffset::east_opt(3600).unwrap();
        let shifted = utc.with_timezone(&offset);
        assert_eq!(Timestamp::from(shifted), Timestamp(1_000));
    }

    #[test]
    fn timestamp_from_system_time() {
        let after = UNIX_EPOCH + Duration::from_millis(1_500);
        assert_eq!(Timestamp::from(after), Timestamp(1_500));

        let before = UNIX_EPOCH - Duration::from_millis(250);
        assert_eq!(Timestamp::from(before), Timestamp(-250));
    }

    #[test]
    fn timestamp_seconds() {
        assert_eq!(Timestamp::from_secs(2).as_millis(), 2_000);
        assert_eq!(Timestamp(-1).as_secs(), -1);
        assert_eq!(Timestamp(1_999).as_secs(), 1);
    }
}
