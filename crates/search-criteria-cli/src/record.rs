//! JSON objects as searchable records.

use std::collections::HashSet;

use anyhow::{bail, Context, Result};
use chrono::DateTime;
use search_criteria::{Number, Searchable, Timestamp, Value};
use serde_json::{Map, Value as Json};

/// How JSON fields are exposed to the filter.
#[derive(Debug, Default)]
pub struct FieldOptions {
    /// Fields whose RFC 3339 strings are read as timestamps.
    pub date_fields: HashSet<String>,
    /// Report absent keys as null instead of unknown.
    pub missing_as_null: bool,
}

/// One JSON object viewed through [`FieldOptions`].
pub struct Record<'r> {
    fields: &'r Map<String, Json>,
    options: &'r FieldOptions,
}

impl<'r> Record<'r> {
    pub fn new(fields: &'r Map<String, Json>, options: &'r FieldOptions) -> Self {
        Record { fields, options }
    }

    pub fn fields(&self) -> &'r Map<String, Json> {
        self.fields
    }
}

impl Searchable for Record<'_> {
    fn field_value(&self, key: &str) -> Option<Value<'_>> {
        let Some(json) = self.fields.get(key) else {
            return self.options.missing_as_null.then_some(Value::Null);
        };
        let is_date = self.options.date_fields.contains(key);
        Some(json_value(json, is_date))
    }
}

fn json_value(json: &Json, is_date: bool) -> Value<'_> {
    match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) if is_date => match n.as_i64() {
            Some(millis) => Value::Timestamp(Timestamp::from_millis(millis)),
            None => Value::Number(json_number(n)),
        },
        Json::Number(n) => Value::Number(json_number(n)),
        Json::String(s) if is_date => match DateTime::parse_from_rfc3339(s) {
            Ok(dt) => Value::Timestamp(Timestamp::from(dt)),
            Err(err) => {
                log::debug!("date field value {s:?} is not RFC 3339: {err}");
                Value::String(s)
            }
        },
        Json::String(s) => Value::String(s),
        // Nested values have no comparable form.
        Json::Array(_) | Json::Object(_) => Value::Null,
    }
}

fn json_number(n: &serde_json::Number) -> Number {
    if let Some(i) = n.as_i64() {
        Number::I64(i)
    } else if let Some(u) = n.as_u64() {
        Number::U64(u)
    } else {
        Number::F64(n.as_f64().unwrap_or(f64::NAN))
    }
}

/// Parses `input` as a JSON array of objects.
pub fn parse_records(input: &str) -> Result<Vec<Map<String, Json>>> {
    let json: Json = serde_json::from_str(input).context("input is not valid JSON")?;
    let Json::Array(items) = json else {
        bail!("input must be a JSON array of objects");
    };
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Json::Object(map) => Ok(map),
            other => bail!("record {i} is not an object: {other}"),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Json) -> Map<String, Json> {
        match value {
            Json::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn maps_json_types() {
        let fields = object(json!({
            "name": "ann",
            "age": 31,
            "big": 18446744073709551615u64,
            "score": 1.5,
            "active": true,
            "email": null,
            "tags": ["a"],
        }));
        let options = FieldOptions::default();
        let record = Record::new(&fields, &options);

        assert_eq!(record.field_value("name"), Some(Value::String("ann")));
        assert_eq!(record.field_value("age"), Some(Value::Number(Number::I64(31))));
        assert_eq!(
            record.field_value("big"),
            Some(Value::Number(Number::U64(u64::MAX)))
        );
        assert_eq!(record.field_value("score"), Some(Value::Number(Number::F64(1.5))));
        assert_eq!(record.field_value("active"), Some(Value::Bool(true)));
        assert_eq!(record.field_value("email"), Some(Value::Null));
        assert_eq!(record.field_value("tags"), Some(Value::Null));
        assert_eq!(record.field_value("missing"), None);
    }

    #[test]
    fn missing_as_null() {
        let fields = object(json!({ "name": "ann" }));
        let options = FieldOptions {
            missing_as_null: true,
            ..FieldOptions::default()
        };
        let record = Record::new(&fields, &options);
        assert_eq!(record.field_value("missing"), Some(Value::Null));
    }

    #[test]
    fn date_fields() {
        let fields = object(json!({
            "created": "1970-01-01T00:00:01Z",
            "updated": 2500,
            "note": "yesterday",
        }));
        let options = FieldOptions {
            date_fields: ["created", "updated", "note"]
                .into_iter()
                .map(String::from)
                .collect(),
            missing_as_null: false,
        };
        let record = Record::new(&fields, &options);

        assert_eq!(
            record.field_value("created"),
            Some(Value::Timestamp(Timestamp(1000)))
        );
        assert_eq!(
            record.field_value("updated"),
            Some(Value::Timestamp(Timestamp(2500)))
        );
        assert_eq!(record.field_value("note"), Some(Value::String("yesterday")));
    }

    #[test]
    fn parse_records_requires_array_of_objects() {
        assert_eq!(parse_records(r#"[{"a":1},{}]"#).unwrap().len(), 2);
        assert!(parse_records(r#"{"a":1}"#).is_err());
        assert!(parse_records(r#"[1]"#).is_err());
        assert!(parse_records("not json").is_err());
    }
}
