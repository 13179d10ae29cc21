//! `check` and `filter` subcommands.

use std::io::Write;

use anyhow::{Context, Result};
use search_criteria::{
    CriteriaSequence, Criterion, CriterionValue, Joiner, SearchError, Searchable,
};
use serde::Serialize;
use serde_json::{Map, Value as Json};

use crate::record::{parse_records, FieldOptions, Record};

/// Result of a subcommand, mapped to the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    NoMatch,
    Invalid,
}

impl Outcome {
    pub fn code(self) -> u8 {
        match self {
            Outcome::Success => 0,
            Outcome::NoMatch => 1,
            Outcome::Invalid => 2,
        }
    }
}

/// Structured view of one criterion for `check --json`.
#[derive(Debug, Serialize)]
struct CriterionView<'a> {
    joiner: Option<&'static str>,
    key: &'a str,
    operation: &'static str,
    code: char,
    value: Json,
}

impl<'a> From<&'a Criterion> for CriterionView<'a> {
    fn from(c: &'a Criterion) -> Self {
        let value = match c.value() {
            CriterionValue::Scalar(s) => Json::String(s.to_string()),
            CriterionValue::List(items) => {
                Json::Array(items.iter().map(|s| Json::String(s.to_string())).collect())
            }
        };
        CriterionView {
            joiner: c.joiner().map(|j| match j {
                Joiner::And => "and",
                Joiner::Or => "or",
            }),
            key: c.key(),
            operation: c.operation().as_str(),
            code: c.operation().code(),
            value,
        }
    }
}

/// Parses `search` and prints its canonical form or criteria list.
///
/// A malformed search is reported on `errors`.
pub fn check(
    search: &str,
    as_json: bool,
    out: &mut impl Write,
    errors: &mut impl Write,
) -> Result<Outcome> {
    let seq = match CriteriaSequence::parse(search) {
        Ok(seq) => seq,
        Err(err) => return reject(&err, errors),
    };

    if as_json {
        let views: Vec<CriterionView> = seq.iter().map(CriterionView::from).collect();
        serde_json::to_writer_pretty(&mut *out, &views)?;
        writeln!(out)?;
    } else {
        writeln!(out, "{seq}")?;
    }
    Ok(Outcome::Success)
}

/// Filters the JSON records in `input` and prints the matches.
///
/// Search and field errors are reported on `errors`. Unreadable input is
/// returned as an error.
pub fn filter(
    search: &str,
    input: &str,
    options: &FieldOptions,
    out: &mut impl Write,
    errors: &mut impl Write,
) -> Result<Outcome> {
    let filter = match CriteriaSequence::parse(search).and_then(|seq| seq.compile()) {
        Ok(filter) => filter,
        Err(err) => return reject(&err, errors),
    };

    let objects = parse_records(input)?;
    let records: Vec<Record> = objects.iter().map(|o| Record::new(o, options)).collect();
    let hits = match filter.filter(&records, Record::accessor) {
        Ok(hits) => hits,
        Err(err) => return reject(&err, errors),
    };
    log::info!("{} of {} records matched", hits.len(), records.len());

    let matched: Vec<&Map<String, Json>> = hits.iter().map(|r| r.fields()).collect();
    serde_json::to_writer_pretty(&mut *out, &matched).context("failed to write output")?;
    writeln!(out)?;

    Ok(if matched.is_empty() {
        Outcome::NoMatch
    } else {
        Outcome::Success
    })
}

fn reject(err: &SearchError, errors: &mut impl Write) -> Result<Outcome> {
    writeln!(errors, "Error: {err}")?;
    Ok(Outcome::Invalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    const PEOPLE: &str = r#"[
        {"name": "ann", "age": 31, "email": null, "joined": "2020-01-01T00:00:00Z"},
        {"name": "bob", "age": 17, "email": "bob@example.com", "joined": "2023-06-01T12:00:00+02:00"},
        {"name": "cy", "age": 45, "email": "cy@example.com", "joined": "2019-03-15T08:30:00Z"}
    ]"#;

    fn run_check(search: &str, as_json: bool) -> (Outcome, String) {
        let mut out: Vec<u8> = Vec::new();
        let outcome = check(search, as_json, &mut out, &mut io::sink()).unwrap();
        (outcome, String::from_utf8(out).unwrap())
    }

    fn filter_errors(search: &str, options: &FieldOptions) -> String {
        let mut out: Vec<u8> = Vec::new();
        let mut errors: Vec<u8> = Vec::new();
        let outcome = filter(search, PEOPLE, options, &mut out, &mut errors).unwrap();
        assert_eq!(outcome, Outcome::Invalid);
        assert!(out.is_empty());
        String::from_utf8(errors).unwrap()
    }

    fn run_filter(search: &str, options: &FieldOptions) -> (Outcome, Vec<String>) {
        let mut out: Vec<u8> = Vec::new();
        let outcome = filter(search, PEOPLE, options, &mut out, &mut io::sink()).unwrap();
        if outcome == Outcome::Invalid {
            return (outcome, Vec::new());
        }
        let rows: Vec<Json> = serde_json::from_slice(&out).unwrap();
        let names = rows
            .iter()
            .map(|r| r["name"].as_str().unwrap().to_string())
            .collect();
        (outcome, names)
    }

    #[test]
    fn check_prints_canonical_form() {
        let (outcome, text) = run_check("|a:b;|c>d", false);
        assert_eq!(outcome, Outcome::Success);
        assert_eq!(text, "a:b;|c>d\n");
    }

    #[test]
    fn check_json() {
        let (outcome, text) = run_check("a:b;|e_f,g", true);
        assert_eq!(outcome, Outcome::Success);
        let json: Json = serde_json::from_str(&text).unwrap();
        assert_eq!(json[0]["joiner"], Json::Null);
        assert_eq!(json[0]["operation"], "equals");
        assert_eq!(json[1]["joiner"], "or");
        assert_eq!(json[1]["code"], "_");
        assert_eq!(json[1]["value"], serde_json::json!(["f", "g"]));
    }

    #[test]
    fn check_rejects_malformed() {
        let (outcome, text) = run_check("a=b", false);
        assert_eq!(outcome, Outcome::Invalid);
        assert_eq!(outcome.code(), 2);
        assert!(text.is_empty());

        let mut errors: Vec<u8> = Vec::new();
        check("a=b", false, &mut io::sink(), &mut errors).unwrap();
        assert_eq!(
            String::from_utf8(errors).unwrap(),
            "Error: invalid search fragment \"a=b\": unknown operator code\n"
        );
    }

    #[test]
    fn filter_records() {
        let options = FieldOptions::default();
        assert_eq!(
            run_filter("age>18;email@null", &options),
            (Outcome::Success, vec!["ann".to_string()])
        );
        assert_eq!(
            run_filter("name_bob,cy;|age<20", &options),
            (Outcome::Success, vec!["bob".to_string(), "cy".to_string()])
        );
        assert_eq!(run_filter("age>100", &options), (Outcome::NoMatch, Vec::new()));
    }

    #[test]
    fn filter_errors_are_invalid() {
        let options = FieldOptions::default();
        assert_eq!(run_filter("a=b", &options).0, Outcome::Invalid);
        assert_eq!(run_filter("nickname:x", &options).0, Outcome::Invalid);
        assert_eq!(run_filter("age~3", &options).0, Outcome::Invalid);
    }

    #[test]
    fn filter_errors_are_reported() {
        let options = FieldOptions::default();
        assert_eq!(filter_errors("nickname:x", &options), "Error: unknown field 'nickname'\n");
        assert_eq!(
            filter_errors("age~3", &options),
            "Error: operation 'like' is not supported for number field 'age'\n"
        );
        assert!(filter_errors("name:a,b", &options).starts_with("Error: operation 'equals'"));
    }

    #[test]
    fn filter_missing_as_null() {
        let options = FieldOptions {
            missing_as_null: true,
            ..FieldOptions::default()
        };
        assert_eq!(run_filter("nickname@null", &options).1.len(), 3);
    }

    #[test]
    fn filter_date_fields() {
        let options = FieldOptions {
            date_fields: ["joined".to_string()].into_iter().collect(),
            missing_as_null: false,
        };
        // 2020-01-01T00:00:00Z
        let (outcome, names) = run_filter("joined>1577836800000", &options);
        assert_eq!(outcome, Outcome::Success);
        assert_eq!(names, ["ann", "bob"]);
    }

    #[test]
    fn filter_rejects_bad_input() {
        let mut out: Vec<u8> = Vec::new();
        let options = FieldOptions::default();
        assert!(filter("a:b", "{}", &options, &mut out, &mut io::sink()).is_err());
    }
}
