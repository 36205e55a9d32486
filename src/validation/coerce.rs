//! Pre-validation transformations.
//!
//! Runs before the uniform validation pass:
//! 1. default splicing for absent declared properties
//! 2. nullability widening of rules under `Permissive` / `AllowNull`
//! 3. string to date conversion for date-typed fields
//!
//! A date that fails to parse is reported immediately with its own message,
//! not folded into the aggregate validation error.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};

use super::oracle::is_date_type;
use crate::dto::{DtoError, DtoResult, Options, Record, ValidationReasons, Value};
use crate::schema::{nullable, Definition, RuleTable};

/// Zone abbreviations accepted as a trailing token, with their UTC offsets in hours.
const ZONES: &[(&str, i32)] = &[
    ("UTC", 0),
    ("GMT", 0),
    ("Z", 0),
    ("EST", -5),
    ("EDT", -4),
    ("CST", -6),
    ("CDT", -5),
    ("MST", -7),
    ("MDT", -6),
    ("PST", -8),
    ("PDT", -7),
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%B %d %Y %H:%M:%S",
    "%B %d %Y %H:%M",
    "%B %d, %Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%B %d %Y", "%B %d, %Y"];

/// Rewrites every rule to its nullable form when the options ask for it.
pub fn widen(rules: &RuleTable, options: &Options) -> RuleTable {
    if !options.widens_nulls() {
        return rules.clone();
    }
    rules
        .iter()
        .map(|(field, rule)| (field.clone(), nullable(rule)))
        .collect()
}

/// Single-rule form of [`widen`].
pub fn widen_rule(rule: &str, options: &Options) -> String {
    if options.widens_nulls() {
        nullable(rule)
    } else {
        rule.to_string()
    }
}

/// Injects non-null declared defaults for properties absent from `input`.
///
/// Defaults come first in declaration order, followed by the remaining
/// input keys in input order.
pub fn splice_defaults(definition: &Definition, input: Record) -> Record {
    let mut merged = Record::with_capacity(input.len() + definition.fields().len());

    for field in definition.fields() {
        match field.default_value() {
            Some(default) if !default.is_null() => {
                merged.insert(field.name().to_string(), default.clone());
            }
            _ => {}
        }
    }

    for (key, value) in input {
        merged.insert(key, value);
    }

    merged
}

/// Converts non-empty strings in date-typed fields into dates.
pub fn coerce_dates(data: &mut Record, rules: &RuleTable) -> DtoResult<()> {
    for (field, rule) in rules {
        if !is_date_type(rule) {
            continue;
        }
        if let Some(value) = data.get_mut(field) {
            let coerced = coerce_date(field, value)?;
            if let Some(date) = coerced {
                *value = Value::Date(date);
            }
        }
    }
    Ok(())
}

/// Parses `value` when it is a non-empty string; other values are left alone.
pub fn coerce_date(field: &str, value: &Value) -> DtoResult<Option<DateTime<Utc>>> {
    match value {
        Value::String(text) if !text.is_empty() => match parse_date(text) {
            Some(date) => Ok(Some(date)),
            None => {
                let message = format!("{} is not a parsable date: '{}'.", field, text);
                tracing::debug!(field, value = %text, "date coercion failed");
                let reasons: ValidationReasons = [(field, message.as_str())].into_iter().collect();
                Err(DtoError::invalid_with_message(message, reasons))
            }
        },
        _ => Ok(None),
    }
}

/// Parses the date formats the builder accepts. Naive times are UTC.
pub fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(date) = DateTime::parse_from_rfc3339(text) {
        return Some(date.with_timezone(&Utc));
    }
    if let Ok(date) = DateTime::parse_from_rfc2822(text) {
        return Some(date.with_timezone(&Utc));
    }

    let (local, offset_hours) = split_zone(text);
    let offset = FixedOffset::east_opt(offset_hours * 3600)?;

    let naive = DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(local, format).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(local, format).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })?;

    offset
        .from_local_datetime(&naive)
        .single()
        .map(|date| date.with_timezone(&Utc))
}

fn split_zone(text: &str) -> (&str, i32) {
    if let Some((head, tail)) = text.rsplit_once(' ') {
        if let Some((_, hours)) = ZONES.iter().find(|(zone, _)| *zone == tail) {
            return (head.trim_end(), *hours);
        }
    }
    (text, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    use crate::dto::{format_date, DtoOption};
    use crate::schema::FieldDecl;

    fn rules(pairs: &[(&str, &str)]) -> RuleTable {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_widen_only_when_asked() {
        let table = rules(&[("name", "string"), ("age", "?float"), ("year", "null|int")]);

        assert_eq!(widen(&table, &Options::none()), table);
        assert_eq!(widen(&table, &Options::allow_extra()), table);

        let widened = widen(&table, &Options::allow_null());
        assert_eq!(widened.get("name").map(String::as_str), Some("?string"));
        assert_eq!(widened.get("age").map(String::as_str), Some("?float"));
        assert_eq!(widened.get("year").map(String::as_str), Some("null|int"));
    }

    #[test]
    fn test_widen_is_idempotent() {
        let table = rules(&[("name", "string"), ("born", "DateValue")]);
        let options = Options::permissive();
        let once = widen(&table, &options);
        assert_eq!(widen(&once, &options), once);
        assert_eq!(widen_rule("?int", &options.clone().with(DtoOption::AllowNull)), "?int");
    }

    #[test]
    fn test_splice_defaults_keeps_input() {
        let def = Definition::new("MyTestDTO")
            .with_field(FieldDecl::typed("name", "string"))
            .with_field(FieldDecl::typed("year", "int").with_default(2019))
            .with_field(FieldDecl::typed("note", "?string").with_default(Value::Null));

        let input: Record = [("name".to_string(), Value::from("Ann"))].into_iter().collect();
        let merged = splice_defaults(&def, input);
        let keys: Vec<&str> = merged.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["year", "name"]);
        assert!(!merged.contains_key("note"));

        let input: Record = [("year".to_string(), Value::Int(1999))].into_iter().collect();
        assert_eq!(splice_defaults(&def, input).get("year"), Some(&Value::Int(1999)));
    }

    #[test]
    fn test_parse_common_formats() {
        let date = parse_date("2001-09-11 8:46 EST").unwrap();
        assert_eq!((date.hour(), date.minute()), (13, 46));

        let date = parse_date("January 28 1986 11:39").unwrap();
        assert_eq!((date.year(), date.month(), date.day()), (1986, 1, 28));

        let date = parse_date("1946-06-14").unwrap();
        assert_eq!((date.hour(), date.minute()), (0, 0));

        let date = parse_date("2001-09-11T13:46:00.000000Z").unwrap();
        assert_eq!(format_date(&date), "2001-09-11T13:46:00.000000Z");

        assert!(parse_date("Gowtham Swaroop").is_none());
        assert!(parse_date("").is_none());
    }

    #[test]
    fn test_coerce_dates() {
        let table = rules(&[("born", "?DateValue"), ("name", "string")]);
        let mut data: Record = [
            ("born".to_string(), Value::from("1946-06-14")),
            ("name".to_string(), Value::from("2001-01-01")),
        ]
        .into_iter()
        .collect();

        coerce_dates(&mut data, &table).unwrap();
        assert!(matches!(data.get("born"), Some(Value::Date(_))));
        assert_eq!(data.get("name"), Some(&Value::from("2001-01-01")));
    }

    #[test]
    fn test_empty_and_non_string_dates_untouched() {
        let table = rules(&[("born", "?DateValue")]);
        let mut data: Record = [("born".to_string(), Value::from(""))].into_iter().collect();
        coerce_dates(&mut data, &table).unwrap();
        assert_eq!(data.get("born"), Some(&Value::from("")));

        let mut data: Record = [("born".to_string(), Value::Int(5))].into_iter().collect();
        coerce_dates(&mut data, &table).unwrap();
        assert_eq!(data.get("born"), Some(&Value::Int(5)));
    }

    #[test]
    fn test_unparsable_date_message() {
        let table = rules(&[("born", "DateValue")]);
        let mut data: Record = [("born".to_string(), Value::from("Gowtham Swaroop"))]
            .into_iter()
            .collect();

        let err = coerce_dates(&mut data, &table).unwrap_err();
        assert_eq!(err.to_string(), "born is not a parsable date: 'Gowtham Swaroop'.");
        assert_eq!(err.reasons().unwrap().len(), 1);
        assert_eq!(err.code(), "DTO_INVALID_DATA");
    }
}
