//! Type oracle: does a value satisfy a type rule?
//!
//! Rule grammar:
//! - `?T` and `null|T` admit null
//! - `T|U` admits either alternative
//! - `T[]` is a list (or record) whose every element satisfies `T`
//! - scalars: `string`, `int`/`integer`, `float`/`double`, `bool`/`boolean`,
//!   `array`, `object`, `null`, `mixed`
//! - date types: see [`DATE_TYPES`]
//! - anything else names a DTO class
//!
//! `Strict` demands the exact variant. `Fuzzy` also accepts lossless
//! representations (`"2019"` for an int, `1` for a bool).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::dto::{DtoError, Options, Value};
use crate::schema::base_type;

/// Rule names that hold calendar dates.
pub const DATE_TYPES: &[&str] = &["DateValue", "DateTime", "Date"];

/// Whether the rule, nullable marker aside, names a date type.
pub fn is_date_type(rule: &str) -> bool {
    DATE_TYPES.contains(&base_type(rule))
}

/// Which oracle validates an object. Persisted in snapshots as `isA`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeMode {
    Strict,
    Fuzzy,
}

impl TypeMode {
    /// Fuzzy for permissive objects, strict otherwise.
    pub fn for_options(options: &Options) -> Self {
        if options.is_permissive() {
            TypeMode::Fuzzy
        } else {
            TypeMode::Strict
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TypeMode::Strict => "strict",
            TypeMode::Fuzzy => "fuzzy",
        }
    }

    pub fn is_a(&self, value: &Value, rule: &str) -> bool {
        let rule = rule.trim();

        if let Some(inner) = rule.strip_prefix('?') {
            return value.is_null() || self.is_a(value, inner);
        }
        if rule.contains('|') {
            return rule.split('|').any(|alt| self.is_a(value, alt));
        }
        if let Some(element) = rule.strip_suffix("[]") {
            return match value {
                Value::List(items) => items.iter().all(|v| self.is_a(v, element)),
                Value::Record(record) => record.values().all(|v| self.is_a(v, element)),
                _ => false,
            };
        }

        match rule {
            "mixed" => true,
            "null" => value.is_null(),
            "string" => matches!(value, Value::String(_)),
            "int" | "integer" => self.is_int(value),
            "float" | "double" => self.is_float(value),
            "bool" | "boolean" => self.is_bool(value),
            "array" => matches!(value, Value::List(_) | Value::Record(_)),
            "object" => matches!(value, Value::Record(_) | Value::Dto(_)),
            date if DATE_TYPES.contains(&date) => matches!(value, Value::Date(_)),
            class => match value {
                Value::Dto(dto) => dto.class_name() == class.trim_start_matches('\\'),
                _ => false,
            },
        }
    }

    fn is_int(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Int(_)) => true,
            (TypeMode::Fuzzy, Value::Float(f)) => f.is_finite() && f.fract() == 0.0,
            (TypeMode::Fuzzy, Value::String(s)) => s.parse::<i64>().is_ok(),
            _ => false,
        }
    }

    fn is_float(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Float(f)) => f.is_finite(),
            (TypeMode::Fuzzy, Value::Int(_)) => true,
            (TypeMode::Fuzzy, Value::String(s)) => is_numeric(s),
            _ => false,
        }
    }

    fn is_bool(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Bool(_)) => true,
            (TypeMode::Fuzzy, Value::Int(i)) => *i == 0 || *i == 1,
            (TypeMode::Fuzzy, Value::String(s)) => matches!(s.as_str(), "0" | "1" | "true" | "false"),
            _ => false,
        }
    }
}

/// Decimal or exponent notation; rejects `inf`, `NaN` and friends.
fn is_numeric(s: &str) -> bool {
    !s.chars().any(|c| c.is_alphabetic() && c != 'e' && c != 'E')
        && s.parse::<f64>().map_or(false, f64::is_finite)
}

impl fmt::Display for TypeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TypeMode {
    type Err = DtoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "strict" => Ok(TypeMode::Strict),
            "fuzzy" => Ok(TypeMode::Fuzzy),
            other => Err(DtoError::logic(format!("Unknown validation mode '{}'", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::dto::Record;

    const STRICT: TypeMode = TypeMode::Strict;
    const FUZZY: TypeMode = TypeMode::Fuzzy;

    #[test]
    fn test_mode_follows_permissive() {
        assert_eq!(TypeMode::for_options(&Options::permissive()), TypeMode::Fuzzy);
        assert_eq!(TypeMode::for_options(&Options::allow_null()), TypeMode::Strict);
        assert_eq!(TypeMode::for_options(&Options::none()), TypeMode::Strict);
    }

    #[test]
    fn test_strict_scalars() {
        assert!(STRICT.is_a(&Value::from("x"), "string"));
        assert!(!STRICT.is_a(&Value::Int(1), "string"));
        assert!(STRICT.is_a(&Value::Int(7), "int"));
        assert!(!STRICT.is_a(&Value::from("7"), "int"));
        assert!(STRICT.is_a(&Value::Float(7.3), "float"));
        assert!(!STRICT.is_a(&Value::Int(7), "float"));
        assert!(STRICT.is_a(&Value::Bool(false), "bool"));
        assert!(!STRICT.is_a(&Value::Int(1), "bool"));
    }

    #[test]
    fn test_fuzzy_scalars() {
        assert!(FUZZY.is_a(&Value::from("2019"), "int"));
        assert!(FUZZY.is_a(&Value::Float(3.0), "int"));
        assert!(!FUZZY.is_a(&Value::Float(3.5), "int"));
        assert!(FUZZY.is_a(&Value::from("13.689"), "float"));
        assert!(FUZZY.is_a(&Value::from("1e3"), "float"));
        assert!(!FUZZY.is_a(&Value::from("inf"), "float"));
        assert!(!FUZZY.is_a(&Value::from("asdf"), "float"));
        assert!(FUZZY.is_a(&Value::Int(1), "bool"));
        assert!(FUZZY.is_a(&Value::from("0"), "bool"));
        assert!(!FUZZY.is_a(&Value::Int(2), "bool"));
        assert!(!FUZZY.is_a(&Value::Int(1), "string"));
    }

    #[test]
    fn test_non_finite_floats_fail() {
        for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(!STRICT.is_a(&Value::Float(value), "float"));
            assert!(!FUZZY.is_a(&Value::Float(value), "float"));
            assert!(!FUZZY.is_a(&Value::Float(value), "int"));
        }
        assert!(STRICT.is_a(&Value::Float(f64::MAX), "float"));
    }

    #[test]
    fn test_nullable_and_unions() {
        assert!(STRICT.is_a(&Value::Null, "?int"));
        assert!(STRICT.is_a(&Value::Null, "null|int"));
        assert!(STRICT.is_a(&Value::Int(1), "null|int"));
        assert!(STRICT.is_a(&Value::from("x"), "int|string"));
        assert!(!STRICT.is_a(&Value::Null, "int"));
        assert!(!STRICT.is_a(&Value::from("x"), "?int"));
    }

    #[test]
    fn test_typed_collections() {
        let list = Value::List(vec![Value::Int(1), Value::Int(2)]);
        assert!(STRICT.is_a(&list, "int[]"));
        assert!(!STRICT.is_a(&Value::List(vec![Value::Int(1), Value::from("x")]), "int[]"));
        assert!(STRICT.is_a(&Value::List(vec![]), "string[]"));
        assert!(!STRICT.is_a(&Value::Int(1), "int[]"));
        assert!(STRICT.is_a(&list, "array"));
        assert!(STRICT.is_a(&Value::Record(Record::new()), "object"));
    }

    #[test]
    fn test_dates_and_unknown_types() {
        let now = Value::Date(Utc::now());
        assert!(STRICT.is_a(&now, "DateValue"));
        assert!(STRICT.is_a(&now, "?DateTime"));
        assert!(!STRICT.is_a(&Value::from("2020-01-01"), "DateValue"));
        assert!(!FUZZY.is_a(&Value::from("4510000000"), "floam"));
        assert!(STRICT.is_a(&Value::Null, "mixed"));
    }

    #[test]
    fn test_date_type_detection() {
        assert!(is_date_type("DateValue"));
        assert!(is_date_type("?DateTime"));
        assert!(is_date_type("null|Date"));
        assert!(!is_date_type("string"));
    }

    #[test]
    fn test_mode_names() {
        assert_eq!("fuzzy".parse::<TypeMode>().unwrap(), TypeMode::Fuzzy);
        assert!("loose".parse::<TypeMode>().is_err());
        assert_eq!(serde_json::to_string(&TypeMode::Strict).unwrap(), "\"strict\"");
    }
}
