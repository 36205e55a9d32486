//! Aggregating validator.
//!
//! Per-field structural checks are delegated to the [`TypeMode`] oracle.
//! Object rules of the definition run after them, and every reason from one
//! pass is folded into a single `InvalidData` error.

use super::oracle::TypeMode;
use crate::dto::{DtoError, DtoResult, Options, Record, ValidationReasons, Value};
use crate::schema::{base_type, Definition, RuleTable};

/// Reason recorded when `field` does not satisfy `rule`.
pub fn type_reason(field: &str, rule: &str) -> String {
    format!("{} is not a valid {}", field, base_type(rule))
}

/// Validates records against rule tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Validator {
    mode: TypeMode,
}

impl Validator {
    pub fn new(mode: TypeMode) -> Self {
        Self { mode }
    }

    pub fn strict() -> Self {
        Self::new(TypeMode::Strict)
    }

    pub fn fuzzy() -> Self {
        Self::new(TypeMode::Fuzzy)
    }

    /// The default validator for an option set.
    pub fn for_options(options: &Options) -> Self {
        Self::new(TypeMode::for_options(options))
    }

    pub fn mode(&self) -> TypeMode {
        self.mode
    }

    pub fn is_a(&self, value: &Value, rule: &str) -> bool {
        self.mode.is_a(value, rule)
    }

    /// Structural check of every ruled field. Absent keys are checked as null.
    pub fn check(&self, data: &Record, rules: &RuleTable) -> ValidationReasons {
        let mut reasons = ValidationReasons::new();
        for (field, rule) in rules {
            let value = data.get(field).unwrap_or(&Value::Null);
            if !self.mode.is_a(value, rule) {
                reasons.insert(field.clone(), type_reason(field, rule));
            }
        }
        reasons
    }

    /// Structural check plus the definition's object rules.
    pub fn check_object(
        &self,
        definition: &Definition,
        data: &Record,
        rules: &RuleTable,
    ) -> ValidationReasons {
        let mut reasons = self.check(data, rules);
        for rule in definition.object_rules() {
            reasons.extend(rule.check(data));
        }
        reasons
    }

    pub fn validate(&self, data: &Record, rules: &RuleTable) -> DtoResult<()> {
        into_result(self.check(data, rules))
    }

    pub fn validate_object(
        &self,
        definition: &Definition,
        data: &Record,
        rules: &RuleTable,
    ) -> DtoResult<()> {
        let reasons = self.check_object(definition, data, rules);
        if !reasons.is_empty() {
            tracing::debug!(class = definition.name(), errors = reasons.len(), "validation failed");
        }
        into_result(reasons)
    }

    /// Checks one value against one rule.
    pub fn assert_is_type(&self, field: &str, value: &Value, rule: &str) -> DtoResult<()> {
        if self.mode.is_a(value, rule) {
            return Ok(());
        }
        let reasons: ValidationReasons = [(field.to_string(), type_reason(field, rule))]
            .into_iter()
            .collect();
        Err(DtoError::invalid(reasons))
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::strict()
    }
}

fn into_result(reasons: ValidationReasons) -> DtoResult<()> {
    if reasons.is_empty() {
        Ok(())
    } else {
        Err(DtoError::invalid(reasons))
    }
}

/// Rejects the first input key without a rule, unless extras are accepted.
pub fn reject_unknown(
    class: &str,
    data: &Record,
    rules: &RuleTable,
    options: &Options,
) -> DtoResult<()> {
    if options.accepts_extra() {
        return Ok(());
    }
    match data.keys().find(|key| !rules.contains_key(*key)) {
        Some(key) => Err(DtoError::undefined_property(class, key.clone())),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ObjectRule;

    fn rules(pairs: &[(&str, &str)]) -> RuleTable {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn record(pairs: &[(&str, Value)]) -> Record {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn test_valid_data_passes() {
        let table = rules(&[("name", "string"), ("age", "float"), ("year", "int")]);
        let data = record(&[
            ("name", Value::from("Ann")),
            ("age", Value::Float(31.5)),
            ("year", Value::Int(2019)),
        ]);
        assert!(Validator::strict().validate(&data, &table).is_ok());
    }

    #[test]
    fn test_errors_are_aggregated() {
        let table = rules(&[("name", "string"), ("age", "?float"), ("year", "int")]);
        let data = record(&[("name", Value::Int(1)), ("age", Value::from("old"))]);

        let err = Validator::strict().validate(&data, &table).unwrap_err();
        assert_eq!(err.to_string(), "There were 3 validation errors.");
        let reasons = err.reasons().unwrap();
        assert_eq!(reasons.get("name"), Some("name is not a valid string"));
        assert_eq!(reasons.get("age"), Some("age is not a valid float"));
        assert_eq!(reasons.get("year"), Some("year is not a valid int"));
    }

    #[test]
    fn test_single_error_message() {
        let table = rules(&[("name", "string")]);
        let err = Validator::strict().validate(&Record::new(), &table).unwrap_err();
        assert_eq!(err.to_string(), "There was 1 validation error.");
    }

    #[test]
    fn test_fuzzy_accepts_numeric_strings() {
        let table = rules(&[("year", "int"), ("age", "float")]);
        let data = record(&[("year", Value::from("2019")), ("age", Value::from("31"))]);
        assert!(Validator::fuzzy().validate(&data, &table).is_ok());
        assert!(Validator::strict().validate(&data, &table).is_err());
    }

    #[test]
    fn test_object_rules_merge_with_type_errors() {
        let def = Definition::new("Address")
            .with_object_rule(ObjectRule::if_this_then_that("status", "other", "reason"));
        let table = rules(&[("status", "string"), ("reason", "?string"), ("zip", "int")]);
        let data = record(&[("status", Value::from("other")), ("zip", Value::from("x"))]);

        let err = Validator::strict().validate_object(&def, &data, &table).unwrap_err();
        let reasons = err.reasons().unwrap();
        assert_eq!(reasons.fields(), vec!["zip", "reason"]);
        assert_eq!(err.to_string(), "There were 2 validation errors.");
    }

    #[test]
    fn test_assert_is_type() {
        let validator = Validator::strict();
        assert!(validator.assert_is_type("age", &Value::Null, "?float").is_ok());
        let err = validator.assert_is_type("age", &Value::from("x"), "?float").unwrap_err();
        assert_eq!(err.reasons().unwrap().get("age"), Some("age is not a valid float"));
    }

    #[test]
    fn test_reject_unknown() {
        let table = rules(&[("name", "string")]);
        let data = record(&[
            ("name", Value::from("Ann")),
            ("nickname", Value::from("A")),
            ("other", Value::Null),
        ]);

        let err = reject_unknown("MyTestDTO", &data, &table, &Options::none()).unwrap_err();
        assert_eq!(err.to_string(), "Undefined property: MyTestDTO::$nickname.");

        assert!(reject_unknown("MyTestDTO", &data, &table, &Options::allow_extra()).is_ok());
        assert!(reject_unknown("MyTestDTO", &data, &table, &Options::permissive()).is_ok());
        assert!(reject_unknown("MyTestDTO", &data, &table, &Options::allow_null()).is_err());
    }

    #[test]
    fn test_for_options() {
        assert_eq!(Validator::for_options(&Options::permissive()).mode(), TypeMode::Fuzzy);
        assert_eq!(Validator::default().mode(), TypeMode::Strict);
    }
}
