//! Property-based tests for object construction laws.
//!
//! # Invariants tested:
//! - Widening is idempotent
//! - Revalidation of a strict object is idempotent and succeeds
//! - A snapshot restores to an equal object
//! - Each open write-once field accepts exactly one write
//! - Valid input flattens to the defaults overlaid by the input
//!
//! Reproducible: set `PROPTEST_SEED` for deterministic runs

use std::sync::Arc;

use proptest::prelude::*;
use simpledto::dto::{DtoOption, Record, Value};
use simpledto::schema::RuleTable;
use simpledto::validation::widen;
use simpledto::{Definition, Dto, DtoError, FieldDecl, Options, Registry};

// =============================================================================
// Strategies
// =============================================================================

fn my_test_dto() -> Arc<Definition> {
    Definition::new("MyTestDTO")
        .with_annotations("@property string $name\n@property float $age\n@property int $year")
        .with_field(FieldDecl::new("year").with_default(2019))
        .shared()
}

fn write_once_dto() -> Arc<Definition> {
    Definition::new("MyWriteOnceDTO")
        .with_annotations("@property string $name\n@property float $age")
        .write_once()
        .shared()
}

fn rule_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("string".to_string()),
        Just("?string".to_string()),
        Just("int".to_string()),
        Just("null|int".to_string()),
        Just("float|string".to_string()),
        Just("DateTime".to_string()),
        Just("MyTestDTO".to_string()),
        Just("mixed".to_string()),
    ]
}

fn rules_strategy() -> impl Strategy<Value = RuleTable> {
    prop::collection::vec(("[a-z]{1,8}", rule_strategy()), 0..8)
        .prop_map(|pairs| pairs.into_iter().collect())
}

fn options_strategy() -> impl Strategy<Value = Options> {
    prop::collection::vec(
        prop_oneof![
            Just(DtoOption::Permissive),
            Just(DtoOption::AllowNull),
            Just(DtoOption::AllowExtra),
        ],
        0..3,
    )
    .prop_map(|options| options.into_iter().collect())
}

/// Valid MyTestDTO input, with or without an explicit year.
fn input_strategy() -> impl Strategy<Value = Record> {
    (
        "[a-zA-Z0-9 ,.]{0,24}",
        -1.0e6f64..1.0e6f64,
        prop::option::of(1900i64..2100),
    )
        .prop_map(|(name, age, year)| {
            let mut input = Record::new();
            input.insert("name".to_string(), Value::from(name));
            input.insert("age".to_string(), Value::Float(age));
            if let Some(year) = year {
                input.insert("year".to_string(), Value::Int(year));
            }
            input
        })
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_widening_is_idempotent(rules in rules_strategy(), options in options_strategy()) {
        let once = widen(&rules, &options);
        prop_assert_eq!(widen(&once, &options), once.clone());
        prop_assert_eq!(once.len(), rules.len());
    }

    #[test]
    fn prop_validate_is_idempotent(input in input_strategy()) {
        let dto = Dto::new(my_test_dto(), input).unwrap();
        prop_assert!(dto.validate().is_ok());
        prop_assert!(dto.validate().is_ok());
    }

    #[test]
    fn prop_snapshot_round_trip(input in input_strategy(), permissive in any::<bool>()) {
        let options = if permissive { Options::permissive() } else { Options::none() };
        let dto = Dto::with_options(my_test_dto(), input, options).unwrap();

        let restored = Dto::from_snapshot(my_test_dto(), &dto.to_snapshot().unwrap(), &Registry::new()).unwrap();
        prop_assert_eq!(restored.to_flat_record(), dto.to_flat_record());
        prop_assert_eq!(restored.mode(), dto.mode());
        prop_assert_eq!(restored.options(), dto.options());
    }

    #[test]
    fn prop_write_once_accepts_one_write(name in "[a-z]{1,12}", other in "[a-z]{1,12}") {
        let mut input = Record::new();
        input.insert("name".to_string(), Value::Null);
        input.insert("age".to_string(), Value::Float(1.0));
        let mut dto = Dto::new(write_once_dto(), input).unwrap();

        prop_assert!(dto.set("name", name.as_str()).is_ok());
        prop_assert!(matches!(dto.set("name", other.as_str()), Err(DtoError::ImmutableWrite)));
        prop_assert_eq!(dto.get("name").unwrap(), &Value::from(name));
    }

    #[test]
    fn prop_flattens_to_defaults_plus_input(input in input_strategy()) {
        let mut expected = Record::new();
        expected.insert("year".to_string(), Value::Int(2019));
        for (key, value) in &input {
            expected.insert(key.clone(), value.clone());
        }

        let dto = Dto::new(my_test_dto(), input).unwrap();
        prop_assert_eq!(dto.to_flat_record(), expected);
    }
}
