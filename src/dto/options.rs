//! Leniency flags for building a DTO.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::errors::DtoError;

/// A single leniency flag. Flags are independent of one another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DtoOption {
    /// Every rule becomes nullable, undeclared properties pass through and
    /// the fuzzy oracle is used by default.
    Permissive,
    /// Every rule becomes nullable.
    AllowNull,
    /// Undeclared properties pass through untouched.
    AllowExtra,
}

impl DtoOption {
    /// Stable code written to snapshots.
    pub fn code(&self) -> u16 {
        match self {
            DtoOption::Permissive => 101,
            DtoOption::AllowNull => 102,
            DtoOption::AllowExtra => 103,
        }
    }

    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            101 => Some(DtoOption::Permissive),
            102 => Some(DtoOption::AllowNull),
            103 => Some(DtoOption::AllowExtra),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DtoOption::Permissive => "permissive",
            DtoOption::AllowNull => "allow_null",
            DtoOption::AllowExtra => "allow_extra",
        }
    }
}

impl fmt::Display for DtoOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DtoOption {
    type Err = DtoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "permissive" => Ok(DtoOption::Permissive),
            "allow_null" => Ok(DtoOption::AllowNull),
            "allow_extra" => Ok(DtoOption::AllowExtra),
            other => Err(DtoError::logic(format!("Unknown DTO option '{}'", other))),
        }
    }
}

/// The option set an object was built with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options(BTreeSet<DtoOption>);

impl Options {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn permissive() -> Self {
        [DtoOption::Permissive].into_iter().collect()
    }

    pub fn allow_null() -> Self {
        [DtoOption::AllowNull].into_iter().collect()
    }

    pub fn allow_extra() -> Self {
        [DtoOption::AllowExtra].into_iter().collect()
    }

    pub fn with(mut self, option: DtoOption) -> Self {
        self.0.insert(option);
        self
    }

    pub fn insert(&mut self, option: DtoOption) {
        self.0.insert(option);
    }

    pub fn contains(&self, option: DtoOption) -> bool {
        self.0.contains(&option)
    }

    pub fn is_permissive(&self) -> bool {
        self.contains(DtoOption::Permissive)
    }

    /// Rules are widened to their nullable form.
    pub fn widens_nulls(&self) -> bool {
        self.contains(DtoOption::Permissive) || self.contains(DtoOption::AllowNull)
    }

    /// Undeclared input keys are kept instead of rejected.
    pub fn accepts_extra(&self) -> bool {
        self.contains(DtoOption::Permissive) || self.contains(DtoOption::AllowExtra)
    }

    pub fn iter(&self) -> impl Iterator<Item = DtoOption> + '_ {
        self.0.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<DtoOption> for Options {
    fn from_iter<I: IntoIterator<Item = DtoOption>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Serialize for Options {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter().map(DtoOption::code))
    }
}

impl<'de> Deserialize<'de> for Options {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let codes = Vec::<u16>::deserialize(deserializer)?;
        codes
            .into_iter()
            .map(|code| {
                DtoOption::from_code(code)
                    .ok_or_else(|| serde::de::Error::custom(format!("unknown option code {}", code)))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip() {
        for option in [DtoOption::Permissive, DtoOption::AllowNull, DtoOption::AllowExtra] {
            assert_eq!(DtoOption::from_code(option.code()), Some(option));
            assert_eq!(option.as_str().parse::<DtoOption>().unwrap(), option);
        }
        assert!(DtoOption::from_code(999).is_none());
    }

    #[test]
    fn test_permissive_implies_both_leniencies() {
        let options = Options::permissive();
        assert!(options.widens_nulls());
        assert!(options.accepts_extra());
    }

    #[test]
    fn test_flags_are_independent() {
        let null_only = Options::allow_null();
        assert!(null_only.widens_nulls());
        assert!(!null_only.accepts_extra());

        let extra_only = Options::allow_extra();
        assert!(!extra_only.widens_nulls());
        assert!(extra_only.accepts_extra());
    }

    #[test]
    fn test_serializes_as_codes() {
        let options = Options::permissive().with(DtoOption::AllowNull);
        assert_eq!(serde_json::to_string(&options).unwrap(), "[101,102]");

        let back: Options = serde_json::from_str("[102,101]").unwrap();
        assert_eq!(back, options);
        assert!(serde_json::from_str::<Options>("[7]").is_err());
    }
}
