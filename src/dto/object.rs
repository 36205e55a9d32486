//! The typed, immutable data object.
//!
//! A [`Dto`] owns a frozen record validated against the rules of its
//! [`Definition`]. Reads go through [`Dto::get`]; the only write path is
//! [`Dto::set`], which succeeds once per field for write-once definitions
//! whose value was null at construction.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Serialize, Serializer};

use super::builder::ObjectBuilder;
use super::composite;
use super::errors::{DtoError, DtoResult, ValidationReasons};
use super::options::Options;
use super::value::{Record, Value};
use super::write_once::WriteOnceCell;
use crate::schema::{CompositeMap, Definition, RuleTable};
use crate::validation::{coerce, is_date_type, TypeMode, Validator};

pub struct Dto {
    definition: Arc<Definition>,
    options: Options,
    validator: Validator,
    /// Resolved rules before nullability widening
    rules: RuleTable,
    data: Record,
    composites: Option<CompositeMap>,
    /// Fields still open to a single write
    write_once: IndexMap<String, WriteOnceCell<Value>>,
}

impl Dto {
    /// Builds with no options and the strict oracle.
    pub fn new(definition: Arc<Definition>, input: Record) -> DtoResult<Self> {
        ObjectBuilder::new(definition).build(input)
    }

    pub fn with_options(
        definition: Arc<Definition>,
        input: Record,
        options: Options,
    ) -> DtoResult<Self> {
        ObjectBuilder::new(definition).options(options).build(input)
    }

    /// Builds with an explicit validator instead of the one the options imply.
    pub fn with_validator(
        definition: Arc<Definition>,
        input: Record,
        options: Options,
        validator: Validator,
    ) -> DtoResult<Self> {
        ObjectBuilder::new(definition)
            .options(options)
            .validator(validator)
            .build(input)
    }

    /// Builds a composite object. Options default to permissive.
    pub fn composite(
        definition: Arc<Definition>,
        input: Record,
        composites: CompositeMap,
        options: Option<Options>,
    ) -> DtoResult<Self> {
        let mut builder = ObjectBuilder::new(definition).composites(composites);
        if let Some(options) = options {
            builder = builder.options(options);
        }
        builder.build(input)
    }

    pub(crate) fn assemble(
        definition: Arc<Definition>,
        options: Options,
        validator: Validator,
        rules: RuleTable,
        data: Record,
        composites: Option<CompositeMap>,
    ) -> Self {
        let write_once = if definition.is_write_once() {
            rules
                .keys()
                .filter(|field| data.get(*field).map_or(true, Value::is_null))
                .map(|field| (field.clone(), WriteOnceCell::Unset))
                .collect()
        } else {
            IndexMap::new()
        };

        Self {
            definition,
            options,
            validator,
            rules,
            data,
            composites,
            write_once,
        }
    }

    pub fn class_name(&self) -> &str {
        self.definition.name()
    }

    pub fn definition(&self) -> &Arc<Definition> {
        &self.definition
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn is_permissive(&self) -> bool {
        self.options.is_permissive()
    }

    pub fn mode(&self) -> TypeMode {
        self.validator.mode()
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    /// The rule table as resolved, without nullability widening.
    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    pub fn data(&self) -> &Record {
        &self.data
    }

    pub fn composites(&self) -> Option<&CompositeMap> {
        self.composites.as_ref()
    }

    pub fn has(&self, property: &str) -> bool {
        self.data.contains_key(property)
    }

    pub fn get(&self, property: &str) -> DtoResult<&Value> {
        self.data
            .get(property)
            .ok_or_else(|| DtoError::undefined_property(self.class_name(), property))
    }

    /// Writes a field of a write-once object.
    ///
    /// Only fields that were null at construction accept a write, and only
    /// once. The value is checked against the field's unwidened rule.
    pub fn set(&mut self, property: &str, value: impl Into<Value>) -> DtoResult<()> {
        if !self.definition.is_write_once() {
            return Err(DtoError::ImmutableWrite);
        }
        let rule = self
            .rules
            .get(property)
            .ok_or_else(|| DtoError::undefined_property(self.definition.name(), property))?
            .clone();

        let cell = self
            .write_once
            .get_mut(property)
            .ok_or(DtoError::ImmutableWrite)?;
        if cell.is_set() {
            return Err(DtoError::ImmutableWrite);
        }

        let mut value = value.into();
        if is_date_type(&rule) {
            if let Some(date) = coerce::coerce_date(property, &value)? {
                value = Value::Date(date);
            }
        }
        self.validator.assert_is_type(property, &value, &rule)?;
        cell.write(value.clone())?;

        tracing::trace!(class = self.definition.name(), field = property, "write-once field set");
        self.overwrite(property, value)
    }

    /// Replaces a ruled field without any further checks.
    pub(crate) fn overwrite(&mut self, property: &str, value: Value) -> DtoResult<()> {
        if !self.rules.contains_key(property) {
            return Err(DtoError::undefined_property(self.class_name(), property));
        }
        self.data.insert(property.to_string(), value);
        Ok(())
    }

    /// Plain nested record of this object and every child object.
    pub fn to_flat_record(&self) -> Record {
        self.data
            .iter()
            .map(|(key, value)| (key.clone(), value.flatten()))
            .collect()
    }

    pub fn to_json(&self) -> serde_json::Value {
        Value::Record(self.to_flat_record()).to_json()
    }

    /// Re-runs validation against the unwidened rules, cascading into
    /// child objects.
    pub fn validate(&self) -> DtoResult<()> {
        let reasons = self.validation_reasons();
        if reasons.is_empty() {
            Ok(())
        } else {
            tracing::debug!(class = self.class_name(), errors = reasons.len(), "revalidation failed");
            Err(DtoError::invalid(reasons))
        }
    }

    pub(crate) fn validation_reasons(&self) -> ValidationReasons {
        let mut reasons = self
            .validator
            .check_object(&self.definition, &self.data, &self.rules);
        if let Some(composites) = &self.composites {
            reasons.extend(composite::cascade(&self.data, composites));
        }
        reasons
    }
}

impl PartialEq for Dto {
    fn eq(&self, other: &Self) -> bool {
        self.definition.is_same_class(&other.definition) && self.data == other.data
    }
}

impl fmt::Debug for Dto {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dto")
            .field("class", &self.class_name())
            .field("mode", &self.mode())
            .field("data", &self.data)
            .finish()
    }
}

impl Serialize for Dto {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.data.iter())
    }
}
