//! Object construction pipeline.
//!
//! ```text
//! input
//!   -> composite expansion (composite objects only)
//!   -> default splicing
//!   -> rule resolution
//!   -> nullability widening, date coercion
//!   -> structural validation + object rules
//!   -> unknown-property policy
//!   -> frozen Dto
//! ```

use std::sync::Arc;

use super::composite;
use super::errors::DtoResult;
use super::object::Dto;
use super::options::{DtoOption, Options};
use super::value::Record;
use crate::schema::{rules, CompositeMap, Definition};
use crate::validation::{coerce_dates, reject_unknown, splice_defaults, widen, Validator};

/// Builds [`Dto`]s of one definition.
#[derive(Debug, Clone)]
pub struct ObjectBuilder {
    definition: Arc<Definition>,
    options: Option<Options>,
    validator: Option<Validator>,
    composites: Option<CompositeMap>,
}

impl ObjectBuilder {
    pub fn new(definition: Arc<Definition>) -> Self {
        Self {
            definition,
            options: None,
            validator: None,
            composites: None,
        }
    }

    pub fn options(mut self, options: Options) -> Self {
        self.options = Some(options);
        self
    }

    /// Overrides the validator the options would select. Never passed on
    /// to child objects.
    pub fn validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Declares composite fields to expand before validation, in place of
    /// the ones the definition declares.
    pub fn composites(mut self, composites: CompositeMap) -> Self {
        self.composites = Some(composites);
        self
    }

    pub fn build(self, input: Record) -> DtoResult<Dto> {
        let definition = self.definition;
        let composites = self
            .composites
            .or_else(|| definition.composites().cloned());
        let given = match self.options {
            Some(options) => options,
            None if composites.is_some() => Options::permissive(),
            None => Options::none(),
        };

        let mut options = given.clone();
        if definition.is_write_once() {
            options.insert(DtoOption::AllowNull);
        }
        let validator = self
            .validator
            .unwrap_or_else(|| Validator::for_options(&options));

        let input = match &composites {
            Some(composites) => {
                composite::check_missing(&input, composites)?;
                composite::expand(input, composites, &given)?
            }
            None => input,
        };

        let mut data = splice_defaults(&definition, input);
        let rules = rules::resolve(&definition, &options)?;
        let widened = widen(&rules, &options);

        coerce_dates(&mut data, &widened)?;
        validator.validate_object(&definition, &data, &widened)?;
        reject_unknown(definition.name(), &data, &rules, &options)?;

        tracing::debug!(
            class = definition.name(),
            fields = data.len(),
            mode = %validator.mode(),
            "built dto"
        );

        Ok(Dto::assemble(
            definition,
            options,
            validator,
            rules,
            data,
            composites,
        ))
    }
}
