//! Text snapshots.
//!
//! ```json
//! {
//!   "isA": "strict",
//!   "options": [102],
//!   "dataRules": { "name": "string", "age": "float" },
//!   "data": { "name": "Ann", "age": 31.5 },
//!   "DTOs": { "items[]": "ItemDTO" }
//! }
//! ```
//!
//! `dataRules` holds the rules as resolved, before widening. `DTOs` is only
//! written for composite objects.

use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::composite;
use super::errors::DtoResult;
use super::object::Dto;
use super::options::Options;
use super::value::{Record, Value};
use crate::schema::{Definition, Registry, RuleTable};
use crate::validation::{coerce_dates, reject_unknown, widen, TypeMode, Validator};

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    #[serde(rename = "isA")]
    is_a: TypeMode,
    options: Options,
    #[serde(rename = "dataRules")]
    data_rules: RuleTable,
    data: Record,
    #[serde(rename = "DTOs", default, skip_serializing_if = "Option::is_none")]
    dtos: Option<IndexMap<String, Value>>,
}

impl Dto {
    /// Serializes this object to a pretty-printed JSON snapshot.
    pub fn to_snapshot(&self) -> DtoResult<String> {
        let snapshot = Snapshot {
            is_a: self.mode(),
            options: self.options().clone(),
            data_rules: self.rules().clone(),
            data: self.to_flat_record(),
            dtos: self.composites().map(composite::to_declarations),
        };
        Ok(serde_json::to_string_pretty(&snapshot)?)
    }

    /// Restores an object from [`Dto::to_snapshot`] output.
    ///
    /// The data is revalidated with the snapshot's mode, against its rules
    /// widened by its options. Composite classes are looked up in `registry`.
    pub fn from_snapshot(
        definition: Arc<Definition>,
        text: &str,
        registry: &Registry,
    ) -> DtoResult<Dto> {
        let snapshot: Snapshot = serde_json::from_str(text)?;
        let validator = Validator::new(snapshot.is_a);

        let composites = snapshot
            .dtos
            .as_ref()
            .map(|raw| composite::parse_declarations(raw, registry))
            .transpose()?;

        let mut data = match &composites {
            Some(composites) => {
                composite::check_missing(&snapshot.data, composites)?;
                composite::expand(snapshot.data, composites, &snapshot.options)?
            }
            None => snapshot.data,
        };

        let widened = widen(&snapshot.data_rules, &snapshot.options);
        coerce_dates(&mut data, &widened)?;
        validator.validate_object(&definition, &data, &widened)?;
        reject_unknown(definition.name(), &data, &snapshot.data_rules, &snapshot.options)?;

        tracing::debug!(
            class = definition.name(),
            mode = %snapshot.is_a,
            fields = data.len(),
            "restored dto from snapshot"
        );

        Ok(Dto::assemble(
            definition,
            snapshot.options,
            validator,
            snapshot.data_rules,
            data,
            composites,
        ))
    }
}
