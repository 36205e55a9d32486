//! simpledto - immutable, validated, strongly-typed data transfer objects
//!
//! - `schema`: object definitions, rule resolution, the definition registry
//! - `validation`: type oracle, coercion, aggregating validator
//! - `dto`: the typed object, composites, write-once fields, snapshots
//! - `cli`: command-line front end

pub mod cli;
pub mod dto;
pub mod schema;
pub mod validation;

pub use dto::{Dto, DtoError, DtoOption, DtoResult, ObjectBuilder, Options, Record, Value};
pub use schema::{CompositeMap, CompositeRule, Definition, FieldDecl, ObjectRule, Registry};
pub use validation::{TypeMode, Validator};
