//! Typed data objects
//!
//! A [`Dto`] is built from a raw [`Record`] and a shared
//! [`Definition`](crate::schema::Definition). Construction resolves the
//! definition's type rules, splices defaults, coerces dates, validates and
//! then freezes the data. Composite objects additionally expand declared
//! fields into child objects first.
//!
//! Once built, an object is read-only except for the write-once path.

mod builder;
pub mod composite;
mod errors;
mod object;
mod options;
mod snapshot;
mod value;
mod write_once;

pub use builder::ObjectBuilder;
pub use errors::{DtoError, DtoResult, ErrorKind, ValidationReasons};
pub use object::Dto;
pub use options::{DtoOption, Options};
pub use value::{format_date, Record, Value, DATE_FORMAT, DATE_FORMAT_NANOS};
pub use write_once::WriteOnceCell;
