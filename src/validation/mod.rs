//! Validation subsystem
//!
//! - `oracle`: per-value type checks in strict or fuzzy mode
//! - `coerce`: defaults, nullability widening, date conversion
//! - `validator`: aggregation of field reasons and object rules

pub mod coerce;
mod oracle;
mod validator;

pub use coerce::{coerce_dates, parse_date, splice_defaults, widen, widen_rule};
pub use oracle::{is_date_type, TypeMode, DATE_TYPES};
pub use validator::{reject_unknown, type_reason, Validator};
