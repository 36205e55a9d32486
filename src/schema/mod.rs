//! Schema subsystem: DTO class definitions and type rule resolution.
//!
//! # Design Principles
//!
//! - A class is described once, explicitly, by a [`Definition`]
//! - Rules come from declared field types and `@property` annotations
//! - A broken definition is a logic error, never a data error
//! - Definitions are immutable once registered

mod loader;
pub mod rules;
mod types;

pub use loader::Registry;
pub use rules::{base_type, is_nullable, nullable, RuleTable};
pub use types::{CompositeMap, CompositeRule, Definition, FieldDecl, ObjectRule};
