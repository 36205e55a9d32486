//! Object definitions.
//!
//! A [`Definition`] is the static description of one DTO class: its declared
//! fields (with optional type and default), its textual property
//! annotations, object-level rules, and whether it is write-once. It is
//! built once and shared behind an `Arc`; every object built from it
//! points back to it.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::dto::{Record, ValidationReasons, Value};

/// A declared field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    name: String,
    declared_type: Option<String>,
    default: Option<Value>,
}

impl FieldDecl {
    /// An untyped field with no default.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_type: None,
            default: None,
        }
    }

    /// A field with a declared type.
    pub fn typed(name: impl Into<String>, declared_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_type: Some(declared_type.into()),
            default: None,
        }
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declared_type(&self) -> Option<&str> {
        self.declared_type.as_deref()
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }
}

type CustomRule = dyn Fn(&Record) -> ValidationReasons + Send + Sync;

/// Object-level validation run after the per-field type checks.
#[derive(Clone)]
pub enum ObjectRule {
    /// When `if_field` equals `equals`, `then_field` must be non-empty.
    IfThisThenThat {
        if_field: String,
        equals: Value,
        then_field: String,
    },
    Custom(Arc<CustomRule>),
}

impl ObjectRule {
    pub fn if_this_then_that(
        if_field: impl Into<String>,
        equals: impl Into<Value>,
        then_field: impl Into<String>,
    ) -> Self {
        ObjectRule::IfThisThenThat {
            if_field: if_field.into(),
            equals: equals.into(),
            then_field: then_field.into(),
        }
    }

    pub fn custom<F>(check: F) -> Self
    where
        F: Fn(&Record) -> ValidationReasons + Send + Sync + 'static,
    {
        ObjectRule::Custom(Arc::new(check))
    }

    /// Returns the reasons this rule rejects `data` for; empty if it passes.
    pub fn check(&self, data: &Record) -> ValidationReasons {
        match self {
            ObjectRule::IfThisThenThat {
                if_field,
                equals,
                then_field,
            } => {
                let mut reasons = ValidationReasons::new();
                let triggered = data.get(if_field) == Some(equals);
                let then_empty = data.get(then_field).map_or(true, Value::is_empty);
                if triggered && then_empty {
                    reasons.insert(
                        then_field.clone(),
                        format!("{} must be set when {} is '{}'.", then_field, if_field, equals),
                    );
                }
                reasons
            }
            ObjectRule::Custom(check) => check(data),
        }
    }
}

impl fmt::Debug for ObjectRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectRule::IfThisThenThat {
                if_field,
                equals,
                then_field,
            } => f
                .debug_struct("IfThisThenThat")
                .field("if_field", if_field)
                .field("equals", equals)
                .field("then_field", then_field)
                .finish(),
            ObjectRule::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Static description of a DTO class.
#[derive(Debug, Clone)]
pub struct Definition {
    name: String,
    annotations: Option<String>,
    fields: Vec<FieldDecl>,
    object_rules: Vec<ObjectRule>,
    write_once: bool,
    /// Composite fields expanded whenever this class is built
    composites: Option<CompositeMap>,
}

impl Definition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annotations: None,
            fields: Vec::new(),
            object_rules: Vec::new(),
            write_once: false,
            composites: None,
        }
    }

    /// Attaches a block of `@property <type> $<name>` annotations.
    pub fn with_annotations(mut self, text: impl Into<String>) -> Self {
        self.annotations = Some(text.into());
        self
    }

    pub fn with_field(mut self, field: FieldDecl) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_object_rule(mut self, rule: ObjectRule) -> Self {
        self.object_rules.push(rule);
        self
    }

    /// Null fields of objects built from this definition may be written once.
    pub fn write_once(mut self) -> Self {
        self.write_once = true;
        self
    }

    /// Declares composite fields. Objects of this class expand them whether
    /// built directly or as the child of another composite.
    pub fn with_composites(mut self, composites: CompositeMap) -> Self {
        self.composites = Some(composites);
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn annotations(&self) -> Option<&str> {
        self.annotations.as_deref()
    }

    pub fn fields(&self) -> &[FieldDecl] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDecl> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn object_rules(&self) -> &[ObjectRule] {
        &self.object_rules
    }

    pub fn is_write_once(&self) -> bool {
        self.write_once
    }

    pub fn composites(&self) -> Option<&CompositeMap> {
        self.composites.as_ref()
    }

    /// Whether the definition declares no shape at all.
    pub fn is_shapeless(&self) -> bool {
        self.fields.is_empty() && self.annotations.as_deref().map_or(true, |a| a.trim().is_empty())
    }

    /// Class identity check used for "already an instance" decisions.
    pub fn is_same_class(&self, other: &Definition) -> bool {
        self.name == other.name
    }
}

/// How a composite field is expanded.
#[derive(Debug, Clone)]
pub enum CompositeRule {
    /// One child object.
    Single(Arc<Definition>),
    /// A collection of child objects.
    Array(Arc<Definition>),
}

impl CompositeRule {
    pub fn target(&self) -> &Arc<Definition> {
        match self {
            CompositeRule::Single(def) | CompositeRule::Array(def) => def,
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self, CompositeRule::Array(_))
    }

    /// Same shape, pointing at `target`.
    pub fn retarget(&self, target: Arc<Definition>) -> Self {
        match self {
            CompositeRule::Single(_) => CompositeRule::Single(target),
            CompositeRule::Array(_) => CompositeRule::Array(target),
        }
    }
}

/// Declared composites, keyed by stored property name.
pub type CompositeMap = IndexMap<String, CompositeRule>;

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, Value)]) -> Record {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn test_field_builders() {
        let field = FieldDecl::typed("year", "int").with_default(2019);
        assert_eq!(field.name(), "year");
        assert_eq!(field.declared_type(), Some("int"));
        assert!(field.has_default());
        assert_eq!(field.default_value(), Some(&Value::Int(2019)));

        let bare = FieldDecl::new("name");
        assert!(!bare.has_default());
        assert!(bare.declared_type().is_none());
    }

    #[test]
    fn test_if_this_then_that_triggers() {
        let rule = ObjectRule::if_this_then_that("status", "other", "reason");

        let reasons = rule.check(&record(&[("status", Value::from("other"))]));
        assert_eq!(reasons.get("reason"), Some("reason must be set when status is 'other'."));

        let reasons = rule.check(&record(&[
            ("status", Value::from("other")),
            ("reason", Value::from("")),
        ]));
        assert_eq!(reasons.len(), 1);
    }

    #[test]
    fn test_if_this_then_that_passes() {
        let rule = ObjectRule::if_this_then_that("status", "other", "reason");
        assert!(rule.check(&record(&[("status", Value::from("active"))])).is_empty());
        assert!(rule
            .check(&record(&[
                ("status", Value::from("other")),
                ("reason", Value::from("moved")),
            ]))
            .is_empty());
    }

    #[test]
    fn test_custom_rule() {
        let rule = ObjectRule::custom(|data| {
            let mut reasons = ValidationReasons::new();
            if data.get("min").and_then(Value::as_i64) > data.get("max").and_then(Value::as_i64) {
                reasons.insert("min", "min must not exceed max");
            }
            reasons
        });
        let reasons = rule.check(&record(&[("min", Value::Int(5)), ("max", Value::Int(1))]));
        assert!(reasons.contains("min"));
    }

    #[test]
    fn test_declared_composites() {
        let leaf = Definition::new("Leaf").with_annotations("@property string $name").shared();
        let composites: CompositeMap = [("leaf".to_string(), CompositeRule::Single(Arc::clone(&leaf)))]
            .into_iter()
            .collect();
        let def = Definition::new("Mid")
            .with_annotations("@property Leaf $leaf")
            .with_composites(composites);

        let rule = &def.composites().unwrap()["leaf"];
        assert!(rule.target().is_same_class(&leaf));
        assert!(Definition::new("Plain").composites().is_none());

        let other = Definition::new("Other").shared();
        assert!(CompositeRule::Array(leaf).retarget(other).is_array());
    }

    #[test]
    fn test_shapeless() {
        assert!(Definition::new("Anything").is_shapeless());
        assert!(Definition::new("Blank").with_annotations("   ").is_shapeless());
        assert!(!Definition::new("Named").with_field(FieldDecl::new("name")).is_shapeless());
    }
}
