//! Type rule resolution.
//!
//! A property's rule comes from one of two sources: the type declared on
//! the field itself, or a line of the definition's annotation block
//! (`@property <type> $<name>` / `@property-read <type> $<name>`). Declared
//! field types win when both exist.

use std::sync::OnceLock;

use indexmap::IndexMap;
use regex::Regex;

use super::types::Definition;
use crate::dto::{DtoError, DtoResult, Options};

/// Property name -> type rule, e.g. `"age" -> "?float"`.
pub type RuleTable = IndexMap<String, String>;

fn annotation_pattern() -> DtoResult<&'static Regex> {
    static PATTERN: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(?m)@property(?:-read)?[ \t]+([^\r\n]*)"))
        .as_ref()
        .map_err(|e| DtoError::logic(format!("Invalid annotation pattern: {}", e)))
}

/// Whether the rule already admits null (`?T` or `null|T`).
pub fn is_nullable(rule: &str) -> bool {
    rule.starts_with('?') || rule.starts_with("null|")
}

/// The rule with any leading nullable marker removed.
pub fn base_type(rule: &str) -> &str {
    rule.strip_prefix('?')
        .or_else(|| rule.strip_prefix("null|"))
        .unwrap_or(rule)
}

/// Nullable form of a rule. Already nullable rules are returned unchanged.
pub fn nullable(rule: &str) -> String {
    if is_nullable(rule) {
        rule.to_string()
    } else {
        format!("?{}", rule)
    }
}

/// Parses an annotation block into rules, in annotation order.
pub fn parse_annotations(text: &str) -> DtoResult<RuleTable> {
    let mut rules = RuleTable::new();

    for captures in annotation_pattern()?.captures_iter(text) {
        let line = captures.get(1).map_or("", |m| m.as_str());
        let mut tokens = line.split_whitespace();

        let (rule, name) = match (tokens.next(), tokens.next()) {
            (Some(rule), Some(name)) if !rule.starts_with('$') => (rule, name),
            _ => return Err(malformed()),
        };
        let name = match name.strip_prefix('$') {
            Some(stripped) if !stripped.is_empty() => stripped,
            _ => return Err(malformed()),
        };

        rules.insert(name.to_string(), rule.to_string());
    }

    Ok(rules)
}

fn malformed() -> DtoError {
    DtoError::logic("A property type annotation is malformed.")
}

/// Derives the rule table for `definition`.
///
/// A definition with no shape at all resolves to an empty table, but only
/// for objects that accept arbitrary properties.
pub fn resolve(definition: &Definition, options: &Options) -> DtoResult<RuleTable> {
    if definition.is_shapeless() && options.accepts_extra() {
        return Ok(RuleTable::new());
    }

    let mut rules = match definition.annotations() {
        Some(text) => parse_annotations(text)?,
        None => RuleTable::new(),
    };

    for field in definition.fields() {
        if let Some(declared) = field.declared_type() {
            rules.insert(field.name().to_string(), declared.to_string());
        }
    }

    if rules.is_empty() {
        return Err(DtoError::logic("No property type rules have been declared."));
    }

    let missing: Vec<&str> = definition
        .fields()
        .iter()
        .map(|f| f.name())
        .filter(|name| !rules.contains_key(*name))
        .collect();
    if !missing.is_empty() {
        return Err(DtoError::logic(format!(
            "Missing type rules for ${}.",
            missing.join(", $")
        )));
    }

    tracing::trace!(class = definition.name(), rules = rules.len(), "resolved type rules");

    Ok(rules)
}
