//! Definition registry.
//!
//! Definitions can be registered in code or loaded from a directory of
//! `*.json` definition files, one class per file:
//!
//! ```json
//! {
//!   "name": "MyTestDTO",
//!   "annotations": "@property string $name\n@property float $age",
//!   "fields": [{ "name": "year", "type": "int", "default": 2019 }],
//!   "rules": [{ "if": "status", "equals": "other", "then": "reason" }],
//!   "write_once": false,
//!   "composites": { "items[]": "ItemDTO" }
//! }
//! ```
//!
//! Registered classes are immutable; registering a name twice fails.
//! Composite declarations are linked once every file is loaded, so a class
//! may name children declared in files read after its own. Linking attaches
//! each class's resolved composites to its definition, children first.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Deserialize;

use super::types::{CompositeMap, Definition, FieldDecl, ObjectRule};
use crate::dto::{composite, DtoError, DtoResult, Value};

#[derive(Debug, Deserialize)]
struct DefinitionFile {
    name: String,
    #[serde(default)]
    annotations: Option<String>,
    #[serde(default)]
    fields: Vec<FieldFile>,
    #[serde(default)]
    rules: Vec<RuleFile>,
    #[serde(default)]
    write_once: bool,
    #[serde(default)]
    composites: IndexMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct FieldFile {
    name: String,
    #[serde(rename = "type", default)]
    declared_type: Option<String>,
    #[serde(default)]
    default: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RuleFile {
    #[serde(rename = "if")]
    if_field: String,
    equals: Value,
    #[serde(rename = "then")]
    then_field: String,
}

impl DefinitionFile {
    fn into_definition(self) -> (Definition, IndexMap<String, Value>) {
        let mut definition = Definition::new(self.name);
        if let Some(text) = self.annotations {
            definition = definition.with_annotations(text);
        }
        for field in self.fields {
            let mut decl = match field.declared_type {
                Some(ty) => FieldDecl::typed(field.name, ty),
                None => FieldDecl::new(field.name),
            };
            if let Some(default) = field.default {
                decl = decl.with_default(default);
            }
            definition = definition.with_field(decl);
        }
        for rule in self.rules {
            definition = definition.with_object_rule(ObjectRule::if_this_then_that(
                rule.if_field,
                rule.equals,
                rule.then_field,
            ));
        }
        if self.write_once {
            definition = definition.write_once();
        }
        (definition, self.composites)
    }
}

/// In-memory registry of DTO classes, optionally backed by a directory.
#[derive(Debug, Default)]
pub struct Registry {
    /// Directory containing definition files
    definition_dir: Option<PathBuf>,
    /// Registered definitions by class name
    definitions: HashMap<String, Arc<Definition>>,
    /// Composite declarations by class, unresolved
    composites: HashMap<String, IndexMap<String, Value>>,
}

impl Registry {
    /// Creates an empty, purely in-memory registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry that loads definitions from `dir`.
    pub fn with_dir(dir: &Path) -> Self {
        Self {
            definition_dir: Some(dir.to_path_buf()),
            ..Self::default()
        }
    }

    pub fn definition_dir(&self) -> Option<&Path> {
        self.definition_dir.as_deref()
    }

    /// Loads every definition file in the directory; returns how many were loaded.
    ///
    /// A malformed file aborts loading.
    pub fn load_all(&mut self) -> DtoResult<usize> {
        let Some(dir) = self.definition_dir.clone() else {
            return Ok(0);
        };

        let entries = fs::read_dir(&dir).map_err(|e| {
            DtoError::malformed_definition(
                dir.display().to_string(),
                format!("Failed to read definition directory: {}", e),
            )
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                DtoError::malformed_definition(
                    dir.display().to_string(),
                    format!("Failed to read directory entry: {}", e),
                )
            })?;
            let path = entry.path();

            // Skip non-JSON files
            if path.extension().map_or(true, |ext| ext != "json") {
                continue;
            }
            paths.push(path);
        }
        // Directory order is platform dependent.
        paths.sort();

        for path in &paths {
            self.load_definition_file(path)?;
        }
        self.link()?;

        tracing::debug!(dir = %dir.display(), loaded = paths.len(), "loaded definitions");
        Ok(paths.len())
    }

    /// Loads a single definition file. Its composites take effect on the
    /// next [`Registry::link`].
    pub fn load_definition_file(&mut self, path: &Path) -> DtoResult<Arc<Definition>> {
        let content = fs::read_to_string(path).map_err(|e| {
            DtoError::malformed_definition(path.display().to_string(), format!("Failed to read file: {}", e))
        })?;

        let file: DefinitionFile = serde_json::from_str(&content).map_err(|e| {
            DtoError::malformed_definition(path.display().to_string(), format!("Invalid JSON: {}", e))
        })?;

        let (definition, composites) = file.into_definition();
        let class = definition.name().to_string();
        let shared = self.register(definition)?;
        if !composites.is_empty() {
            self.composites.insert(class, composites);
        }

        tracing::trace!(path = %path.display(), class = shared.name(), "loaded definition file");
        Ok(shared)
    }

    /// Registers a definition.
    pub fn register(&mut self, definition: Definition) -> DtoResult<Arc<Definition>> {
        self.register_shared(Arc::new(definition))
    }

    /// Registers an already shared definition.
    pub fn register_shared(&mut self, definition: Arc<Definition>) -> DtoResult<Arc<Definition>> {
        let name = definition.name().to_string();
        if self.definitions.contains_key(&name) {
            return Err(DtoError::DuplicateClass(name));
        }
        self.definitions.insert(name, Arc::clone(&definition));
        Ok(definition)
    }

    /// Declares the default composites of a registered class.
    pub fn register_composites(
        &mut self,
        class: &str,
        declarations: IndexMap<String, Value>,
    ) -> DtoResult<()> {
        let name = self.require(class)?.name().to_string();
        self.composites.insert(name, declarations);
        self.link()
    }

    /// Resolves every composite declaration and attaches the result to its
    /// class's definition. Cyclic composites are a logic error.
    pub fn link(&mut self) -> DtoResult<()> {
        let mut linked = HashMap::new();
        let classes: Vec<String> = self.composites.keys().cloned().collect();
        for class in &classes {
            self.link_class(class, &mut linked, &mut Vec::new())?;
        }

        tracing::debug!(classes = linked.len(), "linked composite definitions");
        self.definitions.extend(linked);
        Ok(())
    }

    fn link_class(
        &self,
        class: &str,
        linked: &mut HashMap<String, Arc<Definition>>,
        path: &mut Vec<String>,
    ) -> DtoResult<Arc<Definition>> {
        let base = self.require(class)?;
        if let Some(done) = linked.get(base.name()) {
            return Ok(Arc::clone(done));
        }
        let Some(raw) = self.composites.get(base.name()) else {
            return Ok(base);
        };
        if path.iter().any(|seen| seen == base.name()) {
            return Err(DtoError::logic(format!(
                "Composite classes form a cycle: {} -> {}.",
                path.join(" -> "),
                base.name()
            )));
        }

        path.push(base.name().to_string());
        let mut composites = CompositeMap::with_capacity(raw.len());
        for (field, rule) in composite::parse_declarations(raw, self)? {
            let target = self.link_class(rule.target().name(), linked, path)?;
            composites.insert(field, rule.retarget(target));
        }
        path.pop();

        let definition = Arc::new(base.as_ref().clone().with_composites(composites));
        linked.insert(base.name().to_string(), Arc::clone(&definition));
        Ok(definition)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Definition>> {
        self.definitions.get(name.trim_start_matches('\\'))
    }

    /// Like [`Registry::get`] but unknown names are an error.
    pub fn require(&self, name: &str) -> DtoResult<Arc<Definition>> {
        self.get(name)
            .cloned()
            .ok_or_else(|| DtoError::UnknownClass(name.to_string()))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Registered class names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.definitions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Composites declared by `class`, if it has any.
    pub fn composites_for(&self, class: &str) -> DtoResult<Option<CompositeMap>> {
        Ok(self.require(class)?.composites().cloned())
    }

    /// Resolves textual composite declarations against this registry.
    pub fn resolve_composites(&self, raw: &IndexMap<String, Value>) -> DtoResult<CompositeMap> {
        composite::parse_declarations(raw, self)
    }
}
