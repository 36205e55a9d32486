//! CLI command implementations
//!
//! Every command follows the same sequence:
//! 1. Configuration load (optional file, then flags)
//! 2. Definition load from the definitions directory
//! 3. Read one JSON document from stdin
//! 4. Build or restore the object
//! 5. Print one JSON response to stdout

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::dto::{Dto, DtoOption, ObjectBuilder, Options, Value};
use crate::schema::Registry;
use crate::validation::{TypeMode, Validator};

use super::args::{Command, CommonArgs};
use super::errors::{CliError, CliResult};
use super::io::{parse_request, read_input, write_error, write_response};

/// Configuration file structure (`simpledto.json`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding `*.json` definition files (default "./dtos")
    #[serde(default = "default_definitions_dir")]
    pub definitions_dir: String,

    /// Default options by name: "permissive", "allow_null", "allow_extra"
    #[serde(default)]
    pub options: Vec<String>,

    /// Forced validator mode: "strict" or "fuzzy"
    #[serde(default)]
    pub mode: Option<String>,
}

fn default_definitions_dir() -> String {
    "./dtos".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            definitions_dir: default_definitions_dir(),
            options: Vec::new(),
            mode: None,
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if self.definitions_dir.trim().is_empty() {
            return Err(CliError::config_error("definitions_dir must not be empty"));
        }
        self.option_set()?;
        self.forced_mode()?;
        Ok(())
    }

    /// Parsed default options.
    pub fn option_set(&self) -> CliResult<Options> {
        self.options
            .iter()
            .map(|name| {
                name.parse::<DtoOption>()
                    .map_err(|e| CliError::config_error(e.to_string()))
            })
            .collect()
    }

    pub fn forced_mode(&self) -> CliResult<Option<TypeMode>> {
        self.mode
            .as_deref()
            .map(|mode| {
                mode.parse::<TypeMode>()
                    .map_err(|e| CliError::config_error(e.to_string()))
            })
            .transpose()
    }
}

/// Everything a command needs once configuration has been applied.
#[derive(Debug)]
pub struct Session {
    class: String,
    registry: Registry,
    /// `None` leaves the builder's own default in place
    options: Option<Options>,
    mode: Option<TypeMode>,
}

impl Session {
    /// Applies config file then flags, and loads the definitions.
    pub fn open(args: &CommonArgs) -> CliResult<Self> {
        let config = match &args.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };

        let mut options = config.option_set()?;
        if args.permissive {
            options.insert(DtoOption::Permissive);
        }
        if args.allow_null {
            options.insert(DtoOption::AllowNull);
        }
        if args.allow_extra {
            options.insert(DtoOption::AllowExtra);
        }

        let dir = args
            .defs
            .clone()
            .unwrap_or_else(|| PathBuf::from(&config.definitions_dir));
        let mut registry = Registry::with_dir(&dir);
        let loaded = registry.load_all()?;
        tracing::debug!(dir = %dir.display(), loaded, "definitions ready");

        Ok(Self {
            class: args.class.clone(),
            registry,
            options: if options.is_empty() { None } else { Some(options) },
            mode: args.mode.or(config.forced_mode()?),
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Builds the session's class from a JSON document.
    pub fn build(&self, text: &str) -> CliResult<Dto> {
        let definition = self.registry.require(&self.class)?;
        let record = match parse_request(text)? {
            Value::Record(record) => record,
            other => {
                return Err(CliError::invalid_input(format!(
                    "Expected a JSON object, got {}",
                    other.type_name()
                )))
            }
        };

        let mut builder = ObjectBuilder::new(definition);
        if let Some(options) = &self.options {
            builder = builder.options(options.clone());
        }
        if let Some(mode) = self.mode {
            builder = builder.validator(Validator::new(mode));
        }

        Ok(builder.build(record)?)
    }

    /// Restores the session's class from snapshot text.
    pub fn restore(&self, text: &str) -> CliResult<Dto> {
        let definition = self.registry.require(&self.class)?;
        Ok(Dto::from_snapshot(definition, text, &self.registry)?)
    }
}

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command; failures are also reported on stdout.
pub fn run_command(cmd: Command) -> CliResult<()> {
    let result = match &cmd {
        Command::Build(args) => build(args),
        Command::Snapshot(args) => snapshot(args),
        Command::Restore(args) => restore(args),
    };

    if let Err(e) = &result {
        tracing::warn!(code = e.code_str(), "command failed");
        write_error(e)?;
    }
    result
}

/// Build an object and print its flattened data
pub fn build(args: &CommonArgs) -> CliResult<()> {
    let session = Session::open(args)?;
    let dto = session.build(&read_input()?)?;
    write_response(&dto)
}

/// Build an object and print its snapshot
pub fn snapshot(args: &CommonArgs) -> CliResult<()> {
    let session = Session::open(args)?;
    let dto = session.build(&read_input()?)?;
    let snapshot = parse_request(&dto.to_snapshot()?)?;
    write_response(&snapshot)
}

/// Restore an object from a snapshot and print its flattened data
pub fn restore(args: &CommonArgs) -> CliResult<()> {
    let session = Session::open(args)?;
    let dto = session.restore(&read_input()?)?;
    write_response(&dto)
}
