//! CLI argument definitions using clap
//!
//! Commands:
//! - simpledto build --class <Name>
//! - simpledto snapshot --class <Name>
//! - simpledto restore --class <Name>

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::validation::TypeMode;

/// simpledto - build, snapshot and restore validated data objects
#[derive(Parser, Debug)]
#[command(name = "simpledto")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build an object from a JSON record on stdin and print its data
    Build(CommonArgs),

    /// Build an object from a JSON record on stdin and print its snapshot
    Snapshot(CommonArgs),

    /// Restore an object from a snapshot on stdin and print its data
    Restore(CommonArgs),
}

/// Flags shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// DTO class to build
    #[arg(long)]
    pub class: String,

    /// Path to configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory of definition files, overrides the config
    #[arg(long)]
    pub defs: Option<PathBuf>,

    /// Make every rule nullable and accept undeclared properties
    #[arg(long)]
    pub permissive: bool,

    /// Make every rule nullable
    #[arg(long)]
    pub allow_null: bool,

    /// Accept undeclared properties
    #[arg(long)]
    pub allow_extra: bool,

    /// Force the validator mode (strict or fuzzy)
    #[arg(long)]
    pub mode: Option<TypeMode>,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
