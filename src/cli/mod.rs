//! CLI module for simpledto
//!
//! Provides command-line interface for:
//! - build: Build an object from stdin and print its data
//! - snapshot: Build an object from stdin and print its snapshot
//! - restore: Restore an object from a snapshot on stdin

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command, CommonArgs};
pub use commands::{build, restore, run, run_command, snapshot, Config, Session};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{parse_request, read_input, write_error, write_response};
