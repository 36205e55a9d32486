//! JSON I/O handling for CLI
//!
//! - Input: one JSON document on stdin (may span lines)
//! - Output: one JSON object per line on stdout
//! - UTF-8 only
//!
//! Documents are decoded into [`Value`] directly so key order survives.

use std::io::{self, Read, Write};

use serde::Serialize;

use super::errors::{CliError, CliResult};
use crate::dto::{ValidationReasons, Value};

#[derive(Serialize)]
struct OkResponse<'a, T: Serialize> {
    status: &'static str,
    data: &'a T,
}

#[derive(Serialize)]
struct ErrorResponse<'a> {
    status: &'static str,
    code: &'static str,
    message: &'a str,
    reasons: &'a ValidationReasons,
}

/// Read the raw request text from stdin
pub fn read_input() -> CliResult<String> {
    read_input_from(io::stdin().lock())
}

pub fn read_input_from<R: Read>(mut reader: R) -> CliResult<String> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;

    if text.trim().is_empty() {
        return Err(CliError::invalid_input("Empty input"));
    }
    Ok(text)
}

/// Decode request text into a value, preserving key order.
pub fn parse_request(text: &str) -> CliResult<Value> {
    Ok(serde_json::from_str(text)?)
}

/// Write a success response to stdout
pub fn write_response<T: Serialize>(data: &T) -> CliResult<()> {
    write_response_to(&mut io::stdout().lock(), data)
}

pub fn write_response_to<W: Write, T: Serialize>(out: &mut W, data: &T) -> CliResult<()> {
    write_line(out, &OkResponse { status: "ok", data })
}

/// Write an error response to stdout
pub fn write_error(err: &CliError) -> CliResult<()> {
    write_error_to(&mut io::stdout().lock(), err)
}

pub fn write_error_to<W: Write>(out: &mut W, err: &CliError) -> CliResult<()> {
    let none = ValidationReasons::new();
    let response = ErrorResponse {
        status: "error",
        code: err.code_str(),
        message: err.message(),
        reasons: err.reasons().unwrap_or(&none),
    };
    write_line(out, &response)
}

fn write_line<W: Write, T: Serialize>(out: &mut W, response: &T) -> CliResult<()> {
    serde_json::to_writer(&mut *out, response)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}
