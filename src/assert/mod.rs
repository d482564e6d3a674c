//! Shared harness for the assertion executables.
//!
//! Each binary compares two values: with CLI arguments it resolves them per
//! its mode; with no arguments it reads the framed pair from stdin (the
//! runner's protocol invocation). Exit 0 is pass, anything else is fail.

mod contains;
mod equals;
mod matches;
mod numeric;
pub mod protocol;

pub use contains::contains;
pub use equals::equals;
pub use matches::matches;
pub use numeric::{greater_than, greater_than_or_equal, less_than, less_than_or_equal};

use anyhow::{anyhow, Result};
use std::io::{BufRead, Write};
use std::path::Path;

pub const SEPARATOR: &str = "──────────────────────────────────";

/// Outcome of one comparison: the verdict plus the report printed for the
/// operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub passed: bool,
    pub message: String,
}

impl Report {
    pub fn pass(message: impl Into<String>) -> Self {
        Report {
            passed: true,
            message: message.into(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Report {
            passed: false,
            message: message.into(),
        }
    }
}

pub type AssertFn = fn(&str, &str) -> Report;
pub type ResolveFn = fn(&[String]) -> Result<(String, String)>;

/// Entry point shared by every assertion binary; returns the process exit
/// code.
pub fn run_cli(
    args: &[String],
    stdin: &mut dyn BufRead,
    stdout: &mut dyn Write,
    resolve: ResolveFn,
    assert_fn: AssertFn,
) -> i32 {
    let values = if args.is_empty() {
        protocol::parse(stdin)
    } else {
        resolve(args)
    };

    let (first, second) = match values {
        Ok(values) => values,
        Err(err) => {
            let _ = writeln!(stdout, "{err}");
            return 1;
        }
    };

    let report = assert_fn(&first, &second);
    let _ = write!(stdout, "{}", report.message);
    if report.passed {
        0
    } else {
        1
    }
}

/// If `arg` names an existing file its contents are the value; otherwise
/// the argument itself is.
pub fn resolve_value(arg: &str) -> Result<String> {
    if Path::new(arg).is_file() {
        let contents = std::fs::read(arg)?;
        return Ok(String::from_utf8_lossy(&contents).to_string());
    }
    Ok(arg.to_string())
}

fn require_two_args(args: &[String]) -> Result<()> {
    if args.len() != 2 {
        return Err(anyhow!("expected 2 arguments, got {}", args.len()));
    }
    Ok(())
}

pub fn resolve_both_values(args: &[String]) -> Result<(String, String)> {
    require_two_args(args)?;
    Ok((resolve_value(&args[0])?, resolve_value(&args[1])?))
}

pub fn resolve_literals(args: &[String]) -> Result<(String, String)> {
    require_two_args(args)?;
    Ok((args[0].clone(), args[1].clone()))
}

pub fn resolve_literal_and_value(args: &[String]) -> Result<(String, String)> {
    require_two_args(args)?;
    Ok((args[0].clone(), resolve_value(&args[1])?))
}

// Indents multi-line values so reports stay readable.
fn indent(text: &str) -> String {
    format!("  {}", text.replace('\n', "\n  "))
}
