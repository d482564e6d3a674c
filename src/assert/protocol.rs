//! The stdin wire format between the runner and assertion executables.
//!
//! ```text
//! basanos:1
//! <len(first)>
//! <first><len(second)>
//! <second>
//! ```
//!
//! Lengths are decimal byte counts; there is no newline between a value and
//! the next length line, the prefix makes the boundary unambiguous.

use anyhow::{anyhow, Context, Result};
use std::io::{BufRead, Read};

pub const MAGIC: &str = "basanos:1";

pub fn build(first: &str, second: &str) -> Vec<u8> {
    format!(
        "{MAGIC}\n{}\n{first}{}\n{second}",
        first.len(),
        second.len()
    )
    .into_bytes()
}

pub fn parse(reader: &mut dyn BufRead) -> Result<(String, String)> {
    let magic = read_line(reader).context("read protocol magic")?;
    if magic != MAGIC {
        return Err(anyhow!("bad protocol magic {magic:?}, want {MAGIC:?}"));
    }
    let first = read_value(reader).context("read first value")?;
    let second = read_value(reader).context("read second value")?;
    Ok((first, second))
}

fn read_value(reader: &mut dyn BufRead) -> Result<String> {
    let length_line = read_line(reader)?;
    let length: usize = length_line
        .parse()
        .with_context(|| format!("bad length line {length_line:?}"))?;
    let mut buffer = vec![0u8; length];
    reader
        .read_exact(&mut buffer)
        .with_context(|| format!("read {length} value bytes"))?;
    Ok(String::from_utf8_lossy(&buffer).to_string())
}

fn read_line(reader: &mut dyn BufRead) -> Result<String> {
    let mut line = String::new();
    let read = reader.read_line(&mut line)?;
    if read == 0 {
        return Err(anyhow!("unexpected end of input"));
    }
    Ok(line.trim_end_matches('\n').to_string())
}
