//! Assertion argument resolution.
//!
//! Assertion executables are independent processes; resolving the two
//! argument tokens in-process and handing them over stdin avoids re-reading
//! capture files or racing the filesystem. A token is, in order: a
//! captured-resource reference (matched against its unexpanded spelling), an
//! existing file whose contents are substituted, or a literal.

use super::substitute_vars;
use anyhow::{anyhow, Result};
use std::collections::BTreeMap;
use std::path::Path;

/// Outputs captured from a scenario's run command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

const RUN_OUTPUT_VAR: &str = "${RUN_OUTPUT}";

fn stdout_ref() -> String {
    format!("{RUN_OUTPUT_VAR}/stdout")
}

fn stderr_ref() -> String {
    format!("{RUN_OUTPUT_VAR}/stderr")
}

fn exit_code_ref() -> String {
    format!("{RUN_OUTPUT_VAR}/exit_code")
}

#[derive(Debug, PartialEq, Eq)]
pub(super) struct ResolvedAssertion {
    pub executable: String,
    pub first: String,
    pub second: String,
    /// Whether the command referenced a captured resource, which selects
    /// the stdin protocol invocation.
    pub uses_resources: bool,
}

pub(super) fn resolve_assertion(
    command: &str,
    captured: &CapturedOutput,
    env: &BTreeMap<String, String>,
) -> Result<ResolvedAssertion> {
    let tokens = tokenize(command);
    if tokens.len() != 3 {
        return Err(anyhow!(
            "assertion command must have an executable and exactly 2 arguments, got {}",
            tokens.len().saturating_sub(1)
        ));
    }

    let uses_resources = [stdout_ref(), stderr_ref(), exit_code_ref()]
        .iter()
        .any(|resource| command.contains(resource.as_str()));

    Ok(ResolvedAssertion {
        executable: substitute_vars(&tokens[0], env),
        first: resolve_arg(&tokens[1], captured, env),
        second: resolve_arg(&tokens[2], captured, env),
        uses_resources,
    })
}

// Resource references match their unexpanded spelling; only then is the
// token expanded and tried as a file path.
fn resolve_arg(token: &str, captured: &CapturedOutput, env: &BTreeMap<String, String>) -> String {
    if token == stdout_ref() {
        return captured.stdout.clone();
    }
    if token == stderr_ref() {
        return captured.stderr.clone();
    }
    if token == exit_code_ref() {
        return captured.exit_code.to_string();
    }
    let expanded = substitute_vars(token, env);
    if Path::new(&expanded).is_file() {
        if let Ok(contents) = std::fs::read_to_string(&expanded) {
            return contents;
        }
    }
    expanded
}

/// Splits a command on spaces with shell-like quoting: single and double
/// quotes group, backslash escapes the next character inside double quotes,
/// quotes are stripped, and an empty quoted string still counts as a token.
pub(super) fn tokenize(command: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_double = false;
    let mut in_single = false;
    let mut escaped = false;
    let mut has_content = false;

    for ch in command.chars() {
        if escaped {
            current.push(ch);
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_double => escaped = true,
            '"' if !in_single => {
                in_double = !in_double;
                has_content = true;
            }
            '\'' if !in_double => {
                in_single = !in_single;
                has_content = true;
            }
            ' ' if !in_double && !in_single => {
                if !current.is_empty() || has_content {
                    tokens.push(std::mem::take(&mut current));
                    has_content = false;
                }
            }
            _ => current.push(ch),
        }
    }
    if !current.is_empty() || has_content {
        tokens.push(current);
    }
    tokens
}
