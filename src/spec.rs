//! Schema types for `context.yaml` files.
//!
//! These types keep scenario intent spec-owned while the engine stays a
//! mechanical executor; parsing is strict so a typo in a context file fails
//! the load instead of silently dropping a hook.

use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

fn default_timeout() -> String {
    "10s".to_string()
}

/// What the walker does with the rest of the tree after a failing scenario.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OnFailure {
    #[default]
    Continue,
    SkipChildren,
    AbortRun,
}

/// A command run for its side effects; its exit code never affects
/// pass/fail.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Hook {
    pub run: String,
    #[serde(default = "default_timeout")]
    pub timeout: String,
}

/// The command a leaf scenario executes.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RunBlock {
    pub command: String,
    #[serde(default = "default_timeout")]
    pub timeout: String,
}

/// One assertion command: an executable plus two argument tokens.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Assertion {
    pub command: String,
    #[serde(default = "default_timeout")]
    pub timeout: String,
}

/// A leaf test (has `run`) or a grouping node (has nested `scenarios`).
/// A node carrying both is treated as a leaf; the `run` wins.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<Hook>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<Hook>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before_each: Option<Hook>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after_each: Option<Hook>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run: Option<RunBlock>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assertions: Vec<Assertion>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scenarios: Vec<Scenario>,
}

impl Scenario {
    pub fn is_leaf(&self) -> bool {
        self.run.is_some()
    }
}

/// One `context.yaml`: a node of the spec tree.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Context {
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_failure: Option<OnFailure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<Hook>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<Hook>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before_each: Option<Hook>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after_each: Option<Hook>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scenarios: Vec<Scenario>,
}

pub fn parse_context(data: &[u8]) -> Result<Context> {
    let text = std::str::from_utf8(data).context("context file is not valid UTF-8")?;
    serde_yaml::from_str(text).context("parse context yaml")
}

/// A problem found while validating a context file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub file: String,
    pub path: String,
    pub message: String,
}

/// Structural validation beyond what serde enforces: non-empty commands and
/// ids, sibling-unique ids, and every scenario being a leaf or a group.
pub fn validate(context: &Context, file: &str) -> Vec<Issue> {
    let mut issues = Vec::new();
    if context.name.trim().is_empty() {
        issues.push(Issue {
            file: file.to_string(),
            path: String::new(),
            message: "context name must not be empty".to_string(),
        });
    }
    validate_hooks(
        file,
        "",
        [
            ("before", &context.before),
            ("after", &context.after),
            ("before_each", &context.before_each),
            ("after_each", &context.after_each),
        ],
        &mut issues,
    );
    validate_scenarios(file, "", &context.scenarios, &mut issues);
    issues
}

fn validate_scenarios(file: &str, base: &str, scenarios: &[Scenario], issues: &mut Vec<Issue>) {
    let mut seen = BTreeSet::new();
    for scenario in scenarios {
        let path = if base.is_empty() {
            scenario.id.clone()
        } else {
            format!("{base}/{}", scenario.id)
        };
        if scenario.id.trim().is_empty() || scenario.id.contains('/') {
            issues.push(Issue {
                file: file.to_string(),
                path: path.clone(),
                message: format!("scenario id {:?} must be a single path segment", scenario.id),
            });
        }
        if !seen.insert(scenario.id.clone()) {
            issues.push(Issue {
                file: file.to_string(),
                path: path.clone(),
                message: format!("duplicate scenario id {:?}", scenario.id),
            });
        }
        if scenario.run.is_none() && scenario.scenarios.is_empty() {
            issues.push(Issue {
                file: file.to_string(),
                path: path.clone(),
                message: "scenario needs a run block or nested scenarios".to_string(),
            });
        }
        if let Some(run) = &scenario.run {
            if run.command.trim().is_empty() {
                issues.push(Issue {
                    file: file.to_string(),
                    path: path.clone(),
                    message: "run command must not be empty".to_string(),
                });
            }
        }
        for (index, assertion) in scenario.assertions.iter().enumerate() {
            if assertion.command.trim().is_empty() {
                issues.push(Issue {
                    file: file.to_string(),
                    path: path.clone(),
                    message: format!("assertion {index} command must not be empty"),
                });
            }
        }
        validate_hooks(
            file,
            &path,
            [
                ("before", &scenario.before),
                ("after", &scenario.after),
                ("before_each", &scenario.before_each),
                ("after_each", &scenario.after_each),
            ],
            issues,
        );
        validate_scenarios(file, &path, &scenario.scenarios, issues);
    }
}

fn validate_hooks(
    file: &str,
    path: &str,
    hooks: [(&str, &Option<Hook>); 4],
    issues: &mut Vec<Issue>,
) {
    for (label, hook) in hooks {
        if let Some(hook) = hook {
            if hook.run.trim().is_empty() {
                issues.push(Issue {
                    file: file.to_string(),
                    path: path.to_string(),
                    message: format!("{label} hook command must not be empty"),
                });
            }
        }
    }
}
