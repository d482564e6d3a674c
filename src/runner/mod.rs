//! The spec-tree execution engine: depth-first walk over a loaded
//! [`SpecTree`], sequencing hooks, executing commands, capturing outputs,
//! evaluating assertions, and publishing a deterministic event stream.
//!
//! Everything here is single-threaded and fully sequential; event ordering
//! is observational.

mod assertion;
mod scenario;

pub use assertion::CapturedOutput;

use crate::event::{Event, Status};
use crate::executor::Executor;
use crate::sink::Sink;
use crate::spec::{Hook, OnFailure, Scenario};
use crate::tree::SpecTree;
use anyhow::Result;
use chrono::Utc;
use std::collections::BTreeMap;

/// Outcome of one run of the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub passed: usize,
    pub failed: usize,
    pub status: Status,
}

impl RunSummary {
    pub fn success(&self) -> bool {
        self.status == Status::Pass
    }
}

/// An inherited `*_each` hook together with the path of the context or
/// group that contributed it.
#[derive(Clone)]
struct InheritedHook<'t> {
    from: String,
    hook: &'t Hook,
}

/// Per-frame state threaded through the recursion. Child frames clone and
/// append; nothing is shared mutably.
#[derive(Clone)]
struct Scope<'t> {
    env: BTreeMap<String, String>,
    before_each: Vec<InheritedHook<'t>>,
    after_each: Vec<InheritedHook<'t>>,
    on_failure: OnFailure,
}

impl<'t> Scope<'t> {
    fn root() -> Self {
        Scope {
            env: BTreeMap::new(),
            before_each: Vec::new(),
            after_each: Vec::new(),
            on_failure: OnFailure::Continue,
        }
    }

    /// Frame for a grouping scenario: merged env plus the group's own
    /// `*_each` hooks.
    fn for_group(&self, group: &'t Scenario, group_path: &str) -> Self {
        let mut child = self.clone();
        child.env = merge_env(&self.env, &group.env);
        push_inherited(&mut child.before_each, group_path, &group.before_each);
        push_inherited(&mut child.after_each, group_path, &group.after_each);
        child
    }
}

fn push_inherited<'t>(
    stack: &mut Vec<InheritedHook<'t>>,
    from: &str,
    hook: &'t Option<Hook>,
) {
    if let Some(hook) = hook {
        stack.push(InheritedHook {
            from: from.to_string(),
            hook,
        });
    }
}

pub struct Runner {
    executor: Box<dyn Executor>,
    sinks: Vec<Box<dyn Sink>>,
    /// Glob pattern matched against scenario paths; `None` runs everything.
    pub filter: Option<String>,
    run_id: String,
    spec_root: String,
    output_root: String,
    passed: usize,
    failed: usize,
    aborted: bool,
}

impl Runner {
    pub fn new(executor: Box<dyn Executor>, sinks: Vec<Box<dyn Sink>>) -> Self {
        Runner {
            executor,
            sinks,
            filter: None,
            run_id: String::new(),
            spec_root: String::new(),
            output_root: String::new(),
            passed: 0,
            failed: 0,
            aborted: false,
        }
    }

    pub fn passed(&self) -> usize {
        self.passed
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    /// Runs the tree under a run identifier: brackets the walk with
    /// `run_start`/`run_end` and captures outputs under `runs/<run_id>`.
    pub fn run_with_id(
        &mut self,
        run_id: &str,
        tree: &SpecTree,
        spec_root: &str,
    ) -> Result<RunSummary> {
        self.reset(run_id, spec_root, &join_path("runs", run_id));
        self.emit(Event::RunStart {
            run_id: run_id.to_string(),
            timestamp: Utc::now(),
        });

        let walked = self.walk_context(tree, &Scope::root());

        let summary = self.summary();
        self.emit(Event::RunEnd {
            run_id: run_id.to_string(),
            status: summary.status,
            passed: summary.passed,
            failed: summary.failed,
            timestamp: Utc::now(),
        });
        walked?;
        Ok(summary)
    }

    /// ID-less variant: no run-level events, empty output root.
    pub fn run(&mut self, tree: &SpecTree, spec_root: &str) -> Result<RunSummary> {
        self.reset("", spec_root, "");
        self.walk_context(tree, &Scope::root())?;
        Ok(self.summary())
    }

    fn reset(&mut self, run_id: &str, spec_root: &str, output_root: &str) {
        self.run_id = run_id.to_string();
        self.spec_root = spec_root.to_string();
        self.output_root = output_root.to_string();
        self.passed = 0;
        self.failed = 0;
        self.aborted = false;
    }

    fn summary(&self) -> RunSummary {
        RunSummary {
            passed: self.passed,
            failed: self.failed,
            status: if self.failed > 0 {
                Status::Fail
            } else {
                Status::Pass
            },
        }
    }

    fn walk_context<'t>(&mut self, node: &'t SpecTree, parent: &Scope<'t>) -> Result<()> {
        if self.aborted {
            return Ok(());
        }

        let mut env = merge_env(&parent.env, &node.context.env);
        env.insert("SPEC_ROOT".to_string(), self.spec_root.clone());
        env.insert(
            "CONTEXT_OUTPUT".to_string(),
            join_path(&self.output_root, &node.path),
        );

        self.emit(Event::ContextEnter {
            run_id: self.run_id.clone(),
            path: node.path.clone(),
            name: node.context.name.clone(),
            timestamp: Utc::now(),
        });

        self.run_hook(&node.path, "before", None, node.context.before.as_ref(), &env)?;

        let mut scope = parent.clone();
        scope.env = env.clone();
        scope.on_failure = node.context.on_failure.unwrap_or(parent.on_failure);
        push_inherited(&mut scope.before_each, &node.path, &node.context.before_each);
        push_inherited(&mut scope.after_each, &node.path, &node.context.after_each);

        self.run_scenarios(&node.path, &node.context.scenarios, &scope)?;

        for child in &node.children {
            self.walk_context(child, &scope)?;
        }

        // Frames already on the call path still unwind after an abort: their
        // after hooks run and their exit events emit.
        self.run_hook(&node.path, "after", None, node.context.after.as_ref(), &env)?;

        self.emit(Event::ContextExit {
            run_id: self.run_id.clone(),
            path: node.path.clone(),
            timestamp: Utc::now(),
        });

        Ok(())
    }

    /// Walks one sibling set. Returns `true` when the remaining scenarios
    /// of the enclosing context must be abandoned.
    fn run_scenarios<'t>(
        &mut self,
        base: &str,
        scenarios: &'t [Scenario],
        scope: &Scope<'t>,
    ) -> Result<bool> {
        for scenario in scenarios {
            if self.aborted {
                return Ok(true);
            }
            let path = format!("{base}/{}", scenario.id);

            if scenario.is_leaf() {
                if !self.matches_filter(&path) {
                    continue;
                }
                let passed = self.run_leaf(&path, scenario, scope)?;
                if !passed && self.stop_after_failure(scope.on_failure) {
                    return Ok(true);
                }
            } else if !scenario.scenarios.is_empty() {
                let group_scope = scope.for_group(scenario, &path);
                if self.run_scenarios(&path, &scenario.scenarios, &group_scope)? {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    fn stop_after_failure(&mut self, on_failure: OnFailure) -> bool {
        match on_failure {
            OnFailure::AbortRun => {
                self.aborted = true;
                true
            }
            OnFailure::SkipChildren => true,
            OnFailure::Continue => false,
        }
    }

    fn matches_filter(&self, path: &str) -> bool {
        let Some(pattern) = self.filter.as_deref().filter(|p| !p.is_empty()) else {
            return true;
        };
        match glob::Pattern::new(pattern) {
            // `*` must not cross path segments.
            Ok(compiled) => compiled.matches_with(
                path,
                glob::MatchOptions {
                    require_literal_separator: true,
                    ..Default::default()
                },
            ),
            // A malformed pattern degrades to exact matching.
            Err(_) => path == pattern,
        }
    }

    fn run_hook(
        &mut self,
        path: &str,
        name: &str,
        from: Option<&str>,
        hook: Option<&Hook>,
        env: &BTreeMap<String, String>,
    ) -> Result<()> {
        let Some(hook) = hook else {
            return Ok(());
        };
        let hook_name = format!("_{name}");
        self.emit(Event::HookStart {
            run_id: self.run_id.clone(),
            path: path.to_string(),
            hook: hook_name.clone(),
            from: from.map(str::to_string),
        });
        let outcome = self.exec_capture(&hook.run, &hook.timeout, env)?;
        self.emit(Event::HookEnd {
            run_id: self.run_id.clone(),
            path: path.to_string(),
            hook: hook_name,
            from: from.map(str::to_string),
            exit_code: outcome.exit_code,
        });
        Ok(())
    }

    /// Expands variables, executes, and publishes nonempty streams as
    /// output events.
    fn exec_capture(
        &mut self,
        command: &str,
        timeout: &str,
        env: &BTreeMap<String, String>,
    ) -> Result<crate::executor::ExecOutcome> {
        let expanded = substitute_vars(command, env);
        let outcome = self.executor.execute(&expanded, timeout, env)?;
        self.emit_output(&outcome);
        Ok(outcome)
    }

    fn emit_output(&mut self, outcome: &crate::executor::ExecOutcome) {
        if !outcome.stdout.is_empty() {
            self.emit(Event::Output {
                run_id: self.run_id.clone(),
                stream: crate::event::Stream::Stdout,
                data: outcome.stdout.clone(),
            });
        }
        if !outcome.stderr.is_empty() {
            self.emit(Event::Output {
                run_id: self.run_id.clone(),
                stream: crate::event::Stream::Stderr,
                data: outcome.stderr.clone(),
            });
        }
    }

    // Sink errors are swallowed: one broken sink must not distort another
    // sink's stream or the run outcome.
    fn emit(&mut self, event: Event) {
        for sink in &mut self.sinks {
            let _ = sink.emit(&event);
        }
    }
}

/// Left-to-right map merge; the child overrides the parent.
pub fn merge_env(
    parent: &BTreeMap<String, String>,
    child: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let mut merged = parent.clone();
    for (key, value) in child {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

/// Expands `${NAME}` against `env` in a single pass. Unknown names stay
/// literal; expanded values are not re-expanded.
pub fn substitute_vars(command: &str, env: &BTreeMap<String, String>) -> String {
    let mut out = String::with_capacity(command.len());
    let mut rest = command;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let name = &after[..end];
                match env.get(name) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push_str("${");
                        out.push_str(name);
                        out.push('}');
                    }
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                return out;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Slash-joins path fragments, filtering empty segments so the result never
/// contains `//` and an empty base disappears.
pub fn join_path(base: &str, rest: &str) -> String {
    base.split('/')
        .chain(rest.split('/'))
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}
