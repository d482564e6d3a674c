//! Leaf scenario execution: the enter/run/assert/exit event envelope,
//! output capture, and pass/fail classification.

use super::{join_path, merge_env, substitute_vars, Runner, Scope};
use crate::event::{Event, Status};
use crate::spec::{Assertion, Scenario};
use anyhow::Result;
use chrono::Utc;
use std::collections::BTreeMap;

use super::assertion::{resolve_assertion, CapturedOutput};
use crate::assert::protocol;

impl Runner {
    /// Runs one leaf scenario and returns whether it passed. The caller
    /// applies the failure policy.
    pub(super) fn run_leaf(
        &mut self,
        path: &str,
        scenario: &Scenario,
        scope: &Scope<'_>,
    ) -> Result<bool> {
        let Some(run) = &scenario.run else {
            return Ok(false);
        };

        let scenario_output = join_path(&self.output_root, path);
        let mut env = merge_env(&scope.env, &scenario.env);
        env.insert("SCENARIO_OUTPUT".to_string(), scenario_output.clone());
        env.insert(
            "RUN_OUTPUT".to_string(),
            join_path(&scenario_output, "_run"),
        );

        self.emit(Event::ScenarioEnter {
            run_id: self.run_id.clone(),
            path: path.to_string(),
            name: scenario.name.clone(),
            timestamp: Utc::now(),
        });

        for inherited in &scope.before_each {
            self.run_hook(
                path,
                "before_each",
                Some(&inherited.from),
                Some(inherited.hook),
                &env,
            )?;
        }
        self.run_hook(path, "before", None, scenario.before.as_ref(), &env)?;

        self.emit(Event::ScenarioRunStart {
            run_id: self.run_id.clone(),
            path: path.to_string(),
        });

        let outcome = self.exec_capture(&run.command, &run.timeout, &env)?;
        if outcome.timed_out {
            self.emit(Event::Timeout {
                run_id: self.run_id.clone(),
                path: path.to_string(),
                phase: "run".to_string(),
                limit: run.timeout.clone(),
            });
        }
        self.emit(Event::ScenarioRunEnd {
            run_id: self.run_id.clone(),
            path: path.to_string(),
            exit_code: outcome.exit_code,
        });

        let captured = CapturedOutput {
            stdout: outcome.stdout,
            stderr: outcome.stderr,
            exit_code: outcome.exit_code,
        };
        let assertions_passed =
            self.run_assertions(path, &scenario.assertions, &env, &captured)?;

        // A nonzero run exit code is not a failure by itself; a test may
        // assert on it. Timeouts always fail.
        let passed = assertions_passed && !outcome.timed_out;

        self.emit(Event::ScenarioExit {
            run_id: self.run_id.clone(),
            path: path.to_string(),
            status: if passed { Status::Pass } else { Status::Fail },
            timestamp: Utc::now(),
        });

        if passed {
            self.passed += 1;
        } else {
            self.failed += 1;
        }

        self.run_hook(path, "after", None, scenario.after.as_ref(), &env)?;
        for inherited in scope.after_each.iter().rev() {
            self.run_hook(
                path,
                "after_each",
                Some(&inherited.from),
                Some(inherited.hook),
                &env,
            )?;
        }

        Ok(passed)
    }

    fn run_assertions(
        &mut self,
        path: &str,
        assertions: &[Assertion],
        env: &BTreeMap<String, String>,
        captured: &CapturedOutput,
    ) -> Result<bool> {
        let mut all_passed = true;
        for (index, assertion) in assertions.iter().enumerate() {
            self.emit(Event::AssertionStart {
                run_id: self.run_id.clone(),
                path: path.to_string(),
                index,
                command: assertion.command.clone(),
            });

            let resolved = match resolve_assertion(&assertion.command, captured, env) {
                Ok(resolved) => resolved,
                Err(_) => {
                    self.emit(Event::AssertionEnd {
                        run_id: self.run_id.clone(),
                        path: path.to_string(),
                        index,
                        exit_code: 1,
                    });
                    all_passed = false;
                    continue;
                }
            };

            // Commands that reference captured resources get the resolved
            // pair over stdin; anything else flows to the shell as written.
            let outcome = if resolved.uses_resources {
                let wire = protocol::build(&resolved.first, &resolved.second);
                self.executor.execute_with_stdin(
                    &resolved.executable,
                    &assertion.timeout,
                    env,
                    &wire,
                )?
            } else {
                self.executor.execute(
                    &substitute_vars(&assertion.command, env),
                    &assertion.timeout,
                    env,
                )?
            };
            self.emit_output(&outcome);

            self.emit(Event::AssertionEnd {
                run_id: self.run_id.clone(),
                path: path.to_string(),
                index,
                exit_code: outcome.exit_code,
            });

            if outcome.exit_code != 0 {
                all_passed = false;
            }
        }
        Ok(all_passed)
    }
}
