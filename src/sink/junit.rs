//! JUnit XML sink: one `<testsuite>` per context in enter order, one
//! `<testcase>` per scenario, rendered when the run ends.

use super::Sink;
use crate::event::{Event, Status};
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::io::Write;

struct TestCase {
    name: String,
    classname: String,
    seconds: f64,
    failed: bool,
}

#[derive(Default)]
struct TestSuite {
    cases: Vec<TestCase>,
    failures: usize,
}

struct PendingCase {
    name: String,
    started: DateTime<Utc>,
}

pub struct JunitSink<W: Write> {
    writer: W,
    suites: BTreeMap<String, TestSuite>,
    suite_order: Vec<String>,
    pending: BTreeMap<String, PendingCase>,
}

impl<W: Write> JunitSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            suites: BTreeMap::new(),
            suite_order: Vec::new(),
            pending: BTreeMap::new(),
        }
    }

    fn finish_case(&mut self, path: &str, status: Status, at: DateTime<Utc>) {
        let Some(pending) = self.pending.remove(path) else {
            return;
        };
        let classname = parent_path(path).to_string();
        let Some(suite) = self.suites.get_mut(&classname) else {
            return;
        };
        let seconds = (at - pending.started).num_milliseconds() as f64 / 1000.0;
        let failed = status == Status::Fail;
        if failed {
            suite.failures += 1;
        }
        suite.cases.push(TestCase {
            name: pending.name,
            classname,
            seconds,
            failed,
        });
    }

    fn render(&mut self, passed: usize, failed: usize) -> Result<()> {
        writeln!(self.writer, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
        writeln!(
            self.writer,
            r#"<testsuites tests="{}" failures="{}">"#,
            passed + failed,
            failed
        )?;
        for path in &self.suite_order {
            let Some(suite) = self.suites.get(path) else {
                continue;
            };
            writeln!(
                self.writer,
                r#"  <testsuite name="{}" tests="{}" failures="{}">"#,
                escape_attr(path),
                suite.cases.len(),
                suite.failures
            )?;
            for case in &suite.cases {
                write!(
                    self.writer,
                    r#"    <testcase name="{}" classname="{}" time="{:.3}">"#,
                    escape_attr(&case.name),
                    escape_attr(&case.classname),
                    case.seconds
                )?;
                if case.failed {
                    write!(self.writer, r#"<failure message="test failed"></failure>"#)?;
                }
                writeln!(self.writer, "</testcase>")?;
            }
            writeln!(self.writer, "  </testsuite>")?;
        }
        writeln!(self.writer, "</testsuites>")?;
        Ok(())
    }
}

impl<W: Write> Sink for JunitSink<W> {
    fn emit(&mut self, event: &Event) -> Result<()> {
        match event {
            Event::ContextEnter { path, .. } => {
                self.suites.insert(path.clone(), TestSuite::default());
                self.suite_order.push(path.clone());
            }
            Event::ScenarioEnter {
                path,
                name,
                timestamp,
                ..
            } => {
                self.pending.insert(
                    path.clone(),
                    PendingCase {
                        name: name.clone(),
                        started: *timestamp,
                    },
                );
            }
            Event::ScenarioExit {
                path,
                status,
                timestamp,
                ..
            } => self.finish_case(path, *status, *timestamp),
            Event::RunEnd { passed, failed, .. } => return self.render(*passed, *failed),
            _ => {}
        }
        Ok(())
    }
}

fn parent_path(path: &str) -> &str {
    match path.rfind('/') {
        Some(index) => &path[..index],
        None => path,
    }
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
