//! Human reporter: a dot or `F` per scenario, failed scenarios replayed
//! with their buffered output, then a one-line summary.

use super::Sink;
use crate::event::{Event, Status, Stream};
use anyhow::Result;
use std::io::Write;

struct Failure {
    path: String,
    stdout: String,
    stderr: String,
}

pub struct CliSink<W: Write> {
    writer: W,
    failures: Vec<Failure>,
    current_stdout: String,
    current_stderr: String,
}

impl<W: Write> CliSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            failures: Vec::new(),
            current_stdout: String::new(),
            current_stderr: String::new(),
        }
    }

    fn print_failures(&mut self) -> Result<()> {
        if self.failures.is_empty() {
            return Ok(());
        }
        write!(self.writer, "Failures:\n\n")?;
        for (index, failure) in self.failures.iter().enumerate() {
            writeln!(self.writer, "  {}) {}", index + 1, failure.path)?;
            print_indented(&mut self.writer, "stdout", &failure.stdout)?;
            print_indented(&mut self.writer, "stderr", &failure.stderr)?;
        }
        writeln!(self.writer)?;
        Ok(())
    }
}

impl<W: Write> Sink for CliSink<W> {
    fn emit(&mut self, event: &Event) -> Result<()> {
        match event {
            Event::ScenarioEnter { .. } => {
                self.current_stdout.clear();
                self.current_stderr.clear();
            }
            Event::Output { stream, data, .. } => match stream {
                Stream::Stdout => self.current_stdout.push_str(data),
                Stream::Stderr => self.current_stderr.push_str(data),
            },
            Event::ScenarioExit { path, status, .. } => match status {
                Status::Pass => write!(self.writer, ".")?,
                Status::Fail => {
                    write!(self.writer, "F")?;
                    self.failures.push(Failure {
                        path: path.clone(),
                        stdout: std::mem::take(&mut self.current_stdout),
                        stderr: std::mem::take(&mut self.current_stderr),
                    });
                }
            },
            Event::RunEnd { passed, failed, .. } => {
                write!(self.writer, "\n\n")?;
                self.print_failures()?;
                writeln!(self.writer, "{passed} passed, {failed} failed")?;
            }
            _ => {}
        }
        Ok(())
    }
}

fn print_indented(writer: &mut impl Write, label: &str, content: &str) -> Result<()> {
    if content.is_empty() {
        return Ok(());
    }
    writeln!(writer, "     {label}:")?;
    for line in content.trim_end_matches('\n').split('\n') {
        writeln!(writer, "       {line}")?;
    }
    Ok(())
}
