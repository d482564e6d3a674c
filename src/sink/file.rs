//! Materializes captures on disk. The engine only computes capture path
//! strings; this sink writes the files those paths point at, keyed entirely
//! off the event stream:
//!
//! ```text
//! <run_id>/<scenario_path>/_run/{stdout,stderr,exit_code}
//! <run_id>/<path>/<hook>/{stdout,stderr,exit_code}
//! <run_id>/<scenario_path>/assertions/<index>/{stdout,stderr,exit_code}
//! ```

use super::Sink;
use crate::event::{Event, Stream};
use crate::fs::WritableFs;
use anyhow::Result;

struct Capture {
    target: String,
    stdout: String,
    stderr: String,
}

pub struct FileSink {
    fs: Box<dyn WritableFs>,
    run_id: String,
    current: Option<Capture>,
}

impl FileSink {
    pub fn new(fs: Box<dyn WritableFs>, run_id: &str) -> Self {
        Self {
            fs,
            run_id: run_id.to_string(),
            current: None,
        }
    }

    fn begin(&mut self, target: String) {
        self.current = Some(Capture {
            target,
            stdout: String::new(),
            stderr: String::new(),
        });
    }

    fn finish(&mut self, exit_code: i32) -> Result<()> {
        let Some(capture) = self.current.take() else {
            return Ok(());
        };
        let base = format!("{}/{}", self.run_id, capture.target);
        self.fs
            .write_file(&format!("{base}/stdout"), capture.stdout.as_bytes())?;
        self.fs
            .write_file(&format!("{base}/stderr"), capture.stderr.as_bytes())?;
        self.fs
            .write_file(&format!("{base}/exit_code"), exit_code.to_string().as_bytes())?;
        Ok(())
    }
}

impl Sink for FileSink {
    fn emit(&mut self, event: &Event) -> Result<()> {
        match event {
            Event::HookStart { path, hook, .. } => {
                let dir = hook.trim_start_matches('_');
                self.begin(format!("{path}/{dir}"));
            }
            Event::HookEnd { exit_code, .. } => self.finish(*exit_code)?,
            Event::ScenarioRunStart { path, .. } => self.begin(format!("{path}/_run")),
            Event::ScenarioRunEnd { exit_code, .. } => self.finish(*exit_code)?,
            Event::AssertionStart { path, index, .. } => {
                self.begin(format!("{path}/assertions/{index}"));
            }
            Event::AssertionEnd { exit_code, .. } => self.finish(*exit_code)?,
            Event::Output { stream, data, .. } => {
                if let Some(capture) = &mut self.current {
                    match stream {
                        Stream::Stdout => capture.stdout.push_str(data),
                        Stream::Stderr => capture.stderr.push_str(data),
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }
}
