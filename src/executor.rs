//! Command execution seam. The engine talks to an [`Executor`]; the shell
//! implementation runs commands through `sh -c` with a hard timeout and
//! kills the child when the limit expires.

use anyhow::{anyhow, Context, Result};
use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::JoinHandle;
use std::time::Duration;
use wait_timeout::ChildExt;

/// Result of one command execution. A timeout is a regular outcome, not an
/// error; `Err` from the executor means the command could not be run at all.
#[derive(Debug, Clone, Default)]
pub struct ExecOutcome {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub timed_out: bool,
}

pub trait Executor {
    fn execute(
        &self,
        command: &str,
        timeout: &str,
        env: &BTreeMap<String, String>,
    ) -> Result<ExecOutcome>;

    fn execute_with_stdin(
        &self,
        command: &str,
        timeout: &str,
        env: &BTreeMap<String, String>,
        stdin: &[u8],
    ) -> Result<ExecOutcome>;
}

/// Parses a duration string such as `"10s"`, `"500ms"`, `"2m"`, or `"1h"`.
/// An empty string means no limit.
pub fn parse_timeout(value: &str) -> Result<Option<Duration>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    let split = value
        .find(|ch: char| !ch.is_ascii_digit())
        .ok_or_else(|| anyhow!("timeout {value:?} is missing a unit"))?;
    let (digits, unit) = value.split_at(split);
    let amount: u64 = digits
        .parse()
        .with_context(|| format!("timeout {value:?} has no leading number"))?;
    let duration = match unit {
        "ms" => Duration::from_millis(amount),
        "s" => Duration::from_secs(amount),
        "m" => Duration::from_secs(amount * 60),
        "h" => Duration::from_secs(amount * 3600),
        _ => return Err(anyhow!("timeout {value:?} has unknown unit {unit:?}")),
    };
    Ok(Some(duration))
}

pub struct ShellExecutor;

impl ShellExecutor {
    pub fn new() -> Self {
        Self
    }

    fn run(
        &self,
        command: &str,
        timeout: &str,
        env: &BTreeMap<String, String>,
        stdin: Option<&[u8]>,
    ) -> Result<ExecOutcome> {
        let limit = parse_timeout(timeout)?;

        let mut cmd = Command::new("sh");
        cmd.args(["-c", command])
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        for (key, value) in env {
            cmd.env(key, value);
        }
        // Own process group, so a timeout can take down grandchildren that
        // would otherwise hold the output pipes open.
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        let mut child = cmd
            .spawn()
            .with_context(|| format!("spawn command {command:?}"))?;

        let stdout_reader = drain_pipe(child.stdout.take());
        let stderr_reader = drain_pipe(child.stderr.take());

        if let Some(bytes) = stdin {
            // The child may exit without draining; a broken pipe is fine.
            if let Some(mut pipe) = child.stdin.take() {
                let _ = pipe.write_all(bytes);
            }
        }

        let status = wait_with_limit(&mut child, limit)?;

        let stdout = join_pipe(stdout_reader);
        let stderr = join_pipe(stderr_reader);

        let (exit_code, timed_out) = match status {
            Some(status) => (exit_code_of(&status), false),
            None => (-1, true),
        };

        Ok(ExecOutcome {
            stdout,
            stderr,
            exit_code,
            timed_out,
        })
    }
}

impl Default for ShellExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor for ShellExecutor {
    fn execute(
        &self,
        command: &str,
        timeout: &str,
        env: &BTreeMap<String, String>,
    ) -> Result<ExecOutcome> {
        self.run(command, timeout, env, None)
    }

    fn execute_with_stdin(
        &self,
        command: &str,
        timeout: &str,
        env: &BTreeMap<String, String>,
        stdin: &[u8],
    ) -> Result<ExecOutcome> {
        self.run(command, timeout, env, Some(stdin))
    }
}

// Streams are drained on threads so a chatty child never blocks on a full
// pipe, and partial output survives a kill.
fn drain_pipe<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<Vec<u8>>> {
    let mut pipe = pipe?;
    Some(std::thread::spawn(move || {
        let mut buffer = Vec::new();
        let _ = pipe.read_to_end(&mut buffer);
        buffer
    }))
}

fn join_pipe(handle: Option<JoinHandle<Vec<u8>>>) -> String {
    match handle {
        Some(handle) => String::from_utf8_lossy(&handle.join().unwrap_or_default()).to_string(),
        None => String::new(),
    }
}

// `None` means the limit expired and the child was killed.
fn wait_with_limit(child: &mut Child, limit: Option<Duration>) -> Result<Option<ExitStatus>> {
    match limit {
        None => Ok(Some(child.wait().context("wait for child")?)),
        Some(limit) => match child.wait_timeout(limit).context("wait for child")? {
            Some(status) => Ok(Some(status)),
            None => {
                kill_group(child);
                let _ = child.wait();
                Ok(None)
            }
        },
    }
}

fn kill_group(child: &mut Child) {
    #[cfg(unix)]
    unsafe {
        libc::killpg(child.id() as i32, libc::SIGKILL);
    }
    let _ = child.kill();
}

fn exit_code_of(status: &ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}
