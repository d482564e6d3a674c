//! Immutable event records emitted by the engine. One variant per kind; the
//! JSON rendering is a single match on the tag.
//!
//! The run-level `run_start`/`run_end` kinds share wire names with the
//! scenario-level pair; consumers disambiguate by the presence of `path`.

use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

impl Stream {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stream::Stdout => "stdout",
            Stream::Stderr => "stderr",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Pass,
    Fail,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pass => "pass",
            Status::Fail => "fail",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    RunStart {
        run_id: String,
        timestamp: DateTime<Utc>,
    },
    ContextEnter {
        run_id: String,
        path: String,
        name: String,
        timestamp: DateTime<Utc>,
    },
    ContextExit {
        run_id: String,
        path: String,
        timestamp: DateTime<Utc>,
    },
    HookStart {
        run_id: String,
        path: String,
        hook: String,
        from: Option<String>,
    },
    HookEnd {
        run_id: String,
        path: String,
        hook: String,
        from: Option<String>,
        exit_code: i32,
    },
    ScenarioEnter {
        run_id: String,
        path: String,
        name: String,
        timestamp: DateTime<Utc>,
    },
    ScenarioRunStart {
        run_id: String,
        path: String,
    },
    ScenarioRunEnd {
        run_id: String,
        path: String,
        exit_code: i32,
    },
    Output {
        run_id: String,
        stream: Stream,
        data: String,
    },
    AssertionStart {
        run_id: String,
        path: String,
        index: usize,
        command: String,
    },
    AssertionEnd {
        run_id: String,
        path: String,
        index: usize,
        exit_code: i32,
    },
    Timeout {
        run_id: String,
        path: String,
        phase: String,
        limit: String,
    },
    ScenarioExit {
        run_id: String,
        path: String,
        status: Status,
        timestamp: DateTime<Utc>,
    },
    RunEnd {
        run_id: String,
        status: Status,
        passed: usize,
        failed: usize,
        timestamp: DateTime<Utc>,
    },
}

impl Event {
    /// Wire name of the event kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::RunStart { .. } | Event::ScenarioRunStart { .. } => "run_start",
            Event::ContextEnter { .. } => "context_enter",
            Event::ContextExit { .. } => "context_exit",
            Event::HookStart { .. } => "hook_start",
            Event::HookEnd { .. } => "hook_end",
            Event::ScenarioEnter { .. } => "scenario_enter",
            Event::ScenarioRunEnd { .. } | Event::RunEnd { .. } => "run_end",
            Event::Output { .. } => "output",
            Event::AssertionStart { .. } => "assertion_start",
            Event::AssertionEnd { .. } => "assertion_end",
            Event::Timeout { .. } => "timeout",
            Event::ScenarioExit { .. } => "scenario_exit",
        }
    }

    pub fn run_id(&self) -> &str {
        match self {
            Event::RunStart { run_id, .. }
            | Event::ContextEnter { run_id, .. }
            | Event::ContextExit { run_id, .. }
            | Event::HookStart { run_id, .. }
            | Event::HookEnd { run_id, .. }
            | Event::ScenarioEnter { run_id, .. }
            | Event::ScenarioRunStart { run_id, .. }
            | Event::ScenarioRunEnd { run_id, .. }
            | Event::Output { run_id, .. }
            | Event::AssertionStart { run_id, .. }
            | Event::AssertionEnd { run_id, .. }
            | Event::Timeout { run_id, .. }
            | Event::ScenarioExit { run_id, .. }
            | Event::RunEnd { run_id, .. } => run_id,
        }
    }

    /// JSON object for streaming sinks. `run_id` is omitted when empty
    /// (ID-less runs).
    pub fn to_json(&self) -> Value {
        let mut object = Map::new();
        object.insert("event".to_string(), json!(self.kind()));
        if !self.run_id().is_empty() {
            object.insert("run_id".to_string(), json!(self.run_id()));
        }
        match self {
            Event::RunStart { timestamp, .. } => {
                object.insert("timestamp".to_string(), stamp(timestamp));
            }
            Event::ContextEnter {
                path,
                name,
                timestamp,
                ..
            } => {
                object.insert("path".to_string(), json!(path));
                object.insert("name".to_string(), json!(name));
                object.insert("timestamp".to_string(), stamp(timestamp));
            }
            Event::ContextExit {
                path, timestamp, ..
            } => {
                object.insert("path".to_string(), json!(path));
                object.insert("timestamp".to_string(), stamp(timestamp));
            }
            Event::HookStart {
                path, hook, from, ..
            } => {
                object.insert("path".to_string(), json!(path));
                object.insert("hook".to_string(), json!(hook));
                if let Some(from) = from {
                    object.insert("from".to_string(), json!(from));
                }
            }
            Event::HookEnd {
                path,
                hook,
                from,
                exit_code,
                ..
            } => {
                object.insert("path".to_string(), json!(path));
                object.insert("hook".to_string(), json!(hook));
                if let Some(from) = from {
                    object.insert("from".to_string(), json!(from));
                }
                object.insert("exit_code".to_string(), json!(exit_code));
            }
            Event::ScenarioEnter {
                path,
                name,
                timestamp,
                ..
            } => {
                object.insert("path".to_string(), json!(path));
                object.insert("name".to_string(), json!(name));
                object.insert("timestamp".to_string(), stamp(timestamp));
            }
            Event::ScenarioRunStart { path, .. } => {
                object.insert("path".to_string(), json!(path));
            }
            Event::ScenarioRunEnd {
                path, exit_code, ..
            } => {
                object.insert("path".to_string(), json!(path));
                object.insert("exit_code".to_string(), json!(exit_code));
            }
            Event::Output { stream, data, .. } => {
                object.insert("stream".to_string(), json!(stream.as_str()));
                object.insert("data".to_string(), json!(data));
            }
            Event::AssertionStart {
                path,
                index,
                command,
                ..
            } => {
                object.insert("path".to_string(), json!(path));
                object.insert("index".to_string(), json!(index));
                object.insert("command".to_string(), json!(command));
            }
            Event::AssertionEnd {
                path,
                index,
                exit_code,
                ..
            } => {
                object.insert("path".to_string(), json!(path));
                object.insert("index".to_string(), json!(index));
                object.insert("exit_code".to_string(), json!(exit_code));
            }
            Event::Timeout {
                path, phase, limit, ..
            } => {
                object.insert("path".to_string(), json!(path));
                object.insert("phase".to_string(), json!(phase));
                object.insert("limit".to_string(), json!(limit));
            }
            Event::ScenarioExit {
                path,
                status,
                timestamp,
                ..
            } => {
                object.insert("path".to_string(), json!(path));
                object.insert("status".to_string(), json!(status.as_str()));
                object.insert("timestamp".to_string(), stamp(timestamp));
            }
            Event::RunEnd {
                status,
                passed,
                failed,
                timestamp,
                ..
            } => {
                object.insert("status".to_string(), json!(status.as_str()));
                object.insert("passed".to_string(), json!(passed));
                object.insert("failed".to_string(), json!(failed));
                object.insert("timestamp".to_string(), stamp(timestamp));
            }
        }
        Value::Object(object)
    }
}

fn stamp(timestamp: &DateTime<Utc>) -> Value {
    json!(timestamp.to_rfc3339())
}
