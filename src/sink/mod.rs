//! Event consumers. The engine fans every event out to all sinks in
//! registration order, synchronously; sinks that aggregate must buffer
//! internally and flush on `run_end`.

mod cli;
mod file;
mod json;
mod junit;

pub use cli::CliSink;
pub use file::FileSink;
pub use json::JsonStreamSink;
pub use junit::JunitSink;

use crate::event::Event;
use anyhow::Result;

pub trait Sink {
    fn emit(&mut self, event: &Event) -> Result<()>;
}
