//! Streaming sink: one JSON object per line, in event order.

use super::Sink;
use crate::event::Event;
use anyhow::Result;
use std::io::Write;

pub struct JsonStreamSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonStreamSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> Sink for JsonStreamSink<W> {
    fn emit(&mut self, event: &Event) -> Result<()> {
        serde_json::to_writer(&mut self.writer, &event.to_json())?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }
}
