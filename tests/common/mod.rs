//! Shared test infrastructure for integration tests: temp spec trees and a
//! collecting sink.

use basanos::event::Event;
use basanos::sink::Sink;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tempfile::TempDir;

/// A spec directory rooted in a tempdir; contexts are written as
/// `context.yaml` files under relative directories.
pub struct SpecDir {
    _temp: TempDir,
    root: PathBuf,
}

impl SpecDir {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("create temp dir");
        let root = temp.path().join("spec");
        std::fs::create_dir_all(&root).expect("create spec root");
        Self { _temp: temp, root }
    }

    pub fn write_context(&self, relative: &str, yaml: &str) {
        let dir = if relative.is_empty() {
            self.root.clone()
        } else {
            self.root.join(relative)
        };
        std::fs::create_dir_all(&dir).expect("create context dir");
        std::fs::write(dir.join("context.yaml"), yaml).expect("write context.yaml");
    }

    pub fn write_file(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dir");
        }
        std::fs::write(&path, contents).expect("write file");
        path
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Collects every event; the handle survives the runner taking ownership of
/// the boxed sink.
#[derive(Clone, Default)]
pub struct CollectingSink {
    events: Rc<RefCell<Vec<Event>>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.events.borrow().iter().map(Event::kind).collect()
    }
}

impl Sink for CollectingSink {
    fn emit(&mut self, event: &Event) -> anyhow::Result<()> {
        self.events.borrow_mut().push(event.clone());
        Ok(())
    }
}
