//! Filesystem seams. The tree loader reads through [`FileSystem`]; the
//! files sink writes through [`WritableFs`]. Tests swap in the in-memory
//! implementations.

use anyhow::{anyhow, Context, Result};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::rc::Rc;

pub trait FileSystem {
    fn read_file(&self, path: &Path) -> Result<Vec<u8>>;
    /// Names of the immediate subdirectories of `path`, sorted.
    fn read_dir_names(&self, path: &Path) -> Result<Vec<String>>;
    fn is_file(&self, path: &Path) -> bool;
    fn absolute(&self, path: &Path) -> Result<PathBuf>;
}

pub trait WritableFs {
    /// Writes `data` at `relative`, creating parent directories.
    fn write_file(&self, relative: &str, data: &[u8]) -> Result<()>;
}

pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn read_file(&self, path: &Path) -> Result<Vec<u8>> {
        std::fs::read(path).with_context(|| format!("read {}", path.display()))
    }

    fn read_dir_names(&self, path: &Path) -> Result<Vec<String>> {
        let entries =
            std::fs::read_dir(path).with_context(|| format!("read dir {}", path.display()))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                names.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn absolute(&self, path: &Path) -> Result<PathBuf> {
        if path.is_absolute() {
            return Ok(path.to_path_buf());
        }
        let cwd = std::env::current_dir().context("resolve current dir")?;
        Ok(cwd.join(path))
    }
}

/// Writes under a fixed root directory.
pub struct OsWritableFs {
    root: PathBuf,
}

impl OsWritableFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl WritableFs for OsWritableFs {
    fn write_file(&self, relative: &str, data: &[u8]) -> Result<()> {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
        std::fs::write(&path, data).with_context(|| format!("write {}", path.display()))
    }
}

/// In-memory spec tree for loader tests. Paths are stored slash-joined.
#[derive(Default, Clone)]
pub struct MemoryFs {
    files: Rc<RefCell<BTreeMap<String, Vec<u8>>>>,
    dirs: Rc<RefCell<BTreeSet<String>>>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&self, path: &str, content: &str) {
        self.files
            .borrow_mut()
            .insert(path.to_string(), content.as_bytes().to_vec());
        let mut dir = Path::new(path).parent();
        let mut dirs = self.dirs.borrow_mut();
        while let Some(parent) = dir {
            if parent.as_os_str().is_empty() {
                break;
            }
            dirs.insert(parent.to_string_lossy().to_string());
            dir = parent.parent();
        }
    }

    pub fn add_dir(&self, path: &str) {
        self.dirs.borrow_mut().insert(path.to_string());
    }

    pub fn files(&self) -> Vec<String> {
        self.files.borrow().keys().cloned().collect()
    }

    pub fn contents(&self, path: &str) -> Option<String> {
        self.files
            .borrow()
            .get(path)
            .map(|data| String::from_utf8_lossy(data).to_string())
    }
}

impl FileSystem for MemoryFs {
    fn read_file(&self, path: &Path) -> Result<Vec<u8>> {
        let key = path.to_string_lossy().to_string();
        self.files
            .borrow()
            .get(&key)
            .cloned()
            .ok_or_else(|| anyhow!("no such file: {key}"))
    }

    fn read_dir_names(&self, path: &Path) -> Result<Vec<String>> {
        let base = path.to_string_lossy().to_string();
        if !self.dirs.borrow().contains(&base) {
            return Err(anyhow!("no such dir: {base}"));
        }
        let prefix = format!("{base}/");
        let mut names = BTreeSet::new();
        for dir in self.dirs.borrow().iter() {
            if let Some(rest) = dir.strip_prefix(&prefix) {
                if let Some(first) = rest.split('/').next() {
                    names.insert(first.to_string());
                }
            }
        }
        Ok(names.into_iter().collect())
    }

    fn is_file(&self, path: &Path) -> bool {
        self.files
            .borrow()
            .contains_key(&path.to_string_lossy().to_string())
    }

    fn absolute(&self, path: &Path) -> Result<PathBuf> {
        if path.is_absolute() {
            return Ok(path.to_path_buf());
        }
        Ok(PathBuf::from("/").join(path))
    }
}

impl WritableFs for MemoryFs {
    fn write_file(&self, relative: &str, data: &[u8]) -> Result<()> {
        self.files
            .borrow_mut()
            .insert(relative.to_string(), data.to_vec());
        Ok(())
    }
}
