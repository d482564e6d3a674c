//! Loads a directory tree of `context.yaml` files into a [`SpecTree`].
//! Subdirectories without a context file are skipped; child order is the
//! filesystem's sorted directory order.

use crate::fs::FileSystem;
use crate::spec::{parse_context, validate, Context};
use anyhow::{anyhow, Context as _, Result};
use std::path::Path;

pub const CONTEXT_FILE: &str = "context.yaml";

/// One node of the loaded spec tree. `path` is the logical slash-joined
/// identifier used in events and filters, not the filesystem location.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecTree {
    pub path: String,
    pub context: Context,
    pub children: Vec<SpecTree>,
}

pub fn load_context(fs: &dyn FileSystem, dir: &Path) -> Result<Context> {
    let file = dir.join(CONTEXT_FILE);
    let data = fs.read_file(&file)?;
    let context =
        parse_context(&data).with_context(|| format!("load {}", file.display()))?;
    let issues = validate(&context, &file.to_string_lossy());
    if let Some(issue) = issues.first() {
        return Err(anyhow!(
            "validation failed: {}: {}: {}",
            issue.file,
            issue.path,
            issue.message
        ));
    }
    Ok(context)
}

pub fn load_spec_tree(fs: &dyn FileSystem, root: &Path) -> Result<SpecTree> {
    let root_name = root
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| root.to_string_lossy().to_string());
    load_recursive(fs, root, &root_name)
}

fn load_recursive(fs: &dyn FileSystem, dir: &Path, logical_path: &str) -> Result<SpecTree> {
    let context = load_context(fs, dir)?;
    let mut tree = SpecTree {
        path: logical_path.to_string(),
        context,
        children: Vec::new(),
    };

    for name in fs.read_dir_names(dir)? {
        let child_dir = dir.join(&name);
        if !fs.is_file(&child_dir.join(CONTEXT_FILE)) {
            continue;
        }
        let child_path = format!("{logical_path}/{name}");
        tree.children
            .push(load_recursive(fs, &child_dir, &child_path)?);
    }

    Ok(tree)
}
