//! CLI wiring: argument parsing, sink construction, and the top-level run.

use crate::executor::ShellExecutor;
use crate::fs::{FileSystem, OsFileSystem, OsWritableFs};
use crate::runner::{Runner, RunSummary};
use crate::sink::{CliSink, FileSink, JsonStreamSink, JunitSink, Sink};
use crate::tree::load_spec_tree;
use anyhow::{bail, Result};
use clap::Parser;
use std::path::PathBuf;

pub const DEFAULT_FILES_ROOT: &str = "runs";

#[derive(Parser, Debug)]
#[command(
    name = "basanos",
    version,
    about = "Acceptance test framework driven by YAML spec trees",
    after_help = "Sinks:\n  cli          Human progress reporter (default)\n  json         Streaming JSON event log on stdout\n  junit        JUnit XML report on stdout\n  files[:DIR]  Per-scenario capture files (default dir: runs)\n\nExamples:\n  basanos --spec spec\n  basanos -s spec -o json -o files\n  basanos -f 'spec/api/*'"
)]
pub struct Args {
    /// Spec directory containing the root context.yaml
    #[arg(short = 's', long = "spec", value_name = "DIR", default_value = "spec")]
    pub spec: PathBuf,

    /// Output sink; can be given multiple times
    #[arg(short = 'o', long = "output", value_name = "SINK")]
    pub outputs: Vec<String>,

    /// Run only scenarios whose path matches this glob pattern
    #[arg(short = 'f', long = "filter", value_name = "PATTERN")]
    pub filter: Option<String>,
}

/// Loads the tree, builds sinks, and drives one run. The summary reports
/// pass/fail; `Err` means the run could not be carried out at all.
pub fn run(args: &Args) -> Result<RunSummary> {
    let fs = OsFileSystem;
    let tree = load_spec_tree(&fs, &args.spec)?;
    let spec_root = fs.absolute(&args.spec)?;

    let run_id = chrono::Local::now().format("%Y-%m-%d_%H%M%S").to_string();
    let sinks = build_sinks(&args.outputs, &run_id)?;

    let mut runner = Runner::new(Box::new(ShellExecutor::new()), sinks);
    runner.filter = args.filter.clone();
    runner.run_with_id(&run_id, &tree, &spec_root.to_string_lossy())
}

fn build_sinks(outputs: &[String], run_id: &str) -> Result<Vec<Box<dyn Sink>>> {
    let chosen: Vec<String> = if outputs.is_empty() {
        vec!["cli".to_string()]
    } else {
        outputs.to_vec()
    };

    let mut sinks: Vec<Box<dyn Sink>> = Vec::with_capacity(chosen.len());
    for output in &chosen {
        sinks.push(build_sink(output, run_id)?);
    }
    Ok(sinks)
}

fn build_sink(output: &str, run_id: &str) -> Result<Box<dyn Sink>> {
    let kind = output
        .split_once(':')
        .map(|(kind, _)| kind)
        .unwrap_or(output);
    match kind {
        "json" => Ok(Box::new(JsonStreamSink::new(std::io::stdout()))),
        "junit" => Ok(Box::new(JunitSink::new(std::io::stdout()))),
        "cli" => Ok(Box::new(CliSink::new(std::io::stdout()))),
        "files" => {
            let root = files_root(output);
            Ok(Box::new(FileSink::new(
                Box::new(OsWritableFs::new(root)),
                run_id,
            )))
        }
        other => bail!("unknown output sink {other:?}"),
    }
}

fn files_root(output: &str) -> String {
    match output.split_once(':') {
        Some((_, path)) if !path.is_empty() => path.to_string(),
        _ => DEFAULT_FILES_ROOT.to_string(),
    }
}
