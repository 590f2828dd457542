//! capguard — static analyzer for capability-check guard placement.
//!
//! Walks C sources, finds `if` conditions that test a capability (calls to
//! `capable`/`ns_capable` and configured equivalents), warns when the check
//! is not the last-evaluated term of the condition, and exports one
//! newline-delimited JSON record per guarded condition for correlation with
//! dynamic enforcement-point traces.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use capguard::{scan, ScanOptions};
//!
//! let options = ScanOptions::default();
//! let report = scan(Path::new("./kernel/sys.c"), &options).unwrap();
//! println!("Warnings: {}, Records: {}", report.diagnostics.len(), report.records.len());
//! ```

pub mod analysis;
pub mod callgraph;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod frontend;
pub mod output;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};

use analysis::{analyze_if_condition, capture, ContextCapability, DeclContext, Position};
use callgraph::SimpleCallGraph;
use config::Config;
use diagnostics::{CollectorSink, Diagnostic};
use error::Result;
use frontend::{IfStmt, ParsedFile, SourceLocation};
use output::OutputFormat;

/// Options for a scan invocation.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Path to config file (defaults to `.capguard.toml` in the scan dir).
    pub config_path: Option<PathBuf>,
    /// Output format.
    pub format: OutputFormat,
    /// CLI override for the deny_warnings policy.
    pub deny_warnings_override: Option<bool>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            config_path: None,
            format: OutputFormat::Console,
            deny_warnings_override: None,
        }
    }
}

/// Per-position condition counts for one scan.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct ScanSummary {
    pub conditions: usize,
    pub dominant: usize,
    pub subordinate: usize,
    pub absent: usize,
    /// Conditions dropped because no enclosing function could be resolved.
    pub skipped: usize,
}

/// Complete scan report.
#[derive(Debug)]
pub struct ScanReport {
    pub target_name: String,
    pub diagnostics: Vec<Diagnostic>,
    pub records: Vec<ContextCapability>,
    pub summary: ScanSummary,
    /// False when deny_warnings is set and a misplaced check was found.
    pub pass: bool,
}

/// Enclosing-function lookup over the parsed sources, keyed by the `if`
/// statement's location.
struct SourceDecls {
    by_location: HashMap<SourceLocation, String>,
}

impl SourceDecls {
    fn build(files: &[ParsedFile]) -> Self {
        let mut by_location = HashMap::new();
        for file in files {
            for func in &file.functions {
                for stmt in &func.ifs {
                    by_location.insert(stmt.location.clone(), func.name.clone());
                }
            }
        }
        Self { by_location }
    }
}

impl DeclContext for SourceDecls {
    fn enclosing_function(&self, stmt: &IfStmt) -> Option<String> {
        self.by_location.get(&stmt.location).cloned()
    }
}

/// Run a complete scan: walk sources, parse, build the call graph, analyze
/// every `if` condition.
pub fn scan(path: &Path, options: &ScanOptions) -> Result<ScanReport> {
    let config_dir = if path.is_dir() {
        path.to_path_buf()
    } else {
        path.parent().map(Path::to_path_buf).unwrap_or_default()
    };
    let config_path = options
        .config_path
        .clone()
        .unwrap_or_else(|| config_dir.join(".capguard.toml"));
    let mut config = Config::load(&config_path)?;
    if let Some(deny) = options.deny_warnings_override {
        config.report.deny_warnings = deny;
    }
    let registry = config.registry();

    let files = parse_sources(path)?;
    debug!(files = files.len(), "parsed sources");

    let call_graph = SimpleCallGraph::build(&files);
    let decls = SourceDecls::build(&files);
    let sink = CollectorSink::new();

    let mut records = Vec::new();
    let mut summary = ScanSummary::default();

    for file in &files {
        for func in &file.functions {
            for stmt in &func.ifs {
                summary.conditions += 1;
                match analyze_if_condition(stmt, &decls, &call_graph, &sink, &registry) {
                    Ok(report) => {
                        match report.position {
                            Position::Dominant => summary.dominant += 1,
                            Position::Subordinate => summary.subordinate += 1,
                            Position::Absent => summary.absent += 1,
                        }
                        if let Some(record) = report.record {
                            records.push(record);
                        } else if config.report.include_absent {
                            match capture(&registry, stmt, &decls, &call_graph) {
                                Ok(record) => records.push(record),
                                Err(err) => warn!(%err, "skipping condition"),
                            }
                        }
                    }
                    Err(err) => {
                        summary.skipped += 1;
                        warn!(%err, "skipping condition");
                    }
                }
            }
        }
    }

    let target_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unknown".into());
    let pass = !(config.report.deny_warnings && summary.subordinate > 0);

    Ok(ScanReport {
        target_name,
        diagnostics: sink.take(),
        records,
        summary,
        pass,
    })
}

/// Render a scan report in the specified format.
pub fn render_report(report: &ScanReport, format: OutputFormat) -> Result<String> {
    output::render(&report.diagnostics, &report.records, &report.summary, format)
}

/// Collect and parse `.c`/`.h` files under `path` (gitignore-aware), or the
/// single file itself.
fn parse_sources(path: &Path) -> Result<Vec<ParsedFile>> {
    let mut files = Vec::new();
    if path.is_file() {
        files.push(parse_one(path)?);
        return Ok(files);
    }
    for entry in ignore::WalkBuilder::new(path).build() {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                warn!(%err, "skipping unreadable entry");
                continue;
            }
        };
        let p = entry.path();
        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }
        let ext = p.extension().and_then(|e| e.to_str()).unwrap_or("");
        if matches!(ext, "c" | "h") {
            files.push(parse_one(p)?);
        }
    }
    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}

fn parse_one(path: &Path) -> Result<ParsedFile> {
    let raw = std::fs::read(path)?;
    let content = String::from_utf8_lossy(&raw);
    Ok(frontend::parse_source(path, &content))
}
