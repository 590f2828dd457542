pub mod console;
pub mod json;

use serde::{Deserialize, Serialize};

use crate::analysis::ContextCapability;
use crate::diagnostics::Diagnostic;
use crate::error::Result;
use crate::ScanSummary;

pub use json::serialize;

/// Output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Console,
    Ndjson,
}

impl OutputFormat {
    pub fn from_str_lenient(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "console" | "text" => Some(Self::Console),
            "ndjson" | "jsonl" | "json" => Some(Self::Ndjson),
            _ => None,
        }
    }
}

/// Render a scan's results in the specified format. Console shows the
/// diagnostics; ndjson streams the captured records.
pub fn render(
    diagnostics: &[Diagnostic],
    records: &[ContextCapability],
    summary: &ScanSummary,
    format: OutputFormat,
) -> Result<String> {
    match format {
        OutputFormat::Console => Ok(console::render(diagnostics, summary)),
        OutputFormat::Ndjson => json::render(records),
    }
}
