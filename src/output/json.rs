//! Deterministic record serialization.
//!
//! One record per line, UTF-8, no enclosing array, so report files can be
//! streamed and appended without rewriting prior output.

use crate::analysis::ContextCapability;
use crate::error::Result;

/// Serialize one record to its compact, stable JSON form. Field order is
/// fixed (`capability`, `function_name`, `entry_point`,
/// `followed_by_return`); equal records always yield byte-identical output.
pub fn serialize(record: &ContextCapability) -> String {
    // Total over well-formed records: construction guarantees (pruned
    // trees, explicit no-check marker) leave nothing unrepresentable.
    serde_json::to_string(record).unwrap_or_else(|_| "null".to_string())
}

/// Render a batch of records as newline-delimited JSON.
pub fn render(records: &[ContextCapability]) -> Result<String> {
    let mut out = String::new();
    for record in records {
        out.push_str(&serialize(record));
        out.push('\n');
    }
    Ok(out)
}
