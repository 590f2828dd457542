//! Condition analysis: detection, tree building, position classification
//! and context capture for one `if` statement at a time.
//!
//! Everything here is stateless across conditions; distinct statements can
//! be analyzed concurrently against the same registry and collaborators.

pub mod classify;
pub mod context;
pub mod detect;
pub mod tree;

pub use classify::{classify, Position};
pub use context::{capture, ContextCapability, ContextError, DeclContext};
pub use detect::{CapabilityRef, CheckRegistry};
pub use tree::ConditionTree;

use tracing::debug;

use crate::callgraph::CallGraph;
use crate::diagnostics::{DiagSeverity, DiagnosticsSink};
use crate::frontend::IfStmt;

/// Fixed message for a misplaced capability check.
pub const MISPLACED_CHECK_MSG: &str =
    "Condition with capability check should end with the capability check";

/// Outcome of analyzing one condition. `record` is present for dominant and
/// subordinate checks; an absent check produces no record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionReport {
    pub position: Position,
    pub record: Option<ContextCapability>,
}

/// Analyze one `if` statement: classify the position of its capability
/// check, emit a warning for a subordinate check, and capture the exported
/// record.
///
/// The warning is emitted before context capture, so a missing enclosing
/// function never suppresses the diagnostic; the error is returned for the
/// caller to skip, log or abort on.
pub fn analyze_if_condition(
    stmt: &IfStmt,
    decls: &dyn DeclContext,
    call_graph: &dyn CallGraph,
    sink: &dyn DiagnosticsSink,
    registry: &CheckRegistry,
) -> Result<ConditionReport, ContextError> {
    let position = classify(registry, &stmt.cond);
    if position == Position::Subordinate {
        sink.report(&stmt.location, DiagSeverity::Warning, MISPLACED_CHECK_MSG);
    }
    if position == Position::Absent {
        return Ok(ConditionReport {
            position,
            record: None,
        });
    }
    let record = capture(registry, stmt, decls, call_graph)?;
    debug!(
        function = %record.function_name,
        entry_point = %record.entry_point,
        ?position,
        "captured capability condition"
    );
    Ok(ConditionReport {
        position,
        record: Some(record),
    })
}
