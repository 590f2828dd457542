//! Capture of a condition's surrounding context into an exportable record.

use serde::Serialize;
use thiserror::Error;

use super::detect::CheckRegistry;
use super::tree::ConditionTree;
use crate::callgraph::CallGraph;
use crate::frontend::IfStmt;

/// The exported record for one analyzed condition. Immutable once built;
/// owns its tree, shares nothing with other records.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ContextCapability {
    /// `None` is the explicit no-check marker, rendered as JSON null.
    #[serde(rename = "capability")]
    pub tree: Option<ConditionTree>,
    pub function_name: String,
    /// Empty when no entry point is reachable from the enclosing function.
    pub entry_point: String,
    pub followed_by_return: bool,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContextError {
    /// The `if` statement is not lexically inside a named function. A name
    /// is never fabricated; the caller decides whether to skip or abort.
    #[error("if statement at {location} has no enclosing function")]
    NoEnclosingFunction { location: String },
}

/// Resolves the function lexically enclosing a statement. Implemented by
/// the driver over parsed sources; a compiler frontend would answer from
/// its declaration context.
pub trait DeclContext: Send + Sync {
    fn enclosing_function(&self, stmt: &IfStmt) -> Option<String>;
}

/// Build the record for one `if` statement.
pub fn capture(
    registry: &CheckRegistry,
    stmt: &IfStmt,
    decls: &dyn DeclContext,
    call_graph: &dyn CallGraph,
) -> Result<ContextCapability, ContextError> {
    let function_name =
        decls
            .enclosing_function(stmt)
            .ok_or_else(|| ContextError::NoEnclosingFunction {
                location: stmt.location.to_string(),
            })?;
    let entry_point = call_graph.entry_point_for(&function_name).unwrap_or_default();
    Ok(ContextCapability {
        tree: ConditionTree::build(registry, &stmt.cond),
        function_name,
        entry_point,
        followed_by_return: stmt.then_block.ends_in_return(),
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::frontend::{Block, Expr, SourceLocation, Stmt};

    struct FixedDecls(Option<String>);

    impl DeclContext for FixedDecls {
        fn enclosing_function(&self, _stmt: &IfStmt) -> Option<String> {
            self.0.clone()
        }
    }

    struct FixedGraph(Option<String>);

    impl CallGraph for FixedGraph {
        fn entry_point_for(&self, _function: &str) -> Option<String> {
            self.0.clone()
        }
    }

    fn stmt(cond: Expr, stmts: Vec<Stmt>) -> IfStmt {
        IfStmt {
            cond,
            then_block: Block { stmts },
            location: SourceLocation::new("test.c", 10, 2),
        }
    }

    #[test]
    fn captures_full_context() {
        let registry = CheckRegistry::default();
        let s = stmt(
            Expr::call("capable", vec![Expr::other("CAP_SYS_ADMIN")]),
            vec![Stmt::Return],
        );
        let record = capture(
            &registry,
            &s,
            &FixedDecls(Some("do_thing".into())),
            &FixedGraph(Some("sys_thing".into())),
        )
        .unwrap();
        assert_eq!(record.function_name, "do_thing");
        assert_eq!(record.entry_point, "sys_thing");
        assert!(record.followed_by_return);
        assert!(record.tree.is_some());
    }

    #[test]
    fn missing_function_is_an_error() {
        let registry = CheckRegistry::default();
        let s = stmt(Expr::other("x"), vec![]);
        let err = capture(
            &registry,
            &s,
            &FixedDecls(None),
            &FixedGraph(None),
        )
        .unwrap_err();
        assert!(matches!(err, ContextError::NoEnclosingFunction { .. }));
    }

    #[test]
    fn unreachable_entry_point_is_empty_not_error() {
        let registry = CheckRegistry::default();
        let s = stmt(
            Expr::call("capable", vec![Expr::other("CAP_CHOWN")]),
            vec![Stmt::Other],
        );
        let record = capture(
            &registry,
            &s,
            &FixedDecls(Some("helper".into())),
            &FixedGraph(None),
        )
        .unwrap();
        assert_eq!(record.entry_point, "");
        assert!(!record.followed_by_return);
    }

    #[test]
    fn check_free_condition_gets_no_check_marker() {
        let registry = CheckRegistry::default();
        let s = stmt(Expr::other("x"), vec![Stmt::Return]);
        let record = capture(
            &registry,
            &s,
            &FixedDecls(Some("f".into())),
            &FixedGraph(None),
        )
        .unwrap();
        assert_eq!(record.tree, None);
    }
}
