//! Syntax model for the analyzed C subset.
//!
//! The analysis never mutates these values; they are built once per file by
//! the extractor and borrowed read-only by every downstream pass.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Location in source code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    pub file: PathBuf,
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(file: impl Into<PathBuf>, line: usize, column: usize) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file.display(), self.line, self.column)
    }
}

/// A condition expression, reduced to the four shapes the analysis
/// distinguishes. Everything else (identifiers, literals, member access,
/// casts) collapses into `Other` with its raw text preserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Call {
        callee: String,
        args: Vec<Expr>,
    },
    Binary {
        op: String,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Unary {
        op: String,
        operand: Box<Expr>,
    },
    Other(String),
}

impl Expr {
    pub fn call(callee: impl Into<String>, args: Vec<Expr>) -> Self {
        Self::Call {
            callee: callee.into(),
            args,
        }
    }

    pub fn binary(op: impl Into<String>, lhs: Expr, rhs: Expr) -> Self {
        Self::Binary {
            op: op.into(),
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn unary(op: impl Into<String>, operand: Expr) -> Self {
        Self::Unary {
            op: op.into(),
            operand: Box::new(operand),
        }
    }

    pub fn other(text: impl Into<String>) -> Self {
        Self::Other(text.into())
    }
}

/// A statement in a guarded block, classified only as far as the analysis
/// needs: either it is a `return`, or it is something else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stmt {
    Return,
    Other,
}

/// The block guarded by an `if` condition's true branch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Block {
    pub stmts: Vec<Stmt>,
}

impl Block {
    /// Whether the last effective statement of the block is a `return`.
    /// Purely structural; return values are not inspected.
    pub fn ends_in_return(&self) -> bool {
        matches!(self.stmts.last(), Some(Stmt::Return))
    }
}

/// An `if` statement with its parsed condition and guarded block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IfStmt {
    pub cond: Expr,
    pub then_block: Block,
    pub location: SourceLocation,
}

/// A function definition with the statements and callees the analysis uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDef {
    pub name: String,
    /// `if` statements found at any nesting depth inside the body.
    pub ifs: Vec<IfStmt>,
    /// Names of functions called anywhere in the body, deduplicated.
    pub calls: Vec<String>,
    /// Declared via `SYSCALL_DEFINEn(...)` or named `sys_*`.
    pub is_entry_point: bool,
    pub location: SourceLocation,
}

/// One parsed source file.
#[derive(Debug, Clone, Default)]
pub struct ParsedFile {
    pub path: PathBuf,
    pub functions: Vec<FunctionDef>,
}
