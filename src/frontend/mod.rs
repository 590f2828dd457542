//! Source frontend: the syntax model consumed by the analysis and the
//! extractor that builds it from C sources.
//!
//! The analysis layer only depends on [`ast`]; alternative frontends (a real
//! compiler plugin, a test harness) can construct those values directly.

pub mod ast;
pub mod expr_parser;
pub mod source;

pub use ast::{Block, Expr, FunctionDef, IfStmt, ParsedFile, SourceLocation, Stmt};
pub use expr_parser::parse_condition;
pub use source::parse_source;
