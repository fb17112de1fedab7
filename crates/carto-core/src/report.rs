//! Wire-format report types for structural queries.
//!
//! These are the JSON shapes returned by the `crud` method: functions
//! grouped with their outgoing calls and data-access queries, each
//! carrying a resolved source range.

use serde::{Deserialize, Serialize};

/// A position in a source file. Line and column are 1-based; column
/// counts bytes from the start of the line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

/// A half-open source range `[start, end)` within one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub file: String,
    pub start: Position,
    pub end: Position,
}

impl Range {
    /// Degenerate single-point range: one column wide on one line.
    /// Used as the fallback when a location could not be resolved to
    /// a concrete syntax node.
    pub fn point(file: impl Into<String>, at: Position) -> Self {
        Self {
            file: file.into(),
            start: at,
            end: Position {
                line: at.line,
                column: at.column + 1,
            },
        }
    }
}

/// The full structural report for a project snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrudReport {
    pub functions: Vec<Function>,
    pub tables: Vec<Table>,
}

/// One function with its resolved declaration range, outgoing calls,
/// and data-access queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Function {
    pub id: String,
    pub position: Range,
    pub name: String,
    pub calls: Vec<Call>,
    pub queries: Vec<Query>,
}

/// A table referenced by at least one query in the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    pub id: String,
    pub name: String,
}

/// A call site inside a function.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Call {
    pub function_id: String,
    pub position: Range,
    pub in_loop: bool,
}

/// A data-access operation inside a function.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    pub table_id: String,
    pub position: Range,
    #[serde(rename = "type")]
    pub kind: QueryKind,
    pub raw: String,
    pub in_loop: bool,
}

/// The kind of a data-access operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryKind {
    Unknown,
    Insert,
    Update,
    Delete,
    Select,
}

impl std::fmt::Display for QueryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            Self::Insert => write!(f, "insert"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
            Self::Select => write!(f, "select"),
        }
    }
}
