//! Semantic-analysis summary types.
//!
//! A semantic analyzer (type checking, dataflow, data-access
//! classification) runs upstream of carto and reports what it found as
//! plain data keyed by global snapshot offsets. carto resolves those
//! offsets to concrete syntax nodes and passes the rest of each record
//! through untouched.

use crate::report::QueryKind;

/// Everything the semantic analyzer reported for one snapshot.
#[derive(Debug, Clone, Default)]
pub struct ProgramSummary {
    pub functions: Vec<FunctionSummary>,
}

/// One analyzed function: a stable identity, a display name, the
/// global offset of its declaration, and the call/query sites found
/// in its body.
#[derive(Debug, Clone)]
pub struct FunctionSummary {
    pub id: String,
    pub name: String,
    pub offset: usize,
    pub calls: Vec<CallSite>,
    pub queries: Vec<QuerySite>,
}

/// A call site: the callee's identity and the call's global offset
/// (the invocation marker, or the `go`/`defer` keyword for spawned
/// and deferred calls).
#[derive(Debug, Clone)]
pub struct CallSite {
    pub function_id: String,
    pub offset: usize,
    pub in_loop: bool,
}

/// A data-access site: target table, operation kind, the raw textual
/// fragment, and the expression's global offset.
#[derive(Debug, Clone)]
pub struct QuerySite {
    pub table: String,
    pub kind: QueryKind,
    pub raw: String,
    pub offset: usize,
    pub in_loop: bool,
}
