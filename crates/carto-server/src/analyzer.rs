//! The semantic-analyzer collaborator seam.
//!
//! Deciding which locations are interesting (call sites, data-access
//! expressions, function boundaries) and what they mean (callee
//! identity, operation kind, loop membership) is upstream work: type
//! checking, whole-program construction, and classification live
//! outside this repository. The server only needs something that can
//! turn a snapshot into a [`ProgramSummary`] keyed by global offsets.

use carto_core::{CartoError, ProgramSummary};
use carto_syntax::{Location, ProjectSnapshot, TargetKind};

/// Produces the semantic summary for one snapshot.
pub trait SemanticAnalyzer: Send + Sync {
    fn analyze(&self, snapshot: &ProjectSnapshot) -> Result<ProgramSummary, CartoError>;
}

/// Analyzer used when no collaborator is wired in: reports an empty
/// program. The server still parses, so `crud` surfaces parse errors
/// even without semantic analysis.
pub struct NullAnalyzer;

impl SemanticAnalyzer for NullAnalyzer {
    fn analyze(&self, _snapshot: &ProjectSnapshot) -> Result<ProgramSummary, CartoError> {
        Ok(ProgramSummary::default())
    }
}

/// Build the resolution worklist from an analyzer's summary: one
/// function-boundary location per function, one call-site location per
/// call, one expression location per query.
pub fn worklist_of(summary: &ProgramSummary) -> Vec<Location> {
    let mut worklist = Vec::new();
    for function in &summary.functions {
        worklist.push(Location {
            offset: function.offset,
            target: TargetKind::FunctionBoundary,
        });
        for call in &function.calls {
            worklist.push(Location {
                offset: call.offset,
                target: TargetKind::CallSite,
            });
        }
        for query in &function.queries {
            worklist.push(Location {
                offset: query.offset,
                target: TargetKind::Expression,
            });
        }
    }
    worklist
}

#[cfg(test)]
mod tests {
    use super::*;
    use carto_core::{CallSite, FunctionSummary, QueryKind, QuerySite};

    #[test]
    fn worklist_covers_every_summary_site() {
        let summary = ProgramSummary {
            functions: vec![FunctionSummary {
                id: "main.f".to_string(),
                name: "f".to_string(),
                offset: 10,
                calls: vec![CallSite {
                    function_id: "main.g".to_string(),
                    offset: 20,
                    in_loop: false,
                }],
                queries: vec![QuerySite {
                    table: "users".to_string(),
                    kind: QueryKind::Select,
                    raw: "SELECT 1".to_string(),
                    offset: 30,
                    in_loop: true,
                }],
            }],
        };

        let worklist = worklist_of(&summary);
        assert_eq!(worklist.len(), 3);
        assert!(worklist.contains(&Location { offset: 10, target: TargetKind::FunctionBoundary }));
        assert!(worklist.contains(&Location { offset: 20, target: TargetKind::CallSite }));
        assert!(worklist.contains(&Location { offset: 30, target: TargetKind::Expression }));
    }
}
