//! Result assembler: joins resolved ranges with semantic metadata.
//!
//! Every site the analyzer reported appears in the output. A site
//! whose location resolved to a node gets that node's range; one that
//! did not falls back to the location's own point position, so partial
//! resolution never blocks the report.

use std::collections::BTreeMap;

use carto_core::{Call, CrudReport, Function, ProgramSummary, Query, Range, Table};
use carto_syntax::{PositionTable, Resolution, Span};

/// Merge the analyzer's summary with the engine's resolution into the
/// final report.
pub fn assemble(
    summary: &ProgramSummary,
    resolution: &Resolution,
    table: &PositionTable,
) -> CrudReport {
    let mut tables: BTreeMap<String, Table> = BTreeMap::new();

    let functions = summary
        .functions
        .iter()
        .map(|f| {
            let calls = f
                .calls
                .iter()
                .map(|c| Call {
                    function_id: c.function_id.clone(),
                    position: range_or_point(resolution.calls.get(&c.offset).copied(), c.offset, table),
                    in_loop: c.in_loop,
                })
                .collect();

            let queries = f
                .queries
                .iter()
                .map(|q| {
                    tables.entry(q.table.clone()).or_insert_with(|| Table {
                        id: q.table.clone(),
                        name: q.table.clone(),
                    });
                    Query {
                        table_id: q.table.clone(),
                        position: range_or_point(
                            resolution.expressions.get(&q.offset).copied(),
                            q.offset,
                            table,
                        ),
                        kind: q.kind,
                        raw: q.raw.clone(),
                        in_loop: q.in_loop,
                    }
                })
                .collect();

            Function {
                id: f.id.clone(),
                position: range_or_point(
                    resolution.functions.get(&f.offset).copied(),
                    f.offset,
                    table,
                ),
                name: f.name.clone(),
                calls,
                queries,
            }
        })
        .collect();

    CrudReport {
        functions,
        tables: tables.into_values().collect(),
    }
}

fn range_or_point(span: Option<Span>, offset: usize, table: &PositionTable) -> Range {
    span.and_then(|s| table.range(s))
        .or_else(|| table.point_range(offset))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use carto_core::{CallSite, FunctionSummary, Position, QueryKind, QuerySite};
    use carto_syntax::ProjectSnapshot;

    fn summary_with_one_function(offset: usize, call: usize, query: usize) -> ProgramSummary {
        ProgramSummary {
            functions: vec![FunctionSummary {
                id: "main.f".to_string(),
                name: "f".to_string(),
                offset,
                calls: vec![CallSite {
                    function_id: "main.g".to_string(),
                    offset: call,
                    in_loop: true,
                }],
                queries: vec![QuerySite {
                    table: "users".to_string(),
                    kind: QueryKind::Select,
                    raw: "SELECT * FROM users".to_string(),
                    offset: query,
                    in_loop: false,
                }],
            }],
        }
    }

    #[test]
    fn resolved_sites_get_node_ranges_and_unresolved_get_points() {
        let src = "package main\n\nfunc f() {\n\tg()\n}\n";
        let snap = ProjectSnapshot::parse([("a.go", src)]).unwrap();

        let f_offset = src.find("func f").unwrap();
        let call_marker = src.find("g()").unwrap() + 1;
        // No expression node lives at the `func` keyword, so the query
        // location stays unresolved.
        let query_offset = f_offset;

        let summary = summary_with_one_function(f_offset, call_marker, query_offset);
        let worklist = crate::analyzer::worklist_of(&summary);
        let resolution = carto_syntax::resolve(&snap, &worklist);

        let report = assemble(&summary, &resolution, snap.table());
        let f = &report.functions[0];

        // The declaration resolved to its full span.
        assert_eq!(f.position.start, Position { line: 3, column: 1 });
        assert_eq!(f.position.end, Position { line: 5, column: 2 });

        // The call resolved to exactly `g()`.
        assert_eq!(f.calls[0].position.start, Position { line: 4, column: 2 });
        assert_eq!(f.calls[0].position.end, Position { line: 4, column: 5 });
        assert!(f.calls[0].in_loop);

        // The query fell back to its own single-point range.
        assert_eq!(
            f.queries[0].position,
            Range::point("a.go", Position { line: 3, column: 1 })
        );
        assert_eq!(f.queries[0].kind, QueryKind::Select);
    }

    #[test]
    fn tables_are_deduplicated_by_id() {
        let src = "package main\n\nfunc f() {}\n";
        let snap = ProjectSnapshot::parse([("a.go", src)]).unwrap();

        let mut summary = summary_with_one_function(0, 0, 0);
        // A second query against the same table.
        let extra = summary.functions[0].queries[0].clone();
        summary.functions[0].queries.push(extra);

        let report = assemble(&summary, &Resolution::default(), snap.table());
        assert_eq!(report.tables.len(), 1);
        assert_eq!(report.tables[0].id, "users");
        assert_eq!(report.tables[0].name, "users");
    }

    #[test]
    fn offsets_outside_every_file_yield_an_empty_range() {
        let src = "package main\n";
        let snap = ProjectSnapshot::parse([("a.go", src)]).unwrap();

        let summary = summary_with_one_function(10_000, 10_000, 10_000);
        let report = assemble(&summary, &Resolution::default(), snap.table());

        assert_eq!(report.functions[0].position, Range::default());
    }
}
