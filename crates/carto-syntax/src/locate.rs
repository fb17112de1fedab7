//! Source position resolution engine.
//!
//! Maps a worklist of abstract locations (global byte offsets tagged
//! with a target category) to the concrete syntax nodes they designate
//! in one snapshot. A single pruning depth-first walk serves all three
//! categories; only the per-node match rule differs.
//!
//! The walk keeps its cost near-linear in tree size: at every node two
//! binary searches narrow the sorted offset list to the contiguous
//! subrange that can possibly fall inside the node, and a subtree whose
//! subrange is empty is skipped outright. Children are searched against
//! the parent's narrowed subrange only, giving `O(P log L)` work for
//! `P` nodes and `L` locations instead of the naive `O(P·L)`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tree_sitter::Node;

use crate::snapshot::ProjectSnapshot;

/// The node category a location is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TargetKind {
    /// A call expression, identified by its invocation marker: the
    /// opening parenthesis of the argument list, or the `go`/`defer`
    /// keyword of a spawned or deferred call.
    CallSite,
    /// Any expression containing the offset; the innermost wins.
    Expression,
    /// The innermost enclosing function declaration, method
    /// declaration, or function literal.
    FunctionBoundary,
}

/// An abstract source location to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub offset: usize,
    pub target: TargetKind,
}

/// A resolved node's global `[start, end)` byte range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// Resolution output, one map per category, keyed by location offset.
///
/// An absent entry means the location matched no node of its category.
/// That is a documented outcome rather than an error: callers fall
/// back to the location's own point position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub calls: BTreeMap<usize, Span>,
    pub expressions: BTreeMap<usize, Span>,
    pub functions: BTreeMap<usize, Span>,
}

impl Resolution {
    /// Look up one location's resolved span, if it matched.
    pub fn get(&self, location: Location) -> Option<Span> {
        match location.target {
            TargetKind::CallSite => self.calls.get(&location.offset).copied(),
            TargetKind::Expression => self.expressions.get(&location.offset).copied(),
            TargetKind::FunctionBoundary => self.functions.get(&location.offset).copied(),
        }
    }
}

/// Resolve a worklist against one snapshot.
///
/// Pure and synchronous: the snapshot is immutable and no state is
/// shared across files, so resolving the same worklist twice yields
/// identical results.
pub fn resolve(snapshot: &ProjectSnapshot, worklist: &[Location]) -> Resolution {
    let calls = sorted_offsets(worklist, TargetKind::CallSite);
    let expressions = sorted_offsets(worklist, TargetKind::Expression);
    let functions = sorted_offsets(worklist, TargetKind::FunctionBoundary);

    let mut resolution = Resolution::default();
    for tree in snapshot.trees() {
        // The root visit narrows each list to this file's own range,
        // so files that own none of the offsets are skipped in one
        // pair of binary searches.
        if !calls.is_empty() {
            walk(tree.root(), tree.base, &calls, TargetKind::CallSite, &mut resolution.calls);
        }
        if !expressions.is_empty() {
            walk(
                tree.root(),
                tree.base,
                &expressions,
                TargetKind::Expression,
                &mut resolution.expressions,
            );
        }
        if !functions.is_empty() {
            walk(
                tree.root(),
                tree.base,
                &functions,
                TargetKind::FunctionBoundary,
                &mut resolution.functions,
            );
        }
    }
    resolution
}

fn sorted_offsets(worklist: &[Location], target: TargetKind) -> Vec<usize> {
    let mut offsets: Vec<usize> = worklist
        .iter()
        .filter(|l| l.target == target)
        .map(|l| l.offset)
        .collect();
    offsets.sort_unstable();
    offsets.dedup();
    offsets
}

/// Depth-first walk over one file's tree. `offsets` is the sorted
/// subrange inherited from the parent; it is narrowed again at every
/// node and an empty subrange prunes the whole subtree.
fn walk(
    node: Node<'_>,
    base: usize,
    offsets: &[usize],
    target: TargetKind,
    hits: &mut BTreeMap<usize, Span>,
) {
    let start = base + node.start_byte();
    let end = base + node.end_byte();

    let lo = offsets.partition_point(|&o| o < start);
    let hi = offsets.partition_point(|&o| o < end);
    if lo == hi {
        return;
    }
    let in_range = &offsets[lo..hi];

    record_matches(target, node, base, in_range, hits);

    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        walk(child, base, in_range, target, hits);
    }
}

/// Apply one category's match rule at one node. `in_range` holds the
/// offsets already known to fall inside the node's span, sorted.
///
/// Expression and function-boundary matches record every contained
/// offset and deeper visits overwrite shallower ones, so the innermost
/// matching node wins for each offset.
fn record_matches(
    target: TargetKind,
    node: Node<'_>,
    base: usize,
    in_range: &[usize],
    hits: &mut BTreeMap<usize, Span>,
) {
    let span = Span {
        start: base + node.start_byte(),
        end: base + node.end_byte(),
    };

    match target {
        TargetKind::CallSite => match node.kind() {
            "call_expression" => {
                // Only the invocation marker designates the call; an
                // offset elsewhere inside the span belongs to the
                // callee or an argument, not the call itself.
                if let Some(args) = node.child_by_field_name("arguments") {
                    let marker = base + args.start_byte();
                    if in_range.binary_search(&marker).is_ok() {
                        hits.insert(marker, span);
                    }
                }
            }
            "go_statement" | "defer_statement" => {
                // The keyword position stands for the spawned or
                // deferred call; resolve to the inner call expression.
                if in_range.binary_search(&span.start).is_ok() {
                    let mut cursor = node.walk();
                    let call = node
                        .named_children(&mut cursor)
                        .find(|c| c.kind() == "call_expression");
                    if let Some(call) = call {
                        hits.insert(
                            span.start,
                            Span {
                                start: base + call.start_byte(),
                                end: base + call.end_byte(),
                            },
                        );
                    }
                }
            }
            _ => {}
        },
        TargetKind::Expression => {
            if EXPRESSION_KINDS.contains(&node.kind()) {
                for &offset in in_range {
                    hits.insert(offset, span);
                }
            }
        }
        TargetKind::FunctionBoundary => {
            if matches!(
                node.kind(),
                "function_declaration" | "method_declaration" | "func_literal"
            ) {
                for &offset in in_range {
                    hits.insert(offset, span);
                }
            }
        }
    }
}

/// tree-sitter-go node kinds that correspond to Go expressions. Go's
/// expression grammar also covers type expressions (`map[string]int`,
/// `struct{...}`, `chan T`) and the keyed elements of composite
/// literals, so those kinds count too.
const EXPRESSION_KINDS: &[&str] = &[
    "identifier",
    "type_identifier",
    "field_identifier",
    "package_identifier",
    "selector_expression",
    "call_expression",
    "index_expression",
    "slice_expression",
    "type_assertion_expression",
    "type_conversion_expression",
    "composite_literal",
    "keyed_element",
    "func_literal",
    "binary_expression",
    "unary_expression",
    "parenthesized_expression",
    "int_literal",
    "float_literal",
    "imaginary_literal",
    "rune_literal",
    "interpreted_string_literal",
    "raw_string_literal",
    "true",
    "false",
    "nil",
    "iota",
    "array_type",
    "slice_type",
    "struct_type",
    "pointer_type",
    "func_type",
    "interface_type",
    "map_type",
    "channel_type",
    "qualified_type",
    "generic_type",
];
