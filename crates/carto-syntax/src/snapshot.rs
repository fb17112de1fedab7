//! Parser adapter: stored file text into an immutable parsed forest.
//!
//! A snapshot is built once per query, is never mutated afterwards,
//! and stays valid even if the store it came from is replaced.

use carto_core::CartoError;

use crate::position::PositionTable;

/// One parsed file: its project-relative path, source text, assigned
/// global base offset, and Go syntax tree.
#[derive(Debug)]
pub struct SyntaxTree {
    pub path: String,
    pub source: String,
    pub base: usize,
    tree: tree_sitter::Tree,
}

impl SyntaxTree {
    /// The root node of the parsed tree.
    pub fn root(&self) -> tree_sitter::Node<'_> {
        self.tree.root_node()
    }
}

/// An immutable, consistent view of a whole project: every stored
/// file parsed, sharing one position table.
#[derive(Debug)]
pub struct ProjectSnapshot {
    trees: Vec<SyntaxTree>,
    table: PositionTable,
}

impl ProjectSnapshot {
    /// Parse a set of files into a snapshot.
    ///
    /// Files must arrive in ascending path order; base offsets are
    /// assigned in that order, which keeps global offsets deterministic
    /// across repeated snapshots of the same store contents.
    ///
    /// Any file that does not parse as valid Go aborts the whole
    /// snapshot with a `Parse` error naming the path. A partial
    /// snapshot is never returned.
    pub fn parse<'a, I>(files: I) -> Result<Self, CartoError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&tree_sitter_go::LANGUAGE.into())
            .map_err(|e| CartoError::Internal(e.to_string()))?;

        let mut table = PositionTable::new();
        let mut trees = Vec::new();

        for (path, source) in files {
            let tree = parser.parse(source, None).ok_or_else(|| CartoError::Parse {
                path: path.to_string(),
            })?;
            if tree.root_node().has_error() {
                return Err(CartoError::Parse {
                    path: path.to_string(),
                });
            }

            let base = table.add_file(path, source);
            trees.push(SyntaxTree {
                path: path.to_string(),
                source: source.to_string(),
                base,
                tree,
            });
        }

        tracing::debug!("parsed snapshot of {} files", trees.len());

        Ok(Self { trees, table })
    }

    /// All parsed files, in ascending path (and base offset) order.
    pub fn trees(&self) -> &[SyntaxTree] {
        &self.trees
    }

    /// Look up one file by its project-relative path.
    pub fn file(&self, path: &str) -> Option<&SyntaxTree> {
        self.trees.iter().find(|t| t.path == path)
    }

    /// The shared offset addressing table.
    pub fn table(&self) -> &PositionTable {
        &self.table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_multiple_files_with_disjoint_bases() {
        let a = "package main\n\nfunc f() {}\n";
        let b = "package main\n\nfunc g() {}\n";
        let snap = ProjectSnapshot::parse([("a.go", a), ("b.go", b)]).unwrap();

        assert_eq!(snap.trees().len(), 2);
        assert_eq!(snap.trees()[0].base, 0);
        assert_eq!(snap.trees()[1].base, a.len() + 1);
        assert_eq!(snap.file("b.go").unwrap().path, "b.go");
    }

    #[test]
    fn invalid_go_fails_the_whole_snapshot() {
        let err = ProjectSnapshot::parse([
            ("a.go", "package main\n"),
            ("broken.go", "func {{{\n"),
        ])
        .unwrap_err();

        match err {
            CartoError::Parse { path } => assert_eq!(path, "broken.go"),
            other => panic!("expected Parse error, got {other:?}"),
        }
    }

    #[test]
    fn repeated_parses_assign_identical_bases() {
        let files = [
            ("a.go", "package main\n\nfunc f() {}\n"),
            ("b.go", "package main\n"),
        ];
        let first = ProjectSnapshot::parse(files).unwrap();
        let second = ProjectSnapshot::parse(files).unwrap();

        for (x, y) in first.trees().iter().zip(second.trees()) {
            assert_eq!(x.base, y.base);
            assert_eq!(x.path, y.path);
        }
    }

    #[test]
    fn root_spans_the_whole_file() {
        let src = "package main\n\nfunc f() {}\n";
        let snap = ProjectSnapshot::parse([("a.go", src)]).unwrap();
        let root = snap.trees()[0].root();
        assert_eq!(root.start_byte(), 0);
        assert_eq!(root.end_byte(), src.len());
    }
}
