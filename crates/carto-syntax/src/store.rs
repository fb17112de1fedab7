//! Concurrent source store: the authoritative file map for a project.
//!
//! Many snapshot readers may run concurrently; file writes are
//! exclusive with each other and with snapshotting. Re-rooting a
//! project is not a store operation at all: the owner simply swaps
//! its handle for a fresh store, and snapshots taken from the old one
//! stay valid because stores are never mutated after being superseded.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::RwLock;

use carto_core::CartoError;

use crate::snapshot::ProjectSnapshot;

/// The mutable file set for one project root.
#[derive(Debug)]
pub struct SourceStore {
    root: PathBuf,
    files: RwLock<BTreeMap<String, String>>,
}

impl SourceStore {
    /// A fresh, empty store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            files: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Insert or overwrite one file.
    ///
    /// `path` may be absolute (it must then sit inside the root) or
    /// root-relative; either way it is stored under its slash-separated
    /// relative form. Paths that cannot be expressed inside the root
    /// (`..` escapes, other volumes) are rejected and the store is left
    /// unchanged.
    pub fn put_file(&self, path: impl AsRef<Path>, content: impl Into<String>) -> Result<(), CartoError> {
        let path = path.as_ref();
        let rel = relativize(&self.root, path).ok_or_else(|| CartoError::InvalidPath {
            path: path.display().to_string(),
        })?;

        self.files.write().unwrap().insert(rel, content.into());
        Ok(())
    }

    /// Parse every stored file into an immutable snapshot.
    ///
    /// The read lock is held for the whole parse, so a snapshot can
    /// never observe a half-written file. Any parse failure aborts the
    /// snapshot; see [`ProjectSnapshot::parse`].
    pub fn snapshot(&self) -> Result<ProjectSnapshot, CartoError> {
        let files = self.files.read().unwrap();
        ProjectSnapshot::parse(files.iter().map(|(p, c)| (p.as_str(), c.as_str())))
    }

    pub fn file_count(&self) -> usize {
        self.files.read().unwrap().len()
    }
}

/// Lexically express `path` relative to `root`, slash-separated.
/// Returns `None` when the path does not sit inside the root.
fn relativize(root: &Path, path: &Path) -> Option<String> {
    let root_parts = components_of(root)?;
    let full = if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    };
    let full_parts = components_of(&full)?;

    if full_parts.len() <= root_parts.len() || full_parts[..root_parts.len()] != root_parts[..] {
        return None;
    }
    Some(full_parts[root_parts.len()..].join("/"))
}

/// Normalized component list of a path: `.` dropped, `..` applied.
/// Returns `None` when `..` would climb past the start of the path.
fn components_of(path: &Path) -> Option<Vec<String>> {
    let mut out: Vec<String> = Vec::new();
    for comp in path.components() {
        match comp {
            Component::Prefix(p) => out.push(p.as_os_str().to_string_lossy().into_owned()),
            Component::RootDir | Component::CurDir => {}
            Component::ParentDir => {
                out.pop()?;
            }
            Component::Normal(c) => out.push(c.to_string_lossy().into_owned()),
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn accepts_absolute_paths_under_the_root() {
        let store = SourceStore::new("/proj");
        store.put_file("/proj/pkg/a.go", "package pkg\n").unwrap();
        assert_eq!(store.file_count(), 1);

        let snap = store.snapshot().unwrap();
        assert_eq!(snap.trees()[0].path, "pkg/a.go");
    }

    #[test]
    fn accepts_relative_paths_and_normalizes_them() {
        let store = SourceStore::new("/proj");
        store.put_file("pkg/./sub/../a.go", "package pkg\n").unwrap();

        let snap = store.snapshot().unwrap();
        assert_eq!(snap.trees()[0].path, "pkg/a.go");
    }

    #[test]
    fn rejects_paths_escaping_the_root() {
        let store = SourceStore::new("/proj");

        for bad in ["/other/a.go", "../a.go", "/proj/../elsewhere/a.go"] {
            let err = store.put_file(bad, "package main\n").unwrap_err();
            assert!(matches!(err, CartoError::InvalidPath { .. }), "{bad}");
        }
        // Rejected writes leave the store untouched.
        assert_eq!(store.file_count(), 0);
    }

    #[test]
    fn overwrites_replace_file_content() {
        let store = SourceStore::new("/proj");
        store.put_file("a.go", "package main\n").unwrap();
        store
            .put_file("a.go", "package main\n\nfunc f() {}\n")
            .unwrap();

        assert_eq!(store.file_count(), 1);
        let snap = store.snapshot().unwrap();
        assert!(snap.trees()[0].source.contains("func f"));
    }

    #[test]
    fn snapshot_sees_all_completed_concurrent_writes() {
        let store = Arc::new(SourceStore::new("/proj"));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    let content = format!("package main\n\nfunc f{i}() {{}}\n");
                    store.put_file(format!("f{i}.go"), content).unwrap();
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let snap = store.snapshot().unwrap();
        assert_eq!(snap.trees().len(), 8);
        for i in 0..8 {
            let tree = snap.file(&format!("f{i}.go")).unwrap();
            // Each file's text must be exactly one writer's output,
            // never interleaved.
            assert_eq!(tree.source, format!("package main\n\nfunc f{i}() {{}}\n"));
        }
    }

    #[test]
    fn old_store_snapshots_survive_replacement() {
        let old = Arc::new(SourceStore::new("/proj"));
        old.put_file("a.go", "package main\n").unwrap();
        let snap = old.snapshot().unwrap();

        // The owner swapping in a new store does not disturb the old
        // snapshot or the old store.
        let _fresh = SourceStore::new("/proj2");
        assert_eq!(snap.trees().len(), 1);
        assert_eq!(old.file_count(), 1);
    }
}
