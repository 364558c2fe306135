use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Metadata recorded for one file in the scanned project tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMeta {
    pub size: u64,
}

/// Snapshot of the project's file paths and metadata.
///
/// Built once by the scanner, then treated as immutable for the rest of the
/// run. Backed by a `BTreeMap` so iteration order is deterministic and plans
/// validated against it are reproducible.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileInventory {
    files: BTreeMap<String, FileMeta>,
}

impl FileInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: impl IntoIterator<Item = (String, FileMeta)>) -> Self {
        Self {
            files: entries.into_iter().collect(),
        }
    }

    pub fn insert(&mut self, path: impl Into<String>, meta: FileMeta) {
        self.files.insert(path.into(), meta);
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    pub fn get(&self, path: &str) -> Option<&FileMeta> {
        self.files.get(path)
    }

    /// Paths in sorted order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn total_size(&self) -> u64 {
        self.files.values().map(|meta| meta.size).sum()
    }
}
