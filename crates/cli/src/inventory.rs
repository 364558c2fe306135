//! Builds the file inventory a survey runs against.
//!
//! Walks the project directory with gitignore support, prunes the usual
//! dependency and build directories, and records every surviving file
//! with its size. Only paths and sizes are collected; file contents are
//! never read.

use std::path::Path;

use ignore::WalkBuilder;
use surveyor_core::{FileInventory, FileMeta};
use tracing::debug;

/// Directories never worth surveying, pruned even without a .gitignore.
const EXCLUDED_DIRS: &[&str] = &[
    "node_modules",
    "target",
    "dist",
    "build",
    "coverage",
    "venv",
    ".venv",
    "env",
    "site-packages",
    "__pycache__",
    ".git",
    ".idea",
    ".next",
    ".pytest_cache",
    ".mypy_cache",
];

const EXCLUDED_FILES: &[&str] = &[
    "package-lock.json",
    "pnpm-lock.yaml",
    ".DS_Store",
    ".env",
    ".env.local",
    ".gitignore",
    ".gitattributes",
    ".gitmodules",
];

const EXCLUDED_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "ico", "svg", "mp4", "mp3", "pdf", "zip", "woff", "woff2", "ttf",
    "eot", "pyc", "pyo", "pyd", "so", "dll", "exe", "wasm", "pkl", "pickle", "db", "sqlite", "log",
    "cache", "lock", "bin",
];

const DEFAULT_MAX_FILE_SIZE: u64 = 1024 * 1024; // 1MB
const DEFAULT_MAX_DEPTH: usize = 10;

pub struct InventoryScanner {
    max_file_size: u64,
    max_depth: usize,
}

impl InventoryScanner {
    pub fn new() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_file_size(mut self, size: u64) -> Self {
        self.max_file_size = size;
        self
    }

    /// Scan `root` and return the inventory with root-relative paths.
    pub fn scan(&self, root: &Path) -> std::io::Result<FileInventory> {
        if !root.is_dir() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} is not a directory", root.display()),
            ));
        }

        let mut inventory = FileInventory::new();

        let walker = WalkBuilder::new(root)
            .hidden(false)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .require_git(false)
            .max_depth(Some(self.max_depth))
            .filter_entry(|entry| {
                // The root itself is exempt from name-based pruning.
                if entry.depth() == 0 {
                    return true;
                }
                let is_dir = entry.file_type().map_or(false, |t| t.is_dir());
                let name = entry.file_name().to_string_lossy();
                !(is_dir && EXCLUDED_DIRS.contains(&name.as_ref()))
            })
            .build();

        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    debug!("Error walking directory: {}", e);
                    continue;
                }
            };

            let path = entry.path();

            if !path.is_file() {
                continue;
            }

            if !should_include(path) {
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(m) => m,
                Err(e) => {
                    debug!("Skipping {}: {}", path.display(), e);
                    continue;
                }
            };

            if metadata.len() > self.max_file_size {
                debug!(
                    "Skipping {}: exceeds {} byte limit",
                    path.display(),
                    self.max_file_size
                );
                continue;
            }

            let relative = path
                .strip_prefix(root)
                .unwrap_or(path)
                .to_string_lossy()
                .to_string();

            inventory.insert(
                relative,
                FileMeta {
                    size: metadata.len(),
                },
            );
        }

        Ok(inventory)
    }
}

impl Default for InventoryScanner {
    fn default() -> Self {
        Self::new()
    }
}

fn should_include(path: &Path) -> bool {
    if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
        if EXCLUDED_FILES.contains(&name) {
            return false;
        }
    }

    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    !EXCLUDED_EXTENSIONS.contains(&ext.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_should_include() {
        assert!(should_include(Path::new("src/lib.rs")));
        assert!(should_include(Path::new("README.md")));
        assert!(should_include(Path::new("Cargo.toml")));
        assert!(!should_include(Path::new("logo.png")));
        assert!(!should_include(Path::new("app.exe")));
        assert!(!should_include(Path::new("Cargo.lock")));
        assert!(!should_include(Path::new(".DS_Store")));
    }

    #[test]
    fn test_scan_records_relative_paths_and_sizes() {
        let dir = tempdir().unwrap();
        let src_dir = dir.path().join("src");
        fs::create_dir(&src_dir).unwrap();

        fs::write(src_dir.join("main.rs"), "fn main() {}").unwrap();
        fs::write(dir.path().join("Cargo.toml"), "[package]").unwrap();

        let inventory = InventoryScanner::new().scan(dir.path()).unwrap();

        assert_eq!(inventory.len(), 2);
        assert!(inventory.contains("src/main.rs"));
        assert_eq!(inventory.get("src/main.rs").unwrap().size, 12);
        assert!(inventory.contains("Cargo.toml"));
    }

    #[test]
    fn test_excluded_dirs_pruned_without_gitignore() {
        let dir = tempdir().unwrap();
        let node_modules = dir.path().join("node_modules");
        fs::create_dir(&node_modules).unwrap();
        fs::write(node_modules.join("index.js"), "module.exports = {}").unwrap();

        let target = dir.path().join("target").join("debug");
        fs::create_dir_all(&target).unwrap();
        fs::write(target.join("build.rs"), "fn main() {}").unwrap();

        fs::write(dir.path().join("app.js"), "console.log('hi')").unwrap();

        let inventory = InventoryScanner::new().scan(dir.path()).unwrap();

        assert_eq!(inventory.len(), 1);
        assert!(inventory.contains("app.js"));
    }

    #[test]
    fn test_excluded_files_and_extensions_skipped() {
        let dir = tempdir().unwrap();

        fs::write(dir.path().join("main.rs"), "fn main() {}").unwrap();
        fs::write(dir.path().join("logo.png"), [0u8; 64]).unwrap();
        fs::write(dir.path().join("debug.log"), "noise").unwrap();
        fs::write(dir.path().join("package-lock.json"), "{}").unwrap();

        let inventory = InventoryScanner::new().scan(dir.path()).unwrap();

        assert_eq!(inventory.len(), 1);
        assert!(inventory.contains("main.rs"));
    }

    #[test]
    fn test_gitignore_respected() {
        let dir = tempdir().unwrap();

        fs::write(dir.path().join(".gitignore"), "generated/\n*.snap\n").unwrap();

        let generated = dir.path().join("generated");
        fs::create_dir(&generated).unwrap();
        fs::write(generated.join("schema.rs"), "pub struct Schema;").unwrap();

        fs::write(dir.path().join("render.snap"), "snapshot").unwrap();
        fs::write(dir.path().join("app.rs"), "fn main() {}").unwrap();

        let inventory = InventoryScanner::new().scan(dir.path()).unwrap();

        assert_eq!(inventory.len(), 1);
        assert!(inventory.contains("app.rs"));
    }

    #[test]
    fn test_oversized_files_skipped() {
        let dir = tempdir().unwrap();

        fs::write(dir.path().join("big.rs"), "x".repeat(100)).unwrap();
        fs::write(dir.path().join("small.rs"), "fn f() {}").unwrap();

        let inventory = InventoryScanner::new()
            .with_max_file_size(16)
            .scan(dir.path())
            .unwrap();

        assert_eq!(inventory.len(), 1);
        assert!(inventory.contains("small.rs"));
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");

        let result = InventoryScanner::new().scan(&missing);

        assert!(result.is_err());
    }
}
