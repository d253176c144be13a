//! In-memory mock filesystem for testing the sampler without real `/proc`.
//!
//! Contents are raw bytes so tests can feed arbitrary, non-UTF-8 kernel
//! blocks through the relay. Maps are ordered to keep directory listings
//! (and therefore log output) deterministic.

use crate::collector::traits::FileSystem;
use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};

/// In-memory filesystem for testing.
#[derive(Debug, Clone, Default)]
pub struct MockFs {
    /// Map from path to file contents.
    files: BTreeMap<PathBuf, Vec<u8>>,
    /// Set of directories (for read_dir support).
    directories: BTreeSet<PathBuf>,
}

impl MockFs {
    /// Creates a new empty mock filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file with the given content, replacing any previous content.
    ///
    /// Parent directories are automatically created.
    pub fn add_file(&mut self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = path.as_ref().to_path_buf();
        self.add_parents(&path);
        self.files.insert(path, content.into());
    }

    /// Adds an empty directory.
    pub fn add_dir(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        self.add_parents(&path);
        self.directories.insert(path);
    }

    fn add_parents(&mut self, path: &Path) {
        let mut parent = path.parent();
        while let Some(p) = parent {
            if !p.as_os_str().is_empty() {
                self.directories.insert(p.to_path_buf());
            }
            parent = p.parent();
        }
    }

    /// Adds a process with a `/proc/[pid]/stat` line.
    ///
    /// # Arguments
    /// * `pid` - Process ID
    /// * `comm` - Command name, rendered in parentheses like the kernel does
    /// * `state` - Single-letter scheduler state
    pub fn add_process(&mut self, pid: u32, comm: &str, state: char) {
        let stat = format!(
            "{pid} ({comm}) {state} 1 {pid} {pid} 0 -1 4194560 120 0 0 0 3 7 0 0 20 0 1 0 42 2273280 160 18446744073709551615 1 1 0 0 0 0 0 0 0 0 0 0 17 0 0 0 0 0 0\n"
        );
        self.add_file(format!("/proc/{pid}/stat"), stat);
    }

    /// Removes a process directory and everything below it.
    ///
    /// Simulates a process exiting between two sampling iterations.
    pub fn remove_process(&mut self, pid: u32) {
        let base = PathBuf::from(format!("/proc/{pid}"));
        self.files.retain(|path, _| !path.starts_with(&base));
        self.directories.retain(|path| !path.starts_with(&base));
    }

    /// Removes a single file, leaving its directory in place.
    pub fn remove_file(&mut self, path: impl AsRef<Path>) {
        self.files.remove(path.as_ref());
    }
}

impl FileSystem for MockFs {
    type File = Cursor<Vec<u8>>;

    fn open(&self, path: &Path) -> io::Result<Cursor<Vec<u8>>> {
        self.files
            .get(path)
            .map(|content| Cursor::new(content.clone()))
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("file not found: {:?}", path),
                )
            })
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        if !self.directories.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("directory not found: {:?}", path),
            ));
        }

        let mut entries = BTreeSet::new();

        // Direct children only
        for file_path in self.files.keys() {
            if file_path.parent().is_some_and(|parent| parent == path) {
                entries.insert(file_path.clone());
            }
        }

        for dir_path in &self.directories {
            if dir_path.parent().is_some_and(|parent| parent == path) && dir_path != path {
                entries.insert(dir_path.clone());
            }
        }

        Ok(entries.into_iter().collect())
    }
}
