//! Abstractions for filesystem access to enable testing and mocking.
//!
//! The `FileSystem` trait lets the sampler read the real `/proc` on Linux
//! and an in-memory tree in tests.

use std::fs::File;
use std::io::{self, Read, Seek};
use std::path::{Path, PathBuf};

/// Abstraction for the read-only side of the sampler.
///
/// Handles must be seekable: cached kernel sources are rewound to offset 0
/// before every read.
pub trait FileSystem {
    /// Handle type returned by `open`.
    type File: Read + Seek;

    /// Opens a file for reading.
    ///
    /// # Arguments
    /// * `path` - Path to the file to open
    fn open(&self, path: &Path) -> io::Result<Self::File>;

    /// Lists entries in a directory.
    ///
    /// # Returns
    /// Full paths of the directory entries, in whatever order the
    /// implementation yields them.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;
}

/// Real filesystem implementation that delegates to `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFs;

impl RealFs {
    /// Creates a new `RealFs` instance.
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for RealFs {
    type File = File;

    fn open(&self, path: &Path) -> io::Result<File> {
        File::open(path)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let entries = std::fs::read_dir(path)?;
        let mut paths = Vec::new();
        for entry in entries {
            paths.push(entry?.path());
        }
        Ok(paths)
    }
}
