//! Destination log streams.

use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use super::SampleError;

/// Log of `/proc/stat` records.
pub const STAT_LOG: &str = "proc_stat.log";
/// Log of `/proc/diskstats` records.
pub const DISKSTATS_LOG: &str = "proc_diskstats.log";
/// Log of process-table records.
pub const PS_LOG: &str = "proc_ps.log";

const LOG_MODE: u32 = 0o755;

/// Creates (or truncates) an output file in the log directory.
pub(crate) fn create_output(path: &Path) -> Result<File, SampleError> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(LOG_MODE)
        .open(path)
        .map_err(|source| SampleError::Create {
            path: path.to_path_buf(),
            source,
        })
}

/// The three append-only logs, owned by the sampler for its whole life.
pub struct LogSet {
    pub(crate) stat: File,
    pub(crate) diskstats: File,
    pub(crate) ps: File,
}

impl LogSet {
    /// Creates all three logs in `dir`, truncating any previous run.
    ///
    /// The first file that cannot be created aborts; files created before it
    /// are left on disk.
    pub fn create(dir: &Path) -> Result<Self, SampleError> {
        let stat = create_output(&dir.join(STAT_LOG))?;
        let diskstats = create_output(&dir.join(DISKSTATS_LOG))?;
        let ps = create_output(&dir.join(PS_LOG))?;
        Ok(Self {
            stat,
            diskstats,
            ps,
        })
    }

    /// Paths of the logs in creation order.
    pub fn paths(dir: &Path) -> [PathBuf; 3] {
        [dir.join(STAT_LOG), dir.join(DISKSTATS_LOG), dir.join(PS_LOG)]
    }

    /// Flushes and closes the logs: process table first, then diskstats, then stat.
    pub fn close(self) -> io::Result<()> {
        let Self {
            stat,
            diskstats,
            ps,
        } = self;
        for file in [ps, diskstats, stat] {
            file.sync_all()?;
        }
        Ok(())
    }
}
