//! Process-table snapshot with boot-complete scan.
//!
//! One record per tick: `<uptime>\n<self stat><stat of every process>\n`.
//! Stat lines are relayed untouched and carry their own trailing newline,
//! so there is no extra separator between processes.

use std::ffi::OsStr;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::collector::marker::is_marker;
use crate::collector::relay::{StagingBuffer, relay_transient};
use crate::collector::traits::FileSystem;
use crate::collector::uptime::UptimeReading;
use crate::sampler::RunFlag;

/// Result of one pass over the process table.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanOutcome {
    /// Processes whose stat was relayed (the sampler's own line excluded).
    pub processes: usize,
    /// Stat file that tripped the detector, if any did in this pass.
    pub marker: Option<PathBuf>,
}

/// Coarse PID test on a `/proc` entry name: first byte in `'1'..='9'`.
///
/// Only the first byte is checked, so `"0"` is rejected while a name like
/// `"1abc"` would pass. Real `/proc` has no such entries; the filter is kept
/// as-is so logs stay comparable with the C sampler's.
pub fn is_pid_entry(name: &OsStr) -> bool {
    matches!(name.as_encoded_bytes().first(), Some(b'1'..=b'9'))
}

/// Writes one process-table record and scans it for the marker process.
///
/// Evaluation is latched on `run`: blocks are only checked while the flag is
/// still set, and the first match clears it. Processes after that are still
/// relayed. Processes that vanish between listing and open are skipped, and
/// a process whose stat fails mid-read keeps whatever was read so far.
pub fn snapshot_processes<F, W>(
    fs: &F,
    proc_root: &Path,
    uptime: &UptimeReading,
    run: &RunFlag,
    dest: &mut W,
    buf: &mut StagingBuffer,
) -> io::Result<ScanOutcome>
where
    F: FileSystem,
    W: Write + ?Sized,
{
    dest.write_all(uptime.as_bytes())?;
    dest.write_all(b"\n")?;

    let entries = fs.read_dir(proc_root)?;

    let self_stat = proc_root.join("self").join("stat");
    match fs.open(&self_stat) {
        Ok(mut src) => {
            relay_transient(&mut src, dest, buf, |_| {})?;
        }
        Err(e) => trace!("{} unavailable: {}", self_stat.display(), e),
    }

    let mut outcome = ScanOutcome::default();
    for entry in entries {
        let Some(name) = entry.file_name() else {
            continue;
        };
        if !is_pid_entry(name) {
            continue;
        }

        let stat_path = entry.join("stat");
        let Ok(mut src) = fs.open(&stat_path) else {
            // Process exited since the listing
            continue;
        };

        let mut matched = false;
        relay_transient(&mut src, dest, buf, |chunk| {
            if run.is_running() && is_marker(chunk) {
                run.stop();
                matched = true;
            }
        })?;
        outcome.processes += 1;

        if matched {
            debug!("boot-complete marker found in {}", stat_path.display());
            outcome.marker = Some(stat_path);
        }
    }

    dest.write_all(b"\n")?;
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::MockFs;
    use crate::collector::uptime::parse_uptime;
    use std::io::{Cursor, Read, Seek, SeekFrom};

    fn snapshot(fs: &MockFs, run: &RunFlag) -> (Vec<u8>, ScanOutcome) {
        let mut out = Vec::new();
        let outcome = snapshot_processes(
            fs,
            Path::new("/proc"),
            &parse_uptime(b"1.50 0.20"),
            run,
            &mut out,
            &mut StagingBuffer::new(),
        )
        .unwrap();
        (out, outcome)
    }

    #[test]
    fn test_pid_entry_filter() {
        let names = ["1", "42", "self", "0", "cpuinfo"];
        let accepted: Vec<&str> = names
            .into_iter()
            .filter(|n| is_pid_entry(OsStr::new(n)))
            .collect();
        assert_eq!(accepted, vec!["1", "42"]);
    }

    #[test]
    fn test_pid_entry_filter_checks_first_byte_only() {
        assert!(is_pid_entry(OsStr::new("9net")));
        assert!(!is_pid_entry(OsStr::new("")));
        assert!(!is_pid_entry(OsStr::new("07")));
    }

    #[test]
    fn test_snapshot_record_layout() {
        let mut fs = MockFs::new();
        fs.add_file("/proc/self/stat", "77 (bootchartd) R\n");
        fs.add_file("/proc/1/stat", "1 (init) S\n");
        fs.add_file("/proc/42/stat", "42 (udevd) S\n");
        fs.add_file("/proc/uptime", "1.50 0.20\n");
        let run = RunFlag::new();

        let (out, outcome) = snapshot(&fs, &run);

        assert_eq!(
            out,
            b"150\n77 (bootchartd) R\n1 (init) S\n42 (udevd) S\n\n".to_vec()
        );
        assert_eq!(outcome.processes, 2);
        assert_eq!(outcome.marker, None);
        assert!(run.is_running());
    }

    #[test]
    fn test_snapshot_without_marker_keeps_running() {
        let fs = MockFs::early_boot();
        let run = RunFlag::new();

        let (_, outcome) = snapshot(&fs, &run);

        assert_eq!(outcome.processes, 4);
        assert!(run.is_running());
    }

    #[test]
    fn test_snapshot_marker_stops_run() {
        let fs = MockFs::early_boot().with_marker_process(300);
        let run = RunFlag::new();

        let (out, outcome) = snapshot(&fs, &run);

        assert!(!run.is_running());
        assert_eq!(outcome.marker, Some(PathBuf::from("/proc/300/stat")));
        // Every process is still relayed
        assert_eq!(outcome.processes, 5);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("300 (quicklauncher) S"));
    }

    #[test]
    fn test_snapshot_latch_skips_evaluation_after_stop() {
        let fs = MockFs::early_boot().with_marker_process(300);
        let run = RunFlag::new();
        run.stop();

        let (_, outcome) = snapshot(&fs, &run);

        assert_eq!(outcome.processes, 5);
        assert_eq!(outcome.marker, None);
    }

    #[test]
    fn test_self_stat_is_not_scanned() {
        let mut fs = MockFs::early_boot();
        fs.add_file("/proc/self/stat", "77 (quicklauncher) R\n");
        let run = RunFlag::new();

        snapshot(&fs, &run);

        assert!(run.is_running());
    }

    #[test]
    fn test_vanished_process_is_skipped() {
        let mut fs = MockFs::early_boot();
        // Listed, but its stat is already gone
        fs.add_dir("/proc/555");
        let run = RunFlag::new();

        let (out, outcome) = snapshot(&fs, &run);

        assert_eq!(outcome.processes, 4);
        assert!(!String::from_utf8(out).unwrap().contains("555"));
    }

    /// Stat handle that opens fine but fails on read, like a reaped process.
    enum StatFile {
        Live(Cursor<Vec<u8>>),
        Reaped,
    }

    impl Read for StatFile {
        fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
            match self {
                StatFile::Live(c) => c.read(out),
                // ESRCH
                StatFile::Reaped => Err(io::Error::from_raw_os_error(3)),
            }
        }
    }

    impl Seek for StatFile {
        fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
            match self {
                StatFile::Live(c) => c.seek(pos),
                StatFile::Reaped => Ok(0),
            }
        }
    }

    struct ReapingFs {
        inner: MockFs,
        reaped: PathBuf,
    }

    impl FileSystem for ReapingFs {
        type File = StatFile;

        fn open(&self, path: &Path) -> io::Result<StatFile> {
            let file = self.inner.open(path)?;
            if path == self.reaped {
                Ok(StatFile::Reaped)
            } else {
                Ok(StatFile::Live(file))
            }
        }

        fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
            self.inner.read_dir(path)
        }
    }

    #[test]
    fn test_process_reaped_during_read_is_skipped() {
        let mut inner = MockFs::new();
        inner.add_file("/proc/self/stat", "77 (bootchartd) R\n");
        inner.add_file("/proc/1/stat", "1 (init) S\n");
        inner.add_file("/proc/45/stat", "45 (udevd) S\n");
        inner.add_file("/proc/9/stat", "9 (quicklauncher) S\n");
        let fs = ReapingFs {
            inner,
            reaped: PathBuf::from("/proc/45/stat"),
        };
        let run = RunFlag::new();
        let mut out = Vec::new();

        let outcome = snapshot_processes(
            &fs,
            Path::new("/proc"),
            &parse_uptime(b"1.50 0.20"),
            &run,
            &mut out,
            &mut StagingBuffer::new(),
        )
        .unwrap();

        // Record is complete, and the marker after the reaped process is seen
        assert_eq!(
            out,
            b"150\n77 (bootchartd) R\n1 (init) S\n9 (quicklauncher) S\n\n".to_vec()
        );
        assert_eq!(outcome.marker, Some(PathBuf::from("/proc/9/stat")));
        assert!(!run.is_running());
    }

    #[test]
    fn test_missing_proc_root_is_error() {
        let fs = MockFs::new();
        let mut out = Vec::new();
        let err = snapshot_processes(
            &fs,
            Path::new("/proc"),
            &parse_uptime(b"1.00 0.00"),
            &RunFlag::new(),
            &mut out,
            &mut StagingBuffer::new(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
