//! The boot sampler: fixed-period `/proc` polling until boot completes.
//!
//! `Sampler` is the explicit context for one run. It owns the cached kernel
//! sources, the three log streams and the staging buffer, and watches a
//! [`RunFlag`] that both the marker scan and external stop requests clear.
//!
//! ```no_run
//! use bootchart_core::collector::RealFs;
//! use bootchart_core::sampler::{RunFlag, Sampler, SamplerConfig};
//!
//! let run = RunFlag::new();
//! let sampler = Sampler::start(RealFs::new(), SamplerConfig::default(), run).unwrap();
//! let summary = sampler.run().unwrap();
//! println!("{} iterations", summary.iterations);
//! ```

mod flag;
pub mod header;
pub mod logs;

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::collector::procfs::snapshot_processes;
use crate::collector::relay::{CachedSource, StagingBuffer, copy_with_uptime};
use crate::collector::traits::FileSystem;
use crate::collector::uptime::{UptimeReading, UptimeSource, wait_for_uptime};

pub use flag::RunFlag;
pub use header::{HEADER_FILE, write_header};
pub use logs::{DISKSTATS_LOG, LogSet, PS_LOG, STAT_LOG};

/// Default location of the kernel pseudo-filesystem.
pub const PROC_ROOT: &str = "/proc";
/// Default directory receiving the logs and header.
pub const LOG_DIR: &str = "/etc/bootchart-lite";
/// Sampling period.
pub const TICK: Duration = Duration::from_millis(100);
/// Back-off between attempts to read uptime before `/proc` is mounted.
pub const UPTIME_RETRY: Duration = Duration::from_millis(100);

/// Error type for sampler failures.
#[derive(Debug)]
pub enum SampleError {
    /// An output file could not be created.
    Create { path: PathBuf, source: io::Error },
    /// A one-shot kernel source could not be read.
    Source { path: PathBuf, source: io::Error },
    /// I/O error while writing a log or reading a source.
    Io(io::Error),
}

impl fmt::Display for SampleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleError::Create { path, source } => {
                write!(f, "cannot create {}: {}", path.display(), source)
            }
            SampleError::Source { path, source } => {
                write!(f, "cannot read {}: {}", path.display(), source)
            }
            SampleError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for SampleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SampleError::Create { source, .. } | SampleError::Source { source, .. } => {
                Some(source)
            }
            SampleError::Io(e) => Some(e),
        }
    }
}

impl From<io::Error> for SampleError {
    fn from(e: io::Error) -> Self {
        SampleError::Io(e)
    }
}

/// Paths and timing for one run.
///
/// `Default` gives the fixed production values. Tests point the paths at
/// mock and temporary locations and shorten the tick.
#[derive(Debug, Clone)]
pub struct SamplerConfig {
    pub proc_root: PathBuf,
    pub log_dir: PathBuf,
    pub tick: Duration,
    pub uptime_retry: Duration,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            proc_root: PathBuf::from(PROC_ROOT),
            log_dir: PathBuf::from(LOG_DIR),
            tick: TICK,
            uptime_retry: UPTIME_RETRY,
        }
    }
}

/// Why the loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// The marker process appeared in the given stat file.
    BootComplete(PathBuf),
    /// Someone cleared the run flag from outside.
    Requested,
}

/// What a finished run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub iterations: u64,
    pub reason: StopReason,
    pub last_uptime: UptimeReading,
}

/// Sampling context for one boot.
pub struct Sampler<F: FileSystem> {
    fs: F,
    config: SamplerConfig,
    run: RunFlag,
    uptime: UptimeSource<F::File>,
    stat: CachedSource<F::File>,
    diskstats: CachedSource<F::File>,
    logs: LogSet,
    buffer: StagingBuffer,
    reading: UptimeReading,
    iterations: u64,
    marker: Option<PathBuf>,
}

impl<F: FileSystem> Sampler<F> {
    /// Waits for the uptime source, then creates the logs.
    ///
    /// Blocks until `/proc` is readable. Fails only if a log cannot be
    /// created.
    pub fn start(fs: F, config: SamplerConfig, run: RunFlag) -> Result<Self, SampleError> {
        let mut uptime = UptimeSource::new(config.proc_root.join("uptime"));
        let reading = wait_for_uptime(&mut uptime, &fs, config.uptime_retry);
        debug!("uptime base: {}", reading);

        let logs = LogSet::create(&config.log_dir)?;

        Ok(Self {
            stat: CachedSource::new(config.proc_root.join("stat")),
            diskstats: CachedSource::new(config.proc_root.join("diskstats")),
            fs,
            config,
            run,
            uptime,
            logs,
            buffer: StagingBuffer::new(),
            reading,
            iterations: 0,
            marker: None,
        })
    }

    pub fn is_running(&self) -> bool {
        self.run.is_running()
    }

    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// Filesystem the sampler reads from.
    pub fn fs(&self) -> &F {
        &self.fs
    }

    /// Mutable access to the filesystem, used by tests to change the
    /// process table between iterations.
    pub fn fs_mut(&mut self) -> &mut F {
        &mut self.fs
    }

    /// Runs one full iteration: uptime, process table, stat, diskstats.
    ///
    /// A marker found in the process table clears the run flag, but the
    /// iteration still writes the stat and diskstats records.
    pub fn sample_once(&mut self) -> Result<(), SampleError> {
        if let Some(reading) = self.uptime.acquire(&self.fs) {
            self.reading = reading;
        }

        let outcome = snapshot_processes(
            &self.fs,
            &self.config.proc_root,
            &self.reading,
            &self.run,
            &mut self.logs.ps,
            &mut self.buffer,
        )?;
        if let Some(path) = outcome.marker {
            info!("boot complete: marker found in {}", path.display());
            self.marker = Some(path);
        }

        copy_with_uptime(
            &mut self.stat,
            &self.fs,
            &mut self.logs.stat,
            &self.reading,
            &mut self.buffer,
        )?;
        copy_with_uptime(
            &mut self.diskstats,
            &self.fs,
            &mut self.logs.diskstats,
            &self.reading,
            &mut self.buffer,
        )?;

        self.iterations += 1;
        debug!(
            "sample #{} at {}: {} processes",
            self.iterations, self.reading, outcome.processes
        );
        Ok(())
    }

    /// Samples until the run flag clears, then seals the run.
    ///
    /// The flag is checked once per iteration, so a stop request takes
    /// effect within one tick. Errors inside an iteration are logged and
    /// sampling goes on; only the final header can fail the run.
    pub fn run(mut self) -> Result<RunSummary, SampleError> {
        info!(
            "sampling every {}ms into {}",
            self.config.tick.as_millis(),
            self.config.log_dir.display()
        );

        while self.run.is_running() {
            if let Err(e) = self.sample_once() {
                warn!("sample #{} failed: {}", self.iterations + 1, e);
            }
            thread::sleep(self.config.tick);
        }

        self.finish()
    }

    /// Closes every source and log, then writes the header.
    pub fn finish(self) -> Result<RunSummary, SampleError> {
        let Self {
            fs,
            config,
            uptime,
            mut stat,
            mut diskstats,
            logs,
            mut buffer,
            reading,
            iterations,
            marker,
            ..
        } = self;

        drop(uptime);
        stat.close();
        diskstats.close();
        if let Err(e) = logs.close() {
            warn!("failed to sync logs: {}", e);
        }

        write_header(&fs, &config.proc_root, &config.log_dir, &mut buffer)?;

        let reason = match marker {
            Some(path) => StopReason::BootComplete(path),
            None => StopReason::Requested,
        };
        info!(
            "sampling stopped after {} iterations ({:?}), header written",
            iterations, reason
        );

        Ok(RunSummary {
            iterations,
            reason,
            last_uptime: reading,
        })
    }
}
