//! Uptime stamps from `/proc/uptime`.
//!
//! A reading is the "seconds.fraction" field with the decimal point dropped,
//! so `12345.67` becomes `1234567`. It is kept as text: the digits are
//! written into the logs verbatim and never interpreted here.

use std::fmt;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use tracing::{debug, trace};

use crate::collector::traits::FileSystem;

/// Bytes of `/proc/uptime` looked at per reading.
pub const UPTIME_PREFIX_LEN: usize = 9;

/// Compact digit-only uptime stamp.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UptimeReading {
    digits: Vec<u8>,
}

impl UptimeReading {
    /// Raw stamp bytes as written into the logs.
    pub fn as_bytes(&self) -> &[u8] {
        &self.digits
    }

    /// Number of stamp bytes.
    pub fn len(&self) -> usize {
        self.digits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.digits.is_empty()
    }
}

impl fmt::Display for UptimeReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.digits))
    }
}

/// Extracts the stamp from the head of `/proc/uptime` content.
///
/// Looks at no more than `UPTIME_PREFIX_LEN` bytes, stops at the first space
/// and drops every '.'. Other bytes are copied as-is.
pub fn parse_uptime(raw: &[u8]) -> UptimeReading {
    let digits = raw
        .iter()
        .take(UPTIME_PREFIX_LEN)
        .take_while(|&&b| b != b' ')
        .filter(|&&b| b != b'.')
        .copied()
        .collect();
    UptimeReading { digits }
}

/// Uptime source with a handle cached for the sampler's lifetime.
pub struct UptimeSource<H> {
    path: PathBuf,
    handle: Option<H>,
}

impl<H: Read + Seek> UptimeSource<H> {
    /// Creates a source for the given path. Nothing is opened yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            handle: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the current uptime stamp.
    ///
    /// Returns `None` while the source cannot be opened, which is normal
    /// before `/proc` is mounted. Once opened, the handle is kept and
    /// rewound on every call.
    pub fn acquire<F>(&mut self, fs: &F) -> Option<UptimeReading>
    where
        F: FileSystem<File = H>,
    {
        if self.handle.is_none() {
            match fs.open(&self.path) {
                Ok(handle) => self.handle = Some(handle),
                Err(e) => {
                    trace!("{} not available yet: {}", self.path.display(), e);
                    return None;
                }
            }
        }

        let handle = self.handle.as_mut()?;
        match read_prefix(handle) {
            Ok(raw) => Some(parse_uptime(&raw)),
            Err(e) => {
                debug!("failed to read {}: {}", self.path.display(), e);
                None
            }
        }
    }
}

fn read_prefix<H: Read + Seek>(handle: &mut H) -> io::Result<Vec<u8>> {
    handle.seek(SeekFrom::Start(0))?;
    let mut raw = Vec::with_capacity(UPTIME_PREFIX_LEN);
    handle
        .by_ref()
        .take(UPTIME_PREFIX_LEN as u64)
        .read_to_end(&mut raw)?;
    Ok(raw)
}

/// Polls the source until a stamp is available, sleeping `retry` between
/// attempts. Never gives up: sampling cannot start without a time base.
pub fn wait_for_uptime<F: FileSystem>(
    source: &mut UptimeSource<F::File>,
    fs: &F,
    retry: Duration,
) -> UptimeReading {
    let mut attempts: u64 = 0;
    loop {
        if let Some(reading) = source.acquire(fs) {
            if attempts > 0 {
                debug!(
                    "{} became available after {} retries",
                    source.path().display(),
                    attempts
                );
            }
            return reading;
        }
        attempts += 1;
        thread::sleep(retry);
    }
}
