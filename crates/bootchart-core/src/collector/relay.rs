//! Byte relay from kernel sources into the log streams.
//!
//! No parsing and no transformation: whatever the source yields is written
//! to the destination through a fixed staging buffer.

use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::trace;

use crate::collector::traits::FileSystem;
use crate::collector::uptime::UptimeReading;

/// Size of the staging buffer used for every transfer.
pub const STAGING_BUFFER_SIZE: usize = 1024;

/// Reusable staging buffer, owned by the sampler and lent to each transfer.
pub struct StagingBuffer {
    bytes: Box<[u8; STAGING_BUFFER_SIZE]>,
}

impl StagingBuffer {
    pub fn new() -> Self {
        Self {
            bytes: Box::new([0; STAGING_BUFFER_SIZE]),
        }
    }
}

impl Default for StagingBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Copies `src` to `dest` until end-of-source.
///
/// `inspect` sees every chunk before it is written. Returns the number of
/// bytes relayed.
pub fn relay<R, W, I>(
    src: &mut R,
    dest: &mut W,
    buf: &mut StagingBuffer,
    inspect: I,
) -> io::Result<u64>
where
    R: Read + ?Sized,
    W: Write + ?Sized,
    I: FnMut(&[u8]),
{
    pump(src, dest, buf, inspect, false)
}

/// Like [`relay`], but a read error ends the transfer instead of failing it.
///
/// For sources that may disappear mid-read, such as `/proc/[pid]/stat` of a
/// process reaped after it was opened (ESRCH). Whatever was read before the
/// error has been written. Write errors are still returned.
pub fn relay_transient<R, W, I>(
    src: &mut R,
    dest: &mut W,
    buf: &mut StagingBuffer,
    inspect: I,
) -> io::Result<u64>
where
    R: Read + ?Sized,
    W: Write + ?Sized,
    I: FnMut(&[u8]),
{
    pump(src, dest, buf, inspect, true)
}

fn pump<R, W, I>(
    src: &mut R,
    dest: &mut W,
    buf: &mut StagingBuffer,
    mut inspect: I,
    stop_on_read_error: bool,
) -> io::Result<u64>
where
    R: Read + ?Sized,
    W: Write + ?Sized,
    I: FnMut(&[u8]),
{
    let mut total = 0u64;
    loop {
        let count = match src.read(&mut buf.bytes[..]) {
            Ok(0) => return Ok(total),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) if stop_on_read_error => {
                trace!("source went away after {} bytes: {}", total, e);
                return Ok(total);
            }
            Err(e) => return Err(e),
        };
        let chunk = &buf.bytes[..count];
        inspect(chunk);
        dest.write_all(chunk)?;
        total += count as u64;
    }
}

/// Rewinds an already-open source to offset 0 and relays it whole.
pub fn copy_raw<R, W>(src: &mut R, dest: &mut W, buf: &mut StagingBuffer) -> io::Result<u64>
where
    R: Read + Seek + ?Sized,
    W: Write + ?Sized,
{
    src.seek(SeekFrom::Start(0))?;
    relay(src, dest, buf, |_| {})
}

/// Opens `path`, relays it once and closes it again.
///
/// Open failures are returned; callers decide whether that matters.
pub fn copy_path<F, W>(
    fs: &F,
    path: &Path,
    dest: &mut W,
    buf: &mut StagingBuffer,
) -> io::Result<u64>
where
    F: FileSystem,
    W: Write + ?Sized,
{
    let mut src = fs.open(path)?;
    relay(&mut src, dest, buf, |_| {})
}

/// A periodic source whose handle is opened once and reused every tick.
pub struct CachedSource<H> {
    path: PathBuf,
    handle: Option<H>,
}

impl<H: Read + Seek> CachedSource<H> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            handle: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Relays the source from offset 0.
    ///
    /// If the source cannot be opened this is a silent no-op and the open is
    /// retried on the next call. Write and read errors are returned.
    pub fn copy_to<F, W>(
        &mut self,
        fs: &F,
        dest: &mut W,
        buf: &mut StagingBuffer,
    ) -> io::Result<u64>
    where
        F: FileSystem<File = H>,
        W: Write + ?Sized,
    {
        if self.handle.is_none() {
            match fs.open(&self.path) {
                Ok(handle) => self.handle = Some(handle),
                Err(e) => {
                    trace!("skipping {}: {}", self.path.display(), e);
                    return Ok(0);
                }
            }
        }
        match self.handle.as_mut() {
            Some(handle) => copy_raw(handle, dest, buf),
            None => Ok(0),
        }
    }

    /// Drops the cached handle.
    pub fn close(&mut self) {
        self.handle = None;
    }
}

/// Writes one framed record: `<uptime>\n<raw block>\n`.
///
/// The framing is written even when the source is unavailable, leaving an
/// empty block for that tick.
pub fn copy_with_uptime<F, W>(
    source: &mut CachedSource<F::File>,
    fs: &F,
    dest: &mut W,
    uptime: &UptimeReading,
    buf: &mut StagingBuffer,
) -> io::Result<u64>
where
    F: FileSystem,
    W: Write + ?Sized,
{
    dest.write_all(uptime.as_bytes())?;
    dest.write_all(b"\n")?;
    let copied = source.copy_to(fs, dest, buf)?;
    dest.write_all(b"\n")?;
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::MockFs;
    use crate::collector::uptime::parse_uptime;
    use std::io::Cursor;

    #[test]
    fn test_relay_is_byte_identical_through_file() {
        let payload: Vec<u8> = (0..3000u32).map(|i| (i * 7 % 256) as u8).collect();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("proc_stat.log");

        let mut dest = std::fs::File::create(&path).unwrap();
        let copied = relay(
            &mut Cursor::new(payload.clone()),
            &mut dest,
            &mut StagingBuffer::new(),
            |_| {},
        )
        .unwrap();
        drop(dest);

        assert_eq!(copied, payload.len() as u64);
        assert_eq!(std::fs::read(&path).unwrap(), payload);
    }

    #[test]
    fn test_relay_inspects_staging_sized_chunks() {
        let payload = vec![b'x'; STAGING_BUFFER_SIZE * 2 + 10];
        let mut chunks = Vec::new();
        let mut out = Vec::new();

        relay(
            &mut Cursor::new(payload.clone()),
            &mut out,
            &mut StagingBuffer::new(),
            |chunk| chunks.push(chunk.len()),
        )
        .unwrap();

        assert_eq!(chunks, vec![STAGING_BUFFER_SIZE, STAGING_BUFFER_SIZE, 10]);
        assert_eq!(out, payload);
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::from_raw_os_error(3))
        }
    }

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::StorageFull, "disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_relay_transient_stops_on_read_error() {
        let mut out = Vec::new();
        let mut src = Cursor::new(b"45 (udevd) S\n".to_vec()).chain(FailingReader);

        let copied =
            relay_transient(&mut src, &mut out, &mut StagingBuffer::new(), |_| {}).unwrap();

        assert_eq!(copied, 13);
        assert_eq!(out, b"45 (udevd) S\n");
        assert!(relay(&mut FailingReader, &mut out, &mut StagingBuffer::new(), |_| {}).is_err());
    }

    #[test]
    fn test_relay_transient_propagates_write_error() {
        let err = relay_transient(
            &mut Cursor::new(b"1 (init) S\n".to_vec()),
            &mut FailingWriter,
            &mut StagingBuffer::new(),
            |_| {},
        )
        .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::StorageFull);
    }

    #[test]
    fn test_copy_raw_rewinds_each_call() {
        let mut src = Cursor::new(b"cpu 1 2 3\n".to_vec());
        let mut out = Vec::new();
        let mut buf = StagingBuffer::new();

        copy_raw(&mut src, &mut out, &mut buf).unwrap();
        copy_raw(&mut src, &mut out, &mut buf).unwrap();

        assert_eq!(out, b"cpu 1 2 3\ncpu 1 2 3\n");
    }

    #[test]
    fn test_copy_path_missing_is_error() {
        let fs = MockFs::new();
        let mut out = Vec::new();
        let err = copy_path(
            &fs,
            Path::new("/proc/version"),
            &mut out,
            &mut StagingBuffer::new(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(out.is_empty());
    }

    #[test]
    fn test_copy_with_uptime_framing() {
        let fs = MockFs::early_boot();
        let mut source = CachedSource::new("/proc/diskstats");
        let mut out = Vec::new();

        copy_with_uptime(
            &mut source,
            &fs,
            &mut out,
            &parse_uptime(b"3.50 1.00"),
            &mut StagingBuffer::new(),
        )
        .unwrap();

        let expected =
            b"350\n   179       0 mmcblk0 1024 12 40960 880 16 4 160 40 0 700 920 0 0 0 0\n\n";
        assert_eq!(out, expected.to_vec());
    }

    #[test]
    fn test_copy_with_uptime_missing_source_keeps_framing() {
        let fs = MockFs::new();
        let mut source = CachedSource::new("/proc/diskstats");
        let mut out = Vec::new();

        let copied = copy_with_uptime(
            &mut source,
            &fs,
            &mut out,
            &parse_uptime(b"7.25 1.00"),
            &mut StagingBuffer::new(),
        )
        .unwrap();

        assert_eq!(copied, 0);
        assert_eq!(out, b"725\n\n");
    }

    #[test]
    fn test_cached_source_retries_open() {
        let mut fs = MockFs::new();
        let mut source = CachedSource::new("/proc/stat");
        let mut buf = StagingBuffer::new();

        let mut out = Vec::new();
        assert_eq!(source.copy_to(&fs, &mut out, &mut buf).unwrap(), 0);

        fs.add_file("/proc/stat", "cpu 9\n");
        assert_eq!(source.copy_to(&fs, &mut out, &mut buf).unwrap(), 6);
        assert_eq!(out, b"cpu 9\n");
    }
}
