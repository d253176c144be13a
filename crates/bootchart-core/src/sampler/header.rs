//! Header manifest written once the run is over.
//!
//! Line-oriented `key = value` pairs. The two dynamic values are relayed raw
//! from `/proc` and keep the kernel's own trailing newline.

use std::io::Write;
use std::path::Path;

use super::SampleError;
use super::logs::create_output;
use crate::collector::relay::{StagingBuffer, copy_path};
use crate::collector::traits::FileSystem;

/// File name of the manifest inside the log directory.
pub const HEADER_FILE: &str = "header";

const VERSION: &str = "0.8";
const TITLE: &str = "Boot Chart by bootchart-lite";
const NOT_SUPPORTED: &str = "not supported yet";

/// Writes the header manifest into `log_dir`.
///
/// Fails if the file cannot be created or if `version` or `cmdline` under
/// `proc_root` cannot be read.
pub fn write_header<F: FileSystem>(
    fs: &F,
    proc_root: &Path,
    log_dir: &Path,
    buf: &mut StagingBuffer,
) -> Result<(), SampleError> {
    let path = log_dir.join(HEADER_FILE);
    let mut header = create_output(&path)?;

    writeln!(header, "version = {VERSION}")?;
    writeln!(header, "title = {TITLE}")?;

    write!(header, "system.uname = ")?;
    copy_field(fs, &proc_root.join("version"), &mut header, buf)?;

    writeln!(header, "system.release = {NOT_SUPPORTED}")?;
    writeln!(header, "system.cpu = {NOT_SUPPORTED}")?;

    write!(header, "system.kernel.options = ")?;
    copy_field(fs, &proc_root.join("cmdline"), &mut header, buf)?;

    header.sync_all()?;
    Ok(())
}

fn copy_field<F: FileSystem, W: Write>(
    fs: &F,
    source: &Path,
    dest: &mut W,
    buf: &mut StagingBuffer,
) -> Result<(), SampleError> {
    copy_path(fs, source, dest, buf).map_err(|source_err| SampleError::Source {
        path: source.to_path_buf(),
        source: source_err,
    })?;
    Ok(())
}
