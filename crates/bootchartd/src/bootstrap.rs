//! Handoff to the real init.
//!
//! The sampler is started as `init=` by the kernel. It forks once: the
//! original process becomes `/sbin/init` right away, the child samples.

use std::ffi::OsString;
use std::io;
use std::os::unix::process::CommandExt;
use std::process::Command;

use tracing::error;

/// The system init the parent turns into.
pub const INIT_PATH: &str = "/sbin/init";

/// Which side of the fork this process is on.
pub enum Role {
    /// Original process; must become init.
    Parent,
    /// Forked child; runs the sampler.
    Sampler,
}

/// Forks the sampler off.
///
/// Must be called before any thread is spawned.
pub fn fork() -> io::Result<Role> {
    // SAFETY: single-threaded at this point; the child only continues
    // running ordinary Rust code.
    let pid = unsafe { libc::fork() };
    match pid {
        -1 => Err(io::Error::last_os_error()),
        0 => Ok(Role::Sampler),
        _ => Ok(Role::Parent),
    }
}

/// Arguments after argv[0] for init: the forwarded target, if any.
pub fn init_args(target: Option<OsString>) -> Vec<OsString> {
    target.into_iter().collect()
}

/// Replaces this process with `/sbin/init`. Returns only if exec failed.
pub fn exec_init(target: Option<OsString>) -> io::Error {
    let err = Command::new(INIT_PATH).args(init_args(target)).exec();
    error!("failed to exec {}: {}", INIT_PATH, err);
    err
}
