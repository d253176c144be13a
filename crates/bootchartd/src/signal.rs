//! Stop requests from outside the sampler.
//!
//! SIGUSR1 is the designated stop signal. SIGINT and SIGTERM are handled
//! through `ctrlc` and have the same effect. Both paths only clear the run
//! flag; the loop notices at its next iteration and still writes the header.

use std::io;
use std::sync::OnceLock;

use bootchart_core::sampler::RunFlag;
use tracing::info;

/// Flag reachable from the signal handler. Set once, before installation.
static STOP_FLAG: OnceLock<RunFlag> = OnceLock::new();

extern "C" fn on_stop_signal(_signum: libc::c_int) {
    // Atomic load of the cell plus one atomic store: async-signal-safe.
    if let Some(flag) = STOP_FLAG.get() {
        flag.stop();
    }
}

/// Routes SIGUSR1 to `run.stop()`.
///
/// Uses `sigaction`, so the disposition stays installed after delivery.
/// Only one flag per process can be routed; installing a different one
/// later fails with `AlreadyExists`.
pub fn install_stop_signal(run: &RunFlag) -> io::Result<()> {
    if STOP_FLAG.set(run.clone()).is_err()
        && !STOP_FLAG.get().is_some_and(|flag| flag.shares_state_with(run))
    {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            "SIGUSR1 is already routed to another run flag",
        ));
    }

    // SAFETY: the handler only touches an initialized OnceLock and an
    // AtomicBool; the sigaction struct is fully initialized before use.
    unsafe {
        let mut action: libc::sigaction = std::mem::zeroed();
        action.sa_sigaction = on_stop_signal as extern "C" fn(libc::c_int) as libc::sighandler_t;
        action.sa_flags = libc::SA_RESTART;
        libc::sigemptyset(&mut action.sa_mask);
        if libc::sigaction(libc::SIGUSR1, &action, std::ptr::null_mut()) != 0 {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}

/// Routes SIGINT/SIGTERM to `run.stop()`.
pub fn install_interrupt_handler(run: &RunFlag) -> Result<(), ctrlc::Error> {
    let r = run.clone();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.stop();
    })
}
