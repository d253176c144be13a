//! bootchartd - boot-time telemetry sampler.
//!
//! Runs as the kernel's `init=`. Forks once: the parent execs `/sbin/init`
//! (forwarding an optional runlevel/target), the child polls `/proc` every
//! 100ms into `/etc/bootchart-lite` until the `quicklauncher` process
//! appears or SIGUSR1 arrives, then writes the header manifest.

mod bootstrap;
mod signal;

use std::ffi::OsString;
use std::process::ExitCode;

use chrono::Utc;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use bootchart_core::collector::RealFs;
use bootchart_core::sampler::{RunFlag, SampleError, Sampler, SamplerConfig};

use crate::bootstrap::Role;

/// Environment variable controlling log verbosity (`RUST_LOG` syntax).
///
/// The kernel hands unrecognised `key=value` boot parameters to init's
/// environment, so this can be set from the boot command line.
const LOG_ENV: &str = "BOOTCHART_LOG";

/// Boot-time telemetry sampler.
///
/// Help and version flags are disabled: whatever the kernel passes is meant
/// for init.
#[derive(Parser, Debug)]
#[command(
    name = "bootchartd",
    about = "Boot-time telemetry sampler",
    disable_help_flag = true,
    disable_version_flag = true
)]
struct Args {
    /// Runlevel or target forwarded verbatim to /sbin/init.
    #[arg(allow_hyphen_values = true)]
    target: Option<OsString>,

    /// Anything after the target; ignored.
    #[arg(hide = true, trailing_var_arg = true, allow_hyphen_values = true)]
    rest: Vec<OsString>,
}

/// Returns the init target from the command line.
///
/// Falls back to the raw first argument if clap rejects the command line:
/// boot must proceed whatever the kernel passed.
fn parse_target<I>(argv: I) -> Option<OsString>
where
    I: IntoIterator<Item = OsString> + Clone,
{
    match Args::try_parse_from(argv.clone()) {
        Ok(args) => args.target,
        Err(_) => argv.into_iter().nth(1),
    }
}

/// Initializes the tracing subscriber. Default level is INFO.
fn init_logging() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .with_env_var(LOG_ENV)
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let target = parse_target(std::env::args_os().collect::<Vec<_>>());

    init_logging();

    match bootstrap::fork() {
        Ok(Role::Parent) => {
            bootstrap::exec_init(target);
            // Nothing sensible left to do if init could not be started
            ExitCode::SUCCESS
        }
        Ok(Role::Sampler) => run_sampler(),
        Err(e) => {
            error!("fork failed ({}), starting init without sampling", e);
            bootstrap::exec_init(target);
            ExitCode::SUCCESS
        }
    }
}

fn run_sampler() -> ExitCode {
    info!("bootchartd {} starting", env!("CARGO_PKG_VERSION"));

    let run = RunFlag::new();
    if let Err(e) = signal::install_stop_signal(&run) {
        warn!("Failed to install SIGUSR1 handler: {}", e);
    }
    if let Err(e) = signal::install_interrupt_handler(&run) {
        warn!("Failed to set Ctrl-C handler: {}", e);
    }

    let config = SamplerConfig::default();
    let sampler = match Sampler::start(RealFs::new(), config, run) {
        Ok(sampler) => sampler,
        Err(e) => return fatal(&e),
    };
    info!("sampling started at {}", Utc::now().to_rfc3339());

    match sampler.run() {
        Ok(summary) => {
            info!(
                "done: {} samples, last uptime stamp {}",
                summary.iterations, summary.last_uptime
            );
            ExitCode::SUCCESS
        }
        Err(e) => fatal(&e),
    }
}

/// Reports a fatal error on stdout and returns exit status 1.
fn fatal(err: &SampleError) -> ExitCode {
    error!("{}", err);
    match err {
        SampleError::Create { path, .. } => {
            println!("bootchartd: cannot create {}", path.display());
        }
        other => println!("bootchartd: {}", other),
    }
    ExitCode::from(1)
}
