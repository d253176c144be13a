//! Raw `/proc` collection for the boot sampler.
//!
//! Nothing here parses kernel data. Sources are relayed byte-for-byte into
//! the log streams, tagged with an uptime stamp.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Sampler                            │
//! │  ┌─────────────────────┐   ┌─────────────────────────────┐  │
//! │  │  snapshot_processes │   │     CachedSource            │  │
//! │  │  - /proc/[pid]/stat │   │  - /proc/stat               │  │
//! │  │  - is_marker        │   │  - /proc/diskstats          │  │
//! │  └──────────┬──────────┘   └──────────────┬──────────────┘  │
//! │             └──────────────┬──────────────┘                 │
//! │                     ┌──────▼──────┐                         │
//! │                     │  FileSystem │ (trait)                 │
//! │                     └──────┬──────┘                         │
//! └────────────────────────────┼────────────────────────────────┘
//!                              │
//!              ┌───────────────┼───────────────┐
//!       ┌──────▼──────┐ ┌──────▼──────┐ ┌──────▼──────┐
//!       │   RealFs    │ │   MockFs    │ │  Scenarios  │
//!       │ (Linux)     │ │ (Testing)   │ │ (Fixtures)  │
//!       └─────────────┘ └─────────────┘ └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```
//! use bootchart_core::collector::{MockFs, UptimeSource};
//!
//! let fs = MockFs::early_boot();
//! let mut uptime = UptimeSource::new("/proc/uptime");
//! let reading = uptime.acquire(&fs).unwrap();
//! assert_eq!(reading.as_bytes(), b"1234");
//! ```

pub mod marker;
pub mod mock;
pub mod procfs;
pub mod relay;
pub mod traits;
pub mod uptime;

pub use marker::{EXIT_MARKER, LOOKAHEAD, is_marker};
pub use mock::MockFs;
pub use procfs::{ScanOutcome, is_pid_entry, snapshot_processes};
pub use relay::{
    CachedSource, StagingBuffer, copy_path, copy_raw, copy_with_uptime, relay, relay_transient,
};
pub use traits::{FileSystem, RealFs};
pub use uptime::{UptimeReading, UptimeSource, parse_uptime, wait_for_uptime};
