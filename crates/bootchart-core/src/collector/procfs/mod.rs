//! Process-table snapshots from the `/proc` virtual filesystem.

pub mod process;

pub use process::{ScanOutcome, is_pid_entry, snapshot_processes};
