//! bootchart-core — boot-time telemetry sampling library.
//!
//! Provides:
//! - `collector` — `/proc` access, uptime stamps, raw byte relay, boot-complete detection
//! - `sampler` — the sampling loop context, log set and header manifest
//!
//! Used by `bootchartd`, which forks off the sampler before handing the
//! boot over to the real init.

pub mod collector;
pub mod sampler;
