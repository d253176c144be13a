//! Mock filesystem for testing the sampler without a real `/proc`.

mod filesystem;
mod scenarios;

pub use filesystem::MockFs;
