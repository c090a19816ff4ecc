//! Port traits abstracting the environment away from the pipeline.

use chrono::NaiveDate;

pub use extbuild_process::ProcessRunner;
pub use extbuild_version::RevisionSource;

/// Source of the calendar date stamped into nightly versions.
pub trait Clock {
    fn today(&self) -> NaiveDate;
}
