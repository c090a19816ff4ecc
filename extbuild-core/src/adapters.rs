//! Default port implementations.

use crate::ports::Clock;
use chrono::{Local, NaiveDate};

pub use extbuild_process::{DryRunRunner, SystemRunner};
pub use extbuild_version::{FixedRevisionSource, SvnRevisionSource};

/// The local calendar date.
#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A pinned date, for reproducible nightly versions and tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
