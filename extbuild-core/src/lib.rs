//! Embeddable core library for extbuild.
//!
//! Provides a clap-free entry point that runs the build pipeline for one
//! checkout. Process spawning, working-copy queries, and the calendar are
//! abstracted behind the traits in [`ports`]; [`adapters`] holds the default
//! implementations.
//!
//! # Entry point
//!
//! - [`run_pipeline`](pipeline::run_pipeline): version update, compile,
//!   documentation, SDK, installer, staging

pub mod adapters;
pub mod pipeline;
pub mod ports;
pub mod settings;

pub use extbuild_package::PackageOutcome;
pub use pipeline::{RunOutcome, VersionChange, run_pipeline};
pub use settings::RunSettings;
