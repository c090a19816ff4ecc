//! Shared types for the extbuild orchestrator.
//!
//! This crate owns the vocabulary every other crate speaks: which platforms
//! exist and how their paths are derived, how installer platform identifiers
//! are spelled, which version schemes are available, and how failures are
//! classified.

pub mod error;
pub mod platform;
pub mod scheme;

pub use error::{BuildError, BuildResult};
pub use platform::{
    BuildMode, PLATFORM_MAPPINGS, PLATFORMS, PlatformDescriptor, PlatformFamily, PlatformId,
    PlatformKind, PlatformRequest, Toolchain,
};
pub use scheme::VersionScheme;
