//! Version management for the extension.
//!
//! - [`header`]: the `#define KEY VALUE` header that stores the product
//!   version and release classification
//! - [`resolve`]: the scheme state machine that computes a new version
//! - [`revision`]: working-copy revision lookup used by nightly versions

pub mod header;
pub mod resolve;
pub mod revision;

pub use header::{
    HOST_VERSION_KEY, LONG_NAME_KEY, NAME_KEY, PRODUCTION_RELEASE_KEY, VERSION_NUMBER_KEY,
    VersionHeader, VersionHeaderFile,
};
pub use resolve::{ResolveContext, VersionUpdate, nightly_date, resolve, strip_suffix};
pub use revision::{FixedRevisionSource, RevisionSource, SvnRevisionSource, parse_svnversion};
