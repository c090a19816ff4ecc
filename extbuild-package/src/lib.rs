//! Packaging: the developer SDK archive and the end-user installer bundle.
//!
//! Both assemblers first build an [`ArchivePlan`] from the fixed tables in
//! [`manifest`], check that every source exists, and only then create the
//! archive through an [`ArchiveWriter`].

pub mod archive;
pub mod compat;
pub mod help;
pub mod installer;
pub mod manifest;
pub mod plan;
pub mod sdk;
pub mod template;

pub use archive::{ArchiveFormat, ArchiveWriter, TarGzArchiveWriter, ZipArchiveWriter};
pub use compat::{HostCompat, host_compat_range};
pub use help::{stage_help, unzip_into};
pub use installer::{InstallerRequest, build_installer, installer_metadata, plan_installer};
pub use plan::{ArchivePlan, EntrySource, PlannedEntry, archive_path, sha256_file};
pub use sdk::{SdkRequest, build_sdk, plan_sdk};
pub use template::render_template;

use camino::Utf8PathBuf;

/// A finished archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageOutcome {
    pub path: Utf8PathBuf,
    pub entries: usize,
    /// Lowercase hex SHA-256 of the archive file.
    pub sha256: String,
}
