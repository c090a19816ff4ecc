//! Fixed description of what goes into each archive.
//!
//! Paths are relative to the checkout root; destinations are archive paths.

use extbuild_types::{PlatformFamily, PlatformId, PlatformKind};

/// A directory copied recursively into an archive.
#[derive(Debug, Clone, Copy)]
pub struct TreeEntry {
    pub src: &'static str,
    pub dest: &'static str,
    pub suffixes: &'static [&'static str],
    pub skip: &'static [&'static str],
}

/// A single file copied into an archive.
#[derive(Debug, Clone, Copy)]
pub struct FileEntry {
    pub src: &'static str,
    pub dest: &'static str,
}

pub const VCS_DIRS: &[&str] = &[".svn", "_svn"];

/// Platform-independent SDK directories.
pub const SDK_TREES: &[TreeEntry] = &[
    TreeEntry {
        src: "Code/SpectralUtilities",
        dest: "Code/SpectralUtilities",
        suffixes: &[".h"],
        skip: &[],
    },
    TreeEntry {
        src: "Code/Build/DoxygenOutput/html",
        dest: "doc/html",
        suffixes: &[],
        skip: &[],
    },
];

/// Platform-independent SDK files.
pub const SDK_FILES: &[FileEntry] = &[FileEntry {
    src: "Code/Include/SpectralVersion.h",
    dest: "Code/Include/SpectralVersion.h",
}];

/// Added to the SDK once when any Windows platform is requested.
pub const SDK_WINDOWS_TREES: &[TreeEntry] = &[TreeEntry {
    src: "Code/CompileSettings",
    dest: "Code/CompileSettings",
    suffixes: &[],
    skip: VCS_DIRS,
}];

pub const SDK_OUTPUT_STEM: &str = "Installer/Spectral-SDK";

pub const INSTALLER_TEMPLATE: &str = "Installer/install.rdf";
pub const INSTALLER_MANIFEST_ENTRY: &str = "install.rdf";
pub const INSTALLER_DEFAULT_OUTPUT: &str = "Installer/AebOutput/Spectral.aeb";

/// Platform-independent installer files.
pub const INSTALLER_FILES: &[FileEntry] = &[
    FileEntry {
        src: "Installer/lgpl-2.1.txt",
        dest: "license/lgpl-2.1.txt",
    },
    FileEntry {
        src: "Release/DefaultSettings/41-SpectralOptions.cfg",
        dest: "content/DefaultSettings/41-SpectralOptions.cfg",
    },
    FileEntry {
        src: "Release/DefaultSettings/70-SpectralContextSensitiveHelp.cfg",
        dest: "content/DefaultSettings/70-SpectralContextSensitiveHelp.cfg",
    },
];

pub const HELP_ARCHIVE: &str = "Release/Help/SpectralHelp.zip";
pub const HELP_STAGING: &str = "Installer/AebOutput/Help";
pub const HELP_DEST: &str = "content/Help/Spectral";

const ALL_PLUGINS: &[&str] = &[
    "Ace",
    "Aster",
    "Cem",
    "DgFormats",
    "Elm",
    "Iarr",
    "KMeans",
    "Landsat",
    "Mnf",
    "Ndvi",
    "Plotting",
    "RangeProfile",
    "Resampler",
    "Rx",
    "Sam",
    "Signature",
    "SignatureWindow",
    "SpectralLibrary",
    "SpectralLibraryMatch",
    "Tad",
];

/// Plug-ins shipped in the installer for `kind`.
pub fn installer_plugins(kind: PlatformKind) -> Vec<&'static str> {
    let excluded: &[&str] = match kind {
        PlatformKind::Win32 | PlatformKind::Win64 => &[],
        PlatformKind::Linux => &["Rx"],
        PlatformKind::Solaris => &["Ace", "Rx", "Tad"],
    };
    ALL_PLUGINS
        .iter()
        .copied()
        .filter(|p| !excluded.contains(p))
        .collect()
}

/// `Code/Build/Binaries-<tag>-<mode>` for an installer platform.
pub fn binaries_dir(id: &PlatformId) -> String {
    format!("Code/Build/{}", id.binaries_dir_name())
}

/// SDK library source (and destination) for a platform.
pub fn sdk_library(id: &PlatformId) -> String {
    format!(
        "{}/Lib/{}",
        binaries_dir(id),
        id.kind().descriptor().sdk_library
    )
}

/// Archive directory holding a platform's plug-ins.
pub fn installer_plugin_dest(id: &PlatformId) -> String {
    format!("platform/{id}/PlugIns")
}

/// Whether packaging `id` on a `host` machine needs a separate Unix checkout.
pub fn needs_unix_checkout(id: &PlatformId, host: PlatformFamily) -> bool {
    host == PlatformFamily::Windows && id.family() == PlatformFamily::Unix
}
