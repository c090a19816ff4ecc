//! Platform descriptors and installer platform identifiers.
//!
//! Each supported platform is a static [`PlatformDescriptor`] record. Builders
//! and packagers derive every platform-specific path from these records rather
//! than from per-platform types.

use crate::error::{BuildError, BuildResult};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Operating-system family of a platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformFamily {
    Windows,
    Unix,
}

/// Identity of a builder variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformKind {
    Win32,
    Win64,
    Solaris,
    Linux,
}

/// Static description of one platform.
#[derive(Debug)]
pub struct PlatformDescriptor {
    pub kind: PlatformKind,
    pub family: PlatformFamily,
    /// Tag used in `Binaries-<tag>-<mode>` directory names.
    pub tag: &'static str,
    /// Bit width passed to the toolchain (Windows only).
    pub bits: Option<u8>,
    /// Leading component of installer identifiers for this platform.
    pub installer_prefix: &'static str,
    /// Suffixes of host plug-in files copied when staging for execution.
    pub plugin_suffixes: &'static [&'static str],
    /// Extension of plug-in binaries bundled into the installer.
    pub plugin_extension: &'static str,
    /// Static library shipped in the SDK.
    pub sdk_library: &'static str,
    /// Documentation-generator locations, relative to the dependency tree
    /// unless absolute; the first existing one wins, otherwise the last.
    pub doxygen_candidates: &'static [&'static str],
    /// Graph-rendering tool directories, searched the same way.
    pub graphviz_candidates: &'static [&'static str],
    /// File name of the graph-rendering executable.
    pub dot_executable: &'static str,
}

pub static PLATFORMS: &[PlatformDescriptor] = &[
    PlatformDescriptor {
        kind: PlatformKind::Win32,
        family: PlatformFamily::Windows,
        tag: "Win32",
        bits: Some(32),
        installer_prefix: "win32",
        plugin_suffixes: &[".dll", ".exe"],
        plugin_extension: "dll",
        sdk_library: "SpectralUtilities.lib",
        doxygen_candidates: &["32/bin/doxygen.exe", "64/bin/doxygen.exe"],
        graphviz_candidates: &["64/tools/graphviz/bin", "32/tools/graphviz/bin"],
        dot_executable: "dot.exe",
    },
    PlatformDescriptor {
        kind: PlatformKind::Win64,
        family: PlatformFamily::Windows,
        tag: "x64",
        bits: Some(64),
        installer_prefix: "win64",
        plugin_suffixes: &[".dll", ".exe"],
        plugin_extension: "dll",
        sdk_library: "SpectralUtilities.lib",
        doxygen_candidates: &["32/bin/doxygen.exe", "64/bin/doxygen.exe"],
        graphviz_candidates: &["64/tools/graphviz/bin", "32/tools/graphviz/bin"],
        dot_executable: "dot.exe",
    },
    PlatformDescriptor {
        kind: PlatformKind::Solaris,
        family: PlatformFamily::Unix,
        tag: "solaris-sparc",
        bits: None,
        installer_prefix: "solaris",
        plugin_suffixes: &[".so"],
        plugin_extension: "so",
        sdk_library: "libSpectralUtilities.a",
        doxygen_candidates: &["64/bin/doxygen"],
        graphviz_candidates: &["64/tools/graphviz/bin", "32/tools/graphviz/bin"],
        dot_executable: "dot",
    },
    PlatformDescriptor {
        kind: PlatformKind::Linux,
        family: PlatformFamily::Unix,
        tag: "linux-x86_64",
        bits: None,
        installer_prefix: "linux",
        plugin_suffixes: &[".so"],
        plugin_extension: "so",
        sdk_library: "libSpectralUtilities.a",
        doxygen_candidates: &["/usr/bin/doxygen"],
        graphviz_candidates: &["/usr/bin"],
        dot_executable: "dot",
    },
];

impl PlatformKind {
    pub fn descriptor(self) -> &'static PlatformDescriptor {
        // PLATFORMS holds exactly one entry per kind, in declaration order.
        match self {
            PlatformKind::Win32 => &PLATFORMS[0],
            PlatformKind::Win64 => &PLATFORMS[1],
            PlatformKind::Solaris => &PLATFORMS[2],
            PlatformKind::Linux => &PLATFORMS[3],
        }
    }

    pub fn family(self) -> PlatformFamily {
        self.descriptor().family
    }

    pub fn as_str(self) -> &'static str {
        self.descriptor().installer_prefix
    }

    /// The builder variant for the machine this process runs on.
    pub fn host() -> Option<Self> {
        Self::for_target(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// The builder variant for an OS/architecture pair as reported by
    /// `std::env::consts`.
    pub fn for_target(os: &str, arch: &str) -> Option<Self> {
        match os {
            "windows" if arch == "x86" => Some(PlatformKind::Win32),
            "windows" => Some(PlatformKind::Win64),
            "linux" => Some(PlatformKind::Linux),
            "solaris" | "illumos" => Some(PlatformKind::Solaris),
            _ => None,
        }
    }
}

impl fmt::Display for PlatformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlatformKind {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "win32" => Ok(PlatformKind::Win32),
            "win64" => Ok(PlatformKind::Win64),
            "solaris" => Ok(PlatformKind::Solaris),
            "linux" => Ok(PlatformKind::Linux),
            other => Err(BuildError::config(format!(
                "unknown platform '{other}'; expected one of win32, win64, solaris, linux"
            ))),
        }
    }
}

/// Debug or release build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    Debug,
    #[default]
    Release,
}

impl BuildMode {
    pub fn as_str(self) -> &'static str {
        match self {
            BuildMode::Debug => "debug",
            BuildMode::Release => "release",
        }
    }

    pub fn is_debug(self) -> bool {
        matches!(self, BuildMode::Debug)
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildMode {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "debug" => Ok(BuildMode::Debug),
            "release" => Ok(BuildMode::Release),
            other => Err(BuildError::config(format!(
                "unknown build mode '{other}'; expected debug or release"
            ))),
        }
    }
}

/// Toolchain backend used to compile on Windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Toolchain {
    /// Project-file based build through an MSBuild installation.
    MsBuild,
    /// Scripted build through scons (the only backend on Unix).
    Scons,
}

impl Toolchain {
    /// Default backend for a host family.
    pub fn default_for(family: PlatformFamily) -> Self {
        match family {
            PlatformFamily::Windows => Toolchain::MsBuild,
            PlatformFamily::Unix => Toolchain::Scons,
        }
    }
}

impl FromStr for Toolchain {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "msbuild" => Ok(Toolchain::MsBuild),
            "scons" => Ok(Toolchain::Scons),
            other => Err(BuildError::config(format!(
                "unknown toolchain '{other}'; expected msbuild or scons"
            ))),
        }
    }
}

/// Short names accepted on the command line and the identifiers they expand to.
pub static PLATFORM_MAPPINGS: &[(&str, &str)] = &[
    ("win32", "win32-x86-msvc10.0-release"),
    ("win32-debug", "win32-x86-msvc10.0-debug"),
    ("win64", "win64-x86-msvc10.0-release"),
    ("win64-debug", "win64-x86-msvc10.0-debug"),
    ("solaris", "solaris-sparc-studio12-release"),
    ("solaris-debug", "solaris-sparc-studio12-debug"),
    ("linux", "linux-x86_64-gcc4-release"),
    ("linux-debug", "linux-x86_64-gcc4-debug"),
];

/// A validated installer platform identifier such as `win64-x86-msvc10.0-release`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlatformId {
    id: String,
    kind: PlatformKind,
    mode: BuildMode,
}

impl PlatformId {
    pub fn as_str(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> PlatformKind {
        self.kind
    }

    pub fn mode(&self) -> BuildMode {
        self.mode
    }

    pub fn family(&self) -> PlatformFamily {
        self.kind.family()
    }

    /// `Binaries-<tag>-<mode>` directory name holding this platform's output.
    pub fn binaries_dir_name(&self) -> String {
        format!("Binaries-{}-{}", self.kind.descriptor().tag, self.mode)
    }

    /// Every identifier from the short-name table, in table order.
    pub fn all() -> Vec<PlatformId> {
        PLATFORM_MAPPINGS
            .iter()
            .filter_map(|(_, id)| id.parse().ok())
            .collect()
    }
}

impl fmt::Display for PlatformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

impl FromStr for PlatformId {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let id = PLATFORM_MAPPINGS
            .iter()
            .find(|(short, _)| *short == s)
            .map(|(_, full)| *full)
            .unwrap_or(s);

        let parts: Vec<&str> = id.split('-').collect();
        if parts.len() < 2 {
            return Err(BuildError::config(format!("unknown installer platform '{s}'")));
        }
        let kind = match parts[0] {
            "win32" => PlatformKind::Win32,
            "win64" => PlatformKind::Win64,
            "solaris" => PlatformKind::Solaris,
            "linux" => PlatformKind::Linux,
            _ => {
                return Err(BuildError::config(format!(
                    "unknown installer platform '{s}'"
                )));
            }
        };
        let mode = match parts[parts.len() - 1] {
            "release" => BuildMode::Release,
            "debug" => BuildMode::Debug,
            _ => {
                return Err(BuildError::config(format!(
                    "installer platform '{s}' must end in -release or -debug"
                )));
            }
        };

        Ok(PlatformId {
            id: id.to_string(),
            kind,
            mode,
        })
    }
}

/// A platform selection from the command line: `all` or a comma list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformRequest {
    All,
    Only(Vec<PlatformId>),
}

impl PlatformRequest {
    /// Platforms for an installer bundle: `all` means every identifier.
    pub fn installer_platforms(&self) -> Vec<PlatformId> {
        match self {
            PlatformRequest::All => PlatformId::all(),
            PlatformRequest::Only(ids) => ids.clone(),
        }
    }

    /// Platforms for an SDK: `all` means every identifier of the given family
    /// and variant prefix.
    pub fn sdk_platforms(&self, builder: PlatformKind) -> Vec<PlatformId> {
        match self {
            PlatformRequest::All => {
                let family = builder.family();
                PlatformId::all()
                    .into_iter()
                    .filter(|p| match family {
                        PlatformFamily::Windows => p.family() == PlatformFamily::Windows,
                        PlatformFamily::Unix => p.kind() == builder,
                    })
                    .collect()
            }
            PlatformRequest::Only(ids) => ids.clone(),
        }
    }
}

impl FromStr for PlatformRequest {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "all" {
            return Ok(PlatformRequest::All);
        }
        // A platform named twice, by short name or full id, is kept once.
        let mut ids: Vec<PlatformId> = Vec::new();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let id: PlatformId = part.parse()?;
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        Ok(PlatformRequest::Only(ids))
    }
}
