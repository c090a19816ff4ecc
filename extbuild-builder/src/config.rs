use camino::{Utf8Path, Utf8PathBuf};
use extbuild_types::{BuildError, BuildMode, BuildResult, Toolchain};
use std::collections::BTreeMap;

/// Environment overlay handed to a child process.
pub type BuildEnv = BTreeMap<String, String>;

/// Framework directory holding `msbuild.exe` on a stock Windows install.
pub const DEFAULT_MSBUILD_DIR: &str = r"C:\Windows\Microsoft.NET\Framework\v4.0.30319";

/// Immutable per-run configuration owned by one builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuilderConfig {
    /// Root of the extension checkout (holds `Code/`, `Release/`, `Installer/`).
    pub root: Utf8PathBuf,
    /// Root of the third-party dependency tree.
    pub dependencies: Utf8PathBuf,
    /// Root of the host application's source tree.
    pub host_code_dir: Utf8PathBuf,
    /// Root of the host application's build output, normally `<host>/Build`.
    pub host_build_dir: Utf8PathBuf,
    pub mode: BuildMode,
    /// Job count passed through to the toolchain.
    pub concurrency: u32,
    /// 0 = quiet, 1 = normal, 2 = verbose.
    pub verbosity: u8,
    /// Backend for Windows builders; Unix builders always use scons.
    pub toolchain: Toolchain,
    /// Directory containing `msbuild.exe`.
    pub msbuild_dir: Option<Utf8PathBuf>,
}

impl BuilderConfig {
    pub fn new(
        root: impl Into<Utf8PathBuf>,
        dependencies: impl Into<Utf8PathBuf>,
        host_code_dir: impl Into<Utf8PathBuf>,
    ) -> Self {
        let host_code_dir = host_code_dir.into();
        Self {
            root: root.into(),
            dependencies: dependencies.into(),
            host_build_dir: host_code_dir.join("Build"),
            host_code_dir,
            mode: BuildMode::default(),
            concurrency: 1,
            verbosity: 1,
            toolchain: Toolchain::Scons,
            msbuild_dir: None,
        }
    }

    /// `<root>/Code`.
    pub fn code_dir(&self) -> Utf8PathBuf {
        self.root.join("Code")
    }

    /// `<root>/Code/Build`.
    pub fn build_dir(&self) -> Utf8PathBuf {
        self.code_dir().join("Build")
    }

    /// Check the externally supplied directories before anything runs.
    pub fn validate(&self) -> BuildResult<()> {
        require_dir(&self.dependencies, "dependencies path")?;
        require_dir(&self.host_code_dir, "host application code dir")?;
        require_dir(&self.host_build_dir, "host application build directory")?;
        Ok(())
    }
}

pub(crate) fn require_dir(path: &Utf8Path, what: &str) -> BuildResult<()> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(BuildError::config(format!("{what} {path} does not exist")))
    }
}
