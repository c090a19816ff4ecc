//! Clap-free settings for one pipeline run.

use camino::Utf8PathBuf;
use extbuild_types::{BuildMode, PlatformKind, PlatformRequest, Toolchain, VersionScheme};

/// Everything a run needs, already resolved from flags, environment, and
/// configuration file.
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Checkout root.
    pub root: Utf8PathBuf,
    pub dependencies: Option<Utf8PathBuf>,
    pub host_code_dir: Option<Utf8PathBuf>,
    pub mode: BuildMode,
    pub concurrency: u32,
    pub verbosity: u8,

    /// Builder target; `None` picks the host platform.
    pub platform: Option<PlatformKind>,
    /// Windows backend; `None` picks the family default.
    pub toolchain: Option<Toolchain>,
    pub msbuild_dir: Option<Utf8PathBuf>,

    // Version
    pub scheme: VersionScheme,
    pub new_version: Option<String>,

    // Stages
    pub clean: bool,
    pub build_extension: bool,
    pub build_doxygen: bool,
    pub build_sdk: Option<PlatformRequest>,
    pub build_installer: Option<PlatformRequest>,
    pub prep: bool,

    // Packaging
    pub installer_output: Option<Utf8PathBuf>,
    pub unix_build_dir: Option<Utf8PathBuf>,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            root: Utf8PathBuf::from("."),
            dependencies: None,
            host_code_dir: None,
            mode: BuildMode::default(),
            concurrency: 1,
            verbosity: 1,
            platform: None,
            toolchain: None,
            msbuild_dir: None,
            scheme: VersionScheme::None,
            new_version: None,
            clean: false,
            build_extension: false,
            build_doxygen: false,
            build_sdk: None,
            build_installer: None,
            prep: false,
            installer_output: None,
            unix_build_dir: None,
        }
    }
}

impl RunSettings {
    /// Whether the documentation stage runs. The SDK bundles the generated
    /// documentation, so requesting it implies the stage.
    pub fn wants_doxygen(&self) -> bool {
        self.build_doxygen || self.build_sdk.is_some()
    }

    /// Names of the requested stages, in execution order.
    pub fn stages(&self) -> Vec<&'static str> {
        let mut stages = Vec::new();
        if self.scheme != VersionScheme::None {
            stages.push("version");
        }
        if self.build_extension {
            stages.push("compile");
        }
        if self.wants_doxygen() {
            stages.push("doxygen");
        }
        if self.build_sdk.is_some() {
            stages.push("sdk");
        }
        if self.build_installer.is_some() {
            stages.push("installer");
        }
        if self.prep {
            stages.push("prep");
        }
        stages
    }
}
