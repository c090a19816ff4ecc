//! Configuration file loading for extbuild.
//!
//! Discovers and loads `extbuild.toml` from the checkout root.
//! Merges config file settings with CLI arguments (CLI takes precedence).

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use extbuild_types::{BuildMode, PlatformKind, Toolchain};
use fs_err as fs;
use serde::Deserialize;
use tracing::debug;

/// The config file name to search for.
pub const CONFIG_FILE_NAME: &str = "extbuild.toml";

/// Top-level configuration from extbuild.toml.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtbuildConfig {
    pub paths: PathsConfig,
    pub build: BuildConfig,
    pub installer: InstallerConfig,
}

/// Paths section. Relative paths resolve against the checkout root.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    /// Third-party dependency tree.
    pub dependencies: Option<Utf8PathBuf>,

    /// Host application source tree.
    pub host_code_dir: Option<Utf8PathBuf>,

    /// Directory containing msbuild.exe.
    pub msbuild: Option<Utf8PathBuf>,

    /// Unix checkout used when packaging Unix platforms on Windows.
    pub unix_build_dir: Option<Utf8PathBuf>,
}

/// Build section of the config.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    pub mode: Option<BuildMode>,
    pub concurrency: Option<u32>,
    pub toolchain: Option<Toolchain>,
    pub platform: Option<PlatformKind>,
}

/// Installer section of the config.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InstallerConfig {
    /// Output archive path.
    pub output: Option<Utf8PathBuf>,
}

/// Discover the extbuild.toml config file.
///
/// Returns `None` if the checkout root has no config file.
pub fn discover_config(root: &Utf8Path) -> Option<Utf8PathBuf> {
    let config_path = root.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        debug!("found config file at {}", config_path);
        Some(config_path)
    } else {
        debug!("no config file found at {}", config_path);
        None
    }
}

/// Load and parse an extbuild.toml config file.
pub fn load_config(path: &Utf8Path) -> anyhow::Result<ExtbuildConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config file {}", path))?;
    parse_config(&contents).with_context(|| format!("parse config file {}", path))
}

/// Parse a config file from a string.
pub fn parse_config(contents: &str) -> anyhow::Result<ExtbuildConfig> {
    let config: ExtbuildConfig = toml::from_str(contents).context("invalid TOML")?;
    Ok(config)
}

/// Load config from the checkout root, or return default if not found.
pub fn load_or_default(root: &Utf8Path) -> anyhow::Result<ExtbuildConfig> {
    match discover_config(root) {
        Some(path) => load_config(&path),
        None => Ok(ExtbuildConfig::default()),
    }
}

/// Values given on the command line (or through its environment fallbacks).
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub dependencies: Option<Utf8PathBuf>,
    pub host_code_dir: Option<Utf8PathBuf>,
    pub msbuild: Option<Utf8PathBuf>,
    pub unix_build_dir: Option<Utf8PathBuf>,
    pub installer_output: Option<Utf8PathBuf>,
    pub mode: Option<BuildMode>,
    pub concurrency: Option<u32>,
    pub toolchain: Option<Toolchain>,
    pub platform: Option<PlatformKind>,
}

/// Merged configuration combining config file and CLI arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedConfig {
    pub dependencies: Option<Utf8PathBuf>,
    pub host_code_dir: Option<Utf8PathBuf>,
    pub msbuild: Option<Utf8PathBuf>,
    pub unix_build_dir: Option<Utf8PathBuf>,
    pub installer_output: Option<Utf8PathBuf>,
    pub mode: BuildMode,
    pub concurrency: u32,
    pub toolchain: Option<Toolchain>,
    pub platform: Option<PlatformKind>,
}

/// Builder for merging config file with CLI arguments.
pub struct ConfigMerger {
    config: ExtbuildConfig,
}

impl ConfigMerger {
    /// Create a new merger from a loaded config.
    pub fn new(config: ExtbuildConfig) -> Self {
        Self { config }
    }

    /// Merge with build command CLI arguments.
    ///
    /// Each CLI value replaces the config file value; config file paths are
    /// anchored at `root`.
    pub fn merge_build_args(self, root: &Utf8Path, cli: CliOverrides) -> MergedConfig {
        let anchored = |path: Option<Utf8PathBuf>| path.map(|p| root.join(p));
        let paths = self.config.paths;
        let build = self.config.build;

        MergedConfig {
            dependencies: cli.dependencies.or_else(|| anchored(paths.dependencies)),
            host_code_dir: cli.host_code_dir.or_else(|| anchored(paths.host_code_dir)),
            msbuild: cli.msbuild.or_else(|| anchored(paths.msbuild)),
            unix_build_dir: cli.unix_build_dir.or_else(|| anchored(paths.unix_build_dir)),
            installer_output: cli
                .installer_output
                .or_else(|| anchored(self.config.installer.output)),
            mode: cli.mode.or(build.mode).unwrap_or_default(),
            concurrency: cli.concurrency.or(build.concurrency).unwrap_or(1),
            toolchain: cli.toolchain.or(build.toolchain),
            platform: cli.platform.or(build.platform),
        }
    }
}
