//! Builder strategies.
//!
//! A [`Builder`] turns "compile", "generate documentation", and "stage for
//! execution" into concrete tool invocations for one platform. There is one
//! implementation, [`PlatformBuilder`], parameterised by a static
//! [`PlatformDescriptor`](extbuild_types::PlatformDescriptor).

mod config;
mod platform;
mod staging;
mod toolchain;

pub use config::{BuildEnv, BuilderConfig, DEFAULT_MSBUILD_DIR};
pub use platform::PlatformBuilder;
pub use staging::{DEPLOYMENT_DESCRIPTOR, StagingReport};
pub use toolchain::{msbuild_command, scons_command};

use camino::Utf8PathBuf;
use extbuild_types::{BuildResult, PlatformKind};
use tracing::info;

pub trait Builder {
    fn kind(&self) -> PlatformKind;

    /// 0 = quiet, 1 = normal, 2 = verbose.
    fn verbosity(&self) -> u8;

    /// `<root>/Code/Build/Binaries-<tag>-<mode>`.
    fn binaries_dir(&self) -> Utf8PathBuf;

    /// The host application's compiled plug-in directory for this platform.
    fn plugin_dir(&self) -> Utf8PathBuf;

    /// Documentation generator executable.
    fn doxygen_path(&self) -> Utf8PathBuf;

    /// Environment overlay for compiler invocations.
    fn compile_env(&self) -> BuildEnv;

    fn compile(&self, env: &BuildEnv, clean: bool, concurrency: u32) -> BuildResult<()>;

    fn build_doxygen(&self) -> BuildResult<()>;

    fn prep_to_run(&self) -> BuildResult<StagingReport>;

    /// Compile the extension, running a clean pass first when asked.
    fn build_executable(&self, clean_first: bool, concurrency: u32) -> BuildResult<()> {
        let env = self.compile_env();
        info!(platform = %self.kind(), "building plug-ins");
        if self.verbosity() > 1 {
            info!(env = ?env, "compiler environment");
        }
        if clean_first {
            info!("cleaning previous build output");
            self.compile(&env, true, concurrency)?;
        }
        self.compile(&env, false, concurrency)
    }
}
