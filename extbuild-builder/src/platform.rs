use crate::config::{BuildEnv, BuilderConfig};
use crate::staging::{self, StagingReport};
use crate::toolchain::{msbuild_command, scons_command};
use crate::Builder;
use camino::Utf8PathBuf;
use extbuild_process::{CommandSpec, ProcessRunner, run_checked};
use extbuild_types::{
    BuildError, BuildResult, PlatformDescriptor, PlatformFamily, PlatformKind, Toolchain,
};
use extbuild_version::{VERSION_NUMBER_KEY, VersionHeaderFile};
use tracing::{debug, info};

/// A builder for one platform, driven entirely by its descriptor.
pub struct PlatformBuilder<'a> {
    desc: &'static PlatformDescriptor,
    config: BuilderConfig,
    runner: &'a dyn ProcessRunner,
}

impl<'a> PlatformBuilder<'a> {
    pub fn new(kind: PlatformKind, config: BuilderConfig, runner: &'a dyn ProcessRunner) -> Self {
        Self {
            desc: kind.descriptor(),
            config,
            runner,
        }
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    pub fn descriptor(&self) -> &'static PlatformDescriptor {
        self.desc
    }

    /// `Binaries-<tag>-<mode>`.
    fn binaries_dir_name(&self) -> String {
        format!("Binaries-{}-{}", self.desc.tag, self.config.mode)
    }

    /// First candidate accepted by `exists`, otherwise the last candidate.
    fn first_existing(
        &self,
        candidates: &[&str],
        exists: impl Fn(&Utf8PathBuf) -> bool,
    ) -> Utf8PathBuf {
        let mut fallback = None;
        for candidate in candidates {
            let path = self.config.dependencies.join(candidate);
            if exists(&path) {
                return path;
            }
            fallback = Some(path);
        }
        fallback.unwrap_or_else(|| self.config.dependencies.clone())
    }

    /// Directory handed to the documentation generator for graph rendering.
    pub fn graphviz_dir(&self) -> Utf8PathBuf {
        let dot = self.desc.dot_executable;
        self.first_existing(self.desc.graphviz_candidates, |dir| dir.join(dot).exists())
    }

    /// `<root>/Code/Build/DoxygenOutput`.
    pub fn doxygen_output_dir(&self) -> Utf8PathBuf {
        self.config.build_dir().join("DoxygenOutput")
    }

    /// Environment overlay read by the documentation generator.
    pub fn doxygen_env(&self, version: &str) -> BuildEnv {
        let code = self.config.code_dir();
        BuildEnv::from([
            ("SOURCE".to_string(), code.to_string()),
            ("OUTPUT_DIR".to_string(), self.doxygen_output_dir().to_string()),
            ("CONFIG_DIR".to_string(), code.join("ApiDocs").to_string()),
            ("DOT_DIR".to_string(), self.graphviz_dir().to_string()),
            ("VERSION".to_string(), version.to_string()),
        ])
    }

    fn compile_command(
        &self,
        env: &BuildEnv,
        clean: bool,
        concurrency: u32,
    ) -> BuildResult<CommandSpec> {
        let cfg = &self.config;
        match (self.desc.family, cfg.toolchain) {
            (PlatformFamily::Windows, Toolchain::MsBuild) => {
                let dir = cfg.msbuild_dir.as_deref().ok_or_else(|| {
                    BuildError::config("an MSBuild directory is required for the msbuild toolchain")
                })?;
                msbuild_command(self.desc, &cfg.root, dir, cfg.mode, env, clean, concurrency)
            }
            _ => Ok(scons_command(
                self.desc,
                &cfg.root,
                cfg.mode,
                env,
                clean,
                concurrency,
            )),
        }
    }
}

impl Builder for PlatformBuilder<'_> {
    fn kind(&self) -> PlatformKind {
        self.desc.kind
    }

    fn verbosity(&self) -> u8 {
        self.config.verbosity
    }

    fn binaries_dir(&self) -> Utf8PathBuf {
        self.config.build_dir().join(self.binaries_dir_name())
    }

    fn plugin_dir(&self) -> Utf8PathBuf {
        self.config
            .host_build_dir
            .join(self.binaries_dir_name())
            .join("PlugIns")
    }

    fn doxygen_path(&self) -> Utf8PathBuf {
        self.first_existing(self.desc.doxygen_candidates, |p| p.exists())
    }

    fn compile_env(&self) -> BuildEnv {
        BuildEnv::from([
            (
                "SPECTRALDEPENDENCIES".to_string(),
                self.config.dependencies.to_string(),
            ),
            (
                "OPTICKS_CODE_DIR".to_string(),
                self.config.host_code_dir.to_string(),
            ),
        ])
    }

    fn compile(&self, env: &BuildEnv, clean: bool, concurrency: u32) -> BuildResult<()> {
        let cmd = self.compile_command(env, clean, concurrency)?;
        debug!(command = %cmd.display(), clean, "compiling");
        run_checked(self.runner, &cmd)
    }

    fn build_doxygen(&self) -> BuildResult<()> {
        let version = VersionHeaderFile::extension(&self.config.root).load()?;
        let version = version.require_string(VERSION_NUMBER_KEY)?.to_string();

        let doxygen = self.doxygen_path();
        if !doxygen.is_file() {
            let searched: Vec<String> = self
                .desc
                .doxygen_candidates
                .iter()
                .map(|c| self.config.dependencies.join(c).into_string())
                .collect();
            return Err(BuildError::config(format!(
                "doxygen not found; searched {}",
                searched.join(", ")
            )));
        }

        let output = self.doxygen_output_dir();
        extbuild_fs::reset_dir(&output)?;

        let env = self.doxygen_env(&version);
        let config_file = self.config.code_dir().join("ApiDocs").join("application.dox");
        let cmd = CommandSpec::new(doxygen.into_string())
            .arg(config_file.into_string())
            .cwd(self.config.root.clone())
            .envs(&env);
        info!(output = %output, version = %version, "generating API documentation");
        run_checked(self.runner, &cmd)
    }

    fn prep_to_run(&self) -> BuildResult<StagingReport> {
        staging::stage(
            &self.plugin_dir(),
            &self.binaries_dir(),
            &self.config.build_dir().join("ApplicationUserSettings"),
            self.desc.plugin_suffixes,
        )
    }
}
