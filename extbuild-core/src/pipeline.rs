//! The build pipeline, extracted from the CLI.
//!
//! Stages run in a fixed order and the first failure aborts the rest:
//! version update, compile, documentation, SDK, installer, staging.

use crate::ports::{Clock, ProcessRunner, RevisionSource};
use crate::settings::RunSettings;
use camino::{Utf8Path, Utf8PathBuf};
use extbuild_builder::{Builder, BuilderConfig, DEFAULT_MSBUILD_DIR, PlatformBuilder, StagingReport};
use extbuild_package::{
    ArchiveFormat, InstallerRequest, PackageOutcome, SdkRequest, build_installer, build_sdk,
};
use extbuild_types::{
    BuildError, BuildResult, PlatformFamily, PlatformKind, Toolchain, VersionScheme,
};
use extbuild_version::{ResolveContext, VERSION_NUMBER_KEY, VersionHeaderFile, VersionUpdate, resolve};
use tracing::{debug, info};

/// Version header change made by the first stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionChange {
    pub previous: String,
    pub update: VersionUpdate,
}

/// Outcome of `run_pipeline`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub platform: PlatformKind,
    pub version: Option<VersionChange>,
    /// SDK first, then installer, when requested.
    pub packages: Vec<PackageOutcome>,
    pub staging: Option<StagingReport>,
}

/// Run every requested stage for one checkout.
///
/// All externally supplied paths are checked before the first stage, so a
/// misconfigured run fails without touching the version header or creating
/// any archive.
pub fn run_pipeline(
    settings: &RunSettings,
    runner: &dyn ProcessRunner,
    revisions: &dyn RevisionSource,
    clock: &dyn Clock,
) -> BuildResult<RunOutcome> {
    let platform = match settings.platform {
        Some(kind) => kind,
        None => PlatformKind::host().ok_or_else(|| {
            BuildError::config(format!(
                "no builder for {}/{}; pass --platform",
                std::env::consts::OS,
                std::env::consts::ARCH
            ))
        })?,
    };
    let config = builder_config(settings, platform)?;
    config.validate()?;
    if settings.build_extension
        && let Some(dir) = &config.msbuild_dir
        && !dir.is_dir()
    {
        return Err(BuildError::config(format!(
            "MSBuild directory {dir} does not exist"
        )));
    }
    debug!(platform = %platform, stages = ?settings.stages(), "starting pipeline");

    let builder = PlatformBuilder::new(platform, config, runner);
    let mut outcome = RunOutcome {
        platform,
        version: None,
        packages: Vec::new(),
        staging: None,
    };

    outcome.version = update_version(settings, revisions, clock)?;

    if settings.build_extension {
        stage("compile", || {
            builder.build_executable(settings.clean, settings.concurrency)
        })?;
    }

    if settings.wants_doxygen() {
        stage("doxygen", || builder.build_doxygen())?;
    }

    if let Some(request) = &settings.build_sdk {
        let platforms = request.sdk_platforms(platform);
        let sdk = stage("sdk", || {
            build_sdk(&SdkRequest {
                root: &settings.root,
                platforms: &platforms,
                format: ArchiveFormat::sdk_for(platform.family()),
            })
        })?;
        outcome.packages.push(sdk);
    }

    if let Some(request) = &settings.build_installer {
        let platforms = request.installer_platforms();
        let host_code_dir = builder.config().host_code_dir.clone();
        let installer = stage("installer", || {
            build_installer(&InstallerRequest {
                root: &settings.root,
                host_code_dir: &host_code_dir,
                platforms: &platforms,
                output: settings.installer_output.as_deref(),
                host: platform.family(),
                unix_build_dir: settings.unix_build_dir.as_deref(),
            })
        })?;
        outcome.packages.push(installer);
    }

    if settings.prep {
        outcome.staging = Some(stage("prep", || builder.prep_to_run())?);
    }

    Ok(outcome)
}

fn stage<T>(name: &str, body: impl FnOnce() -> BuildResult<T>) -> BuildResult<T> {
    debug!(stage = name, "stage started");
    let result = body()?;
    debug!(stage = name, "stage finished");
    Ok(result)
}

fn require_path<'a>(
    path: &'a Option<Utf8PathBuf>,
    what: &str,
    flag: &str,
) -> BuildResult<&'a Utf8Path> {
    path.as_deref().ok_or_else(|| {
        BuildError::config(format!("{what} is required; pass {flag} or set it in extbuild.toml"))
    })
}

fn builder_config(settings: &RunSettings, platform: PlatformKind) -> BuildResult<BuilderConfig> {
    let dependencies = require_path(
        &settings.dependencies,
        "the dependencies path",
        "--dependencies",
    )?;
    let host_code_dir = require_path(
        &settings.host_code_dir,
        "the host application code dir",
        "--host-code-dir",
    )?;

    let mut config = BuilderConfig::new(settings.root.clone(), dependencies, host_code_dir);
    config.mode = settings.mode;
    config.concurrency = settings.concurrency.max(1);
    config.verbosity = settings.verbosity;
    config.toolchain = settings
        .toolchain
        .unwrap_or_else(|| Toolchain::default_for(platform.family()));
    if platform.family() == PlatformFamily::Windows && config.toolchain == Toolchain::MsBuild {
        config.msbuild_dir = Some(
            settings
                .msbuild_dir
                .clone()
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_MSBUILD_DIR)),
        );
    }
    Ok(config)
}

fn update_version(
    settings: &RunSettings,
    revisions: &dyn RevisionSource,
    clock: &dyn Clock,
) -> BuildResult<Option<VersionChange>> {
    if settings.scheme == VersionScheme::None {
        return Ok(None);
    }
    let file = VersionHeaderFile::extension(&settings.root);
    stage("version", || {
        let mut header = file.load()?;
        let previous = header.require_string(VERSION_NUMBER_KEY)?.to_string();
        let ctx = ResolveContext {
            today: clock.today(),
            revisions,
        };
        let Some(update) = resolve(
            &previous,
            settings.scheme,
            settings.new_version.as_deref(),
            &ctx,
        )?
        else {
            return Ok(None);
        };

        update.apply_to(&mut header);
        if header.is_modified() {
            file.commit(&header)?;
        } else {
            debug!(version = %update.version, "version header already up to date");
        }
        info!(
            scheme = %settings.scheme,
            from = %previous,
            to = %update.version,
            production = update.production,
            "updated version"
        );
        Ok(Some(VersionChange { previous, update }))
    })
}
