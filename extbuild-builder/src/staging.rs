//! Staging compiled output into the layout the host application loads from.

use anyhow::Context;
use camino::Utf8Path;
use extbuild_fs::EntryFilter;
use extbuild_types::{BuildError, BuildResult};
use fs_err as fs;
use tracing::{debug, info};

/// Fixed deployment descriptor written to `Bin/spectral.dep`.
pub const DEPLOYMENT_DESCRIPTOR: &str = "!depV1 { deployment: { \
AppHomePath: $E(OPTICKS_HOME), \
AdditionalDefaultPath: ../../../../Release/DefaultSettings, \
UserConfigPath: ../../ApplicationUserSettings, \
PlugInPath: ../PlugIns } } ";

const DESCRIPTOR_FILE: &str = "spectral.dep";

/// What a staging pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StagingReport {
    pub plugins_copied: usize,
    pub descriptor_written: bool,
    pub user_settings_created: bool,
}

/// Stage host plug-ins and runtime scaffolding.
///
/// - copies files from `host_plugins` matching `suffixes` into
///   `<binaries>/PlugIns`, replacing same-named files
/// - writes `<binaries>/Bin/spectral.dep` only if it is absent
/// - creates `user_settings` if it is absent
pub(crate) fn stage(
    host_plugins: &Utf8Path,
    binaries: &Utf8Path,
    user_settings: &Utf8Path,
    suffixes: &[&str],
) -> BuildResult<StagingReport> {
    if !host_plugins.is_dir() {
        return Err(BuildError::config(format!(
            "host application plug-in directory {host_plugins} does not exist"
        )));
    }

    let mut report = StagingReport::default();
    let staged_plugins = binaries.join("PlugIns");
    report.plugins_copied = extbuild_fs::copy_tree(
        host_plugins,
        &staged_plugins,
        &EntryFilter::with_suffixes(suffixes),
    )?;
    info!(from = %host_plugins, to = %staged_plugins, count = report.plugins_copied, "staged host plug-ins");

    let bin = binaries.join("Bin");
    extbuild_fs::ensure_dir(&bin)?;
    let descriptor = bin.join(DESCRIPTOR_FILE);
    if descriptor.exists() {
        debug!(path = %descriptor, "deployment descriptor already present");
    } else {
        fs::write(&descriptor, DEPLOYMENT_DESCRIPTOR)
            .with_context(|| format!("write {descriptor}"))?;
        info!(path = %descriptor, "wrote deployment descriptor");
        report.descriptor_written = true;
    }

    report.user_settings_created = extbuild_fs::ensure_dir(user_settings)?;
    if report.user_settings_created {
        info!(path = %user_settings, "created user settings directory");
    }
    Ok(report)
}
