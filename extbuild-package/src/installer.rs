use crate::PackageOutcome;
use crate::archive::ArchiveFormat;
use crate::compat::host_compat_range;
use crate::help::stage_help;
use crate::manifest::{self, HELP_ARCHIVE, HELP_DEST, HELP_STAGING, INSTALLER_FILES};
use crate::plan::ArchivePlan;
use crate::template::render_template;
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use extbuild_fs::EntryFilter;
use extbuild_types::{BuildError, BuildResult, PlatformFamily, PlatformId};
use extbuild_version::{
    HOST_VERSION_KEY, LONG_NAME_KEY, NAME_KEY, VERSION_NUMBER_KEY, VersionHeaderFile,
};
use fs_err as fs;
use std::collections::BTreeMap;
use tracing::info;

#[derive(Debug, Clone)]
pub struct InstallerRequest<'a> {
    /// Checkout root.
    pub root: &'a Utf8Path,
    /// Host application source root, for its version header.
    pub host_code_dir: &'a Utf8Path,
    pub platforms: &'a [PlatformId],
    /// Output archive; relative paths resolve against `root`.
    pub output: Option<&'a Utf8Path>,
    /// Family of the machine doing the packaging.
    pub host: PlatformFamily,
    /// Checkout holding Unix build output when packaging from Windows.
    pub unix_build_dir: Option<&'a Utf8Path>,
}

impl InstallerRequest<'_> {
    pub fn output_path(&self) -> Utf8PathBuf {
        match self.output {
            Some(path) => self.root.join(path),
            None => self.root.join(manifest::INSTALLER_DEFAULT_OUTPUT),
        }
    }

    /// Checkout root that holds the build output for `id`.
    fn prefix_for(&self, id: &PlatformId) -> BuildResult<&Utf8Path> {
        if !manifest::needs_unix_checkout(id, self.host) {
            return Ok(self.root);
        }
        match self.unix_build_dir {
            Some(dir) if dir.is_dir() => Ok(dir),
            _ => Err(BuildError::config(format!(
                "packaging {id} on Windows requires --unix-build-dir pointing at an existing Unix checkout"
            ))),
        }
    }
}

/// `<aebl:targetPlatform>` lines, one per platform.
pub fn target_platforms_xml(platforms: &[PlatformId]) -> String {
    platforms
        .iter()
        .map(|p| format!("<aebl:targetPlatform>{p}</aebl:targetPlatform>\n"))
        .collect()
}

/// Values substituted into the installer manifest template.
pub fn installer_metadata(
    root: &Utf8Path,
    host_code_dir: &Utf8Path,
    platforms: &[PlatformId],
) -> BuildResult<BTreeMap<String, String>> {
    let ours = VersionHeaderFile::extension(root).load()?;
    let host = VersionHeaderFile::host(host_code_dir).load()?;
    let compat = host_compat_range(host.require_string(HOST_VERSION_KEY)?);

    Ok(BTreeMap::from([
        (
            "version".to_string(),
            ours.require_string(VERSION_NUMBER_KEY)?.to_string(),
        ),
        ("name".to_string(), ours.require_string(NAME_KEY)?.to_string()),
        (
            "description".to_string(),
            ours.require_string(LONG_NAME_KEY)?.to_string(),
        ),
        ("target_platforms".to_string(), target_platforms_xml(platforms)),
        ("opticks_min_version".to_string(), compat.min),
        ("opticks_max_version".to_string(), compat.max),
    ]))
}

/// Everything the installer archive will contain, in write order.
///
/// `help_dir` is the staged help tree.
pub fn plan_installer(
    req: &InstallerRequest<'_>,
    manifest_body: String,
    help_dir: &Utf8Path,
) -> BuildResult<ArchivePlan> {
    let mut plan = ArchivePlan::new();
    plan.bytes(manifest::INSTALLER_MANIFEST_ENTRY, manifest_body);
    for file in INSTALLER_FILES {
        plan.file(req.root.join(file.src), file.dest);
    }
    plan.tree(help_dir, HELP_DEST, &EntryFilter::ALL)?;

    for id in req.platforms {
        info!(platform = %id, "adding installer plug-ins");
        let plugins = req
            .prefix_for(id)?
            .join(manifest::binaries_dir(id))
            .join("PlugIns");
        let dest = manifest::installer_plugin_dest(id);
        let ext = id.kind().descriptor().plugin_extension;
        for name in manifest::installer_plugins(id.kind()) {
            let file = format!("{name}.{ext}");
            plan.file(plugins.join(&file), format!("{dest}/{file}"));
        }
    }
    Ok(plan)
}

/// Assemble the installer bundle.
pub fn build_installer(req: &InstallerRequest<'_>) -> BuildResult<PackageOutcome> {
    if req.platforms.is_empty() {
        return Err(BuildError::config(
            "the installer needs at least one platform; use 'all' or a comma list",
        ));
    }
    for id in req.platforms {
        req.prefix_for(id)?;
    }

    let values = installer_metadata(req.root, req.host_code_dir, req.platforms)?;
    let template_path = req.root.join(manifest::INSTALLER_TEMPLATE);
    let template = fs::read_to_string(&template_path)
        .with_context(|| format!("read manifest template {template_path}"))?;
    let body = render_template(&template, &values)?;

    let help_dir = stage_help(
        &req.root.join(HELP_ARCHIVE),
        &req.root.join(HELP_STAGING),
    )?;

    let plan = plan_installer(req, body, &help_dir)?;
    let path = req.output_path();
    let sha256 = plan.write(&path, ArchiveFormat::Zip)?;
    info!(path = %path, entries = plan.len(), sha256 = %sha256, "installer bundle written");
    Ok(PackageOutcome {
        path,
        entries: plan.len(),
        sha256,
    })
}
