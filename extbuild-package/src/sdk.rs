use crate::PackageOutcome;
use crate::archive::ArchiveFormat;
use crate::manifest::{self, SDK_FILES, SDK_OUTPUT_STEM, SDK_TREES, SDK_WINDOWS_TREES, TreeEntry};
use crate::plan::ArchivePlan;
use camino::{Utf8Path, Utf8PathBuf};
use extbuild_fs::EntryFilter;
use extbuild_types::{BuildResult, PlatformFamily, PlatformId};
use tracing::info;

#[derive(Debug, Clone)]
pub struct SdkRequest<'a> {
    /// Checkout root.
    pub root: &'a Utf8Path,
    /// Platforms whose libraries are bundled; may be empty.
    pub platforms: &'a [PlatformId],
    pub format: ArchiveFormat,
}

impl SdkRequest<'_> {
    pub fn output_path(&self) -> Utf8PathBuf {
        self.root
            .join(format!("{SDK_OUTPUT_STEM}.{}", self.format.extension()))
    }
}

fn add_tree(plan: &mut ArchivePlan, root: &Utf8Path, tree: &TreeEntry) -> BuildResult<()> {
    let filter = EntryFilter {
        suffixes: tree.suffixes,
        skip: tree.skip,
    };
    plan.tree(&root.join(tree.src), tree.dest, &filter)
}

/// Everything the SDK archive will contain, in write order.
pub fn plan_sdk(root: &Utf8Path, platforms: &[PlatformId]) -> BuildResult<ArchivePlan> {
    let mut plan = ArchivePlan::new();
    for tree in SDK_TREES {
        add_tree(&mut plan, root, tree)?;
    }
    for file in SDK_FILES {
        plan.file(root.join(file.src), file.dest);
    }

    for id in platforms {
        info!(platform = %id, "adding SDK library");
        let lib = manifest::sdk_library(id);
        plan.file(root.join(&lib), lib);
    }

    if platforms.iter().any(|p| p.family() == PlatformFamily::Windows) {
        for tree in SDK_WINDOWS_TREES {
            add_tree(&mut plan, root, tree)?;
        }
    }
    Ok(plan)
}

/// Assemble the developer SDK archive under `<root>/Installer`.
pub fn build_sdk(req: &SdkRequest<'_>) -> BuildResult<PackageOutcome> {
    let plan = plan_sdk(req.root, req.platforms)?;
    let path = req.output_path();
    let sha256 = plan.write(&path, req.format)?;
    info!(path = %path, entries = plan.len(), sha256 = %sha256, "SDK archive written");
    Ok(PackageOutcome {
        path,
        entries: plan.len(),
        sha256,
    })
}
