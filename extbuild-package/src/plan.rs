//! Archive contents are planned in full, checked, and only then written.

use crate::archive::ArchiveFormat;
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use extbuild_fs::EntryFilter;
use extbuild_types::{BuildError, BuildResult};
use fs_err as fs;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::io;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntrySource {
    File(Utf8PathBuf),
    Bytes(Vec<u8>),
}

/// One archive member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedEntry {
    pub dest: String,
    pub source: EntrySource,
}

/// Ordered list of archive members.
#[derive(Debug, Clone, Default)]
pub struct ArchivePlan {
    entries: Vec<PlannedEntry>,
}

/// Join an archive prefix and a relative path with `/` on every host.
pub fn archive_path(prefix: &str, rel: &Utf8Path) -> String {
    let mut out = prefix.trim_end_matches('/').to_string();
    for component in rel.components() {
        if !out.is_empty() {
            out.push('/');
        }
        out.push_str(component.as_str());
    }
    out
}

impl ArchivePlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[PlannedEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn file(&mut self, src: impl Into<Utf8PathBuf>, dest: impl Into<String>) {
        self.entries.push(PlannedEntry {
            dest: dest.into(),
            source: EntrySource::File(src.into()),
        });
    }

    pub fn bytes(&mut self, dest: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.entries.push(PlannedEntry {
            dest: dest.into(),
            source: EntrySource::Bytes(bytes.into()),
        });
    }

    /// Add every file under `src` accepted by `filter` beneath `dest_prefix`.
    pub fn tree(
        &mut self,
        src: &Utf8Path,
        dest_prefix: &str,
        filter: &EntryFilter<'_>,
    ) -> BuildResult<()> {
        if !src.is_dir() {
            return Err(BuildError::config(format!(
                "packaging input directory {src} does not exist"
            )));
        }
        for rel in extbuild_fs::walk_files(src, filter)? {
            let dest = archive_path(dest_prefix, &rel);
            self.file(src.join(&rel), dest);
        }
        Ok(())
    }

    /// Fail if any planned source file is missing or two entries share an
    /// archive path.
    pub fn verify(&self) -> BuildResult<()> {
        let mut seen = BTreeSet::new();
        if let Some(dup) = self.entries.iter().find(|e| !seen.insert(e.dest.as_str())) {
            return Err(BuildError::config(format!(
                "archive entry {} is planned more than once; check for repeated platforms",
                dup.dest
            )));
        }

        let missing: Vec<&Utf8Path> = self
            .entries
            .iter()
            .filter_map(|e| match &e.source {
                EntrySource::File(path) if !path.is_file() => Some(path.as_path()),
                _ => None,
            })
            .collect();
        match missing.as_slice() {
            [] => Ok(()),
            [only] => Err(BuildError::config(format!(
                "packaging input {only} does not exist"
            ))),
            [first, rest @ ..] => Err(BuildError::config(format!(
                "packaging input {first} does not exist (and {} more)",
                rest.len()
            ))),
        }
    }

    /// Verify, then write every entry to a new archive at `out`.
    ///
    /// Returns the SHA-256 of the finished archive as lowercase hex.
    pub fn write(&self, out: &Utf8Path, format: ArchiveFormat) -> BuildResult<String> {
        self.verify()?;
        if let Some(parent) = out.parent().filter(|p| !p.as_str().is_empty()) {
            extbuild_fs::ensure_dir(parent)?;
        }
        self.write_staged(out, format)?;
        Ok(sha256_file(out)?)
    }

    /// Build the archive in a hidden sibling of `out` and rename it into place.
    /// On failure the sibling is removed and `out` is left as it was.
    fn write_staged(&self, out: &Utf8Path, format: ArchiveFormat) -> BuildResult<()> {
        let staged = extbuild_fs::temp_sibling(out)?;
        let result = self.write_entries(&staged, format).and_then(|()| {
            fs::rename(&staged, out)
                .with_context(|| format!("rename {staged} to {out}"))
                .map_err(BuildError::from)
        });
        if result.is_err()
            && staged.exists()
            && let Err(e) = fs::remove_file(&staged)
        {
            debug!(path = %staged, error = %e, "could not remove partial archive");
        }
        result
    }

    fn write_entries(&self, path: &Utf8Path, format: ArchiveFormat) -> BuildResult<()> {
        let mut writer = format.create(path)?;
        for entry in &self.entries {
            debug!(dest = %entry.dest, "archive entry");
            match &entry.source {
                EntrySource::File(src) => writer.put(src, &entry.dest)?,
                EntrySource::Bytes(bytes) => writer.put_bytes(&entry.dest, bytes)?,
            }
        }
        writer.finish()?;
        Ok(())
    }
}

/// SHA-256 of the file at `path` as lowercase hex.
pub fn sha256_file(path: &Utf8Path) -> anyhow::Result<String> {
    let mut file = fs::File::open(path).with_context(|| format!("open {path}"))?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher).with_context(|| format!("hash {path}"))?;
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn scratch() -> (TempDir, Utf8PathBuf) {
        let temp = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        (temp, root)
    }

    #[test]
    fn archive_path_uses_forward_slashes() {
        assert_eq!(archive_path("doc/html", Utf8Path::new("a/b.html")), "doc/html/a/b.html");
        assert_eq!(archive_path("", Utf8Path::new("x.h")), "x.h");
        assert_eq!(archive_path("content/", Utf8Path::new("y")), "content/y");
    }

    #[test]
    fn tree_requires_source_directory() {
        let (_temp, root) = scratch();
        let mut plan = ArchivePlan::new();
        let err = plan
            .tree(&root.join("absent"), "doc", &EntryFilter::ALL)
            .unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn missing_file_blocks_archive_creation() {
        let (_temp, root) = scratch();
        let mut plan = ArchivePlan::new();
        plan.bytes("install.rdf", "x");
        plan.file(root.join("gone.dll"), "platform/win64/PlugIns/gone.dll");

        let out = root.join("out/bundle.zip");
        let err = plan.write(&out, ArchiveFormat::Zip).unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("gone.dll"));
        assert!(!out.exists());
    }

    #[test]
    fn repeated_destination_is_rejected_before_writing() {
        let (_temp, root) = scratch();
        std::fs::write(root.join("Ace.so"), "so").unwrap();
        let mut plan = ArchivePlan::new();
        plan.file(root.join("Ace.so"), "platform/linux/PlugIns/Ace.so");
        plan.file(root.join("Ace.so"), "platform/linux/PlugIns/Ace.so");

        let out = root.join("bundle.zip");
        let err = plan.write(&out, ArchiveFormat::Zip).unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("platform/linux/PlugIns/Ace.so"));
        assert!(!out.exists());
    }

    #[test]
    fn failed_write_leaves_no_partial_archive() {
        let (_temp, root) = scratch();
        let mut plan = ArchivePlan::new();
        plan.bytes("install.rdf", "first");
        plan.bytes("install.rdf", "second");

        let out = root.join("bundle.zip");
        plan.write_staged(&out, ArchiveFormat::Zip).unwrap_err();
        assert!(!out.exists());
        assert!(!extbuild_fs::temp_sibling(&out).unwrap().exists());
    }

    #[test]
    fn failed_write_keeps_previous_archive() {
        let (_temp, root) = scratch();
        let out = root.join("bundle.zip");
        std::fs::write(&out, "previous").unwrap();
        let mut plan = ArchivePlan::new();
        plan.bytes("a", "1");
        plan.bytes("a", "2");

        plan.write_staged(&out, ArchiveFormat::Zip).unwrap_err();
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "previous");
    }

    #[test]
    fn write_creates_parents_and_hashes() {
        let (_temp, root) = scratch();
        std::fs::write(root.join("a.txt"), "a").unwrap();
        let mut plan = ArchivePlan::new();
        plan.file(root.join("a.txt"), "a.txt");

        let out = root.join("nested/dir/out.tar.gz");
        let digest = plan.write(&out, ArchiveFormat::TarGz).unwrap();
        assert!(out.is_file());
        assert_eq!(digest.len(), 64);
        assert_eq!(digest, sha256_file(&out).unwrap());
    }
}
