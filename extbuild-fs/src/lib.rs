//! Filesystem helpers shared by the builder and packaging crates.
//!
//! Directory walks are sorted so that staging and archive assembly are
//! deterministic across hosts.

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use tracing::debug;

/// Selects which entries of a directory tree take part in a walk.
///
/// `suffixes` restricts files at every level (empty = every file);
/// `skip` excludes files or directories by exact name.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntryFilter<'a> {
    pub suffixes: &'a [&'a str],
    pub skip: &'a [&'a str],
}

impl EntryFilter<'static> {
    pub const ALL: Self = EntryFilter {
        suffixes: &[],
        skip: &[],
    };
}

impl<'a> EntryFilter<'a> {
    pub fn with_suffixes(suffixes: &'a [&'a str]) -> Self {
        Self { suffixes, skip: &[] }
    }

    pub fn skipping(skip: &'a [&'a str]) -> Self {
        Self { suffixes: &[], skip }
    }

    pub fn skips(&self, name: &str) -> bool {
        self.skip.contains(&name)
    }

    pub fn accepts_file(&self, name: &str) -> bool {
        if self.skips(name) {
            return false;
        }
        self.suffixes.is_empty() || self.suffixes.iter().any(|s| name.ends_with(s))
    }
}

/// List the files under `root` accepted by `filter`, as paths relative to
/// `root`, sorted.
pub fn walk_files(root: &Utf8Path, filter: &EntryFilter<'_>) -> anyhow::Result<Vec<Utf8PathBuf>> {
    let mut out = Vec::new();
    walk_into(root, Utf8Path::new(""), filter, &mut out)?;
    Ok(out)
}

fn walk_into(
    dir: &Utf8Path,
    rel: &Utf8Path,
    filter: &EntryFilter<'_>,
    out: &mut Vec<Utf8PathBuf>,
) -> anyhow::Result<()> {
    let mut entries: Vec<(String, Utf8PathBuf)> = Vec::new();
    for entry in dir
        .read_dir_utf8()
        .with_context(|| format!("read directory {}", dir))?
    {
        let entry = entry.with_context(|| format!("read entry in {}", dir))?;
        entries.push((entry.file_name().to_string(), entry.path().to_path_buf()));
    }
    entries.sort();

    for (name, path) in entries {
        if filter.skips(&name) {
            debug!(path = %path, "skipping entry");
            continue;
        }
        if path.is_file() {
            if filter.accepts_file(&name) {
                out.push(rel.join(&name));
            }
        } else if path.is_dir() {
            walk_into(&path, &rel.join(&name), filter, out)?;
        }
    }
    Ok(())
}

/// Copy one file, deleting any existing destination first.
pub fn replace_file(src: &Utf8Path, dst: &Utf8Path) -> anyhow::Result<()> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent))?;
    }
    if dst.exists() {
        fs::remove_file(dst).with_context(|| format!("remove {}", dst))?;
    }
    fs::copy(src, dst).with_context(|| format!("copy {} to {}", src, dst))?;
    Ok(())
}

/// Recursively copy the files under `src` accepted by `filter` into `dst`,
/// preserving relative layout. Returns the number of files copied.
pub fn copy_tree(src: &Utf8Path, dst: &Utf8Path, filter: &EntryFilter<'_>) -> anyhow::Result<usize> {
    fs::create_dir_all(dst).with_context(|| format!("create {}", dst))?;
    let files = walk_files(src, filter)?;
    for rel in &files {
        replace_file(&src.join(rel), &dst.join(rel))?;
    }
    debug!(src = %src, dst = %dst, count = files.len(), "copied tree");
    Ok(files.len())
}

/// Create `dir` (and parents) if missing. Returns true if it was created.
pub fn ensure_dir(dir: &Utf8Path) -> anyhow::Result<bool> {
    if dir.is_dir() {
        return Ok(false);
    }
    fs::create_dir_all(dir).with_context(|| format!("create {}", dir))?;
    Ok(true)
}

/// Remove `dir` if present and recreate it empty.
pub fn reset_dir(dir: &Utf8Path) -> anyhow::Result<()> {
    if dir.exists() {
        fs::remove_dir_all(dir).with_context(|| format!("remove {}", dir))?;
    }
    fs::create_dir_all(dir).with_context(|| format!("create {}", dir))
}

/// Hidden sibling of `path` used to stage a replacement before renaming it
/// into place.
pub fn temp_sibling(path: &Utf8Path) -> anyhow::Result<Utf8PathBuf> {
    let file_name = path
        .file_name()
        .with_context(|| format!("{} has no file name", path))?;
    Ok(path.with_file_name(format!(".{file_name}.tmp")))
}

/// Replace the contents of `path` by writing a sibling temporary file and
/// renaming it over the original.
pub fn write_atomic(path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()> {
    let tmp = temp_sibling(path)?;
    fs::write(&tmp, contents).with_context(|| format!("write {}", tmp))?;
    fs::rename(&tmp, path).with_context(|| format!("rename {} to {}", tmp, path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn utf8_root(temp: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8")
    }

    fn touch(path: &Utf8Path, contents: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    #[test]
    fn walk_is_sorted_and_recursive() {
        let temp = TempDir::new().unwrap();
        let root = utf8_root(&temp);
        touch(&root.join("b.h"), "");
        touch(&root.join("a.h"), "");
        touch(&root.join("sub/c.h"), "");

        let files = walk_files(&root, &EntryFilter::ALL).unwrap();
        assert_eq!(
            files,
            vec![
                Utf8PathBuf::from("a.h"),
                Utf8PathBuf::from("b.h"),
                Utf8PathBuf::from("sub/c.h"),
            ]
        );
    }

    #[test]
    fn suffix_filter_applies_at_every_level() {
        let temp = TempDir::new().unwrap();
        let root = utf8_root(&temp);
        touch(&root.join("keep.h"), "");
        touch(&root.join("drop.cpp"), "");
        touch(&root.join("nested/deeper/keep2.h"), "");
        touch(&root.join("nested/deeper/drop2.cpp"), "");

        let files = walk_files(&root, &EntryFilter::with_suffixes(&[".h"])).unwrap();
        assert_eq!(
            files,
            vec![
                Utf8PathBuf::from("keep.h"),
                Utf8PathBuf::from("nested/deeper/keep2.h"),
            ]
        );
    }

    #[test]
    fn skip_list_excludes_directories() {
        let temp = TempDir::new().unwrap();
        let root = utf8_root(&temp);
        touch(&root.join("settings.props"), "");
        touch(&root.join(".svn/entries"), "");
        touch(&root.join("_svn/entries"), "");

        let files = walk_files(&root, &EntryFilter::skipping(&[".svn", "_svn"])).unwrap();
        assert_eq!(files, vec![Utf8PathBuf::from("settings.props")]);
    }

    #[test]
    fn copy_tree_replaces_existing_files() {
        let temp = TempDir::new().unwrap();
        let root = utf8_root(&temp);
        touch(&root.join("src/plugin.so"), "new");
        touch(&root.join("dst/plugin.so"), "old");

        let count = copy_tree(&root.join("src"), &root.join("dst"), &EntryFilter::ALL).unwrap();
        assert_eq!(count, 1);
        assert_eq!(
            std::fs::read_to_string(root.join("dst/plugin.so")).unwrap(),
            "new"
        );

        // A second copy yields the same single file.
        copy_tree(&root.join("src"), &root.join("dst"), &EntryFilter::ALL).unwrap();
        let files = walk_files(&root.join("dst"), &EntryFilter::ALL).unwrap();
        assert_eq!(files, vec![Utf8PathBuf::from("plugin.so")]);
    }

    #[test]
    fn reset_dir_clears_contents() {
        let temp = TempDir::new().unwrap();
        let root = utf8_root(&temp);
        touch(&root.join("out/stale.html"), "");

        reset_dir(&root.join("out")).unwrap();
        assert!(root.join("out").is_dir());
        assert!(!root.join("out/stale.html").exists());
    }

    #[test]
    fn ensure_dir_reports_creation() {
        let temp = TempDir::new().unwrap();
        let root = utf8_root(&temp);
        assert!(ensure_dir(&root.join("a/b")).unwrap());
        assert!(!ensure_dir(&root.join("a/b")).unwrap());
    }

    #[test]
    fn write_atomic_replaces_and_leaves_no_temp() {
        let temp = TempDir::new().unwrap();
        let root = utf8_root(&temp);
        let target = root.join("Version.h");
        touch(&target, "old");

        write_atomic(&target, b"new").unwrap();
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "new");
        assert!(!root.join(".Version.h.tmp").exists());
    }
}
