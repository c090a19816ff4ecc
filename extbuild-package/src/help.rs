use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use std::io;
use tracing::{debug, info};

/// Extract every file of the zip at `src` beneath `dst`, creating
/// directories as needed. Returns the number of files written.
///
/// Entries whose names would escape `dst` are skipped.
pub fn unzip_into(src: &Utf8Path, dst: &Utf8Path) -> anyhow::Result<usize> {
    let file = fs::File::open(src).with_context(|| format!("open {src}"))?;
    let mut archive =
        zip::ZipArchive::new(file).with_context(|| format!("read zip archive {src}"))?;
    fs::create_dir_all(dst).with_context(|| format!("create {dst}"))?;

    let mut written = 0;
    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .with_context(|| format!("read entry {index} of {src}"))?;
        if entry.is_dir() {
            continue;
        }
        let Some(rel) = entry
            .enclosed_name()
            .and_then(|p| Utf8PathBuf::from_path_buf(p).ok())
        else {
            debug!(entry = entry.name(), "skipping unsafe zip entry name");
            continue;
        };
        let out = dst.join(&rel);
        if let Some(parent) = out.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create {parent}"))?;
        }
        let mut target = fs::File::create(&out).with_context(|| format!("create {out}"))?;
        io::copy(&mut entry, &mut target).with_context(|| format!("extract {rel} to {out}"))?;
        written += 1;
    }
    Ok(written)
}

/// Unpack the help archive into `<staging>/Spectral` unless `staging` already
/// exists. Returns the directory holding the help tree.
pub fn stage_help(help_zip: &Utf8Path, staging: &Utf8Path) -> anyhow::Result<Utf8PathBuf> {
    let target = staging.join("Spectral");
    if staging.exists() {
        debug!(path = %staging, "help already staged");
    } else {
        let count = unzip_into(help_zip, &target)?;
        info!(from = %help_zip, to = %target, files = count, "unpacked help content");
    }
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    fn write_zip(path: &Utf8Path, entries: &[(&str, &str)]) {
        let mut zip = zip::ZipWriter::new(std::fs::File::create(path).unwrap());
        for (name, body) in entries {
            if name.ends_with('/') {
                zip.add_directory(*name, SimpleFileOptions::default()).unwrap();
            } else {
                zip.start_file(*name, SimpleFileOptions::default()).unwrap();
                zip.write_all(body.as_bytes()).unwrap();
            }
        }
        zip.finish().unwrap();
    }

    fn scratch() -> (TempDir, Utf8PathBuf) {
        let temp = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        (temp, root)
    }

    #[test]
    fn extracts_nested_files() {
        let (_temp, root) = scratch();
        let src = root.join("help.zip");
        write_zip(
            &src,
            &[
                ("index.html", "home"),
                ("topics/", ""),
                ("topics/rx.html", "rx"),
            ],
        );

        let count = unzip_into(&src, &root.join("out")).unwrap();
        assert_eq!(count, 2);
        assert_eq!(
            std::fs::read_to_string(root.join("out/topics/rx.html")).unwrap(),
            "rx"
        );
        assert_eq!(
            std::fs::read_to_string(root.join("out/index.html")).unwrap(),
            "home"
        );
    }

    #[test]
    fn staging_happens_once() {
        let (_temp, root) = scratch();
        let src = root.join("help.zip");
        write_zip(&src, &[("index.html", "v1")]);
        let staging = root.join("AebOutput/Help");

        let dir = stage_help(&src, &staging).unwrap();
        assert_eq!(dir, staging.join("Spectral"));
        assert_eq!(std::fs::read_to_string(dir.join("index.html")).unwrap(), "v1");

        write_zip(&src, &[("index.html", "v2")]);
        stage_help(&src, &staging).unwrap();
        assert_eq!(std::fs::read_to_string(dir.join("index.html")).unwrap(), "v1");
    }
}
