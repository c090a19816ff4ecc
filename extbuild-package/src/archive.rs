//! Archive containers behind one `put(src, dest)` interface.

use anyhow::Context;
use camino::Utf8Path;
use extbuild_types::PlatformFamily;
use flate2::Compression;
use flate2::write::GzEncoder;
use fs_err as fs;
use std::io::{self, Write};
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

/// Container format of a produced archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    TarGz,
}

impl ArchiveFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ArchiveFormat::Zip => "zip",
            ArchiveFormat::TarGz => "tar.gz",
        }
    }

    /// SDK container convention for a host family.
    pub fn sdk_for(host: PlatformFamily) -> Self {
        match host {
            PlatformFamily::Windows => ArchiveFormat::Zip,
            PlatformFamily::Unix => ArchiveFormat::TarGz,
        }
    }

    /// Create an empty archive at `path`, truncating any existing file.
    pub fn create(self, path: &Utf8Path) -> anyhow::Result<Box<dyn ArchiveWriter>> {
        let file = fs::File::create(path).with_context(|| format!("create archive {path}"))?;
        Ok(match self {
            ArchiveFormat::Zip => Box::new(ZipArchiveWriter::new(file)),
            ArchiveFormat::TarGz => Box::new(TarGzArchiveWriter::new(file)),
        })
    }
}

/// Writes entries into an archive. Entry names always use `/`.
pub trait ArchiveWriter {
    /// Copy the file at `src` into the archive as `dest`.
    fn put(&mut self, src: &Utf8Path, dest: &str) -> anyhow::Result<()>;

    /// Store `bytes` in the archive as `dest`.
    fn put_bytes(&mut self, dest: &str, bytes: &[u8]) -> anyhow::Result<()>;

    /// Flush trailing structures and close the archive.
    fn finish(self: Box<Self>) -> anyhow::Result<()>;
}

pub struct ZipArchiveWriter {
    inner: zip::ZipWriter<fs::File>,
}

impl ZipArchiveWriter {
    pub fn new(file: fs::File) -> Self {
        Self {
            inner: zip::ZipWriter::new(file),
        }
    }

    fn start(&mut self, dest: &str) -> anyhow::Result<()> {
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        self.inner
            .start_file(dest, options)
            .with_context(|| format!("start zip entry {dest}"))
    }
}

impl ArchiveWriter for ZipArchiveWriter {
    fn put(&mut self, src: &Utf8Path, dest: &str) -> anyhow::Result<()> {
        let mut input = fs::File::open(src).with_context(|| format!("open {src}"))?;
        self.start(dest)?;
        io::copy(&mut input, &mut self.inner).with_context(|| format!("write zip entry {dest}"))?;
        Ok(())
    }

    fn put_bytes(&mut self, dest: &str, bytes: &[u8]) -> anyhow::Result<()> {
        self.start(dest)?;
        self.inner
            .write_all(bytes)
            .with_context(|| format!("write zip entry {dest}"))
    }

    fn finish(self: Box<Self>) -> anyhow::Result<()> {
        let mut file = self.inner.finish().context("finish zip archive")?;
        file.flush().context("flush zip archive")
    }
}

pub struct TarGzArchiveWriter {
    inner: tar::Builder<GzEncoder<fs::File>>,
}

impl TarGzArchiveWriter {
    pub fn new(file: fs::File) -> Self {
        let mut inner = tar::Builder::new(GzEncoder::new(file, Compression::default()));
        inner.mode(tar::HeaderMode::Deterministic);
        Self { inner }
    }
}

impl ArchiveWriter for TarGzArchiveWriter {
    fn put(&mut self, src: &Utf8Path, dest: &str) -> anyhow::Result<()> {
        self.inner
            .append_path_with_name(src, dest)
            .with_context(|| format!("add {src} to tar archive as {dest}"))
    }

    fn put_bytes(&mut self, dest: &str, bytes: &[u8]) -> anyhow::Result<()> {
        let mut header = tar::Header::new_gnu();
        header.set_size(bytes.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        self.inner
            .append_data(&mut header, dest, bytes)
            .with_context(|| format!("add {dest} to tar archive"))
    }

    fn finish(self: Box<Self>) -> anyhow::Result<()> {
        let encoder = self.inner.into_inner().context("finish tar archive")?;
        let mut file = encoder.finish().context("finish gzip stream")?;
        file.flush().context("flush tar archive")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use flate2::read::GzDecoder;
    use pretty_assertions::assert_eq;
    use std::io::Read;
    use tempfile::TempDir;

    fn scratch() -> (TempDir, Utf8PathBuf) {
        let temp = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        std::fs::write(root.join("input.txt"), "from disk").unwrap();
        (temp, root)
    }

    fn fill(format: ArchiveFormat, root: &Utf8Path) -> Utf8PathBuf {
        let out = root.join(format!("out.{}", format.extension()));
        let mut writer = format.create(&out).unwrap();
        writer.put(&root.join("input.txt"), "docs/input.txt").unwrap();
        writer.put_bytes("install.rdf", b"generated").unwrap();
        writer.finish().unwrap();
        out
    }

    #[test]
    fn zip_entries_are_readable() {
        let (_temp, root) = scratch();
        let out = fill(ArchiveFormat::Zip, &root);

        let mut archive = zip::ZipArchive::new(std::fs::File::open(&out).unwrap()).unwrap();
        let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
        names.sort();
        assert_eq!(names, vec!["docs/input.txt", "install.rdf"]);

        let mut text = String::new();
        archive
            .by_name("install.rdf")
            .unwrap()
            .read_to_string(&mut text)
            .unwrap();
        assert_eq!(text, "generated");
    }

    #[test]
    fn tar_gz_entries_are_readable() {
        let (_temp, root) = scratch();
        let out = fill(ArchiveFormat::TarGz, &root);

        let mut archive = tar::Archive::new(GzDecoder::new(std::fs::File::open(&out).unwrap()));
        let mut seen = Vec::new();
        for entry in archive.entries().unwrap() {
            let mut entry = entry.unwrap();
            let name = entry.path().unwrap().to_string_lossy().into_owned();
            let mut text = String::new();
            entry.read_to_string(&mut text).unwrap();
            seen.push((name, text));
        }
        assert_eq!(
            seen,
            vec![
                ("docs/input.txt".to_string(), "from disk".to_string()),
                ("install.rdf".to_string(), "generated".to_string()),
            ]
        );
    }

    #[test]
    fn put_reports_missing_source() {
        let (_temp, root) = scratch();
        let mut writer = ArchiveFormat::Zip.create(&root.join("x.zip")).unwrap();
        let err = writer.put(&root.join("missing.bin"), "missing.bin").unwrap_err();
        assert!(format!("{err:#}").contains("missing.bin"));
    }
}
