//! Reader/writer for `#define KEY VALUE` version headers.
//!
//! Only `#define` lines with a key and a value are interpreted. On write, only
//! lines whose key was updated are regenerated; every other line is emitted
//! byte-for-byte in its original position.

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use extbuild_types::{BuildError, BuildResult};
use fs_err as fs;
use std::collections::BTreeMap;
use tracing::debug;

pub const VERSION_NUMBER_KEY: &str = "SPECTRAL_VERSION_NUMBER";
pub const PRODUCTION_RELEASE_KEY: &str = "SPECTRAL_IS_PRODUCTION_RELEASE";
pub const NAME_KEY: &str = "SPECTRAL_NAME";
pub const LONG_NAME_KEY: &str = "SPECTRAL_NAME_LONG";
pub const HOST_VERSION_KEY: &str = "OPTICKS_VERSION";

/// In-memory view of a version header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionHeader {
    lines: Vec<String>,
    values: BTreeMap<String, String>,
    updates: BTreeMap<String, String>,
}

fn parse_define(line: &str) -> Option<(&str, String)> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() >= 3 && fields[0] == "#define" {
        Some((fields[1], fields[2..].join(" ")))
    } else {
        None
    }
}

fn line_terminator(line: &str) -> &'static str {
    if line.ends_with("\r\n") {
        "\r\n"
    } else if line.ends_with('\n') {
        "\n"
    } else {
        ""
    }
}

/// Strip one pair of surrounding double quotes, if present.
pub fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

impl VersionHeader {
    pub fn parse(text: &str) -> Self {
        let lines: Vec<String> = text.split_inclusive('\n').map(str::to_string).collect();
        let mut values = BTreeMap::new();
        for line in &lines {
            if let Some((key, value)) = parse_define(line) {
                values.insert(key.to_string(), value);
            }
        }
        Self {
            lines,
            values,
            updates: BTreeMap::new(),
        }
    }

    /// Raw value for `key`, including any quotes.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.updates
            .get(key)
            .or_else(|| self.values.get(key))
            .map(String::as_str)
    }

    /// Value for `key` with surrounding quotes removed.
    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.get(key).map(unquote)
    }

    /// Value for `key` with quotes removed, or a format error naming the key.
    pub fn require_string(&self, key: &str) -> BuildResult<&str> {
        self.get_string(key)
            .ok_or_else(|| BuildError::format(format!("version header does not define {key}")))
    }

    /// Set the raw value for `key`.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.updates.insert(key.to_string(), value.into());
    }

    /// Set `key` to a quoted string literal.
    pub fn set_string(&mut self, key: &str, value: &str) {
        self.set(key, format!("\"{value}\""));
    }

    /// Whether any staged value differs from the one read from the text.
    pub fn is_modified(&self) -> bool {
        self.updates
            .iter()
            .any(|(key, value)| self.values.get(key) != Some(value))
    }

    /// Render the header with updates applied.
    ///
    /// Updated keys that never appeared in the original text are appended.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            match parse_define(line) {
                Some((key, _)) if self.updates.contains_key(key) => {
                    out.push_str(&format!("#define {} {}", key, self.updates[key]));
                    out.push_str(line_terminator(line));
                }
                _ => out.push_str(line),
            }
        }
        for (key, value) in &self.updates {
            if !self.values.contains_key(key) {
                if !out.is_empty() && !out.ends_with('\n') {
                    out.push('\n');
                }
                out.push_str(&format!("#define {key} {value}\n"));
            }
        }
        out
    }
}

/// A version header on disk.
#[derive(Debug, Clone)]
pub struct VersionHeaderFile {
    path: Utf8PathBuf,
}

impl VersionHeaderFile {
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The extension's own header: `<root>/Code/Include/SpectralVersion.h`.
    pub fn extension(root: &Utf8Path) -> Self {
        Self::new(root.join("Code").join("Include").join("SpectralVersion.h"))
    }

    /// The host application's header:
    /// `<host>/application/Interfaces/OpticksVersion.h`.
    pub fn host(host_code_dir: &Utf8Path) -> Self {
        Self::new(
            host_code_dir
                .join("application")
                .join("Interfaces")
                .join("OpticksVersion.h"),
        )
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    pub fn load(&self) -> BuildResult<VersionHeader> {
        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("read version header {}", self.path))?;
        Ok(VersionHeader::parse(&text))
    }

    /// Write the full header back in one atomic replace.
    pub fn commit(&self, header: &VersionHeader) -> BuildResult<()> {
        debug!(path = %self.path, "writing version header");
        extbuild_fs::write_atomic(&self.path, header.render().as_bytes())?;
        Ok(())
    }
}
