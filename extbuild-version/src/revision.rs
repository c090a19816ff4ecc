//! Working-copy revision lookup.

use camino::{Utf8Path, Utf8PathBuf};
use extbuild_process::{CommandSpec, ProcessRunner};
use extbuild_types::{BuildError, BuildResult};
use tracing::{debug, info};

/// Supplies the build-revision token embedded in nightly versions.
pub trait RevisionSource {
    /// The revision of the current checkout, or `None` when the checkout has
    /// no revision-control metadata.
    fn revision(&self) -> BuildResult<Option<String>>;
}

/// Turn `svnversion -c` output (`LOW:HIGH[M|S]`) into a revision token.
///
/// A modified working copy yields a token ending in `*`. A switched working
/// copy is rejected.
pub fn parse_svnversion(output: &str) -> BuildResult<String> {
    let output = output.trim();
    let parts: Vec<&str> = output.split(':').collect();
    if parts.len() != 2 {
        return Err(BuildError::format(format!(
            "unexpected svnversion output '{output}'"
        )));
    }
    let revision = parts[1];
    if revision.ends_with('S') {
        return Err(BuildError::config(
            "switched working copies are not supported for nightly versions",
        ));
    }
    Ok(match revision.strip_suffix('M') {
        Some(base) => format!("{base}*"),
        None => revision.to_string(),
    })
}

/// Queries Subversion through `svnversion`.
pub struct SvnRevisionSource<'a> {
    root: Utf8PathBuf,
    runner: &'a dyn ProcessRunner,
}

impl<'a> SvnRevisionSource<'a> {
    pub fn new(root: impl Into<Utf8PathBuf>, runner: &'a dyn ProcessRunner) -> Self {
        Self {
            root: root.into(),
            runner,
        }
    }

    fn has_metadata(root: &Utf8Path) -> bool {
        [".svn", "_svn"].iter().any(|dir| root.join(dir).exists())
    }
}

impl RevisionSource for SvnRevisionSource<'_> {
    fn revision(&self) -> BuildResult<Option<String>> {
        if !Self::has_metadata(&self.root) {
            debug!(root = %self.root, "no svn metadata");
            return Ok(None);
        }
        let cmd = CommandSpec::new("svnversion")
            .args(["-c", "-n", "."])
            .cwd(self.root.clone());
        let output = self.runner.run_captured(&cmd)?;
        if output.status != 0 {
            return Err(BuildError::tool_failed("svnversion", output.status));
        }
        let revision = parse_svnversion(&output.stdout)?;
        info!(revision = %revision, "working-copy revision");
        Ok(Some(revision))
    }
}

/// A revision supplied up front, e.g. from the command line.
#[derive(Debug, Clone, Default)]
pub struct FixedRevisionSource {
    revision: Option<String>,
}

impl FixedRevisionSource {
    pub fn new(revision: Option<String>) -> Self {
        Self { revision }
    }
}

impl RevisionSource for FixedRevisionSource {
    fn revision(&self) -> BuildResult<Option<String>> {
        Ok(self.revision.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use extbuild_process::DryRunRunner;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn clean_revision_passes_through() {
        assert_eq!(parse_svnversion("4100:4168").unwrap(), "4168");
        assert_eq!(parse_svnversion("4100:42\n").unwrap(), "42");
    }

    #[test]
    fn modified_marker_becomes_star() {
        assert_eq!(parse_svnversion("4100:4168M").unwrap(), "4168*");
    }

    #[test]
    fn switched_working_copy_is_rejected() {
        assert!(parse_svnversion("4100:4168S").unwrap_err().is_config());
        assert!(parse_svnversion("4100:4168MS").unwrap_err().is_config());
    }

    #[test]
    fn output_without_range_is_a_format_error() {
        let err = parse_svnversion("exported").unwrap_err();
        assert!(matches!(err, BuildError::Format(_)));
    }

    #[test]
    fn checkout_without_metadata_has_no_revision() {
        let temp = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        let runner = DryRunRunner::new();
        let source = SvnRevisionSource::new(root, &runner);
        assert_eq!(source.revision().unwrap(), None);
        assert!(runner.recorded().is_empty());
    }

    #[test]
    fn queries_svnversion_in_checkout_root() {
        let temp = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        std::fs::create_dir(root.join("_svn")).unwrap();
        let runner = DryRunRunner::new().with_stdout("4000:4321M");
        let source = SvnRevisionSource::new(root.clone(), &runner);

        assert_eq!(source.revision().unwrap().as_deref(), Some("4321*"));
        let recorded = runner.recorded();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].display(), "svnversion -c -n .");
        assert_eq!(recorded[0].cwd.as_deref(), Some(root.as_path()));
    }

    #[test]
    fn svnversion_failure_is_a_tool_failure() {
        let temp = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        std::fs::create_dir(root.join(".svn")).unwrap();
        let runner = DryRunRunner::with_status(1);
        let err = SvnRevisionSource::new(root, &runner).revision().unwrap_err();
        assert!(matches!(err, BuildError::ToolFailed { .. }));
    }
}
