//! Version scheme resolution.
//!
//! [`resolve`] is pure apart from the revision lookup behind
//! [`ResolveContext::revisions`]; it never touches the header file. The
//! caller applies the returned [`VersionUpdate`] and commits it.

use crate::header::{PRODUCTION_RELEASE_KEY, VERSION_NUMBER_KEY, VersionHeader};
use crate::revision::RevisionSource;
use chrono::NaiveDate;
use extbuild_types::{BuildError, BuildResult, VersionScheme};
use tracing::debug;

const UNOFFICIAL_SUFFIX: &str = "Unofficial";
const NIGHTLY_TOKEN: &str = "Nightly";

/// New version number and release classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionUpdate {
    pub version: String,
    pub production: bool,
}

impl VersionUpdate {
    /// Stage the version-number and release-flag keys on `header`.
    pub fn apply_to(&self, header: &mut VersionHeader) {
        header.set_string(VERSION_NUMBER_KEY, &self.version);
        header.set(
            PRODUCTION_RELEASE_KEY,
            if self.production { "true" } else { "false" },
        );
    }
}

/// Inputs the resolver needs beyond the version itself.
pub struct ResolveContext<'a> {
    pub today: NaiveDate,
    pub revisions: &'a dyn RevisionSource,
}

/// Compute the version that `scheme` produces from `current`.
///
/// Returns `None` for [`VersionScheme::None`], meaning nothing is written.
pub fn resolve(
    current: &str,
    scheme: VersionScheme,
    explicit: Option<&str>,
    ctx: &ResolveContext<'_>,
) -> BuildResult<Option<VersionUpdate>> {
    let explicit = explicit.map(str::trim).filter(|v| !v.is_empty());

    let update = match (scheme, explicit) {
        (VersionScheme::None, _) => return Ok(None),
        (VersionScheme::Unofficial, None) => VersionUpdate {
            version: format!("{}{UNOFFICIAL_SUFFIX}", strip_suffix(current)?),
            production: false,
        },
        (VersionScheme::Nightly, None) => {
            let base = strip_suffix(current)?;
            let date = nightly_date(ctx.today)?;
            let revision = ctx.revisions.revision()?.ok_or_else(|| {
                BuildError::config(
                    "nightly versions need a working-copy revision; none could be determined",
                )
            })?;
            check_revision_token(&revision)?;
            VersionUpdate {
                version: format!("{base}{NIGHTLY_TOKEN}{date}.{revision}"),
                production: false,
            }
        }
        (scheme, Some(version)) if scheme.requires_explicit_version() => VersionUpdate {
            version: version.to_string(),
            production: scheme == VersionScheme::Production,
        },
        (scheme, _) if scheme.derives_version() => {
            return Err(BuildError::config(format!(
                "--new-version cannot be combined with the {scheme} scheme"
            )));
        }
        (scheme, _) => {
            return Err(BuildError::config(format!(
                "the {scheme} scheme requires --new-version"
            )));
        }
    };

    debug!(scheme = %scheme, from = current, to = %update.version, "resolved version");
    Ok(Some(update))
}

/// Reduce `version` to its numeric base.
///
/// A trailing build-revision component after a nightly component is dropped,
/// then any non-numeric suffix of the last component is removed.
pub fn strip_suffix(version: &str) -> BuildResult<String> {
    let mut parts: Vec<&str> = version.split('.').collect();
    if parts.len() >= 2 && parts[parts.len() - 2].contains(NIGHTLY_TOKEN) {
        parts.pop();
    }

    let Some((last, leading)) = parts.split_last() else {
        return Err(BuildError::format("empty version string"));
    };
    if let Some(bad) = leading.iter().find(|p| !is_numeric(p)) {
        return Err(BuildError::format(format!(
            "version component '{bad}' in '{version}' is not numeric"
        )));
    }

    let digits = last.len() - last.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return Err(BuildError::format(format!(
            "last component of version '{version}' does not start with a number"
        )));
    }

    let mut stripped = leading.join(".");
    if !leading.is_empty() {
        stripped.push('.');
    }
    stripped.push_str(&last[..digits]);
    Ok(stripped)
}

/// `today` as `YYYYMMDD`.
pub fn nightly_date(today: NaiveDate) -> BuildResult<String> {
    let date = today.format("%Y%m%d").to_string();
    if date.len() != 8 {
        return Err(BuildError::format(format!(
            "nightly date '{date}' is not exactly 8 characters"
        )));
    }
    Ok(date)
}

fn is_numeric(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

// Digits, optionally followed by the modified-working-copy marker.
fn check_revision_token(token: &str) -> BuildResult<()> {
    if is_numeric(token.strip_suffix('*').unwrap_or(token)) {
        Ok(())
    } else {
        Err(BuildError::format(format!(
            "build revision '{token}' is not a working-copy revision number"
        )))
    }
}
