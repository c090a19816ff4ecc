use crate::error::BuildError;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Version-mutation policy applied during release preparation.
///
/// - none: leave the version header untouched
/// - unofficial / nightly: derive the version from the current one
/// - milestone / rc / production: take an explicit replacement version
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionScheme {
    #[default]
    None,
    Unofficial,
    Nightly,
    Milestone,
    Production,
    Rc,
}

impl VersionScheme {
    pub const ALL: [VersionScheme; 6] = [
        VersionScheme::None,
        VersionScheme::Unofficial,
        VersionScheme::Nightly,
        VersionScheme::Milestone,
        VersionScheme::Production,
        VersionScheme::Rc,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            VersionScheme::None => "none",
            VersionScheme::Unofficial => "unofficial",
            VersionScheme::Nightly => "nightly",
            VersionScheme::Milestone => "milestone",
            VersionScheme::Production => "production",
            VersionScheme::Rc => "rc",
        }
    }

    /// Whether the scheme needs `--new-version`.
    pub fn requires_explicit_version(self) -> bool {
        matches!(
            self,
            VersionScheme::Milestone | VersionScheme::Production | VersionScheme::Rc
        )
    }

    /// Whether the scheme derives the version from the current one and
    /// therefore rejects `--new-version`.
    pub fn derives_version(self) -> bool {
        matches!(self, VersionScheme::Unofficial | VersionScheme::Nightly)
    }
}

impl fmt::Display for VersionScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VersionScheme {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VersionScheme::ALL
            .into_iter()
            .find(|scheme| scheme.as_str() == s)
            .ok_or_else(|| {
                BuildError::config(format!(
                    "unknown version scheme '{s}'; use milestone, nightly, none, production, rc or unofficial"
                ))
            })
    }
}
