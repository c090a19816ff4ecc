/// Host-application versions an installer bundle declares itself compatible with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostCompat {
    pub min: String,
    pub max: String,
}

/// The minimum is `host_version` itself. The maximum widens to
/// `major.minor.*` when the minor component is numeric.
pub fn host_compat_range(host_version: &str) -> HostCompat {
    let parts: Vec<&str> = host_version.split('.').collect();
    let max = match parts.as_slice() {
        [major, minor, ..] if !minor.is_empty() && minor.chars().all(|c| c.is_ascii_digit()) => {
            format!("{major}.{minor}.*")
        }
        _ => host_version.to_string(),
    };
    HostCompat {
        min: host_version.to_string(),
        max,
    }
}
