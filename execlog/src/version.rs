// Version gate for agent upgrades
// Pre-release and build qualifiers (`-SNAPSHOT`, `+build.5`) never affect ordering.

use crate::errors::VersionError;
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

lazy_static! {
    static ref VERSION_RE: Regex =
        Regex::new(r"^\s*v?(\d+)(?:\.(\d+))?(?:\.(\d+))?(?:[-+][0-9A-Za-z.+-]*)?\s*$")
            .expect("version regex is valid");
}

/// A `major.minor.patch` version with any qualifier dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse `8.4`, `8.4.0`, `v8.4.0` or `8.4.0-SNAPSHOT`; missing parts are zero
    pub fn coerce(input: &str) -> Result<Self, VersionError> {
        let invalid = || VersionError::InvalidVersion(input.to_string());
        let caps = VERSION_RE.captures(input).ok_or_else(invalid)?;

        let part = |i: usize| -> Result<u64, VersionError> {
            match caps.get(i) {
                Some(m) => m.as_str().parse().map_err(|_| invalid()),
                None => Ok(0),
            }
        };

        Ok(Self::new(part(1)?, part(2)?, part(3)?))
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Version::coerce(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Reject an upgrade to a version newer than the running kibana
///
/// # Errors
/// `VersionTooHigh` when `version` is greater than `kibana_version`,
/// `InvalidVersion` when either side cannot be read as a version.
pub fn check_kibana_version(version: &str, kibana_version: &str) -> Result<(), VersionError> {
    let requested = Version::coerce(version)?;
    let running = Version::coerce(kibana_version)?;

    if requested > running {
        tracing::warn!(
            version = version,
            kibana_version = %running,
            "Requested version is higher than the running version"
        );
        return Err(VersionError::VersionTooHigh {
            version: version.to_string(),
            kibana_version: running.to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_versions_pass() {
        assert!(check_kibana_version("8.4.0", "8.4.0").is_ok());
    }

    #[test]
    fn test_higher_version_fails() {
        let err = check_kibana_version("8.5.0", "8.4.0").unwrap_err();
        assert_eq!(
            err.to_string(),
            "cannot upgrade agent to 8.5.0 because it is higher than the installed kibana version 8.4.0"
        );
    }

    #[test]
    fn test_snapshot_qualifier_is_ignored() {
        assert!(check_kibana_version("8.4.0", "8.4.0-SNAPSHOT").is_ok());
        assert!(check_kibana_version("8.4.0-SNAPSHOT", "8.4.0").is_ok());
    }

    #[test]
    fn test_lower_version_passes() {
        assert!(check_kibana_version("7.17.3", "8.4.0").is_ok());
        assert!(check_kibana_version("8.3.9", "8.4.0").is_ok());
    }

    #[test]
    fn test_numeric_not_lexical_ordering() {
        assert!(check_kibana_version("8.10.0", "8.9.0").is_err());
    }

    #[test]
    fn test_coerce_partial_versions() {
        assert_eq!(Version::coerce("8").unwrap(), Version::new(8, 0, 0));
        assert_eq!(Version::coerce("v8.4").unwrap(), Version::new(8, 4, 0));
        assert_eq!(
            Version::coerce("8.4.1+build.7").unwrap(),
            Version::new(8, 4, 1)
        );
    }

    #[test]
    fn test_invalid_versions() {
        assert!(matches!(
            check_kibana_version("latest", "8.4.0"),
            Err(VersionError::InvalidVersion(v)) if v == "latest"
        ));
        assert!(matches!(
            check_kibana_version("8.4.0", ""),
            Err(VersionError::InvalidVersion(_))
        ));
    }
}
