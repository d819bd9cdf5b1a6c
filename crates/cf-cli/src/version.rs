//! Minimum API version gate.

use crate::error::CliError;

/// Oldest v3 API any `v3-*` command supports.
pub const MIN_VERSION_V3: &str = "3.27.0";
/// Tasks.
pub const MIN_VERSION_RUN_TASK: &str = "3.0.0";
/// Isolation segments.
pub const MIN_VERSION_ISOLATION_SEGMENT: &str = "3.11.0";
/// Service instance sharing.
pub const MIN_VERSION_SHARE_SERVICE: &str = "3.36.0";
/// Container networking policies.
pub const MIN_VERSION_NETWORKING: &str = "3.0.0";

/// Fail when `current` is older than `minimum`.
///
/// An empty minimum always passes, as does a current version that is empty
/// or does not parse.
pub fn minimum_version_check(current: &str, minimum: &str) -> Result<(), CliError> {
    if minimum.is_empty() {
        return Ok(());
    }
    let (Some(have), Some(want)) = (parse(current), parse(minimum)) else {
        return Ok(());
    };
    if have < want {
        return Err(CliError::MinimumVersionNotMet {
            current: current.to_string(),
            minimum: minimum.to_string(),
        });
    }
    Ok(())
}

fn parse(version: &str) -> Option<(u64, u64, u64)> {
    let version = version.trim().trim_start_matches('v');
    let core = version.split(['-', '+']).next()?;
    let mut parts = core.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next().map_or(Some(0), |p| p.parse().ok())?;
    let patch = parts.next().map_or(Some(0), |p| p.parse().ok())?;
    Some((major, minor, patch))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn older_version_fails() {
        let err = minimum_version_check("3.26.9", MIN_VERSION_V3).expect_err("too old");
        assert!(matches!(
            err,
            CliError::MinimumVersionNotMet { ref current, ref minimum }
                if current == "3.26.9" && minimum == "3.27.0"
        ));
    }

    #[test]
    fn equal_and_newer_pass() {
        assert!(minimum_version_check("3.27.0", MIN_VERSION_V3).is_ok());
        assert!(minimum_version_check("3.100.0", MIN_VERSION_V3).is_ok());
        assert!(minimum_version_check("4.0.0", MIN_VERSION_V3).is_ok());
    }

    #[test]
    fn numeric_not_lexical() {
        assert!(minimum_version_check("3.9.0", MIN_VERSION_ISOLATION_SEGMENT).is_err());
        assert!(minimum_version_check("3.11.0", MIN_VERSION_ISOLATION_SEGMENT).is_ok());
    }

    #[test]
    fn empty_or_garbage_passes() {
        assert!(minimum_version_check("", MIN_VERSION_V3).is_ok());
        assert!(minimum_version_check("banana", MIN_VERSION_V3).is_ok());
        assert!(minimum_version_check("0.0.0", "").is_ok());
    }
}
