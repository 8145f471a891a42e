//! Previous-version resolution against the list of published releases.
use log::*;
use semver::Version;

use crate::error::{ReleaseError, Result};

/// Tags for majors at or above this value carry a `v` prefix.
pub const PREFIXED_TAG_MAJOR: u64 = 4;

/// A published release as returned by the forge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseRecord {
    /// Display name of the release, or its tag when the name is empty.
    pub identifier: String,
    pub is_prerelease: bool,
}

impl ReleaseRecord {
    /// Build a record preferring the display name over the tag name.
    pub fn new(
        name: Option<&str>,
        tag_name: &str,
        is_prerelease: bool,
    ) -> Self {
        let identifier = match name {
            Some(name) if !name.is_empty() => name,
            _ => tag_name,
        };

        Self {
            identifier: identifier.to_string(),
            is_prerelease,
        }
    }
}

/// Candidates below the current version split by major, input order kept.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PartitionedCandidates {
    pub same_major: Vec<Version>,
    pub other_major: Vec<Version>,
}

impl PartitionedCandidates {
    /// Nearest predecessor, preferring the current major.
    pub fn nearest(&self) -> Option<&Version> {
        self.same_major.first().or_else(|| self.other_major.first())
    }
}

/// Parse version text, tolerating a leading `v` or `=` and whitespace.
pub fn parse_version(text: &str) -> Result<Version> {
    let trimmed = text.trim();
    let trimmed = trimmed
        .strip_prefix('v')
        .or_else(|| trimmed.strip_prefix('='))
        .unwrap_or(trimmed);
    Ok(Version::parse(trimmed)?)
}

/// Render a version the way it is tagged in the repository history.
pub fn tagged(version: &Version) -> String {
    if version.major >= PREFIXED_TAG_MAJOR {
        format!("v{version}")
    } else {
        version.to_string()
    }
}

/// Filter and partition releases relative to `current`.
///
/// Records are dropped when they are namespaced sub-package releases, are
/// prereleases, do not parse as a version, or are not strictly below
/// `current`.
pub fn partition_candidates(
    current: &Version,
    releases: &[ReleaseRecord],
    namespace_marker: &str,
) -> PartitionedCandidates {
    let mut candidates = PartitionedCandidates::default();

    for release in releases {
        if !namespace_marker.is_empty()
            && release.identifier.contains(namespace_marker)
        {
            continue;
        }

        if release.is_prerelease {
            continue;
        }

        let version = match parse_version(&release.identifier) {
            Ok(version) => version,
            Err(err) => {
                debug!(
                    "skipping release with unparseable version {}: {err}",
                    release.identifier
                );
                continue;
            }
        };

        if version >= *current {
            continue;
        }

        if version.major == current.major {
            candidates.same_major.push(version);
        } else {
            candidates.other_major.push(version);
        }
    }

    candidates
}

/// Resolve the release the current version should be compared against.
pub fn resolve_previous_version(
    current: &str,
    releases: &[ReleaseRecord],
    namespace_marker: &str,
) -> Result<Version> {
    let current_version = parse_version(current)?;

    let candidates =
        partition_candidates(&current_version, releases, namespace_marker);

    debug!(
        "found {} same-major and {} other-major candidates below {}",
        candidates.same_major.len(),
        candidates.other_major.len(),
        current_version
    );

    candidates
        .nearest()
        .cloned()
        .ok_or_else(|| ReleaseError::no_previous_version(current))
}
