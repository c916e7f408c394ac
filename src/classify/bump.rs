//! Semver bump inference from commit messages and file categories.

use std::fmt;

use semver::Version;
use serde::{Deserialize, Serialize};

use crate::github::CommitRecord;

/// Type of version bump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BumpType {
    Patch,
    Minor,
    Major,
}

impl BumpType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BumpType::Patch => "patch",
            BumpType::Minor => "minor",
            BumpType::Major => "major",
        }
    }
}

impl fmt::Display for BumpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const BREAKING_MARKERS: [&str; 4] = ["breaking", "breaking change", "breaking:", "major:"];
const FEATURE_MARKERS: [&str; 4] = ["feat:", "feature:", "add:", "new:"];

/// Infer the bump type.
///
/// Two independent passes over all commits: any breaking marker means
/// major; otherwise any feature marker, or any source-code change, means
/// minor; otherwise patch. Markers match case-insensitively anywhere in
/// the message.
pub fn infer_bump(commits: &[CommitRecord], has_source_changes: bool) -> BumpType {
    let messages: Vec<String> = commits.iter().map(|c| c.message.to_lowercase()).collect();
    let any_marker = |markers: &[&str]| {
        messages
            .iter()
            .any(|message| markers.iter().any(|marker| message.contains(marker)))
    };

    if any_marker(&BREAKING_MARKERS) {
        return BumpType::Major;
    }

    if any_marker(&FEATURE_MARKERS) || has_source_changes {
        BumpType::Minor
    } else {
        BumpType::Patch
    }
}

/// Apply a bump to a version.
pub fn apply_bump(base: &Version, bump: BumpType) -> Version {
    match bump {
        BumpType::Major => Version::new(base.major + 1, 0, 0),
        BumpType::Minor => Version::new(base.major, base.minor + 1, 0),
        BumpType::Patch => Version::new(base.major, base.minor, base.patch + 1),
    }
}

/// Suggest the next version when `from_revision` is a semver tag.
///
/// Accepts an optional `v`/`V` prefix (`v1.2.3`, `1.2.3`). Any other
/// revision (SHA, branch name) yields `None`.
pub fn next_version(from_revision: &str, bump: BumpType) -> Option<Version> {
    let raw = from_revision
        .strip_prefix(|c: char| c == 'v' || c == 'V')
        .unwrap_or(from_revision);
    let base = Version::parse(raw).ok()?;
    Some(apply_bump(&base, bump))
}
