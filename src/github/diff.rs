//! Normalized comparison data: file changes, commits, and the diff summary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of revision characters shown in the narrative summary.
const NARRATIVE_REVISION_LEN: usize = 8;

/// Known file-level statuses reported by the hosting API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    Added,
    Modified,
    Removed,
    Renamed,
    /// Anything else the API reports (`copied`, `changed`, ...).
    Other,
}

/// One file touched by the comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    pub path: String,
    pub additions: u64,
    pub deletions: u64,
    /// Unified diff text; empty when the API omits it (binary or oversized files).
    pub patch: String,
    /// Status string exactly as reported by the API.
    pub status: String,
}

impl FileChange {
    pub fn status_kind(&self) -> FileStatus {
        match self.status.as_str() {
            "added" => FileStatus::Added,
            "modified" => FileStatus::Modified,
            "removed" => FileStatus::Removed,
            "renamed" => FileStatus::Renamed,
            _ => FileStatus::Other,
        }
    }
}

/// One commit in the comparison range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub sha: String,
    pub message: String,
    pub author_name: String,
    pub author_date: Option<DateTime<Utc>>,
    pub url: String,
}

/// Structured difference between two revisions.
///
/// Totals and the narrative are computed once in [`DiffSummary::new`];
/// deserialization recomputes them from the file and commit lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawDiffSummary")]
pub struct DiffSummary {
    repository: String,
    from_revision: String,
    to_revision: String,
    file_changes: Vec<FileChange>,
    commits: Vec<CommitRecord>,
    total_files_changed: usize,
    total_additions: u64,
    total_deletions: u64,
    narrative_summary: String,
}

impl DiffSummary {
    pub fn new(
        repository: impl Into<String>,
        from_revision: impl Into<String>,
        to_revision: impl Into<String>,
        file_changes: Vec<FileChange>,
        commits: Vec<CommitRecord>,
    ) -> Self {
        let repository = repository.into();
        let from_revision = from_revision.into();
        let to_revision = to_revision.into();

        let total_files_changed = file_changes.len();
        let total_additions = file_changes.iter().map(|f| f.additions).sum();
        let total_deletions = file_changes.iter().map(|f| f.deletions).sum();

        let narrative_summary = format!(
            "Analysis of {} from {} to {}:\n- {} files changed\n- {} additions, {} deletions\n- {} commits analyzed",
            repository,
            display_revision(&from_revision),
            display_revision(&to_revision),
            total_files_changed,
            total_additions,
            total_deletions,
            commits.len()
        );

        Self {
            repository,
            from_revision,
            to_revision,
            file_changes,
            commits,
            total_files_changed,
            total_additions,
            total_deletions,
            narrative_summary,
        }
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    pub fn from_revision(&self) -> &str {
        &self.from_revision
    }

    pub fn to_revision(&self) -> &str {
        &self.to_revision
    }

    pub fn file_changes(&self) -> &[FileChange] {
        &self.file_changes
    }

    pub fn commits(&self) -> &[CommitRecord] {
        &self.commits
    }

    pub fn total_files_changed(&self) -> usize {
        self.total_files_changed
    }

    pub fn total_additions(&self) -> u64 {
        self.total_additions
    }

    pub fn total_deletions(&self) -> u64 {
        self.total_deletions
    }

    pub fn narrative_summary(&self) -> &str {
        &self.narrative_summary
    }
}

#[derive(Deserialize)]
struct RawDiffSummary {
    repository: String,
    from_revision: String,
    to_revision: String,
    file_changes: Vec<FileChange>,
    commits: Vec<CommitRecord>,
}

impl From<RawDiffSummary> for DiffSummary {
    fn from(raw: RawDiffSummary) -> Self {
        DiffSummary::new(
            raw.repository,
            raw.from_revision,
            raw.to_revision,
            raw.file_changes,
            raw.commits,
        )
    }
}

fn display_revision(revision: &str) -> String {
    revision.chars().take(NARRATIVE_REVISION_LEN).collect()
}
