//! GitHub API operations using octocrab.

pub mod auth;
pub mod compare;
pub mod diff;
pub mod repository;

pub use auth::{GitHubToken, TokenSource, discover_token};
pub use compare::{Comparison, GitHubApi, HostingApi, RepositoryHandle, RevisionComparator};
pub use diff::{CommitRecord, DiffSummary, FileChange, FileStatus};
pub use repository::RepoSlug;
