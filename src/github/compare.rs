//! Revision comparison via the GitHub REST API.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use octocrab::Octocrab;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::CompareError;

use super::diff::{CommitRecord, DiffSummary, FileChange};
use super::repository::RepoSlug;

/// Commits requested per comparison page.
const COMMITS_PER_PAGE: u8 = 100;

/// Safety limit on comparison pages.
const MAX_PAGES: u32 = 50;

/// Characters escaped in a revision path segment. `/` stays for branch names.
const REVISION_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// A repository that exists on the hosting API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryHandle {
    pub slug: RepoSlug,
    pub default_branch: Option<String>,
    pub description: Option<String>,
    pub html_url: Option<String>,
}

/// File and commit lists returned by a comparison, in API order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Comparison {
    pub files: Vec<FileChange>,
    pub commits: Vec<CommitRecord>,
}

/// Operations the comparator needs from a source-control host.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HostingApi: Send + Sync {
    async fn resolve_repository(&self, slug: &RepoSlug) -> Result<RepositoryHandle, CompareError>;

    async fn compare_revisions(
        &self,
        handle: &RepositoryHandle,
        from: &str,
        to: &str,
    ) -> Result<Comparison, CompareError>;
}

/// Produces a [`DiffSummary`] between two revisions of a repository.
pub struct RevisionComparator<H = GitHubApi> {
    api: H,
}

impl<H: HostingApi> RevisionComparator<H> {
    pub fn new(api: H) -> Self {
        Self { api }
    }

    /// Compare `from_revision` with `to_revision`.
    ///
    /// The repository identifier is normalized first; full revision strings
    /// are passed to the API unchanged. Failures are returned, never retried.
    pub async fn compare(
        &self,
        repository: &str,
        from_revision: &str,
        to_revision: &str,
    ) -> Result<DiffSummary, CompareError> {
        let slug = RepoSlug::parse(repository)?;

        for revision in [from_revision, to_revision] {
            if revision.trim().is_empty() {
                return Err(CompareError::RevisionNotFound {
                    repository: slug.to_string(),
                    detail: "empty revision pointer".to_string(),
                });
            }
        }

        let handle = self.api.resolve_repository(&slug).await?;
        debug!("Resolved repository {}", handle.slug);

        let comparison = self
            .api
            .compare_revisions(&handle, from_revision, to_revision)
            .await?;

        debug!(
            "Compared {}...{}: {} files, {} commits",
            from_revision,
            to_revision,
            comparison.files.len(),
            comparison.commits.len()
        );

        Ok(DiffSummary::new(
            slug.to_string(),
            from_revision,
            to_revision,
            comparison.files,
            comparison.commits,
        ))
    }
}

/// [`HostingApi`] backed by octocrab.
pub struct GitHubApi {
    client: Octocrab,
}

impl GitHubApi {
    /// Build a client, optionally authenticated and pointed at a custom API root.
    pub fn new(token: Option<&str>, base_uri: Option<&str>) -> Result<Self, CompareError> {
        let mut builder = Octocrab::builder();

        if let Some(uri) = base_uri {
            builder = builder
                .base_uri(uri)
                .map_err(|e| CompareError::UpstreamUnavailable(e.to_string()))?;
        }
        if let Some(token) = token {
            builder = builder.personal_token(token.to_string());
        }

        let client = builder
            .build()
            .map_err(|e| CompareError::UpstreamUnavailable(e.to_string()))?;

        Ok(Self { client })
    }

    /// Use a pre-configured octocrab client.
    ///
    /// This allows dependency injection for testing with mock servers.
    pub fn with_client(client: Octocrab) -> Self {
        Self { client }
    }
}

#[derive(Deserialize)]
struct ApiRepository {
    #[serde(default)]
    default_branch: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    html_url: Option<String>,
}

#[derive(Deserialize)]
struct ApiComparison {
    #[serde(default)]
    total_commits: Option<usize>,
    #[serde(default)]
    commits: Option<Vec<ApiCommit>>,
    #[serde(default)]
    files: Option<Vec<ApiFile>>,
}

#[derive(Deserialize)]
struct ApiFile {
    filename: String,
    #[serde(default)]
    additions: u64,
    #[serde(default)]
    deletions: u64,
    status: String,
    #[serde(default)]
    patch: Option<String>,
}

#[derive(Deserialize)]
struct ApiCommit {
    sha: String,
    #[serde(default)]
    html_url: Option<String>,
    commit: ApiCommitDetail,
}

#[derive(Deserialize)]
struct ApiCommitDetail {
    message: String,
    #[serde(default)]
    author: Option<ApiSignature>,
}

#[derive(Deserialize)]
struct ApiSignature {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    date: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
struct PageParams {
    per_page: u8,
    page: u32,
}

impl From<ApiFile> for FileChange {
    fn from(file: ApiFile) -> Self {
        FileChange {
            path: file.filename,
            additions: file.additions,
            deletions: file.deletions,
            patch: file.patch.unwrap_or_default(),
            status: file.status,
        }
    }
}

impl From<ApiCommit> for CommitRecord {
    fn from(commit: ApiCommit) -> Self {
        let (author_name, author_date) = match commit.commit.author {
            Some(sig) => (sig.name.unwrap_or_else(|| "unknown".to_string()), sig.date),
            None => ("unknown".to_string(), None),
        };

        CommitRecord {
            sha: commit.sha,
            message: commit.commit.message,
            author_name,
            author_date,
            url: commit.html_url.unwrap_or_default(),
        }
    }
}

#[async_trait]
impl HostingApi for GitHubApi {
    async fn resolve_repository(&self, slug: &RepoSlug) -> Result<RepositoryHandle, CompareError> {
        let route = format!("/repos/{}/{}", slug.owner, slug.name);

        let repo: ApiRepository = self
            .client
            .get(&route, None::<&()>)
            .await
            .map_err(|e| match classify(&e) {
                ApiFailure::NotFound => CompareError::RepositoryNotFound {
                    owner: slug.owner.clone(),
                    name: slug.name.clone(),
                },
                _ => CompareError::UpstreamUnavailable(e.to_string()),
            })?;

        Ok(RepositoryHandle {
            slug: slug.clone(),
            default_branch: repo.default_branch,
            description: repo.description,
            html_url: repo.html_url,
        })
    }

    async fn compare_revisions(
        &self,
        handle: &RepositoryHandle,
        from: &str,
        to: &str,
    ) -> Result<Comparison, CompareError> {
        let route = format!(
            "/repos/{}/{}/compare/{}...{}",
            handle.slug.owner,
            handle.slug.name,
            encode_revision(from),
            encode_revision(to)
        );

        let mut comparison = Comparison::default();
        let mut page = 1u32;

        loop {
            let params = PageParams {
                per_page: COMMITS_PER_PAGE,
                page,
            };

            let response: ApiComparison =
                self.client
                    .get(&route, Some(&params))
                    .await
                    .map_err(|e| match classify(&e) {
                        ApiFailure::NotFound | ApiFailure::UnknownRevision => {
                            CompareError::RevisionNotFound {
                                repository: handle.slug.to_string(),
                                detail: format!("'{}' or '{}' does not resolve", from, to),
                            }
                        }
                        _ => CompareError::UpstreamUnavailable(e.to_string()),
                    })?;

            // The full file list arrives with the first page.
            if page == 1 {
                comparison.files = response
                    .files
                    .unwrap_or_default()
                    .into_iter()
                    .map(FileChange::from)
                    .collect();
            }

            let page_commits = response.commits.unwrap_or_default();
            let fetched = page_commits.len();
            comparison
                .commits
                .extend(page_commits.into_iter().map(CommitRecord::from));

            let total = response.total_commits.unwrap_or(0);
            debug!(
                "Comparison page {}: {} commits ({}/{})",
                page,
                fetched,
                comparison.commits.len(),
                total
            );

            if fetched == 0 || comparison.commits.len() >= total {
                break;
            }

            page += 1;

            if page > MAX_PAGES {
                warn!(
                    "Reached {}-page safety limit while comparing {} in {}",
                    MAX_PAGES, route, handle.slug
                );
                break;
            }
        }

        Ok(comparison)
    }
}

/// Percent-encode a revision so `#`, `?` and `%` reach the API intact.
fn encode_revision(revision: &str) -> String {
    utf8_percent_encode(revision, REVISION_ENCODE_SET).to_string()
}

#[derive(Debug, PartialEq, Eq)]
enum ApiFailure {
    NotFound,
    UnknownRevision,
    RateLimited,
    Other,
}

/// Classify an octocrab error from its Display and Debug output.
fn classify(err: &octocrab::Error) -> ApiFailure {
    let display = err.to_string().to_lowercase();
    let debug = format!("{:?}", err).to_lowercase();
    let mentions = |needle: &str| display.contains(needle) || debug.contains(needle);

    if mentions("rate limit") {
        ApiFailure::RateLimited
    } else if mentions("no commit found") || mentions("no common ancestor") {
        ApiFailure::UnknownRevision
    } else if mentions("not found") || mentions("status_code: 404") {
        ApiFailure::NotFound
    } else {
        ApiFailure::Other
    }
}
