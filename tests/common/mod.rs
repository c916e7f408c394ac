//! Shared test utilities for integration tests.
//!
//! Not all functions are used by every test file, but they're shared across tests.
#![allow(dead_code)]

use octocrab::Octocrab;
use releasecast::RevisionRequest;
use serde_json::{Value, json};

/// Helper to create an octocrab client pointing to a mock server.
pub fn mock_client(uri: &str) -> Octocrab {
    Octocrab::builder()
        .base_uri(uri)
        .expect("Failed to set base URI")
        .build()
        .expect("Failed to build octocrab")
}

/// `GET /repos/{owner}/{name}` body.
pub fn repository_json(owner: &str, name: &str) -> Value {
    json!({
        "id": 1,
        "name": name,
        "full_name": format!("{}/{}", owner, name),
        "default_branch": "main",
        "description": "Test repository",
        "html_url": format!("https://github.com/{}/{}", owner, name),
        "private": false
    })
}

/// One entry of a comparison's `files` array.
pub fn file_json(path: &str, additions: u64, deletions: u64, status: &str) -> Value {
    json!({
        "sha": "bbcd538c8e72b8c175046e27cc8f907076331401",
        "filename": path,
        "status": status,
        "additions": additions,
        "deletions": deletions,
        "changes": additions + deletions,
        "patch": format!("@@ -1 +1 @@\n-old {}\n+new {}", path, path)
    })
}

/// One entry of a comparison's `commits` array.
pub fn commit_json(sha: &str, message: &str) -> Value {
    json!({
        "sha": sha,
        "html_url": format!("https://github.com/octo/demo/commit/{}", sha),
        "commit": {
            "message": message,
            "author": {
                "name": "Octo Cat",
                "email": "octocat@github.com",
                "date": "2024-05-01T12:00:00Z"
            }
        }
    })
}

/// `GET /repos/{owner}/{name}/compare/{from}...{to}` body.
pub fn comparison_json(total_commits: usize, commits: Vec<Value>, files: Vec<Value>) -> Value {
    json!({
        "status": "ahead",
        "ahead_by": total_commits,
        "behind_by": 0,
        "total_commits": total_commits,
        "commits": commits,
        "files": files
    })
}

/// GitHub-style error body.
pub fn error_json(message: &str) -> Value {
    json!({
        "message": message,
        "documentation_url": "https://docs.github.com/rest"
    })
}

/// The request used by the end-to-end scenario.
pub fn demo_request() -> RevisionRequest {
    RevisionRequest::new("octo/demo", "v1.0.0", "v1.1.0", "team@example.com")
        .expect("demo request is valid")
}
