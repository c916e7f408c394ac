//! Change classification: file categories and the suggested version bump.

pub mod bump;
pub mod category;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::github::{CommitRecord, FileChange};

pub use bump::{BumpType, apply_bump, infer_bump, next_version};
pub use category::{FileCategory, categorize};

/// Files bucketed by category plus the inferred bump.
///
/// Only non-empty categories are present in `categories`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeClassification {
    pub categories: BTreeMap<FileCategory, Vec<String>>,
    pub suggested_bump: BumpType,
}

impl ChangeClassification {
    /// Paths in `category`, in input order.
    pub fn paths(&self, category: FileCategory) -> &[String] {
        self.categories
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Non-empty categories with their paths, in `FileCategory` order.
    pub fn iter(&self) -> impl Iterator<Item = (FileCategory, &[String])> {
        self.categories
            .iter()
            .map(|(category, paths)| (*category, paths.as_slice()))
    }
}

/// Classify a comparison. Pure and infallible.
pub fn classify(file_changes: &[FileChange], commits: &[CommitRecord]) -> ChangeClassification {
    let mut categories: BTreeMap<FileCategory, Vec<String>> = BTreeMap::new();

    for change in file_changes {
        categories
            .entry(categorize(&change.path))
            .or_default()
            .push(change.path.clone());
    }

    let has_source_changes = categories.contains_key(&FileCategory::SourceCode);

    ChangeClassification {
        suggested_bump: infer_bump(commits, has_source_changes),
        categories,
    }
}
