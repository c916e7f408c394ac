//! File-path categorization.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Release category of a changed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileCategory {
    SourceCode,
    Tests,
    Documentation,
    Config,
    Dependencies,
    Other,
}

impl FileCategory {
    pub const ALL: [FileCategory; 6] = [
        FileCategory::SourceCode,
        FileCategory::Tests,
        FileCategory::Documentation,
        FileCategory::Config,
        FileCategory::Dependencies,
        FileCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FileCategory::SourceCode => "source_code",
            FileCategory::Tests => "tests",
            FileCategory::Documentation => "documentation",
            FileCategory::Config => "config",
            FileCategory::Dependencies => "dependencies",
            FileCategory::Other => "other",
        }
    }
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const TEST_INFIXES: [&str; 5] = ["/test/", "/tests/", "_test.", ".test.", "spec."];
const TEST_PREFIXES: [&str; 2] = ["test/", "tests/"];
const DOC_EXTENSIONS: [&str; 4] = [".md", ".txt", ".rst", ".adoc"];
const DEPENDENCY_MANIFESTS: [&str; 5] = [
    "package.json",
    "requirements.txt",
    "Gemfile",
    "pom.xml",
    "build.gradle",
];
const CONFIG_EXTENSIONS: [&str; 6] = [".json", ".yaml", ".yml", ".toml", ".ini", ".env"];
const SOURCE_EXTENSIONS: [&str; 11] = [
    ".py", ".js", ".ts", ".java", ".cpp", ".c", ".go", ".rb", ".php", ".rs", ".swift",
];

/// Categorize one path. First matching rule wins; matching is case-sensitive.
///
/// Rule order: tests, documentation, dependencies, config, source code, other.
/// A manifest with a documentation extension (`requirements.txt`) is therefore
/// filed under documentation.
pub fn categorize(path: &str) -> FileCategory {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    let ends_with_any = |exts: &[&str]| exts.iter().any(|ext| path.ends_with(ext));

    if TEST_INFIXES.iter().any(|marker| path.contains(marker))
        || TEST_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
    {
        FileCategory::Tests
    } else if ends_with_any(&DOC_EXTENSIONS) {
        FileCategory::Documentation
    } else if DEPENDENCY_MANIFESTS.contains(&file_name) {
        FileCategory::Dependencies
    } else if ends_with_any(&CONFIG_EXTENSIONS) {
        FileCategory::Config
    } else if ends_with_any(&SOURCE_EXTENSIONS) {
        FileCategory::SourceCode
    } else {
        FileCategory::Other
    }
}
