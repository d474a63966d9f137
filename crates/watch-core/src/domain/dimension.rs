use std::fmt;

use serde::{Deserialize, Serialize};

/// An independently ordered category of facts about a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Commits,
    Releases,
    Tags,
    Events,
    Issues,
    ContentHash,
}

impl Dimension {
    /// Repository dimensions in the order a pass fetches them.
    pub const REPOSITORY: [Dimension; 5] = [
        Dimension::Commits,
        Dimension::Releases,
        Dimension::Tags,
        Dimension::Events,
        Dimension::Issues,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Commits => "commits",
            Dimension::Releases => "releases",
            Dimension::Tags => "tags",
            Dimension::Events => "events",
            Dimension::Issues => "issues",
            Dimension::ContentHash => "content_hash",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
