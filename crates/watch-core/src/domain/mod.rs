//! Domain model: what is monitored and what a fetch returns.

pub mod dimension;
pub mod identity;
pub mod items;

pub use dimension::Dimension;
pub use identity::{RepoRef, ResourceIdentity};
pub use items::{
    Commit, CommitSummary, Comparison, FileChange, Issue, PageSample, Release, RepoEvent, Tag,
    TreeEntry,
};
