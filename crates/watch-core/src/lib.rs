//! Watch-Core: incremental baseline-diff monitoring
//!
//! Samples remote resources (GitHub repositories, web pages), compares each
//! sample against the stored baseline, and reports only what is new.
//!
//! ## Key Components
//!
//! - `adapter`: GitHub and HTTP page adapters behind `RepoSource` / `PageSource`
//! - `fetch`: rate-limit aware retry around adapter calls
//! - `diff`: marker trimming, since-window and content-hash diffs
//! - `aggregator` / `severity` / `alert`: change sets and what to say about them
//! - `monitor`: one pass per resource, persisting markers once per pass
//! - `scheduler`: one-shot and cancellable watch loop

pub mod adapter;
pub mod aggregator;
pub mod alert;
pub mod config;
pub mod diff;
pub mod domain;
pub mod error;
pub mod fetch;
pub mod metrics;
pub mod monitor;
pub mod obs;
pub mod reporting;
pub mod scheduler;
pub mod severity;
pub mod telemetry;

pub use adapter::{parse_url_list, read_url_list, GitHubClient, HttpPageSource, PageSource, RepoSource};
pub use aggregator::{ChangeAggregator, ChangeSet, CommitRange};
pub use alert::compose_notification;
pub use config::{FetchPolicy, GitHubConfig, PageConfig, ScheduleSettings, WindowLimits};
pub use diff::{diff_content, diff_ordered, diff_since, ContentChange, ContentDiff, DimensionDiff, Keyed};
pub use domain::{
    Commit, CommitSummary, Comparison, Dimension, FileChange, Issue, PageSample, Release,
    RepoEvent, RepoRef, ResourceIdentity, Tag, TreeEntry,
};
pub use error::{ConfigError, FetchError, FetchResult, MonitorError};
pub use fetch::RateLimitedFetcher;
pub use metrics::METRICS;
pub use monitor::{Monitor, PageMonitor, RepoMonitor};
pub use scheduler::{LoopState, PassOutcome, Scheduler};
pub use severity::{ChangeKind, SeverityPolicy, SeverityRule};
pub use telemetry::init_tracing;
