//! Baseline diff engine.
//!
//! Three strategies, one per marker kind:
//!
//! - [`diff_ordered`]: positional trimming of a newest-first snapshot
//!   against the last-seen item (commits, releases, tags, events)
//! - [`diff_since`]: time-window dimensions where the adapter already
//!   filtered by the last check time (issues)
//! - [`diff_content`]: binary changed/unchanged on a content hash (pages)
//!
//! The first observation of a dimension always bootstraps: the marker is
//! established and nothing is reported as new.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use watch_state::BaselineRecord;

use crate::domain::{Commit, PageSample, Release, RepoEvent, Tag};

/// An item with a marker identity in its dimension's natural order.
pub trait Keyed {
    type Marker: Clone + PartialEq + fmt::Debug;

    fn marker(&self) -> Self::Marker;
}

impl Keyed for Commit {
    type Marker = String;

    fn marker(&self) -> String {
        self.sha.clone()
    }
}

impl Keyed for Release {
    type Marker = u64;

    fn marker(&self) -> u64 {
        self.id
    }
}

impl Keyed for Tag {
    type Marker = String;

    fn marker(&self) -> String {
        self.name.clone()
    }
}

impl Keyed for RepoEvent {
    type Marker = String;

    fn marker(&self) -> String {
        self.id.clone()
    }
}

/// Outcome of diffing one dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct DimensionDiff<T, M> {
    /// New items, newest first
    pub new_items: Vec<T>,
    /// Marker to persist; `None` only if there was never anything to mark
    pub new_marker: Option<M>,
    /// This was the first observation of the dimension
    pub bootstrapped: bool,
    /// The stored marker was not found in the fetched window
    pub window_exceeded: bool,
}

impl<T, M> DimensionDiff<T, M> {
    pub fn is_empty(&self) -> bool {
        self.new_items.is_empty()
    }
}

/// Trim a newest-first `snapshot` against `stored`.
///
/// Items are collected from the newest until the stored marker is met. If
/// the marker is not in the window (it fell off the fetched page), every
/// fetched item is reported as new and `window_exceeded` is set: the engine
/// cannot see past the fetch window, so this is a best-effort answer.
pub fn diff_ordered<T: Keyed>(
    snapshot: Vec<T>,
    stored: Option<&T::Marker>,
) -> DimensionDiff<T, T::Marker> {
    let Some(newest) = snapshot.first().map(Keyed::marker) else {
        return DimensionDiff {
            new_items: Vec::new(),
            new_marker: stored.cloned(),
            bootstrapped: false,
            window_exceeded: false,
        };
    };

    let Some(stored) = stored else {
        return DimensionDiff {
            new_items: Vec::new(),
            new_marker: Some(newest),
            bootstrapped: true,
            window_exceeded: false,
        };
    };

    let total = snapshot.len();
    let new_items: Vec<T> = snapshot
        .into_iter()
        .take_while(|item| item.marker() != *stored)
        .collect();
    let window_exceeded = new_items.len() == total;

    DimensionDiff {
        new_items,
        new_marker: Some(newest),
        bootstrapped: false,
        window_exceeded,
    }
}

/// Diff a dimension whose marker is the time of the last check.
///
/// The adapter is asked for items updated since `last_check`, so everything
/// it returns is new. Without a previous check the dimension bootstraps.
pub fn diff_since<T>(
    snapshot: Vec<T>,
    last_check: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> DimensionDiff<T, DateTime<Utc>> {
    match last_check {
        None => DimensionDiff {
            new_items: Vec::new(),
            new_marker: Some(now),
            bootstrapped: true,
            window_exceeded: false,
        },
        Some(_) => DimensionDiff {
            new_items: snapshot,
            new_marker: Some(now),
            bootstrapped: false,
            window_exceeded: false,
        },
    }
}

/// A detected page content change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentChange {
    pub url: String,
    pub old_hash: String,
    pub new_hash: String,
    pub old_timestamp: Option<String>,
    pub new_timestamp: String,
    /// New length minus old length, in bytes
    pub content_length_change: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ContentDiff {
    Bootstrap,
    Unchanged,
    Changed(ContentChange),
}

/// Compare a fresh page sample with the stored baseline.
pub fn diff_content(url: &str, previous: Option<&BaselineRecord>, sample: &PageSample) -> ContentDiff {
    let Some(previous) = previous else {
        return ContentDiff::Bootstrap;
    };
    let Some(old_hash) = previous.hash.as_deref() else {
        return ContentDiff::Bootstrap;
    };

    if old_hash == sample.hash {
        return ContentDiff::Unchanged;
    }

    let old_length = previous.content_length.unwrap_or(0) as i64;
    ContentDiff::Changed(ContentChange {
        url: url.to_string(),
        old_hash: old_hash.to_string(),
        new_hash: sample.hash.clone(),
        old_timestamp: previous.timestamp.clone(),
        new_timestamp: sample.fetched_at.to_rfc3339(),
        content_length_change: sample.content_length as i64 - old_length,
    })
}
