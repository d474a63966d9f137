//! Scripted fakes shared by the integration tests.
#![allow(dead_code)]

use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use watch_core::{
    Commit, Comparison, FetchError, FetchResult, FileChange, Issue, PageSample, PageSource,
    Release, RepoEvent, RepoRef, RepoSource, Tag, TreeEntry,
};
use watch_notify::{Dispatcher, Notification};
use watch_state::{BaselineRecord, BaselineStore, StoreError, StoreResult};

type Script<T> = Mutex<VecDeque<FetchResult<T>>>;

fn next_list<T>(script: &Script<Vec<T>>) -> FetchResult<Vec<T>> {
    script.lock().unwrap().pop_front().unwrap_or_else(|| Ok(Vec::new()))
}

/// Repository source answering from per-dimension queues. An exhausted
/// queue answers with an empty list.
#[derive(Default)]
pub struct ScriptedRepo {
    pub commits: Script<Vec<Commit>>,
    pub releases: Script<Vec<Release>>,
    pub tags: Script<Vec<Tag>>,
    pub events: Script<Vec<RepoEvent>>,
    pub issues: Script<Vec<Issue>>,
    pub compare: Script<Comparison>,
    pub calls: Mutex<Vec<String>>,
}

impl ScriptedRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_commits(&self, result: FetchResult<Vec<Commit>>) {
        self.commits.lock().unwrap().push_back(result);
    }

    pub fn push_releases(&self, result: FetchResult<Vec<Release>>) {
        self.releases.lock().unwrap().push_back(result);
    }

    pub fn push_tags(&self, result: FetchResult<Vec<Tag>>) {
        self.tags.lock().unwrap().push_back(result);
    }

    pub fn push_events(&self, result: FetchResult<Vec<RepoEvent>>) {
        self.events.lock().unwrap().push_back(result);
    }

    pub fn push_issues(&self, result: FetchResult<Vec<Issue>>) {
        self.issues.lock().unwrap().push_back(result);
    }

    pub fn push_compare(&self, result: FetchResult<Comparison>) {
        self.compare.lock().unwrap().push_back(result);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, prefix: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with(prefix))
            .collect()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl RepoSource for ScriptedRepo {
    async fn commits(
        &self,
        _repo: &RepoRef,
        since: Option<&str>,
        branch: Option<&str>,
    ) -> FetchResult<Vec<Commit>> {
        self.record(format!("commits since={since:?} branch={branch:?}"));
        next_list(&self.commits)
    }

    async fn releases(&self, _repo: &RepoRef, limit: u32) -> FetchResult<Vec<Release>> {
        self.record(format!("releases limit={limit}"));
        next_list(&self.releases)
    }

    async fn tags(&self, _repo: &RepoRef, limit: u32) -> FetchResult<Vec<Tag>> {
        self.record(format!("tags limit={limit}"));
        next_list(&self.tags)
    }

    async fn events(&self, _repo: &RepoRef, limit: u32) -> FetchResult<Vec<RepoEvent>> {
        self.record(format!("events limit={limit}"));
        next_list(&self.events)
    }

    async fn issues(
        &self,
        _repo: &RepoRef,
        since: Option<DateTime<Utc>>,
    ) -> FetchResult<Vec<Issue>> {
        self.record(format!("issues since_set={}", since.is_some()));
        next_list(&self.issues)
    }

    async fn compare(&self, _repo: &RepoRef, base: &str, head: &str) -> FetchResult<Comparison> {
        self.record(format!("compare {base}...{head}"));
        self.compare
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(FetchError::Fatal("no comparison scripted".to_string())))
    }

    async fn tree(&self, _repo: &RepoRef, reference: &str) -> FetchResult<Vec<TreeEntry>> {
        self.record(format!("tree {reference}"));
        Ok(Vec::new())
    }
}

/// Page source answering from a queue.
#[derive(Default)]
pub struct ScriptedPage {
    pub samples: Script<PageSample>,
}

impl ScriptedPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_body(&self, body: &str) {
        self.samples
            .lock()
            .unwrap()
            .push_back(Ok(PageSample::from_body(body.as_bytes(), 200, Utc::now())));
    }

    pub fn push_error(&self, err: FetchError) {
        self.samples.lock().unwrap().push_back(Err(err));
    }
}

#[async_trait]
impl PageSource for ScriptedPage {
    async fn sample(&self, _url: &str) -> FetchResult<PageSample> {
        self.samples
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(FetchError::Transient("no sample scripted".to_string())))
    }
}

/// Dispatcher that records every notification and reports success.
#[derive(Default)]
pub struct RecordingDispatcher {
    pub sent: Mutex<Vec<Notification>>,
}

impl RecordingDispatcher {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Dispatcher for RecordingDispatcher {
    async fn dispatch(&self, notification: &Notification) -> BTreeMap<String, bool> {
        self.sent.lock().unwrap().push(notification.clone());
        BTreeMap::from([("recording".to_string(), true)])
    }
}

/// Store whose writes always fail.
pub struct ReadOnlyStore;

impl BaselineStore for ReadOnlyStore {
    fn load(&self, _identity: &str) -> StoreResult<Option<BaselineRecord>> {
        Ok(None)
    }

    fn save(&self, _identity: &str, _record: &BaselineRecord) -> StoreResult<()> {
        Err(StoreError::Serialization("read-only store".to_string()))
    }

    fn remove(&self, _identity: &str) -> StoreResult<()> {
        Ok(())
    }
}

pub fn commit(sha: &str) -> Commit {
    Commit {
        sha: sha.to_string(),
        message: format!("commit {sha}"),
        author: "octo".to_string(),
        date: format!("2025-01-01T00:00:0{}Z", sha.len() % 10),
        url: format!("https://github.com/octo/hello/commit/{sha}"),
    }
}

pub fn release(id: u64, tag: &str) -> Release {
    Release {
        id,
        tag: tag.to_string(),
        name: tag.to_string(),
        published: Some("2025-01-01T00:00:00Z".to_string()),
        prerelease: false,
        draft: false,
        author: "octo".to_string(),
        url: String::new(),
        body: String::new(),
    }
}

pub fn tag(name: &str) -> Tag {
    Tag {
        name: name.to_string(),
        sha: format!("sha-{name}"),
    }
}

pub fn event(id: &str) -> RepoEvent {
    RepoEvent {
        id: id.to_string(),
        kind: "PushEvent".to_string(),
        actor: "octo".to_string(),
        created: "2025-01-01T00:00:00Z".to_string(),
        payload_action: String::new(),
        payload_ref: "refs/heads/main".to_string(),
        payload_size: 1,
    }
}

pub fn issue(number: u64, is_pr: bool) -> Issue {
    Issue {
        number,
        title: format!("issue {number}"),
        state: "open".to_string(),
        is_pr,
        user: "octo".to_string(),
        created: "2025-01-01T00:00:00Z".to_string(),
        updated: "2025-01-02T00:00:00Z".to_string(),
        labels: vec![],
        url: String::new(),
    }
}

pub fn comparison(files: &[&str]) -> Comparison {
    Comparison {
        status: "ahead".to_string(),
        ahead_by: 2,
        behind_by: 0,
        total_commits: 2,
        commits: vec![],
        files: files
            .iter()
            .map(|f| FileChange {
                filename: f.to_string(),
                status: "modified".to_string(),
                additions: 1,
                deletions: 1,
                changes: 2,
                patch: String::new(),
            })
            .collect(),
    }
}
