//! GitHub REST adapter.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use super::http::{build_client, classify_failure, transport_error};
use super::RepoSource;
use crate::config::GitHubConfig;
use crate::domain::items::{first_line, truncate_chars};
use crate::domain::{
    Commit, CommitSummary, Comparison, FileChange, Issue, Release, RepoEvent, RepoRef, Tag,
    TreeEntry,
};
use crate::error::{ConfigError, FetchError, FetchResult};

const RELEASE_BODY_MAX: usize = 500;
const PATCH_MAX: usize = 1000;

pub struct GitHubClient {
    http: reqwest::Client,
    token: String,
    config: GitHubConfig,
}

impl GitHubClient {
    /// Build a client. A missing or empty token is a configuration error.
    pub fn new(config: GitHubConfig) -> Result<Self, ConfigError> {
        let token = config
            .token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .ok_or(ConfigError::MissingCredential("GITHUB_TOKEN"))?;
        let http = build_client(&config.user_agent, config.request_timeout, false)?;
        Ok(Self {
            http,
            token,
            config,
        })
    }

    pub fn config(&self) -> &GitHubConfig {
        &self.config
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> FetchResult<T> {
        let url = format!("{}{}", self.config.api_base, path);
        debug!(url = %url, "GET");

        let response = self
            .http
            .get(&url)
            .header(AUTHORIZATION, format!("token {}", self.token))
            .header(ACCEPT, "application/vnd.github.v3+json")
            .query(query)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let body = response.text().await.unwrap_or_default();
            return Err(classify_failure(status, &headers, &body, Utc::now()));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| FetchError::Fatal(format!("undecodable response from {path}: {e}")))
    }
}

#[derive(Deserialize)]
struct RawUser {
    login: String,
}

fn login(user: Option<RawUser>) -> String {
    user.map(|u| u.login).unwrap_or_default()
}

#[derive(Deserialize)]
struct RawSignature {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    date: Option<String>,
}

#[derive(Deserialize)]
struct RawCommitDetail {
    message: String,
    #[serde(default)]
    author: Option<RawSignature>,
}

#[derive(Deserialize)]
struct RawCommit {
    sha: String,
    commit: RawCommitDetail,
    #[serde(default)]
    html_url: String,
}

impl RawCommit {
    fn author_and_date(&self) -> (String, String) {
        match &self.commit.author {
            Some(sig) => (
                sig.name.clone().unwrap_or_default(),
                sig.date.clone().unwrap_or_default(),
            ),
            None => (String::new(), String::new()),
        }
    }
}

impl From<RawCommit> for Commit {
    fn from(raw: RawCommit) -> Self {
        let (author, date) = raw.author_and_date();
        Commit {
            message: first_line(&raw.commit.message),
            sha: raw.sha,
            author,
            date,
            url: raw.html_url,
        }
    }
}

impl From<RawCommit> for CommitSummary {
    fn from(raw: RawCommit) -> Self {
        let (author, date) = raw.author_and_date();
        CommitSummary {
            message: first_line(&raw.commit.message),
            sha: raw.sha,
            author,
            date,
        }
    }
}

#[derive(Deserialize)]
struct RawRelease {
    id: u64,
    tag_name: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    published_at: Option<String>,
    #[serde(default)]
    prerelease: bool,
    #[serde(default)]
    draft: bool,
    #[serde(default)]
    author: Option<RawUser>,
    #[serde(default)]
    html_url: String,
    #[serde(default)]
    body: Option<String>,
}

impl From<RawRelease> for Release {
    fn from(raw: RawRelease) -> Self {
        let name = raw
            .name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| raw.tag_name.clone());
        Release {
            id: raw.id,
            tag: raw.tag_name,
            name,
            published: raw.published_at,
            prerelease: raw.prerelease,
            draft: raw.draft,
            author: login(raw.author),
            url: raw.html_url,
            body: truncate_chars(raw.body.as_deref().unwrap_or_default(), RELEASE_BODY_MAX),
        }
    }
}

#[derive(Deserialize)]
struct RawTagCommit {
    sha: String,
}

#[derive(Deserialize)]
struct RawTag {
    name: String,
    commit: RawTagCommit,
}

#[derive(Deserialize, Default)]
struct RawEventPayload {
    #[serde(default)]
    action: Option<String>,
    #[serde(default, rename = "ref")]
    reference: Option<String>,
    #[serde(default)]
    size: Option<u64>,
}

#[derive(Deserialize)]
struct RawEvent {
    id: String,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    actor: Option<RawUser>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    payload: RawEventPayload,
}

impl From<RawEvent> for RepoEvent {
    fn from(raw: RawEvent) -> Self {
        RepoEvent {
            id: raw.id,
            kind: raw.kind.unwrap_or_default(),
            actor: login(raw.actor),
            created: raw.created_at.unwrap_or_default(),
            payload_action: raw.payload.action.unwrap_or_default(),
            payload_ref: raw.payload.reference.unwrap_or_default(),
            payload_size: raw.payload.size.unwrap_or(0),
        }
    }
}

#[derive(Deserialize)]
struct RawLabel {
    name: String,
}

#[derive(Deserialize)]
struct RawIssue {
    number: u64,
    title: String,
    state: String,
    #[serde(default)]
    pull_request: Option<serde_json::Value>,
    #[serde(default)]
    user: Option<RawUser>,
    #[serde(default)]
    created_at: String,
    #[serde(default)]
    updated_at: String,
    #[serde(default)]
    labels: Vec<RawLabel>,
    #[serde(default)]
    html_url: String,
}

impl From<RawIssue> for Issue {
    fn from(raw: RawIssue) -> Self {
        Issue {
            number: raw.number,
            title: raw.title,
            state: raw.state,
            is_pr: raw.pull_request.is_some(),
            user: login(raw.user),
            created: raw.created_at,
            updated: raw.updated_at,
            labels: raw.labels.into_iter().map(|l| l.name).collect(),
            url: raw.html_url,
        }
    }
}

#[derive(Deserialize)]
struct RawFile {
    filename: String,
    status: String,
    #[serde(default)]
    additions: u64,
    #[serde(default)]
    deletions: u64,
    #[serde(default)]
    changes: u64,
    #[serde(default)]
    patch: Option<String>,
}

impl From<RawFile> for FileChange {
    fn from(raw: RawFile) -> Self {
        FileChange {
            filename: raw.filename,
            status: raw.status,
            additions: raw.additions,
            deletions: raw.deletions,
            changes: raw.changes,
            patch: truncate_chars(raw.patch.as_deref().unwrap_or_default(), PATCH_MAX),
        }
    }
}

#[derive(Deserialize)]
struct RawComparison {
    #[serde(default)]
    status: String,
    #[serde(default)]
    ahead_by: u64,
    #[serde(default)]
    behind_by: u64,
    #[serde(default)]
    total_commits: u64,
    #[serde(default)]
    commits: Vec<RawCommit>,
    #[serde(default)]
    files: Vec<RawFile>,
}

impl From<RawComparison> for Comparison {
    fn from(raw: RawComparison) -> Self {
        Comparison {
            status: raw.status,
            ahead_by: raw.ahead_by,
            behind_by: raw.behind_by,
            total_commits: raw.total_commits,
            commits: raw.commits.into_iter().map(CommitSummary::from).collect(),
            files: raw.files.into_iter().map(FileChange::from).collect(),
        }
    }
}

#[derive(Deserialize)]
struct RawTreeEntry {
    path: String,
    #[serde(rename = "type")]
    kind: String,
    sha: String,
    #[serde(default)]
    size: Option<u64>,
}

#[derive(Deserialize)]
struct RawTree {
    #[serde(default)]
    tree: Vec<RawTreeEntry>,
}

fn blobs(tree: RawTree) -> Vec<TreeEntry> {
    tree.tree
        .into_iter()
        .filter(|e| e.kind == "blob")
        .map(|e| TreeEntry {
            path: e.path,
            kind: e.kind,
            sha: e.sha,
            size: e.size.unwrap_or(0),
        })
        .collect()
}

#[async_trait]
impl RepoSource for GitHubClient {
    async fn commits(
        &self,
        repo: &RepoRef,
        since: Option<&str>,
        branch: Option<&str>,
    ) -> FetchResult<Vec<Commit>> {
        let mut query = vec![("per_page", self.config.commits_per_page.to_string())];
        if let Some(since) = since {
            query.push(("since", since.to_string()));
        }
        if let Some(branch) = branch {
            query.push(("sha", branch.to_string()));
        }
        let raw: Vec<RawCommit> = self
            .get_json(&format!("/repos/{}/{}/commits", repo.owner, repo.name), &query)
            .await?;
        Ok(raw.into_iter().map(Commit::from).collect())
    }

    async fn releases(&self, repo: &RepoRef, limit: u32) -> FetchResult<Vec<Release>> {
        let raw: Vec<RawRelease> = self
            .get_json(
                &format!("/repos/{}/{}/releases", repo.owner, repo.name),
                &[("per_page", limit.to_string())],
            )
            .await?;
        Ok(raw.into_iter().map(Release::from).collect())
    }

    async fn tags(&self, repo: &RepoRef, limit: u32) -> FetchResult<Vec<Tag>> {
        let raw: Vec<RawTag> = self
            .get_json(
                &format!("/repos/{}/{}/tags", repo.owner, repo.name),
                &[("per_page", limit.to_string())],
            )
            .await?;
        Ok(raw
            .into_iter()
            .map(|t| Tag {
                name: t.name,
                sha: t.commit.sha,
            })
            .collect())
    }

    async fn events(&self, repo: &RepoRef, limit: u32) -> FetchResult<Vec<RepoEvent>> {
        let raw: Vec<RawEvent> = self
            .get_json(
                &format!("/repos/{}/{}/events", repo.owner, repo.name),
                &[("per_page", limit.min(100).to_string())],
            )
            .await?;
        Ok(raw
            .into_iter()
            .take(limit as usize)
            .map(RepoEvent::from)
            .collect())
    }

    async fn issues(
        &self,
        repo: &RepoRef,
        since: Option<DateTime<Utc>>,
    ) -> FetchResult<Vec<Issue>> {
        let mut query = vec![
            ("per_page", self.config.issues_per_page.to_string()),
            ("state", "all".to_string()),
            ("sort", "updated".to_string()),
            ("direction", "desc".to_string()),
        ];
        if let Some(since) = since {
            query.push(("since", since.to_rfc3339_opts(SecondsFormat::Secs, true)));
        }
        let raw: Vec<RawIssue> = self
            .get_json(&format!("/repos/{}/{}/issues", repo.owner, repo.name), &query)
            .await?;
        Ok(raw.into_iter().map(Issue::from).collect())
    }

    async fn compare(&self, repo: &RepoRef, base: &str, head: &str) -> FetchResult<Comparison> {
        let raw: RawComparison = self
            .get_json(
                &format!("/repos/{}/{}/compare/{base}...{head}", repo.owner, repo.name),
                &[],
            )
            .await?;
        Ok(raw.into())
    }

    async fn tree(&self, repo: &RepoRef, reference: &str) -> FetchResult<Vec<TreeEntry>> {
        let raw: RawTree = self
            .get_json(
                &format!("/repos/{}/{}/git/trees/{reference}", repo.owner, repo.name),
                &[("recursive", "1".to_string())],
            )
            .await?;
        Ok(blobs(raw))
    }
}
