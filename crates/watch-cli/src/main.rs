//! ASM Watch - change monitoring for attack surface management
//!
//! The `asm-watch` command watches GitHub repositories and web pages and
//! reports only what changed since the last run.
//!
//! ## Commands
//!
//! - `repo`: monitor one repository (commits, releases, tags, events, issues)
//! - `pages`: monitor web pages for content changes
//! - `github`: ad-hoc repository listings exported as JSON
//! - `notify`: send a manual notification through configured channels

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn, Level};

use watch_core::{
    read_url_list, reporting, ChangeSet, ConfigError, ContentChange, GitHubClient, GitHubConfig,
    HttpPageSource, Monitor, PageConfig, PageMonitor, PassOutcome, RateLimitedFetcher, RepoMonitor,
    RepoRef, RepoSource, ScheduleSettings, Scheduler,
};
use watch_notify::{ChannelSelection, Notification, NotificationHub, NotifyConfig, Severity};
use watch_state::JsonFileStore;

#[derive(Parser)]
#[command(name = "asm-watch")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Incremental change monitoring for repositories and web pages", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Monitor a GitHub repository against its stored baseline
    Repo(RepoArgs),

    /// Monitor web pages for content changes
    Pages(PagesArgs),

    /// Ad-hoc repository listings
    Github(GithubArgs),

    /// Send a manual notification through configured channels
    Notify(NotifyArgs),
}

#[derive(Args)]
struct NotifyArgs {
    #[arg(long)]
    title: String,

    #[arg(long)]
    message: String,

    /// critical, high, medium, low or info
    #[arg(long, default_value = "info")]
    severity: Severity,

    /// Extra details as a JSON object
    #[arg(long)]
    details: Option<String>,

    /// slack, teams, discord, email, webhook or all
    #[arg(long, default_value = "all")]
    channel: ChannelSelection,

    /// Email recipient (SMTP_* variables provide the relay)
    #[arg(long, env = "ASM_EMAIL_TO")]
    email_to: Option<String>,
}

#[derive(Args)]
struct RepoArgs {
    /// Repository to monitor (owner/repo)
    #[arg(long)]
    repo: String,

    /// GitHub API token
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Branch to follow (default: the repository's default branch)
    #[arg(long)]
    branch: Option<String>,

    /// Keep monitoring every --interval seconds until interrupted
    #[arg(long)]
    watch: bool,

    /// Seconds between passes in watch mode
    #[arg(long, default_value = "300")]
    interval: u64,

    /// Baseline state file
    #[arg(long, default_value = "repo_monitor_state.json")]
    state_file: PathBuf,

    /// Where a one-shot pass writes its change set
    #[arg(short, long, default_value = "repo_monitor_results.json")]
    output: PathBuf,

    /// Directory for timestamped reports in watch mode
    #[arg(long, default_value = "monitor_reports")]
    report_dir: PathBuf,

    /// Send notifications for detected changes
    #[arg(long)]
    notify: bool,
}

#[derive(Args)]
struct PagesArgs {
    /// File with one URL per line (blank lines and # comments ignored)
    #[arg(long)]
    urls_file: Option<PathBuf>,

    /// Additional URL to monitor (repeatable)
    #[arg(long = "url")]
    urls: Vec<String>,

    /// Baseline state file
    #[arg(long, default_value = "baseline.json")]
    baseline: PathBuf,

    /// Where a one-shot run writes detected changes
    #[arg(short, long, default_value = "changes.json")]
    output: PathBuf,

    /// Directory for timestamped reports in watch mode
    #[arg(long, default_value = "monitor_reports")]
    report_dir: PathBuf,

    #[arg(long)]
    watch: bool,

    #[arg(long, default_value = "300")]
    interval: u64,

    /// Sample pages whose TLS certificate does not verify
    #[arg(long)]
    insecure: bool,

    #[arg(long)]
    notify: bool,
}

#[derive(Args)]
struct GithubArgs {
    /// Repository (owner/repo)
    #[arg(long)]
    repo: String,

    /// GitHub API token
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Output file for results
    #[arg(short, long, default_value = "repo_monitor_results.json")]
    output: PathBuf,

    #[command(subcommand)]
    query: GithubQuery,
}

#[derive(Subcommand)]
enum GithubQuery {
    /// Recent commits
    Commits {
        /// Only commits after this time (e.g. 2025-01-01T00:00:00Z)
        #[arg(long)]
        since: Option<String>,

        #[arg(long)]
        branch: Option<String>,
    },

    /// Recent releases
    Releases {
        #[arg(long, default_value = "25")]
        limit: u32,
    },

    /// Recent tags
    Tags {
        #[arg(long, default_value = "25")]
        limit: u32,
    },

    /// Recent repository events
    Events {
        #[arg(long, default_value = "100")]
        limit: u32,
    },

    /// Issues and pull requests, most recently updated first
    Issues {
        #[arg(long)]
        since: Option<DateTime<Utc>>,
    },

    /// File-level comparison of two commits
    Compare { base: String, head: String },

    /// Files in the tree at a ref
    Tree {
        #[arg(default_value = "HEAD")]
        reference: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    watch_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::Repo(args) => cmd_repo(args).await,
        Commands::Pages(args) => cmd_pages(args).await,
        Commands::Github(args) => cmd_github(args).await,
        Commands::Notify(args) => cmd_notify(args).await,
    }
}

fn notify_config() -> Result<NotifyConfig> {
    NotifyConfig::from_env().context("Failed to read notification settings")
}

fn notification_hub(config: &NotifyConfig) -> Result<Arc<NotificationHub>> {
    let hub = NotificationHub::from_config(config)
        .context("Failed to configure notification channels")?;
    if hub.is_empty() {
        warn!("no notification channels configured (set SLACK_WEBHOOK, TEAMS_WEBHOOK, DISCORD_WEBHOOK, ASM_WEBHOOK_URL, or SMTP_* with ASM_EMAIL_TO)");
    }
    Ok(Arc::new(hub))
}

fn github_client(token: Option<String>) -> Result<GitHubClient> {
    let mut config = GitHubConfig::from_env();
    if let Some(token) = token {
        config = config.with_token(&token);
    }
    Ok(GitHubClient::new(config)?)
}

async fn cmd_repo(args: RepoArgs) -> Result<()> {
    let repo = RepoRef::parse(&args.repo)?;
    let client = Arc::new(github_client(args.token)?);
    let store = Arc::new(JsonFileStore::new(&args.state_file));

    info!(repo = %repo, state_file = %args.state_file.display(), "monitoring repository");
    let monitor = RepoMonitor::new(repo, client, store).with_branch(args.branch);
    let settings = ScheduleSettings::default().with_interval(Duration::from_secs(args.interval));

    let mut scheduler = Scheduler::new(vec![Box::new(monitor)], settings);
    if args.notify {
        scheduler = scheduler.with_dispatcher(notification_hub(&notify_config()?)?);
    }

    if args.watch {
        scheduler = scheduler.with_report_dir(&args.report_dir);
        return watch(scheduler).await;
    }

    let sets = one_shot(&scheduler).await?;
    if let Some(set) = sets.first() {
        export_or_warn(&args.output, set);
    }
    Ok(())
}

async fn cmd_pages(args: PagesArgs) -> Result<()> {
    let mut urls = match &args.urls_file {
        Some(path) => read_url_list(path)?,
        None => Vec::new(),
    };
    urls.extend(args.urls);
    if urls.is_empty() {
        return Err(ConfigError::NothingToMonitor.into());
    }

    let config = PageConfig {
        accept_invalid_certs: args.insecure,
        ..Default::default()
    };
    let source = Arc::new(HttpPageSource::new(&config)?);
    let store = Arc::new(JsonFileStore::new(&args.baseline));

    info!(urls = urls.len(), baseline = %args.baseline.display(), "monitoring pages");
    let monitors: Vec<Box<dyn Monitor>> = urls
        .iter()
        .map(|url| Box::new(PageMonitor::new(url, source.clone(), store.clone())) as Box<dyn Monitor>)
        .collect();
    let settings = ScheduleSettings::default().with_interval(Duration::from_secs(args.interval));

    let mut scheduler = Scheduler::new(monitors, settings);
    if args.notify {
        scheduler = scheduler.with_dispatcher(notification_hub(&notify_config()?)?);
    }

    if args.watch {
        scheduler = scheduler.with_report_dir(&args.report_dir);
        return watch(scheduler).await;
    }

    let sets = one_shot(&scheduler).await?;
    let changes: Vec<ContentChange> = sets.into_iter().filter_map(|s| s.page_change).collect();
    if changes.is_empty() {
        info!("no changes detected");
    } else {
        info!(changes = changes.len(), output = %args.output.display(), "changes detected");
        export_or_warn(&args.output, &changes);
    }
    Ok(())
}

/// Run every monitor once. Only configuration errors fail the command.
async fn one_shot(scheduler: &Scheduler) -> Result<Vec<ChangeSet>> {
    collect_change_sets(scheduler.run_once().await)
}

fn collect_change_sets(outcomes: Vec<PassOutcome>) -> Result<Vec<ChangeSet>> {
    let mut sets = Vec::with_capacity(outcomes.len());
    for outcome in outcomes {
        match outcome.result {
            Ok(set) => sets.push(set),
            Err(e) if e.is_config() => {
                return Err(e).with_context(|| format!("Cannot monitor {}", outcome.identity));
            }
            Err(e) => error!(resource = %outcome.identity, error = %e, "pass failed"),
        }
    }
    Ok(sets)
}

async fn watch(scheduler: Scheduler) -> Result<()> {
    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupt received, stopping after the current pass");
                cancel.cancel();
            }
        })
    };

    let result = scheduler.run_until_cancelled(cancel).await;
    interrupt.abort();
    result.context("Watch loop stopped")
}

fn export_or_warn<T: serde::Serialize + ?Sized>(path: &Path, value: &T) {
    match reporting::export_json(path, value) {
        Ok(()) => info!(path = %path.display(), "results exported"),
        Err(e) => warn!(path = %path.display(), error = %e, "failed to export results"),
    }
}

async fn cmd_github(args: GithubArgs) -> Result<()> {
    let repo = RepoRef::parse(&args.repo)?;
    let client = github_client(args.token)?;

    let (count, value) = run_query(&client, &RateLimitedFetcher::default(), &repo, args.query).await?;

    reporting::export_json(&args.output, &value)?;
    println!("Found {} item(s), written to {}", count, args.output.display());
    Ok(())
}

/// Run one listing through the rate-limited fetcher.
async fn run_query(
    source: &dyn RepoSource,
    fetcher: &RateLimitedFetcher,
    repo: &RepoRef,
    query: GithubQuery,
) -> Result<(usize, Value)> {
    let listed = match query {
        GithubQuery::Commits { since, branch } => {
            let items = fetcher
                .fetch("commits", || source.commits(repo, since.as_deref(), branch.as_deref()))
                .await
                .context("Failed to list commits")?;
            (items.len(), serde_json::to_value(items)?)
        }
        GithubQuery::Releases { limit } => {
            let items = fetcher
                .fetch("releases", || source.releases(repo, limit))
                .await
                .context("Failed to list releases")?;
            (items.len(), serde_json::to_value(items)?)
        }
        GithubQuery::Tags { limit } => {
            let items = fetcher
                .fetch("tags", || source.tags(repo, limit))
                .await
                .context("Failed to list tags")?;
            (items.len(), serde_json::to_value(items)?)
        }
        GithubQuery::Events { limit } => {
            let items = fetcher
                .fetch("events", || source.events(repo, limit))
                .await
                .context("Failed to list events")?;
            (items.len(), serde_json::to_value(items)?)
        }
        GithubQuery::Issues { since } => {
            let items = fetcher
                .fetch("issues", || source.issues(repo, since))
                .await
                .context("Failed to list issues")?;
            (items.len(), serde_json::to_value(items)?)
        }
        GithubQuery::Compare { base, head } => {
            let comparison = fetcher
                .fetch("compare", || source.compare(repo, &base, &head))
                .await
                .with_context(|| format!("Failed to compare {base}...{head}"))?;
            (comparison.files.len(), serde_json::to_value(comparison)?)
        }
        GithubQuery::Tree { reference } => {
            let items = fetcher
                .fetch("tree", || source.tree(repo, &reference))
                .await
                .with_context(|| format!("Failed to list tree at {reference}"))?;
            (items.len(), serde_json::to_value(items)?)
        }
    };
    Ok(listed)
}

fn parse_details(details: Option<&str>) -> Result<serde_json::Map<String, Value>> {
    match details {
        None => Ok(serde_json::Map::new()),
        Some(raw) => match serde_json::from_str::<Value>(raw).context("--details is not valid JSON")? {
            Value::Object(map) => Ok(map),
            _ => bail!("--details must be a JSON object"),
        },
    }
}

/// Channels a manual notification goes to.
fn manual_channels(mut config: NotifyConfig, args: &NotifyArgs) -> Result<NotifyConfig> {
    if let Some(to) = &args.email_to {
        config = config.with_email_to(to);
    }
    let config = config.select(args.channel);

    if args.channel == ChannelSelection::Email && !config.email_ready() {
        bail!("Email needs --email-to and SMTP_USER / SMTP_PASSWORD");
    }
    if config.is_empty() {
        bail!("No notification channels configured for '{}'", args.channel);
    }
    Ok(config)
}

async fn cmd_notify(args: NotifyArgs) -> Result<()> {
    let mut notification = Notification::new(&args.title, &args.message, args.severity);
    for (key, value) in parse_details(args.details.as_deref())? {
        notification = notification.with_detail(&key, value);
    }

    let config = manual_channels(notify_config()?, &args)?;
    let hub = notification_hub(&config)?;

    let results = hub.send_all(&notification).await;
    for (channel, delivered) in &results {
        println!("{channel}: {}", if *delivered { "sent" } else { "failed" });
    }
    if !results.values().any(|delivered| *delivered) {
        bail!("Notification was not delivered to any channel");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use watch_core::{
        Commit, Comparison, FetchError, FetchResult, Issue, MonitorError, Release, RepoEvent, Tag,
        TreeEntry,
    };
    use watch_notify::SmtpConfig;

    /// Answers every listing with a rate limit first, then an empty list.
    #[derive(Default)]
    struct ThrottledOnce {
        calls: AtomicU32,
    }

    impl ThrottledOnce {
        fn next<T: Default>(&self) -> FetchResult<T> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(FetchError::Throttled { retry_at: None })
            } else {
                Ok(T::default())
            }
        }
    }

    #[async_trait]
    impl RepoSource for ThrottledOnce {
        async fn commits(
            &self,
            _: &RepoRef,
            _: Option<&str>,
            _: Option<&str>,
        ) -> FetchResult<Vec<Commit>> {
            self.next()
        }
        async fn releases(&self, _: &RepoRef, _: u32) -> FetchResult<Vec<Release>> {
            self.next()
        }
        async fn tags(&self, _: &RepoRef, _: u32) -> FetchResult<Vec<Tag>> {
            self.next()
        }
        async fn events(&self, _: &RepoRef, _: u32) -> FetchResult<Vec<RepoEvent>> {
            self.next()
        }
        async fn issues(
            &self,
            _: &RepoRef,
            _: Option<DateTime<Utc>>,
        ) -> FetchResult<Vec<Issue>> {
            self.next()
        }
        async fn compare(&self, _: &RepoRef, _: &str, _: &str) -> FetchResult<Comparison> {
            self.next::<()>()?;
            Err(FetchError::Fatal("no such commits".to_string()))
        }
        async fn tree(&self, _: &RepoRef, _: &str) -> FetchResult<Vec<TreeEntry>> {
            self.next()
        }
    }

    fn notify_args(extra: &[&str]) -> NotifyArgs {
        let mut argv = vec!["asm-watch", "notify", "--title", "t", "--message", "m"];
        argv.extend_from_slice(extra);
        let Commands::Notify(args) = Cli::try_parse_from(argv).unwrap().command else {
            panic!("expected notify command");
        };
        args
    }

    fn configured() -> NotifyConfig {
        NotifyConfig::default()
            .with_slack("https://hooks.slack.test/a")
            .with_discord("https://discord.test/api/webhooks/1")
            .with_smtp(SmtpConfig::new("alerts@example.test", "secret"))
    }

    #[test]
    fn repo_defaults_match_state_file_layout() {
        let cli = Cli::try_parse_from(["asm-watch", "repo", "--repo", "octo/hello"]).unwrap();
        let Commands::Repo(args) = cli.command else {
            panic!("expected repo command");
        };
        assert_eq!(args.state_file, PathBuf::from("repo_monitor_state.json"));
        assert_eq!(args.output, PathBuf::from("repo_monitor_results.json"));
        assert_eq!(args.report_dir, PathBuf::from("monitor_reports"));
        assert_eq!(args.interval, 300);
        assert!(!args.watch);
    }

    #[test]
    fn github_compare_takes_base_and_head() {
        let cli = Cli::try_parse_from([
            "asm-watch", "github", "--repo", "octo/hello", "compare", "v1.0", "main",
        ])
        .unwrap();
        let Commands::Github(args) = cli.command else {
            panic!("expected github command");
        };
        match args.query {
            GithubQuery::Compare { base, head } => {
                assert_eq!(base, "v1.0");
                assert_eq!(head, "main");
            }
            _ => panic!("expected compare"),
        }
    }

    #[test]
    fn issues_since_parses_rfc3339() {
        let cli = Cli::try_parse_from([
            "asm-watch",
            "github",
            "--repo",
            "octo/hello",
            "issues",
            "--since",
            "2025-01-01T00:00:00Z",
        ])
        .unwrap();
        let Commands::Github(args) = cli.command else {
            panic!("expected github command");
        };
        assert!(matches!(args.query, GithubQuery::Issues { since: Some(_) }));
    }

    #[test]
    fn notify_severity_is_validated() {
        let cli = Cli::try_parse_from([
            "asm-watch", "notify", "--title", "t", "--message", "m", "--severity", "HIGH",
        ])
        .unwrap();
        let Commands::Notify(args) = cli.command else {
            panic!("expected notify command");
        };
        assert_eq!(args.severity, Severity::High);
        assert_eq!(args.channel, ChannelSelection::All);

        assert!(Cli::try_parse_from([
            "asm-watch", "notify", "--title", "t", "--message", "m", "--severity", "urgent",
        ])
        .is_err());
    }

    #[test]
    fn details_must_be_an_object() {
        assert!(parse_details(None).unwrap().is_empty());
        assert_eq!(parse_details(Some(r#"{"a": 1}"#)).unwrap()["a"], 1);
        assert!(parse_details(Some("[1, 2]")).is_err());
        assert!(parse_details(Some("{nope")).is_err());
    }

    #[tokio::test]
    async fn pages_without_urls_is_a_config_error() {
        let cli = Cli::try_parse_from(["asm-watch", "pages"]).unwrap();
        let Commands::Pages(args) = cli.command else {
            panic!("expected pages command");
        };
        let err = cmd_pages(args).await.unwrap_err();
        assert!(err.downcast_ref::<ConfigError>().is_some());
    }

    #[test]
    fn missing_token_is_reported() {
        let err = GitHubClient::new(GitHubConfig::default()).err().unwrap();
        assert!(err.to_string().contains("GITHUB_TOKEN"));
    }

    #[test]
    fn only_config_errors_fail_a_one_shot_run() {
        let identity = watch_core::ResourceIdentity::new("octo/hello");
        let transient = PassOutcome {
            identity: identity.clone(),
            result: Err(MonitorError::Panicked("boom".to_string())),
            severity: None,
            report_path: None,
            notifications: None,
        };
        assert!(collect_change_sets(vec![transient]).unwrap().is_empty());

        let config = PassOutcome {
            identity,
            result: Err(ConfigError::NothingToMonitor.into()),
            severity: None,
            report_path: None,
            notifications: None,
        };
        assert!(collect_change_sets(vec![config]).is_err());
    }

    #[test]
    fn notify_channel_selects_email_with_recipient() {
        let args = notify_args(&["--channel", "email", "--email-to", "soc@example.test"]);
        let config = manual_channels(configured(), &args).unwrap();
        assert!(config.email_ready());
        assert!(config.slack_webhook.is_none());
        assert!(config.discord_webhook.is_none());
    }

    #[test]
    fn notify_email_without_recipient_is_refused() {
        let mut args = notify_args(&["--channel", "email"]);
        args.email_to = None;
        let err = manual_channels(configured(), &args).unwrap_err();
        assert!(err.to_string().contains("--email-to"));
    }

    #[test]
    fn notify_channel_without_configuration_is_refused() {
        let args = notify_args(&["--channel", "teams"]);
        assert!(manual_channels(configured(), &args).is_err());
        assert!(Cli::try_parse_from([
            "asm-watch", "notify", "--title", "t", "--message", "m", "--channel", "pager",
        ])
        .is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn github_listings_wait_out_a_rate_limit() {
        let repo = RepoRef::parse("octo/hello").unwrap();
        let fetcher = RateLimitedFetcher::default();

        let source = ThrottledOnce::default();
        let started = tokio::time::Instant::now();
        let (count, value) = run_query(&source, &fetcher, &repo, GithubQuery::Releases { limit: 5 })
            .await
            .unwrap();
        assert_eq!((count, value), (0, serde_json::json!([])));
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert!(started.elapsed() >= Duration::from_secs(60));

        let source = ThrottledOnce::default();
        let query = GithubQuery::Tree {
            reference: "HEAD".to_string(),
        };
        assert!(run_query(&source, &fetcher, &repo, query).await.is_ok());
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn github_compare_failure_after_retry_is_reported() {
        let repo = RepoRef::parse("octo/hello").unwrap();
        let source = ThrottledOnce::default();
        let query = GithubQuery::Compare {
            base: "v1.0".to_string(),
            head: "main".to_string(),
        };
        let err = run_query(&source, &RateLimitedFetcher::default(), &repo, query)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("v1.0...main"));
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }
}
