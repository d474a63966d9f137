//! Drives monitors once or on a fixed interval until cancelled.

use std::collections::BTreeMap;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use watch_notify::{Dispatcher, Severity};

use crate::aggregator::ChangeSet;
use crate::alert::compose_notification;
use crate::config::ScheduleSettings;
use crate::domain::ResourceIdentity;
use crate::error::MonitorError;
use crate::metrics::METRICS;
use crate::monitor::Monitor;
use crate::obs;
use crate::reporting;
use crate::severity::SeverityPolicy;

/// Watch loop state.
///
/// The scheduler publishes `Idle`, `Fetching`, `Notifying`, `Sleeping` and
/// `Stopped`; monitors log `Diffing` and `Persisting` from inside a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Fetching,
    Diffing,
    Persisting,
    Notifying,
    Sleeping,
    Stopped,
}

impl LoopState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoopState::Idle => "idle",
            LoopState::Fetching => "fetching",
            LoopState::Diffing => "diffing",
            LoopState::Persisting => "persisting",
            LoopState::Notifying => "notifying",
            LoopState::Sleeping => "sleeping",
            LoopState::Stopped => "stopped",
        }
    }
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened to one monitor in one pass.
#[derive(Debug)]
pub struct PassOutcome {
    pub identity: ResourceIdentity,
    pub result: Result<ChangeSet, MonitorError>,
    /// `None` when nothing changed or the pass failed
    pub severity: Option<Severity>,
    pub report_path: Option<PathBuf>,
    /// Per-channel delivery results, when a dispatcher is configured and
    /// there was something to send
    pub notifications: Option<BTreeMap<String, bool>>,
}

impl PassOutcome {
    pub fn change_set(&self) -> Option<&ChangeSet> {
        self.result.as_ref().ok()
    }
}

pub struct Scheduler {
    monitors: Vec<Box<dyn Monitor>>,
    settings: ScheduleSettings,
    policy: SeverityPolicy,
    dispatcher: Option<Arc<dyn Dispatcher>>,
    report_dir: Option<PathBuf>,
    state: watch::Sender<LoopState>,
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl Scheduler {
    pub fn new(monitors: Vec<Box<dyn Monitor>>, settings: ScheduleSettings) -> Self {
        let (state, _) = watch::channel(LoopState::Idle);
        Self {
            monitors,
            settings,
            policy: SeverityPolicy::standard(),
            dispatcher: None,
            report_dir: None,
            state,
        }
    }

    pub fn with_policy(mut self, policy: SeverityPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_dispatcher(mut self, dispatcher: Arc<dyn Dispatcher>) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    /// Write a timestamped JSON report for every pass that found changes.
    pub fn with_report_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.report_dir = Some(dir.into());
        self
    }

    pub fn state(&self) -> LoopState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<LoopState> {
        self.state.subscribe()
    }

    fn transition(&self, state: LoopState) {
        self.state.send_replace(state);
        obs::emit_loop_state(state);
    }

    /// Run every monitor once, in order, pacing between resources.
    pub async fn run_once(&self) -> Vec<PassOutcome> {
        let mut outcomes = Vec::with_capacity(self.monitors.len());
        for (i, monitor) in self.monitors.iter().enumerate() {
            if i > 0 && !self.settings.resource_pacing.is_zero() {
                tokio::time::sleep(self.settings.resource_pacing).await;
            }
            outcomes.push(self.run_monitor(monitor.as_ref()).await);
        }
        METRICS.flush();
        outcomes
    }

    async fn run_monitor(&self, monitor: &dyn Monitor) -> PassOutcome {
        let identity = monitor.identity().clone();
        self.transition(LoopState::Fetching);

        let result = match AssertUnwindSafe(monitor.run_pass()).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => Err(MonitorError::Panicked(panic_message(payload.as_ref()))),
        };

        let set = match &result {
            Ok(set) => {
                METRICS.inc_passes_completed();
                set
            }
            Err(e) => {
                METRICS.inc_passes_failed();
                error!(resource = %identity, error = %e, "monitoring pass failed");
                return PassOutcome {
                    identity,
                    result,
                    severity: None,
                    report_path: None,
                    notifications: None,
                };
            }
        };

        let severity = self.policy.evaluate(set);
        let mut report_path = None;
        let mut notifications = None;

        match severity {
            None => info!(resource = %identity, "no changes detected"),
            Some(severity) => {
                info!(
                    resource = %identity,
                    severity = %severity,
                    items = set.item_count(),
                    "changes detected"
                );
                if let Some(dir) = &self.report_dir {
                    match reporting::write_timestamped(dir, set) {
                        Ok(path) => {
                            info!(path = %path.display(), "report written");
                            report_path = Some(path);
                        }
                        Err(e) => warn!(resource = %identity, error = %e, "failed to write report"),
                    }
                }
                if let Some(dispatcher) = &self.dispatcher {
                    self.transition(LoopState::Notifying);
                    let notification = compose_notification(set, severity);
                    let results = dispatcher.dispatch(&notification).await;
                    for _ in results.values().filter(|delivered| **delivered) {
                        METRICS.inc_notifications_sent();
                    }
                    info!(resource = %identity, results = ?results, "notifications dispatched");
                    notifications = Some(results);
                }
            }
        }

        PassOutcome {
            identity,
            result,
            severity,
            report_path,
            notifications,
        }
    }

    /// Repeat passes every `interval` until `cancel` fires.
    ///
    /// A configuration error in the first pass ends the loop with that
    /// error; any later failure is logged and the loop carries on. An
    /// in-flight pass is allowed to finish; only the sleep is interrupted.
    pub async fn run_until_cancelled(&self, cancel: CancellationToken) -> Result<(), MonitorError> {
        info!(
            monitors = self.monitors.len(),
            interval_secs = self.settings.interval.as_secs(),
            "watch loop started"
        );
        let mut first_pass = true;

        while !cancel.is_cancelled() {
            let outcomes = self.run_once().await;

            if first_pass {
                first_pass = false;
                for outcome in outcomes {
                    if let Err(e) = outcome.result {
                        if e.is_config() {
                            self.transition(LoopState::Stopped);
                            return Err(e);
                        }
                    }
                }
            }

            self.transition(LoopState::Sleeping);
            if cancel.is_cancelled() {
                break;
            }
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.settings.interval) => {}
            }
        }

        self.transition(LoopState::Stopped);
        info!("watch loop stopped");
        Ok(())
    }
}
