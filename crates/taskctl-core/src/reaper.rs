use crate::clock::Clock;
use crate::error::TaskctlError;
use crate::platform::Platform;
use crate::task::{PlatformFailure, TaskArn, TaskRun, TaskStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

pub const DEFAULT_MAX_AGE_MINUTES: u32 = 60;
pub const DEFAULT_STOP_REASON: &str = "Task running for longer than 1 hour";

/// When a running task counts as overdue, and what reason the stop carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReapPolicy {
    max_age_minutes: u32,
    stop_reason: String,
}

impl ReapPolicy {
    pub fn new(max_age_minutes: u32, stop_reason: impl Into<String>) -> Result<Self, TaskctlError> {
        if max_age_minutes == 0 {
            return Err(TaskctlError::InvalidInput(
                "max age must be at least one minute".into(),
            ));
        }
        let stop_reason = stop_reason.into();
        TaskctlError::require_non_empty(&stop_reason, "stop reason")?;
        Ok(Self {
            max_age_minutes,
            stop_reason,
        })
    }

    pub fn max_age_minutes(&self) -> u32 {
        self.max_age_minutes
    }

    pub fn stop_reason(&self) -> &str {
        &self.stop_reason
    }

    /// Decide what the reaper does with one described task at `now`.
    pub fn evaluate(&self, task: &TaskRun, now: DateTime<Utc>) -> Verdict {
        if task.last_status != TaskStatus::Running {
            return match task.started_at {
                None if !task.last_status.is_terminal() => Verdict::NotStarted,
                _ => Verdict::NotRunning {
                    status: task.last_status,
                },
            };
        }
        let Some(started_at) = task.started_at else {
            return Verdict::NotStarted;
        };

        let elapsed_minutes = elapsed_minutes(started_at, now);
        if elapsed_minutes >= i64::from(self.max_age_minutes) {
            Verdict::Overdue { elapsed_minutes }
        } else {
            Verdict::WithinLimit { elapsed_minutes }
        }
    }
}

impl Default for ReapPolicy {
    fn default() -> Self {
        Self {
            max_age_minutes: DEFAULT_MAX_AGE_MINUTES,
            stop_reason: DEFAULT_STOP_REASON.to_string(),
        }
    }
}

/// Whole minutes between `started_at` and `now`, rounded down.
/// A start time in the future yields a negative value.
pub fn elapsed_minutes(started_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let seconds = (now - started_at).num_seconds();
    seconds.div_euclid(60)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    /// Running for at least the allowed age.
    Overdue { elapsed_minutes: i64 },
    /// Running, still under the allowed age.
    WithinLimit { elapsed_minutes: i64 },
    /// No start time yet.
    NotStarted,
    /// Described in a state other than RUNNING, e.g. it stopped between list and describe.
    NotRunning { status: TaskStatus },
}

impl Verdict {
    pub fn is_overdue(&self) -> bool {
        matches!(self, Verdict::Overdue { .. })
    }

    pub fn elapsed_minutes(&self) -> Option<i64> {
        match self {
            Verdict::Overdue { elapsed_minutes } | Verdict::WithinLimit { elapsed_minutes } => {
                Some(*elapsed_minutes)
            }
            _ => None,
        }
    }
}

/// A described task together with the policy's verdict on it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assessment {
    pub task: TaskRun,
    pub verdict: Verdict,
}

/// The tasks one pass looked at. `Empty` means there was nothing to look at.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Plan {
    Empty { reason: EmptyReason },
    Assessed {
        assessments: Vec<Assessment>,
        missing: Vec<PlatformFailure>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyReason {
    /// ListTasks returned no ARNs.
    NoTasksListed,
    /// DescribeTasks returned no task details.
    NoTasksDescribed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StopFailure {
    pub task_arn: TaskArn,
    pub error: String,
}

/// Per-task results of a pass that had something to evaluate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReapReport {
    pub stopped: Vec<TaskArn>,
    pub failed: Vec<StopFailure>,
    pub within_limit: Vec<TaskArn>,
    pub not_started: Vec<TaskArn>,
    pub not_running: Vec<TaskArn>,
    pub missing: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReapOutcome {
    Empty { reason: EmptyReason },
    Completed(ReapReport),
}

impl ReapOutcome {
    pub fn stopped_count(&self) -> usize {
        match self {
            ReapOutcome::Empty { .. } => 0,
            ReapOutcome::Completed(report) => report.stopped.len(),
        }
    }

    pub fn failed_count(&self) -> usize {
        match self {
            ReapOutcome::Empty { .. } => 0,
            ReapOutcome::Completed(report) => report.failed.len(),
        }
    }

    pub fn report(&self) -> Option<&ReapReport> {
        match self {
            ReapOutcome::Empty { .. } => None,
            ReapOutcome::Completed(report) => Some(report),
        }
    }

    /// Short human-readable status, returned by the reap entry point.
    pub fn summary(&self) -> String {
        match self {
            ReapOutcome::Empty {
                reason: EmptyReason::NoTasksListed,
            } => "No tasks to stop".to_string(),
            ReapOutcome::Empty {
                reason: EmptyReason::NoTasksDescribed,
            } => "No tasks running".to_string(),
            ReapOutcome::Completed(report) if report.failed.is_empty() => {
                format!("{} tasks were stopped", report.stopped.len())
            }
            ReapOutcome::Completed(report) => {
                let failed: Vec<&str> = report.failed.iter().map(|f| f.task_arn.task_id()).collect();
                format!(
                    "{} tasks were stopped, {} failed to stop ({})",
                    report.stopped.len(),
                    report.failed.len(),
                    failed.join(", ")
                )
            }
        }
    }
}

/// Stops tasks that have been running for at least the policy's max age.
///
/// One pass is list, describe, then a stop per overdue task, strictly in that
/// order. A failed stop is recorded and the pass moves on to the next task.
pub struct Reaper<'a> {
    platform: &'a dyn Platform,
    clock: &'a dyn Clock,
}

impl<'a> Reaper<'a> {
    pub fn new(platform: &'a dyn Platform, clock: &'a dyn Clock) -> Self {
        Self { platform, clock }
    }

    /// List and describe the cluster's tasks and judge each one. Never stops anything.
    pub async fn plan(&self, cluster: &str, policy: &ReapPolicy) -> Result<Plan, TaskctlError> {
        TaskctlError::require_non_empty(cluster, "cluster")?;

        let arns = self.platform.list_tasks(cluster).await?;
        if arns.is_empty() {
            debug!("No tasks listed on {}", cluster);
            return Ok(Plan::Empty {
                reason: EmptyReason::NoTasksListed,
            });
        }

        let described = self.platform.describe_tasks(cluster, &arns).await?;
        for failure in &described.missing {
            info!("Task vanished between list and describe: {}", failure);
        }
        if described.tasks.is_empty() {
            debug!("DescribeTasks returned no tasks on {}", cluster);
            return Ok(Plan::Empty {
                reason: EmptyReason::NoTasksDescribed,
            });
        }

        let now = self.clock.now();
        let assessments = described
            .tasks
            .into_iter()
            .map(|task| {
                let verdict = policy.evaluate(&task, now);
                Assessment { task, verdict }
            })
            .collect();

        Ok(Plan::Assessed {
            assessments,
            missing: described.missing,
        })
    }

    /// Run one reaping pass.
    pub async fn reap(&self, cluster: &str, policy: &ReapPolicy) -> Result<ReapOutcome, TaskctlError> {
        let (assessments, missing) = match self.plan(cluster, policy).await? {
            Plan::Empty { reason } => return Ok(ReapOutcome::Empty { reason }),
            Plan::Assessed {
                assessments,
                missing,
            } => (assessments, missing),
        };

        let mut report = ReapReport {
            missing: missing
                .into_iter()
                .map(|f| f.arn.unwrap_or(f.reason))
                .collect(),
            ..ReapReport::default()
        };

        for Assessment { task, verdict } in assessments {
            match verdict {
                Verdict::Overdue { elapsed_minutes } => {
                    let task_id = task.task_arn.task_id();
                    let stopped = self
                        .platform
                        .stop_task(cluster, task_id, policy.stop_reason())
                        .await;
                    match stopped {
                        Ok(()) => {
                            info!(
                                "Stopped task {} after {} minutes",
                                task_id, elapsed_minutes
                            );
                            report.stopped.push(task.task_arn);
                        }
                        Err(e) => {
                            warn!("Failed to stop task {}: {}", task_id, e);
                            report.failed.push(StopFailure {
                                task_arn: task.task_arn,
                                error: e.to_string(),
                            });
                        }
                    }
                }
                Verdict::WithinLimit { .. } => report.within_limit.push(task.task_arn),
                Verdict::NotStarted => report.not_started.push(task.task_arn),
                Verdict::NotRunning { status } => {
                    info!(
                        "Skipping task {}: described as {} after being listed",
                        task.task_arn.task_id(),
                        status
                    );
                    report.not_running.push(task.task_arn);
                }
            }
        }

        info!("{} tasks were stopped", report.stopped.len());
        Ok(ReapOutcome::Completed(report))
    }
}
