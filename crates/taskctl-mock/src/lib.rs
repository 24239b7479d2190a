//! In-memory [`Platform`] for exercising the launcher and reaper without AWS.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};
use taskctl_core::task::{
    DescribeTasksOutput, ListTaskDefinitions, PlatformFailure, RunRequest, RunTaskOutput,
    SortOrder, TaskArn, TaskDefinitionRef, TaskRun, TaskStatus,
};
use taskctl_core::{Platform, TaskctlError};

/// A StopTask call as received by [`InMemoryPlatform`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopCall {
    pub cluster: String,
    pub task_id: String,
    pub reason: String,
}

#[derive(Debug, Default)]
struct State {
    definitions: Vec<TaskDefinitionRef>,
    tasks: Vec<TaskRun>,
    run_requests: Vec<RunRequest>,
    stop_calls: Vec<StopCall>,
    failing_stops: HashSet<String>,
    vanished: HashSet<String>,
    run_rejection: Option<String>,
    list_error: Option<String>,
    describe_error: Option<String>,
}

/// Platform kept entirely in memory. Records every request it receives.
///
/// Tasks launched through it start out PENDING without a start time; stopping a
/// task marks it STOPPED and drops it from `list_tasks`.
#[derive(Debug, Default)]
pub struct InMemoryPlatform {
    state: Mutex<State>,
}

impl InMemoryPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a task-definition revision.
    pub fn with_definition(self, arn: &str) -> Result<Self, TaskctlError> {
        let def = TaskDefinitionRef::parse(arn)?;
        self.state().definitions.push(def);
        Ok(self)
    }

    /// Put an existing task on the cluster.
    pub fn with_task(self, task: TaskRun) -> Self {
        self.state().tasks.push(task);
        self
    }

    /// Make StopTask fail for this task id.
    pub fn fail_stop_for(self, task_id: &str) -> Self {
        self.state().failing_stops.insert(task_id.to_string());
        self
    }

    /// Keep listing this task but report it missing from DescribeTasks.
    pub fn vanish_on_describe(self, task_id: &str) -> Self {
        self.state().vanished.insert(task_id.to_string());
        self
    }

    /// Reject every RunTask call with the given failure reason.
    pub fn reject_runs(self, reason: &str) -> Self {
        self.state().run_rejection = Some(reason.to_string());
        self
    }

    /// Make every ListTasks call fail with `message`.
    pub fn fail_list(self, message: &str) -> Self {
        self.state().list_error = Some(message.to_string());
        self
    }

    /// Make every DescribeTasks call fail with `message`.
    pub fn fail_describe(self, message: &str) -> Self {
        self.state().describe_error = Some(message.to_string());
        self
    }

    pub fn run_requests(&self) -> Vec<RunRequest> {
        self.state().run_requests.clone()
    }

    pub fn stop_calls(&self) -> Vec<StopCall> {
        self.state().stop_calls.clone()
    }

    pub fn tasks(&self) -> Vec<TaskRun> {
        self.state().tasks.clone()
    }
}

#[async_trait::async_trait]
impl Platform for InMemoryPlatform {
    fn name(&self) -> &str {
        "memory"
    }

    async fn run_task(&self, request: &RunRequest) -> Result<RunTaskOutput, TaskctlError> {
        let mut state = self.state();
        state.run_requests.push(request.clone());

        if let Some(reason) = &state.run_rejection {
            return Ok(RunTaskOutput {
                tasks: Vec::new(),
                failures: vec![PlatformFailure {
                    arn: None,
                    reason: reason.clone(),
                }],
            });
        }

        let known = state
            .definitions
            .iter()
            .any(|d| d.arn() == request.task_definition());
        if !known {
            return Err(TaskctlError::Platform(format!(
                "ClientException: Unable to find task definition {}",
                request.task_definition()
            )));
        }

        let arn = TaskArn::new(format!(
            "arn:aws:ecs:local:000000000000:task/{}/{:032x}",
            request.cluster(),
            state.tasks.len() + 1
        ));
        state.tasks.push(TaskRun {
            task_arn: arn.clone(),
            cluster_arn: request.cluster().to_string(),
            task_definition_arn: Some(request.task_definition().to_string()),
            last_status: TaskStatus::Pending,
            started_at: None,
        });

        Ok(RunTaskOutput {
            tasks: vec![arn],
            failures: Vec::new(),
        })
    }

    async fn list_task_definitions(
        &self,
        query: &ListTaskDefinitions,
    ) -> Result<Vec<String>, TaskctlError> {
        let state = self.state();
        let mut defs: Vec<&TaskDefinitionRef> = state
            .definitions
            .iter()
            .filter(|d| d.family() == query.family_prefix)
            .collect();
        defs.sort_by_key(|d| d.revision());
        if query.sort == SortOrder::Desc {
            defs.reverse();
        }
        if let Some(max) = query.max_results {
            defs.truncate(max as usize);
        }
        Ok(defs.into_iter().map(|d| d.arn().to_string()).collect())
    }

    async fn list_tasks(&self, cluster: &str) -> Result<Vec<TaskArn>, TaskctlError> {
        let state = self.state();
        if let Some(message) = &state.list_error {
            return Err(TaskctlError::Platform(message.clone()));
        }
        Ok(state
            .tasks
            .iter()
            .filter(|t| t.cluster_arn == cluster && !t.last_status.is_terminal())
            .map(|t| t.task_arn.clone())
            .collect())
    }

    async fn describe_tasks(
        &self,
        cluster: &str,
        tasks: &[TaskArn],
    ) -> Result<DescribeTasksOutput, TaskctlError> {
        let state = self.state();
        if let Some(message) = &state.describe_error {
            return Err(TaskctlError::Platform(message.clone()));
        }
        let mut output = DescribeTasksOutput::default();
        for arn in tasks {
            let found = state
                .tasks
                .iter()
                .find(|t| t.cluster_arn == cluster && &t.task_arn == arn);
            match found {
                Some(task) if !state.vanished.contains(arn.task_id()) => {
                    output.tasks.push(task.clone())
                }
                _ => output.missing.push(PlatformFailure {
                    arn: Some(arn.to_string()),
                    reason: "MISSING".to_string(),
                }),
            }
        }
        Ok(output)
    }

    async fn stop_task(
        &self,
        cluster: &str,
        task_id: &str,
        reason: &str,
    ) -> Result<(), TaskctlError> {
        let mut state = self.state();
        state.stop_calls.push(StopCall {
            cluster: cluster.to_string(),
            task_id: task_id.to_string(),
            reason: reason.to_string(),
        });

        if state.failing_stops.contains(task_id) {
            return Err(TaskctlError::Platform(format!(
                "AccessDeniedException: not allowed to stop {}",
                task_id
            )));
        }

        let task = state
            .tasks
            .iter_mut()
            .find(|t| t.cluster_arn == cluster && t.task_arn.task_id() == task_id)
            .ok_or_else(|| {
                TaskctlError::Platform(format!(
                    "InvalidParameterException: The referenced task was not found: {}",
                    task_id
                ))
            })?;
        task.last_status = TaskStatus::Stopped;
        Ok(())
    }
}
