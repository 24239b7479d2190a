use crate::error::TaskctlError;
use crate::task::{DescribeTasksOutput, ListTaskDefinitions, RunRequest, RunTaskOutput, TaskArn};

/// The orchestration platform API consumed by the launcher, resolver and reaper.
/// Every implementation surfaces rejected calls as `TaskctlError::Platform`
/// and performs no retries of its own.
#[async_trait::async_trait]
pub trait Platform: Send + Sync {
    /// Backend name for logs and `--json` output ("ecs", "memory").
    fn name(&self) -> &str;

    /// Submit a RunTask request.
    async fn run_task(&self, request: &RunRequest) -> Result<RunTaskOutput, TaskctlError>;

    /// List task-definition ARNs matching the query, in the requested order.
    async fn list_task_definitions(
        &self,
        query: &ListTaskDefinitions,
    ) -> Result<Vec<String>, TaskctlError>;

    /// List ARNs of tasks on the cluster whose desired status is RUNNING.
    async fn list_tasks(&self, cluster: &str) -> Result<Vec<TaskArn>, TaskctlError>;

    /// Describe the given tasks in one logical lookup.
    async fn describe_tasks(
        &self,
        cluster: &str,
        tasks: &[TaskArn],
    ) -> Result<DescribeTasksOutput, TaskctlError>;

    /// Ask the platform to stop a task. `task_id` is the short id or full ARN.
    async fn stop_task(&self, cluster: &str, task_id: &str, reason: &str)
        -> Result<(), TaskctlError>;
}
