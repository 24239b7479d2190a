//! JSON responses printed by `aws ecs ... --output json`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use taskctl_core::task::{
    DescribeTasksOutput, PlatformFailure, RunTaskOutput, TaskArn, TaskRun, TaskStatus,
};
use taskctl_core::TaskctlError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireTask {
    pub task_arn: String,
    #[serde(default)]
    pub cluster_arn: Option<String>,
    #[serde(default)]
    pub task_definition_arn: Option<String>,
    #[serde(default)]
    pub last_status: Option<TaskStatus>,
    #[serde(default, deserialize_with = "timestamp")]
    pub started_at: Option<DateTime<Utc>>,
}

impl WireTask {
    fn into_task_run(self, cluster: &str) -> TaskRun {
        TaskRun {
            task_arn: TaskArn::new(self.task_arn),
            cluster_arn: self.cluster_arn.unwrap_or_else(|| cluster.to_string()),
            task_definition_arn: self.task_definition_arn,
            last_status: self.last_status.unwrap_or(TaskStatus::Unknown),
            started_at: self.started_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WireFailure {
    #[serde(default)]
    pub arn: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
}

impl From<WireFailure> for PlatformFailure {
    fn from(f: WireFailure) -> Self {
        let reason = match (f.reason, f.detail) {
            (Some(reason), Some(detail)) => format!("{} ({})", reason, detail),
            (Some(reason), None) => reason,
            (None, Some(detail)) => detail,
            (None, None) => "unknown failure".to_string(),
        };
        PlatformFailure { arn: f.arn, reason }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TasksResponse {
    #[serde(default)]
    tasks: Vec<WireTask>,
    #[serde(default)]
    failures: Vec<WireFailure>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListTaskDefinitionsResponse {
    #[serde(default)]
    task_definition_arns: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListTasksResponse {
    #[serde(default)]
    task_arns: Vec<String>,
}

pub fn parse_run_task(stdout: &str) -> Result<RunTaskOutput, TaskctlError> {
    let response: TasksResponse = serde_json::from_str(stdout)?;
    Ok(RunTaskOutput {
        tasks: response
            .tasks
            .into_iter()
            .map(|t| TaskArn::new(t.task_arn))
            .collect(),
        failures: response.failures.into_iter().map(Into::into).collect(),
    })
}

pub fn parse_list_task_definitions(stdout: &str) -> Result<Vec<String>, TaskctlError> {
    let response: ListTaskDefinitionsResponse = serde_json::from_str(stdout)?;
    Ok(response.task_definition_arns)
}

pub fn parse_list_tasks(stdout: &str) -> Result<Vec<TaskArn>, TaskctlError> {
    let response: ListTasksResponse = serde_json::from_str(stdout)?;
    Ok(response.task_arns.into_iter().map(TaskArn::new).collect())
}

pub fn parse_describe_tasks(
    stdout: &str,
    cluster: &str,
) -> Result<DescribeTasksOutput, TaskctlError> {
    let response: TasksResponse = serde_json::from_str(stdout)?;
    Ok(DescribeTasksOutput {
        tasks: response
            .tasks
            .into_iter()
            .map(|t| t.into_task_run(cluster))
            .collect(),
        missing: response.failures.into_iter().map(Into::into).collect(),
    })
}

/// AWS CLI v2 prints ISO 8601 timestamps; v1 prints epoch seconds.
fn timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Seconds(f64),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Text(text)) => DateTime::parse_from_rfc3339(&text)
            .map(|t| Some(t.with_timezone(&Utc)))
            .map_err(serde::de::Error::custom),
        Some(Raw::Seconds(seconds)) => {
            DateTime::from_timestamp_millis((seconds * 1000.0).round() as i64)
                .map(Some)
                .ok_or_else(|| {
                    serde::de::Error::custom(format!("timestamp out of range: {}", seconds))
                })
        }
    }
}
