use crate::error::TaskctlError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// ARN of a task run, e.g. `arn:aws:ecs:eu-west-1:123456789012:task/jobs/0f1e2d3c`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct TaskArn(pub String);

impl TaskArn {
    pub fn new(arn: impl Into<String>) -> Self {
        Self(arn.into())
    }

    /// Short task id: the last `/` segment of the ARN.
    pub fn task_id(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskArn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single task-definition revision. Accepts either a full ARN
/// (`arn:aws:ecs:...:task-definition/worker:3`) or the `family:revision` short form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaskDefinitionRef {
    arn: String,
    family: String,
    revision: u32,
}

impl TaskDefinitionRef {
    pub fn parse(arn: &str) -> Result<Self, TaskctlError> {
        let tail = arn.rsplit('/').next().unwrap_or(arn);
        let (family, revision) = tail.rsplit_once(':').ok_or_else(|| {
            TaskctlError::InvalidInput(format!("task definition '{}' has no revision", arn))
        })?;
        if family.is_empty() {
            return Err(TaskctlError::InvalidInput(format!(
                "task definition '{}' has no family",
                arn
            )));
        }
        let revision: u32 = revision.parse().map_err(|_| {
            TaskctlError::InvalidInput(format!(
                "task definition '{}' has a non-numeric revision",
                arn
            ))
        })?;

        Ok(Self {
            arn: arn.to_string(),
            family: family.to_string(),
            revision,
        })
    }

    pub fn arn(&self) -> &str {
        &self.arn
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn revision(&self) -> u32 {
        self.revision
    }
}

impl TryFrom<String> for TaskDefinitionRef {
    type Error = TaskctlError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TaskDefinitionRef> for String {
    fn from(value: TaskDefinitionRef) -> Self {
        value.arn
    }
}

impl fmt::Display for TaskDefinitionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.arn)
    }
}

/// Lifecycle state reported by the platform (`lastStatus`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Provisioning,
    Pending,
    Activating,
    Running,
    Deactivating,
    Stopping,
    Deprovisioning,
    Stopped,
    Deleted,
    #[serde(other)]
    Unknown,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Stopped | TaskStatus::Deleted)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Provisioning => write!(f, "provisioning"),
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::Activating => write!(f, "activating"),
            TaskStatus::Running => write!(f, "running"),
            TaskStatus::Deactivating => write!(f, "deactivating"),
            TaskStatus::Stopping => write!(f, "stopping"),
            TaskStatus::Deprovisioning => write!(f, "deprovisioning"),
            TaskStatus::Stopped => write!(f, "stopped"),
            TaskStatus::Deleted => write!(f, "deleted"),
            TaskStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// A task run as observed on the cluster.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskRun {
    pub task_arn: TaskArn,
    pub cluster_arn: String,
    pub task_definition_arn: Option<String>,
    pub last_status: TaskStatus,
    pub started_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LaunchType {
    #[default]
    Fargate,
    Ec2,
    External,
}

impl fmt::Display for LaunchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LaunchType::Fargate => write!(f, "FARGATE"),
            LaunchType::Ec2 => write!(f, "EC2"),
            LaunchType::External => write!(f, "EXTERNAL"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignPublicIp {
    Enabled,
    Disabled,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkConfiguration {
    pub awsvpc_configuration: AwsVpcConfiguration,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AwsVpcConfiguration {
    pub subnets: Vec<String>,
    pub assign_public_ip: AssignPublicIp,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskOverride {
    pub container_overrides: Vec<ContainerOverride>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ContainerOverride {
    pub name: String,
    pub environment: Vec<KeyValuePair>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct KeyValuePair {
    pub name: String,
    pub value: String,
}

/// One RunTask call. Serializes to the platform's RunTask input shape.
///
/// Only [`RunRequest::new`] builds one, so `count` is always 1 and public
/// IP assignment is always disabled.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    cluster: String,
    task_definition: String,
    count: u32,
    launch_type: LaunchType,
    network_configuration: NetworkConfiguration,
    overrides: TaskOverride,
}

impl RunRequest {
    pub fn new(
        cluster: &str,
        definition: &TaskDefinitionRef,
        subnets: &[String],
        container_name: &str,
        environment: &BTreeMap<String, String>,
        launch_type: LaunchType,
    ) -> Self {
        let environment = environment
            .iter()
            .map(|(name, value)| KeyValuePair {
                name: name.clone(),
                value: value.clone(),
            })
            .collect();

        Self {
            cluster: cluster.to_string(),
            task_definition: definition.arn().to_string(),
            count: 1,
            launch_type,
            network_configuration: NetworkConfiguration {
                awsvpc_configuration: AwsVpcConfiguration {
                    subnets: subnets.to_vec(),
                    assign_public_ip: AssignPublicIp::Disabled,
                },
            },
            overrides: TaskOverride {
                container_overrides: vec![ContainerOverride {
                    name: container_name.to_string(),
                    environment,
                }],
            },
        }
    }

    pub fn cluster(&self) -> &str {
        &self.cluster
    }

    pub fn task_definition(&self) -> &str {
        &self.task_definition
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn launch_type(&self) -> LaunchType {
        self.launch_type
    }

    pub fn subnets(&self) -> &[String] {
        &self.network_configuration.awsvpc_configuration.subnets
    }

    pub fn assign_public_ip(&self) -> AssignPublicIp {
        self.network_configuration.awsvpc_configuration.assign_public_ip
    }

    pub fn container_overrides(&self) -> &[ContainerOverride] {
        &self.overrides.container_overrides
    }
}

/// A per-item failure reported alongside a successful API response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlatformFailure {
    pub arn: Option<String>,
    pub reason: String,
}

impl fmt::Display for PlatformFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.arn {
            Some(arn) => write!(f, "{}: {}", arn, self.reason),
            None => write!(f, "{}", self.reason),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunTaskOutput {
    pub tasks: Vec<TaskArn>,
    pub failures: Vec<PlatformFailure>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DescribeTasksOutput {
    pub tasks: Vec<TaskRun>,
    pub missing: Vec<PlatformFailure>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Asc => write!(f, "ASC"),
            SortOrder::Desc => write!(f, "DESC"),
        }
    }
}

/// Query for ListTaskDefinitions. Only ACTIVE (non-deregistered) revisions are listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListTaskDefinitions {
    pub family_prefix: String,
    pub sort: SortOrder,
    pub max_results: Option<u32>,
}

impl ListTaskDefinitions {
    /// Newest revision first, one result.
    pub fn latest(family: &str) -> Self {
        Self {
            family_prefix: family.to_string(),
            sort: SortOrder::Desc,
            max_results: Some(1),
        }
    }
}
