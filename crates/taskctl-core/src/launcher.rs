use crate::error::TaskctlError;
use crate::platform::Platform;
use crate::resolver::resolve_latest;
use crate::task::{LaunchType, RunRequest, TaskArn, TaskDefinitionRef};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Which task definition a launch should run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefinitionSelector {
    /// A specific revision, used as-is.
    Pinned(TaskDefinitionRef),
    /// Whatever the newest ACTIVE revision of the family is at launch time.
    Latest { family: String },
}

/// Everything needed for one launch, assembled from config plus per-call overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub cluster: String,
    pub definition: DefinitionSelector,
    pub subnets: Vec<String>,
    pub container_name: String,
    pub overrides: BTreeMap<String, String>,
    pub launch_type: LaunchType,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LaunchResult {
    pub task_arn: TaskArn,
    pub task_definition: TaskDefinitionRef,
}

/// Requests exactly one task run per call. No polling, no retries, no dedup.
pub struct Launcher<'a> {
    platform: &'a dyn Platform,
    launch_type: LaunchType,
}

impl<'a> Launcher<'a> {
    pub fn new(platform: &'a dyn Platform) -> Self {
        Self {
            platform,
            launch_type: LaunchType::default(),
        }
    }

    pub fn with_launch_type(mut self, launch_type: LaunchType) -> Self {
        self.launch_type = launch_type;
        self
    }

    /// Launch one task of `definition` with the overrides applied to `container_name`.
    pub async fn launch(
        &self,
        cluster: &str,
        definition: &TaskDefinitionRef,
        subnets: &[String],
        container_name: &str,
        overrides: &BTreeMap<String, String>,
    ) -> Result<LaunchResult, TaskctlError> {
        TaskctlError::require_non_empty(cluster, "cluster")?;
        TaskctlError::require_non_empty(container_name, "container name")?;
        if subnets.is_empty() {
            return Err(TaskctlError::InvalidInput(
                "at least one subnet is required".into(),
            ));
        }

        let request = RunRequest::new(
            cluster,
            definition,
            subnets,
            container_name,
            overrides,
            self.launch_type,
        );
        debug!(
            "RunTask {} on {} ({} subnets, {} overrides)",
            definition,
            cluster,
            subnets.len(),
            overrides.len()
        );

        let output = self.platform.run_task(&request).await?;

        let task_arn = match output.tasks.into_iter().next() {
            Some(arn) => arn,
            None => {
                let reasons: Vec<String> = output.failures.iter().map(|f| f.to_string()).collect();
                let detail = if reasons.is_empty() {
                    "RunTask returned no task".to_string()
                } else {
                    reasons.join("; ")
                };
                return Err(TaskctlError::Platform(detail));
            }
        };

        info!("Launched task {} from {}", task_arn, definition);

        Ok(LaunchResult {
            task_arn,
            task_definition: definition.clone(),
        })
    }

    /// Resolve the spec's definition if needed, then launch with the spec's launch type.
    pub async fn launch_spec(&self, spec: &LaunchSpec) -> Result<LaunchResult, TaskctlError> {
        let definition = match &spec.definition {
            DefinitionSelector::Pinned(def) => def.clone(),
            DefinitionSelector::Latest { family } => resolve_latest(self.platform, family).await?,
        };

        let launcher = Launcher::new(self.platform).with_launch_type(spec.launch_type);
        launcher
            .launch(
                &spec.cluster,
                &definition,
                &spec.subnets,
                &spec.container_name,
                &spec.overrides,
            )
            .await
    }
}
