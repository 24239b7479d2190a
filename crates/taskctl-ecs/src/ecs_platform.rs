use crate::{args, wire};
use taskctl_core::config::AwsConfig;
use taskctl_core::task::{
    DescribeTasksOutput, ListTaskDefinitions, RunRequest, RunTaskOutput, TaskArn,
};
use taskctl_core::{Platform, TaskctlError};
use tokio::process::Command;
use tracing::{debug, info};

/// ECS platform: drives the `aws ecs` CLI and parses its JSON output.
/// Credentials and region resolution are left to the CLI's own chain.
pub struct EcsCliPlatform {
    config: AwsConfig,
}

impl EcsCliPlatform {
    pub fn new(config: AwsConfig) -> Self {
        Self { config }
    }

    /// Run an `aws` command and return stdout.
    async fn run_cmd(&self, mut cmd_args: Vec<String>) -> Result<String, TaskctlError> {
        let cli = self.config.cli_path.as_str();
        cmd_args.extend(args::global(
            self.config.region.as_deref(),
            self.config.profile.as_deref(),
        ));
        let subcommand = cmd_args.get(1).cloned().unwrap_or_default();
        debug!("Running: {} {}", cli, cmd_args.join(" "));

        let output = Command::new(cli)
            .args(&cmd_args)
            .env("AWS_PAGER", "")
            .output()
            .await
            .map_err(|e| TaskctlError::Platform(format!("Failed to run {}: {}", cli, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TaskctlError::Platform(format!(
                "{} ecs {} failed: {}",
                cli,
                subcommand,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[async_trait::async_trait]
impl Platform for EcsCliPlatform {
    fn name(&self) -> &str {
        "ecs"
    }

    async fn run_task(&self, request: &RunRequest) -> Result<RunTaskOutput, TaskctlError> {
        let stdout = self.run_cmd(args::run_task(request)?).await?;
        wire::parse_run_task(&stdout)
    }

    async fn list_task_definitions(
        &self,
        query: &ListTaskDefinitions,
    ) -> Result<Vec<String>, TaskctlError> {
        let stdout = self.run_cmd(args::list_task_definitions(query)).await?;
        wire::parse_list_task_definitions(&stdout)
    }

    async fn list_tasks(&self, cluster: &str) -> Result<Vec<TaskArn>, TaskctlError> {
        let stdout = self.run_cmd(args::list_tasks(cluster)).await?;
        wire::parse_list_tasks(&stdout)
    }

    async fn describe_tasks(
        &self,
        cluster: &str,
        tasks: &[TaskArn],
    ) -> Result<DescribeTasksOutput, TaskctlError> {
        let mut described = DescribeTasksOutput::default();
        for chunk in tasks.chunks(args::DESCRIBE_BATCH) {
            let stdout = self.run_cmd(args::describe_tasks(cluster, chunk)).await?;
            let page = wire::parse_describe_tasks(&stdout, cluster)?;
            described.tasks.extend(page.tasks);
            described.missing.extend(page.missing);
        }
        Ok(described)
    }

    async fn stop_task(
        &self,
        cluster: &str,
        task_id: &str,
        reason: &str,
    ) -> Result<(), TaskctlError> {
        info!("Stopping task {} on {}", task_id, cluster);
        self.run_cmd(args::stop_task(cluster, task_id, reason)).await?;
        Ok(())
    }
}
