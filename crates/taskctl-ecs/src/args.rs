//! Argument lists for `aws ecs` subcommands. Global options (region, profile,
//! output format) are appended by the caller.

use taskctl_core::task::{ListTaskDefinitions, RunRequest, TaskArn};
use taskctl_core::TaskctlError;

/// DescribeTasks accepts at most this many tasks per call.
pub const DESCRIBE_BATCH: usize = 100;

pub fn run_task(request: &RunRequest) -> Result<Vec<String>, TaskctlError> {
    let input = serde_json::to_string(request)?;
    Ok(vec![
        "ecs".into(),
        "run-task".into(),
        "--cli-input-json".into(),
        input,
    ])
}

pub fn list_task_definitions(query: &ListTaskDefinitions) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "ecs".into(),
        "list-task-definitions".into(),
        "--family-prefix".into(),
        query.family_prefix.clone(),
        "--status".into(),
        "ACTIVE".into(),
        "--sort".into(),
        query.sort.to_string(),
    ];
    if let Some(max) = query.max_results {
        args.push("--max-items".into());
        args.push(max.to_string());
    }
    args
}

pub fn list_tasks(cluster: &str) -> Vec<String> {
    vec![
        "ecs".into(),
        "list-tasks".into(),
        "--cluster".into(),
        cluster.to_string(),
        "--desired-status".into(),
        "RUNNING".into(),
    ]
}

pub fn describe_tasks(cluster: &str, tasks: &[TaskArn]) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "ecs".into(),
        "describe-tasks".into(),
        "--cluster".into(),
        cluster.to_string(),
        "--tasks".into(),
    ];
    args.extend(tasks.iter().map(|t| t.to_string()));
    args
}

pub fn stop_task(cluster: &str, task_id: &str, reason: &str) -> Vec<String> {
    vec![
        "ecs".into(),
        "stop-task".into(),
        "--cluster".into(),
        cluster.to_string(),
        "--task".into(),
        task_id.to_string(),
        "--reason".into(),
        reason.to_string(),
    ]
}

/// `--region`, `--profile` and `--output json`.
pub fn global(region: Option<&str>, profile: Option<&str>) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(region) = region {
        args.push("--region".to_string());
        args.push(region.to_string());
    }
    if let Some(profile) = profile {
        args.push("--profile".to_string());
        args.push(profile.to_string());
    }
    args.push("--output".to_string());
    args.push("json".to_string());
    args
}
