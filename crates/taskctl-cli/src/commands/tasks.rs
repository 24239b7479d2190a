use crate::dispatch;
use taskctl_core::reaper::{Plan, Verdict};
use taskctl_core::{Config, Reaper, SystemClock};

pub async fn run(config: &Config, json: bool) -> anyhow::Result<()> {
    let platform = dispatch::create_platform(config);
    let clock = SystemClock;
    let (cluster, policy) = config.reap_target()?;

    let plan = Reaper::new(platform.as_ref(), &clock)
        .plan(cluster, &policy)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    let assessments = match plan {
        Plan::Empty { .. } => {
            println!("No tasks found.");
            return Ok(());
        }
        Plan::Assessed { assessments, .. } => assessments,
    };

    println!(
        "{:<34} {:<14} {:<26} {:>8}  {}",
        "TASK ID", "STATUS", "STARTED", "AGE", "REAP"
    );
    println!("{}", "-".repeat(92));
    for a in &assessments {
        let started = a
            .task
            .started_at
            .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| "-".into());
        let age = a
            .verdict
            .elapsed_minutes()
            .map(|m| format!("{}m", m))
            .unwrap_or_else(|| "-".into());
        let reap = match a.verdict {
            Verdict::Overdue { .. } => "yes",
            _ => "no",
        };
        println!(
            "{:<34} {:<14} {:<26} {:>8}  {}",
            a.task.task_arn.task_id(),
            a.task.last_status.to_string(),
            started,
            age,
            reap,
        );
    }
    println!(
        "\nTasks running {} minutes or longer are stopped by `taskctl reap`.",
        policy.max_age_minutes()
    );

    Ok(())
}
