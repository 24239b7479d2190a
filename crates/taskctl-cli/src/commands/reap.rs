use crate::dispatch;
use taskctl_core::invoke;
use taskctl_core::reaper::Plan;
use taskctl_core::{Config, Reaper, SystemClock};

pub async fn run(config: &Config, dry_run: bool, json: bool) -> anyhow::Result<()> {
    let platform = dispatch::create_platform(config);
    let clock = SystemClock;

    if dry_run {
        let (cluster, policy) = config.reap_target()?;
        let plan = Reaper::new(platform.as_ref(), &clock).plan(cluster, &policy).await?;
        if json {
            println!("{}", serde_json::to_string_pretty(&plan)?);
            return Ok(());
        }
        let overdue: Vec<_> = match &plan {
            Plan::Empty { .. } => Vec::new(),
            Plan::Assessed { assessments, .. } => assessments
                .iter()
                .filter(|a| a.verdict.is_overdue())
                .collect(),
        };
        println!("{} tasks would be stopped", overdue.len());
        for a in overdue {
            println!(
                "   - {} ({} min)",
                a.task.task_arn.task_id(),
                a.verdict.elapsed_minutes().unwrap_or_default()
            );
        }
        return Ok(());
    }

    let outcome =
        invoke::handle_reap(platform.as_ref(), &clock, config, &serde_json::Value::Null).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!("{}", outcome.summary());
    }

    if outcome.failed_count() > 0 {
        anyhow::bail!("{} task(s) could not be stopped", outcome.failed_count());
    }

    Ok(())
}
