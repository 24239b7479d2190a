//! Entry points for scheduled or event-driven triggers.
//!
//! Both take the trigger payload as opaque JSON and ignore its contents;
//! everything they need comes from the [`Config`] built at startup.

use crate::clock::Clock;
use crate::config::Config;
use crate::error::TaskctlError;
use crate::launcher::{LaunchResult, Launcher};
use crate::platform::Platform;
use crate::reaper::{ReapOutcome, Reaper};
use std::collections::BTreeMap;
use tracing::debug;

/// Launch one task as configured, adding `extra` environment overrides.
pub async fn handle_launch(
    platform: &dyn Platform,
    config: &Config,
    payload: &serde_json::Value,
    extra: &BTreeMap<String, String>,
) -> Result<LaunchResult, TaskctlError> {
    debug!("Launch triggered (payload present: {})", !payload.is_null());
    let spec = config.launch_spec(extra)?;
    Launcher::new(platform).launch_spec(&spec).await
}

/// Run one reaper pass. `ReapOutcome::summary` is the status line for the trigger.
pub async fn handle_reap(
    platform: &dyn Platform,
    clock: &dyn Clock,
    config: &Config,
    payload: &serde_json::Value,
) -> Result<ReapOutcome, TaskctlError> {
    debug!("Reap triggered (payload present: {})", !payload.is_null());
    let (cluster, policy) = config.reap_target()?;
    Reaper::new(platform, clock).reap(cluster, &policy).await
}
