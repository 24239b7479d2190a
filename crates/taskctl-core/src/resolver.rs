use crate::error::TaskctlError;
use crate::platform::Platform;
use crate::task::{ListTaskDefinitions, TaskDefinitionRef};
use tracing::{debug, warn};

/// Resolve the newest ACTIVE revision of a task-definition family.
///
/// The platform is asked for revisions newest-first; the highest revision
/// number among the returned ARNs that belong to exactly `family` wins.
/// If the platform ever reported two ARNs with the same revision number the
/// pick between them is unspecified.
pub async fn resolve_latest(
    platform: &dyn Platform,
    family: &str,
) -> Result<TaskDefinitionRef, TaskctlError> {
    TaskctlError::require_non_empty(family, "task definition family")?;

    let query = ListTaskDefinitions::latest(family);
    debug!("Listing task definitions for family {} on {}", family, platform.name());
    let arns = platform.list_task_definitions(&query).await?;

    let latest = arns
        .iter()
        .filter_map(|arn| match TaskDefinitionRef::parse(arn) {
            Ok(def) => Some(def),
            Err(e) => {
                warn!("Ignoring unparseable task definition {}: {}", arn, e);
                None
            }
        })
        .filter(|def| def.family() == family)
        .max_by_key(|def| def.revision());

    match latest {
        Some(def) => {
            debug!("Resolved {} to revision {}", family, def.revision());
            Ok(def)
        }
        None => Err(TaskctlError::NotFound {
            family: family.to_string(),
        }),
    }
}
