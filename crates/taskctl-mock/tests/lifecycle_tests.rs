use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::BTreeMap;
use taskctl_core::invoke::{handle_launch, handle_reap};
use taskctl_mock::InMemoryPlatform;
use taskctl_core::reaper::{EmptyReason, Plan};
use taskctl_core::task::{AssignPublicIp, LaunchType};
use taskctl_core::{
    resolve_latest, Config, FixedClock, Launcher, ReapOutcome, ReapPolicy, Reaper,
    TaskArn, TaskDefinitionRef, TaskRun, TaskStatus, TaskctlError,
};

const CLUSTER: &str = "arn:aws:ecs:eu-west-1:123456789012:cluster/jobs";

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

fn def_arn(family: &str, revision: u32) -> String {
    format!(
        "arn:aws:ecs:eu-west-1:123456789012:task-definition/{}:{}",
        family, revision
    )
}

fn task(id: &str, status: TaskStatus, minutes_ago: Option<i64>) -> TaskRun {
    TaskRun {
        task_arn: TaskArn::new(format!(
            "arn:aws:ecs:eu-west-1:123456789012:task/jobs/{}",
            id
        )),
        cluster_arn: CLUSTER.to_string(),
        task_definition_arn: Some(def_arn("worker", 1)),
        last_status: status,
        started_at: minutes_ago.map(|m| now() - Duration::minutes(m)),
    }
}

fn policy(minutes: u32) -> ReapPolicy {
    ReapPolicy::new(minutes, "Task running for longer than 1 hour").unwrap()
}

#[tokio::test]
async fn resolves_highest_revision() {
    let platform = InMemoryPlatform::new()
        .with_definition(&def_arn("worker", 1))
        .unwrap()
        .with_definition(&def_arn("worker", 3))
        .unwrap()
        .with_definition(&def_arn("worker", 2))
        .unwrap()
        .with_definition(&def_arn("worker-canary", 9))
        .unwrap();

    let def = resolve_latest(&platform, "worker").await.unwrap();
    assert_eq!(def.family(), "worker");
    assert_eq!(def.revision(), 3);
    assert_eq!(def.arn(), def_arn("worker", 3));
}

#[tokio::test]
async fn unknown_family_is_not_found() {
    let platform = InMemoryPlatform::new()
        .with_definition(&def_arn("worker", 1))
        .unwrap();

    let err = resolve_latest(&platform, "reporter").await.unwrap_err();
    assert!(matches!(err, TaskctlError::NotFound { ref family } if family == "reporter"));

    let err = resolve_latest(&platform, "").await.unwrap_err();
    assert!(matches!(err, TaskctlError::InvalidInput(_)));
}

#[tokio::test]
async fn launch_submits_single_private_run() {
    let platform = InMemoryPlatform::new()
        .with_definition(&def_arn("worker", 3))
        .unwrap();
    let def = TaskDefinitionRef::parse(&def_arn("worker", 3)).unwrap();
    let subnets = vec!["subnet-1".to_string(), "subnet-2".to_string()];
    let mut overrides = BTreeMap::new();
    overrides.insert("MODE".to_string(), "batch".to_string());

    let result = Launcher::new(&platform)
        .launch(CLUSTER, &def, &subnets, "worker-container", &overrides)
        .await
        .unwrap();

    let requests = platform.run_requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.count(), 1);
    assert_eq!(request.assign_public_ip(), AssignPublicIp::Disabled);
    assert_eq!(request.subnets(), subnets.as_slice());
    assert_eq!(request.launch_type(), LaunchType::Fargate);

    let containers = request.container_overrides();
    assert_eq!(containers.len(), 1);
    assert_eq!(containers[0].name, "worker-container");
    assert_eq!(containers[0].environment.len(), 1);
    assert_eq!(containers[0].environment[0].name, "MODE");
    assert_eq!(containers[0].environment[0].value, "batch");

    assert_eq!(result.task_definition, def);
    assert!(platform.tasks().iter().any(|t| t.task_arn == result.task_arn));
}

#[tokio::test]
async fn run_request_matches_run_task_shape() {
    let platform = InMemoryPlatform::new()
        .with_definition(&def_arn("worker", 3))
        .unwrap();
    let def = TaskDefinitionRef::parse(&def_arn("worker", 3)).unwrap();
    let mut overrides = BTreeMap::new();
    overrides.insert("MODE".to_string(), "batch".to_string());

    Launcher::new(&platform)
        .launch(CLUSTER, &def, &["subnet-1".to_string()], "worker-container", &overrides)
        .await
        .unwrap();

    let json = serde_json::to_value(&platform.run_requests()[0]).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "cluster": CLUSTER,
            "taskDefinition": def_arn("worker", 3),
            "count": 1,
            "launchType": "FARGATE",
            "networkConfiguration": {
                "awsvpcConfiguration": {
                    "subnets": ["subnet-1"],
                    "assignPublicIp": "DISABLED"
                }
            },
            "overrides": {
                "containerOverrides": [
                    {
                        "name": "worker-container",
                        "environment": [{ "name": "MODE", "value": "batch" }]
                    }
                ]
            }
        })
    );
}

#[tokio::test]
async fn repeated_launches_are_not_deduplicated() {
    let platform = InMemoryPlatform::new()
        .with_definition(&def_arn("worker", 1))
        .unwrap();
    let def = TaskDefinitionRef::parse(&def_arn("worker", 1)).unwrap();
    let subnets = vec!["subnet-1".to_string()];
    let launcher = Launcher::new(&platform);

    let first = launcher
        .launch(CLUSTER, &def, &subnets, "c", &BTreeMap::new())
        .await
        .unwrap();
    let second = launcher
        .launch(CLUSTER, &def, &subnets, "c", &BTreeMap::new())
        .await
        .unwrap();

    assert_ne!(first.task_arn, second.task_arn);
    assert_eq!(platform.run_requests().len(), 2);
}

#[tokio::test]
async fn launch_rejections_surface_unmodified() {
    let platform = InMemoryPlatform::new()
        .with_definition(&def_arn("worker", 1))
        .unwrap()
        .reject_runs("RESOURCE:ENI");
    let def = TaskDefinitionRef::parse(&def_arn("worker", 1)).unwrap();

    let err = Launcher::new(&platform)
        .launch(CLUSTER, &def, &["subnet-1".to_string()], "c", &BTreeMap::new())
        .await
        .unwrap_err();
    match err {
        TaskctlError::Platform(msg) => assert_eq!(msg, "RESOURCE:ENI"),
        other => panic!("expected platform error, got {:?}", other),
    }
    assert_eq!(platform.run_requests().len(), 1);
}

#[tokio::test]
async fn run_task_errors_propagate() {
    let platform = InMemoryPlatform::new();
    let def = TaskDefinitionRef::parse(&def_arn("unregistered", 4)).unwrap();

    let err = Launcher::new(&platform)
        .launch(CLUSTER, &def, &["subnet-1".to_string()], "c", &BTreeMap::new())
        .await
        .unwrap_err();
    match err {
        TaskctlError::Platform(msg) => assert_eq!(
            msg,
            format!(
                "ClientException: Unable to find task definition {}",
                def_arn("unregistered", 4)
            )
        ),
        other => panic!("expected platform error, got {:?}", other),
    }
    assert!(platform.tasks().is_empty());
}

#[tokio::test]
async fn launch_validates_before_calling_platform() {
    let platform = InMemoryPlatform::new();
    let def = TaskDefinitionRef::parse(&def_arn("worker", 1)).unwrap();
    let launcher = Launcher::new(&platform);

    let no_subnets = launcher
        .launch(CLUSTER, &def, &[], "c", &BTreeMap::new())
        .await;
    assert!(matches!(no_subnets, Err(TaskctlError::InvalidInput(_))));

    let no_cluster = launcher
        .launch("", &def, &["subnet-1".to_string()], "c", &BTreeMap::new())
        .await;
    assert!(matches!(no_cluster, Err(TaskctlError::InvalidInput(_))));

    assert!(platform.run_requests().is_empty());
}

#[tokio::test]
async fn empty_cluster_reaps_nothing() {
    let platform = InMemoryPlatform::new();
    let clock = FixedClock::new(now());

    let outcome = Reaper::new(&platform, &clock)
        .reap(CLUSTER, &policy(60))
        .await
        .unwrap();

    assert_eq!(outcome.stopped_count(), 0);
    assert_eq!(
        outcome,
        ReapOutcome::Empty {
            reason: EmptyReason::NoTasksListed
        }
    );
    assert_eq!(outcome.summary(), "No tasks to stop");
    assert!(platform.stop_calls().is_empty());
}

#[tokio::test]
async fn reaps_only_overdue_tasks() {
    let platform = InMemoryPlatform::new()
        .with_task(task("t1", TaskStatus::Running, Some(45)))
        .with_task(task("t2", TaskStatus::Running, Some(75)));
    let clock = FixedClock::new(now());

    let outcome = Reaper::new(&platform, &clock)
        .reap(CLUSTER, &policy(60))
        .await
        .unwrap();

    assert_eq!(outcome.stopped_count(), 1);
    assert_eq!(outcome.summary(), "1 tasks were stopped");
    let stops = platform.stop_calls();
    assert_eq!(stops.len(), 1);
    assert_eq!(stops[0].task_id, "t2");
    assert_eq!(stops[0].cluster, CLUSTER);
    assert_eq!(stops[0].reason, "Task running for longer than 1 hour");

    let report = outcome.report().unwrap();
    assert_eq!(report.within_limit.len(), 1);
    assert_eq!(report.within_limit[0].task_id(), "t1");
}

#[tokio::test]
async fn threshold_boundary_is_inclusive() {
    let platform = InMemoryPlatform::new()
        .with_task(task("exact", TaskStatus::Running, Some(60)))
        .with_task(task("almost", TaskStatus::Running, Some(59)));
    let clock = FixedClock::new(now());

    let outcome = Reaper::new(&platform, &clock)
        .reap(CLUSTER, &policy(60))
        .await
        .unwrap();

    let stopped: Vec<&str> = outcome
        .report()
        .unwrap()
        .stopped
        .iter()
        .map(|a| a.task_id())
        .collect();
    assert_eq!(stopped, vec!["exact"]);
}

#[tokio::test]
async fn tasks_without_start_time_are_skipped() {
    let platform = InMemoryPlatform::new()
        .with_task(task("pending", TaskStatus::Pending, None))
        .with_task(task("provisioning", TaskStatus::Provisioning, None));
    let clock = FixedClock::new(now());

    let outcome = Reaper::new(&platform, &clock)
        .reap(CLUSTER, &policy(1))
        .await
        .unwrap();

    assert_eq!(outcome.stopped_count(), 0);
    assert_eq!(outcome.report().unwrap().not_started.len(), 2);
    assert!(platform.stop_calls().is_empty());
}

#[tokio::test]
async fn second_pass_stops_nothing_new() {
    let platform = InMemoryPlatform::new()
        .with_task(task("old", TaskStatus::Running, Some(120)))
        .with_task(task("young", TaskStatus::Running, Some(5)));
    let clock = FixedClock::new(now());
    let reaper = Reaper::new(&platform, &clock);

    let first = reaper.reap(CLUSTER, &policy(60)).await.unwrap();
    let second = reaper.reap(CLUSTER, &policy(60)).await.unwrap();

    assert_eq!(first.stopped_count(), 1);
    assert_eq!(second.stopped_count(), 0);
    assert_eq!(platform.stop_calls().len(), 1);
}

#[tokio::test]
async fn failed_stop_does_not_abort_the_pass() {
    let platform = InMemoryPlatform::new()
        .with_task(task("a", TaskStatus::Running, Some(90)))
        .with_task(task("b", TaskStatus::Running, Some(90)))
        .with_task(task("c", TaskStatus::Running, Some(90)))
        .fail_stop_for("b");
    let clock = FixedClock::new(now());

    let outcome = Reaper::new(&platform, &clock)
        .reap(CLUSTER, &policy(60))
        .await
        .unwrap();

    assert_eq!(outcome.stopped_count(), 2);
    assert_eq!(outcome.failed_count(), 1);
    let report = outcome.report().unwrap();
    assert_eq!(report.failed[0].task_arn.task_id(), "b");
    assert_eq!(platform.stop_calls().len(), 3);
    assert_eq!(
        outcome.summary(),
        "2 tasks were stopped, 1 failed to stop (b)"
    );
}

#[tokio::test]
async fn vanished_tasks_are_skipped_not_failed() {
    let platform = InMemoryPlatform::new()
        .with_task(task("gone", TaskStatus::Running, Some(90)))
        .vanish_on_describe("gone");
    let clock = FixedClock::new(now());

    let outcome = Reaper::new(&platform, &clock)
        .reap(CLUSTER, &policy(60))
        .await
        .unwrap();

    assert_eq!(
        outcome,
        ReapOutcome::Empty {
            reason: EmptyReason::NoTasksDescribed
        }
    );
    assert_eq!(outcome.summary(), "No tasks running");
    assert!(platform.stop_calls().is_empty());
}

#[tokio::test]
async fn vanished_task_is_recorded_while_live_ones_are_judged() {
    let platform = InMemoryPlatform::new()
        .with_task(task("gone", TaskStatus::Running, Some(90)))
        .with_task(task("old", TaskStatus::Running, Some(90)))
        .with_task(task("young", TaskStatus::Running, Some(10)))
        .vanish_on_describe("gone");
    let clock = FixedClock::new(now());

    let outcome = Reaper::new(&platform, &clock)
        .reap(CLUSTER, &policy(60))
        .await
        .unwrap();

    let report = outcome.report().unwrap();
    assert_eq!(
        report.missing,
        vec!["arn:aws:ecs:eu-west-1:123456789012:task/jobs/gone".to_string()]
    );
    let stopped: Vec<&str> = report.stopped.iter().map(|a| a.task_id()).collect();
    assert_eq!(stopped, vec!["old"]);
    assert_eq!(report.within_limit.len(), 1);
    assert_eq!(report.within_limit[0].task_id(), "young");
    assert!(report.failed.is_empty());

    let stops = platform.stop_calls();
    assert_eq!(stops.len(), 1);
    assert_eq!(stops[0].task_id, "old");
}

#[tokio::test]
async fn list_errors_propagate_from_reap() {
    let platform = InMemoryPlatform::new()
        .with_task(task("old", TaskStatus::Running, Some(90)))
        .fail_list("AccessDeniedException: ecs:ListTasks");
    let clock = FixedClock::new(now());

    let err = Reaper::new(&platform, &clock)
        .reap(CLUSTER, &policy(60))
        .await
        .unwrap_err();
    match err {
        TaskctlError::Platform(msg) => assert_eq!(msg, "AccessDeniedException: ecs:ListTasks"),
        other => panic!("expected platform error, got {:?}", other),
    }
    assert!(platform.stop_calls().is_empty());
}

#[tokio::test]
async fn describe_errors_propagate_from_reap() {
    let platform = InMemoryPlatform::new()
        .with_task(task("old", TaskStatus::Running, Some(90)))
        .fail_describe("ThrottlingException: Rate exceeded");
    let clock = FixedClock::new(now());

    let err = Reaper::new(&platform, &clock)
        .reap(CLUSTER, &policy(60))
        .await
        .unwrap_err();
    match err {
        TaskctlError::Platform(msg) => assert_eq!(msg, "ThrottlingException: Rate exceeded"),
        other => panic!("expected platform error, got {:?}", other),
    }
    assert!(platform.stop_calls().is_empty());
}

#[tokio::test]
async fn plan_never_stops() {
    let platform = InMemoryPlatform::new()
        .with_task(task("old", TaskStatus::Running, Some(120)))
        .with_task(task("stopping", TaskStatus::Stopping, Some(120)));
    let clock = FixedClock::new(now());

    let plan = Reaper::new(&platform, &clock)
        .plan(CLUSTER, &policy(60))
        .await
        .unwrap();

    match plan {
        Plan::Assessed { assessments, .. } => {
            assert_eq!(assessments.len(), 2);
            assert!(assessments[0].verdict.is_overdue());
            assert!(!assessments[1].verdict.is_overdue());
        }
        other => panic!("expected assessments, got {:?}", other),
    }
    assert!(platform.stop_calls().is_empty());
}

#[tokio::test]
async fn entry_points_use_config() {
    let platform = InMemoryPlatform::new()
        .with_definition(&def_arn("worker", 1))
        .unwrap()
        .with_definition(&def_arn("worker", 2))
        .unwrap()
        .with_task(task("old", TaskStatus::Running, Some(61)));
    let clock = FixedClock::new(now());
    let config = Config {
        cluster: CLUSTER.to_string(),
        family: Some("worker".to_string()),
        subnets: vec!["subnet-1".to_string()],
        container_name: Some("worker-container".to_string()),
        ..Config::default()
    };
    let payload = serde_json::json!({ "source": "aws.events" });

    let launched = handle_launch(&platform, &config, &payload, &BTreeMap::new())
        .await
        .unwrap();
    assert_eq!(launched.task_definition.revision(), 2);

    let outcome = handle_reap(&platform, &clock, &config, &payload)
        .await
        .unwrap();
    assert_eq!(outcome.summary(), "1 tasks were stopped");
}
