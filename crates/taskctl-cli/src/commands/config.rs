use std::path::Path;
use taskctl_core::Config;

const SAMPLE_CONFIG: &str = r#"# taskctl configuration

cluster: arn:aws:ecs:eu-west-1:123456789012:cluster/jobs

# Launch the newest revision of this family...
family: worker
# ...or pin a specific revision instead.
# task_definition: arn:aws:ecs:eu-west-1:123456789012:task-definition/worker:3

subnets:
  - subnet-0a1b2c3d
  - subnet-4e5f6a7b
container_name: worker-container
launch_type: FARGATE

overrides:
  EXAMPLE_DYNAMIC_VARIABLE: test

reaper:
  max_age_minutes: 60
  stop_reason: Task running for longer than 1 hour

aws:
  cli_path: aws
  # region: eu-west-1
  # profile: default
"#;

/// Write the sample config to `path`. Returns false when a file is already there.
fn write_sample(path: &Path) -> anyhow::Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    let dir = path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("config path has no parent: {}", path.display()))?;
    std::fs::create_dir_all(dir)?;
    std::fs::write(path, SAMPLE_CONFIG)?;
    Ok(true)
}

fn print_status(path: &Path) -> anyhow::Result<()> {
    println!("Config file: {}", path.display());
    if !path.exists() {
        println!("Not created yet; `taskctl config --init` writes a sample,");
        println!("or pass --from-env to read ECS_CLUSTER_ARN, SUBNET_IDS, ...");
        return Ok(());
    }

    let config = Config::load_from(path)?;
    println!("Cluster:     {}", config.cluster);
    match (&config.task_definition, &config.family) {
        (Some(arn), _) => println!("Definition:  {} (pinned)", arn),
        (None, Some(family)) => println!("Definition:  latest of {}", family),
        (None, None) => println!("Definition:  not set"),
    }
    println!("Subnets:     {}", config.subnets.join(", "));
    println!(
        "Reaper:      stop after {} minutes",
        config.reaper.max_age_minutes
    );
    Ok(())
}

pub async fn run(path: bool, init: bool) -> anyhow::Result<()> {
    let config_path = Config::default_path();

    if path {
        println!("{}", config_path.display());
    } else if init {
        if write_sample(&config_path)? {
            println!("Wrote sample config to {}", config_path.display());
            println!("Set cluster, subnets and container_name before launching.");
        } else {
            println!("Leaving existing config at {} untouched", config_path.display());
        }
    } else {
        print_status(&config_path)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{write_sample, SAMPLE_CONFIG};
    use std::path::PathBuf;
    use taskctl_core::Config;

    fn scratch_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("taskctl-{}-{}", name, std::process::id()))
    }

    #[test]
    fn sample_config_parses() {
        let dir = scratch_dir("sample");
        let path = dir.join("taskctl.yaml");
        assert!(write_sample(&path).unwrap());

        let config = Config::load_from(&path).unwrap();
        std::fs::remove_dir_all(&dir).unwrap();

        assert_eq!(config.family.as_deref(), Some("worker"));
        assert_eq!(config.subnets.len(), 2);
        assert_eq!(config.reaper.max_age_minutes, 60);
        assert!(config.launch_spec(&Default::default()).is_ok());
    }

    #[test]
    fn init_keeps_existing_file() {
        let dir = scratch_dir("existing");
        let path = dir.join("nested").join("taskctl.yaml");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "cluster: mine\n").unwrap();

        assert!(!write_sample(&path).unwrap());
        let contents = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_dir_all(&dir).unwrap();

        assert_eq!(contents, "cluster: mine\n");
        assert_ne!(contents, SAMPLE_CONFIG);
    }
}
