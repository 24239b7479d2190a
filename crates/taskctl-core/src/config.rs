use crate::error::TaskctlError;
use crate::launcher::{DefinitionSelector, LaunchSpec};
use crate::reaper::{ReapPolicy, DEFAULT_MAX_AGE_MINUTES, DEFAULT_STOP_REASON};
use crate::task::{LaunchType, TaskDefinitionRef};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Top-level configuration. Built once at startup and passed down.
/// Loaded from ~/.config/taskctl/taskctl.yaml, or from the environment.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub cluster: String,
    /// Family resolved to its newest revision when no `task_definition` is pinned.
    #[serde(default)]
    pub family: Option<String>,
    #[serde(default)]
    pub task_definition: Option<String>,
    #[serde(default)]
    pub subnets: Vec<String>,
    #[serde(default)]
    pub container_name: Option<String>,
    #[serde(default)]
    pub launch_type: LaunchType,
    /// Environment overrides applied to every launch.
    #[serde(default)]
    pub overrides: BTreeMap<String, String>,
    #[serde(default)]
    pub reaper: ReaperConfig,
    #[serde(default)]
    pub aws: AwsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReaperConfig {
    #[serde(default = "default_max_age_minutes")]
    pub max_age_minutes: u32,
    #[serde(default = "default_stop_reason")]
    pub stop_reason: String,
}

impl Default for ReaperConfig {
    fn default() -> Self {
        Self {
            max_age_minutes: default_max_age_minutes(),
            stop_reason: default_stop_reason(),
        }
    }
}

fn default_max_age_minutes() -> u32 {
    DEFAULT_MAX_AGE_MINUTES
}

fn default_stop_reason() -> String {
    DEFAULT_STOP_REASON.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwsConfig {
    #[serde(default = "default_cli_path")]
    pub cli_path: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub profile: Option<String>,
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            cli_path: default_cli_path(),
            region: None,
            profile: None,
        }
    }
}

fn default_cli_path() -> String {
    "aws".to_string()
}

/// Split a comma-joined subnet list, dropping blanks.
pub fn split_subnets(joined: &str) -> Vec<String> {
    joined
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl Config {
    /// Load config from the default path, or an empty config if it does not exist.
    pub fn load_default() -> anyhow::Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Default config file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("/etc"))
            .join("taskctl")
            .join("taskctl.yaml")
    }

    /// Build config from the process environment.
    pub fn from_env() -> Result<Self, TaskctlError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from `lookup`, using the variable names the Lambda
    /// handlers are deployed with. Unset variables keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, TaskctlError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(cluster) = get("ECS_CLUSTER_ARN").or_else(|| get("CLUSTER_ARN")) {
            config.cluster = cluster;
        }
        config.task_definition = get("ECS_TASK_ARN");
        config.family = get("TASK_FAMILY");
        config.container_name = get("ECS_CONTAINER_NAME");
        if let Some(subnets) = get("SUBNET_IDS") {
            config.subnets = split_subnets(&subnets);
        }
        if let Some(launch_type) = get("ECS_LAUNCH_TYPE") {
            config.launch_type = serde_json::from_value(serde_json::Value::String(
                launch_type.to_uppercase(),
            ))
            .map_err(|_| {
                TaskctlError::Config(format!("unknown launch type '{}'", launch_type))
            })?;
        }
        if let Some(minutes) = get("MAX_AGE_MINUTES") {
            config.reaper.max_age_minutes = minutes.trim().parse().map_err(|_| {
                TaskctlError::Config(format!("MAX_AGE_MINUTES is not a number: '{}'", minutes))
            })?;
        }
        if let Some(reason) = get("STOP_REASON") {
            config.reaper.stop_reason = reason;
        }
        config.aws.region = get("AWS_REGION");
        config.aws.profile = get("AWS_PROFILE");

        Ok(config)
    }

    fn require_cluster(&self) -> Result<(), TaskctlError> {
        if self.cluster.trim().is_empty() {
            return Err(TaskctlError::Config("'cluster' is not set".into()));
        }
        Ok(())
    }

    /// Which definition a launch runs: the pinned one, else the family's latest.
    pub fn definition_selector(&self) -> Result<DefinitionSelector, TaskctlError> {
        match (&self.task_definition, &self.family) {
            (Some(arn), _) => Ok(DefinitionSelector::Pinned(TaskDefinitionRef::parse(arn)?)),
            (None, Some(family)) => Ok(DefinitionSelector::Latest {
                family: family.clone(),
            }),
            (None, None) => Err(TaskctlError::Config(
                "either 'task_definition' or 'family' must be set".into(),
            )),
        }
    }

    /// Assemble a launch from config, with `extra` overrides taking precedence.
    pub fn launch_spec(&self, extra: &BTreeMap<String, String>) -> Result<LaunchSpec, TaskctlError> {
        self.require_cluster()?;
        if self.subnets.is_empty() {
            return Err(TaskctlError::Config("'subnets' is empty".into()));
        }
        let container_name = self
            .container_name
            .clone()
            .ok_or_else(|| TaskctlError::Config("'container_name' is not set".into()))?;

        let mut overrides = self.overrides.clone();
        overrides.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));

        Ok(LaunchSpec {
            cluster: self.cluster.clone(),
            definition: self.definition_selector()?,
            subnets: self.subnets.clone(),
            container_name,
            overrides,
            launch_type: self.launch_type,
        })
    }

    /// Cluster and policy for a reap pass.
    pub fn reap_target(&self) -> Result<(&str, ReapPolicy), TaskctlError> {
        self.require_cluster()?;
        let policy = ReapPolicy::new(self.reaper.max_age_minutes, self.reaper.stop_reason.clone())
            .map_err(|e| TaskctlError::Config(e.to_string()))?;
        Ok((&self.cluster, policy))
    }
}
