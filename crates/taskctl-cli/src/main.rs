use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use taskctl_core::Config;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod commands;
mod dispatch;

#[derive(Parser)]
#[command(name = "taskctl")]
#[command(about = "Launch ECS tasks and reap the ones that run too long", long_about = None)]
struct Cli {
    /// Config file (defaults to ~/.config/taskctl/taskctl.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Read configuration from ECS_CLUSTER_ARN, SUBNET_IDS, ... instead of a file
    #[arg(long, global = true, conflicts_with = "config")]
    from_env: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch one task
    Launch {
        /// Run this task definition instead of the configured one
        #[arg(short, long)]
        task_definition: Option<String>,

        /// Resolve the latest revision of this family instead of the configured one
        #[arg(short, long, conflicts_with = "task_definition")]
        family: Option<String>,

        /// Container environment override (repeatable)
        #[arg(short, long = "env", value_name = "KEY=VALUE", value_parser = commands::launch::parse_env)]
        env: Vec<(String, String)>,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the latest revision of a task definition family
    Resolve {
        /// Family name (defaults to the configured family)
        family: Option<String>,
    },

    /// Stop tasks that have been running longer than the allowed age
    Reap {
        /// Override the configured threshold
        #[arg(short, long)]
        max_age_minutes: Option<u32>,

        /// Override the configured stop reason
        #[arg(short, long)]
        reason: Option<String>,

        /// Report what would be stopped without stopping anything
        #[arg(long)]
        dry_run: bool,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// List tasks on the cluster with their age
    Tasks {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show or initialise the config file
    Config {
        /// Print the config path only
        #[arg(long)]
        path: bool,

        /// Write a sample config
        #[arg(long)]
        init: bool,
    },
}

fn load_config(cli: &Cli) -> Result<Config> {
    if cli.from_env {
        debug!("Loading config from the environment");
        return Ok(Config::from_env()?);
    }
    match &cli.config {
        Some(path) => {
            debug!("Loading config from {}", path.display());
            Config::load_from(path)
        }
        None => {
            debug!("Loading config from {}", Config::default_path().display());
            Config::load_default()
        }
    }
}

/// Filter from `RUST_LOG`, or `info` when it is unset, blank or unparseable.
fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(rust_log.as_deref()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Launch {
            task_definition,
            family,
            env,
            json,
        } => {
            let mut config = load_config(&cli)?;
            if let Some(arn) = task_definition {
                config.task_definition = Some(arn.clone());
            }
            if let Some(family) = family {
                config.task_definition = None;
                config.family = Some(family.clone());
            }
            commands::launch::run(&config, env, *json).await?;
        }
        Commands::Resolve { family } => {
            let config = load_config(&cli)?;
            commands::resolve::run(&config, family.as_deref()).await?;
        }
        Commands::Reap {
            max_age_minutes,
            reason,
            dry_run,
            json,
        } => {
            let mut config = load_config(&cli)?;
            if let Some(minutes) = max_age_minutes {
                config.reaper.max_age_minutes = *minutes;
            }
            if let Some(reason) = reason {
                config.reaper.stop_reason = reason.clone();
            }
            commands::reap::run(&config, *dry_run, *json).await?;
        }
        Commands::Tasks { json } => {
            let config = load_config(&cli)?;
            commands::tasks::run(&config, *json).await?;
        }
        Commands::Config { path, init } => {
            commands::config::run(*path, *init).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::log_filter;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn rust_log_level_is_honoured() {
        assert_eq!(log_filter(Some("debug")).max_level_hint(), Some(LevelFilter::DEBUG));
        assert_eq!(
            log_filter(Some("warn,taskctl_core=trace")).max_level_hint(),
            Some(LevelFilter::TRACE)
        );
    }

    #[test]
    fn defaults_to_info() {
        assert_eq!(log_filter(None).max_level_hint(), Some(LevelFilter::INFO));
        assert_eq!(log_filter(Some("  ")).max_level_hint(), Some(LevelFilter::INFO));
    }
}
