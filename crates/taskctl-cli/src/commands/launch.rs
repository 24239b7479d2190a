use crate::dispatch;
use std::collections::BTreeMap;
use taskctl_core::invoke;
use taskctl_core::Config;

pub async fn run(config: &Config, env: &[(String, String)], json: bool) -> anyhow::Result<()> {
    let platform = dispatch::create_platform(config);
    let extra: BTreeMap<String, String> = env.iter().cloned().collect();

    let result =
        invoke::handle_launch(platform.as_ref(), config, &serde_json::Value::Null, &extra)
            .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("Task launched:");
        println!("  Task:       {}", result.task_arn);
        println!("  Definition: {}", result.task_definition);
        println!("  Cluster:    {}", config.cluster);
    }

    Ok(())
}

/// Parse a `KEY=VALUE` environment override.
pub fn parse_env(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;
    if key.is_empty() {
        return Err(format!("empty variable name in '{}'", s));
    }
    Ok((key.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::parse_env;

    #[test]
    fn parses_key_value() {
        assert_eq!(
            parse_env("MODE=batch").unwrap(),
            ("MODE".to_string(), "batch".to_string())
        );
        assert_eq!(
            parse_env("QUERY=a=b").unwrap(),
            ("QUERY".to_string(), "a=b".to_string())
        );
        assert_eq!(parse_env("EMPTY=").unwrap().1, "");
    }

    #[test]
    fn rejects_malformed() {
        assert!(parse_env("MODE").is_err());
        assert!(parse_env("=batch").is_err());
    }
}
