use crate::dispatch;
use taskctl_core::{resolve_latest, Config};

pub async fn run(config: &Config, family: Option<&str>) -> anyhow::Result<()> {
    let family = match family.or(config.family.as_deref()) {
        Some(family) => family,
        None => anyhow::bail!("No family given and none configured"),
    };
    let platform = dispatch::create_platform(config);

    let def = resolve_latest(platform.as_ref(), family).await?;
    println!("{}", def);

    Ok(())
}
