use taskctl_core::{Config, Platform};
use taskctl_ecs::EcsCliPlatform;

/// Create the platform backend for this config.
pub fn create_platform(config: &Config) -> Box<dyn Platform> {
    Box::new(EcsCliPlatform::new(config.aws.clone()))
}
