pub mod args;
pub mod ecs_platform;
pub mod wire;

pub use ecs_platform::EcsCliPlatform;
