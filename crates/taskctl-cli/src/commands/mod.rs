pub mod config;
pub mod launch;
pub mod reap;
pub mod resolve;
pub mod tasks;
