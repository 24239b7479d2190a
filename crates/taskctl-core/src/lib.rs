pub mod clock;
pub mod config;
pub mod error;
pub mod invoke;
pub mod launcher;
pub mod platform;
pub mod reaper;
pub mod resolver;
pub mod task;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::Config;
pub use error::TaskctlError;
pub use launcher::{DefinitionSelector, LaunchResult, LaunchSpec, Launcher};
pub use platform::Platform;
pub use reaper::{ReapOutcome, ReapPolicy, ReapReport, Reaper, Verdict};
pub use resolver::resolve_latest;
pub use task::{TaskArn, TaskDefinitionRef, TaskRun, TaskStatus};
