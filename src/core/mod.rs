pub mod command;
pub mod config;
pub mod cpu;
pub mod disk;
pub mod error;
pub mod health;
pub mod memory;
pub mod metrics;
pub mod threads;

pub use command::{CommandRunner, TokioCommandRunner};
pub use config::Config;
pub use error::CollectError;
pub use health::{classify, Severity, Thresholds};
pub use metrics::{run_check, Metric};
