/// Errors raised while collecting a metric
///
/// `Parse` covers output whose shape is not what the collector expects;
/// every other variant means the external command itself could not deliver.
/// Handlers surface all of them the same way: a 500 with the `Display` text.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CollectError {
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` failed: {message}")]
    CommandFailed { command: String, message: String },

    #[error("`{command}` did not finish within {}", format_after(.after))]
    Timeout { command: String, after: Duration },

    #[error("{0}")]
    Parse(String),

    #[error("no process is listening on port {port}")]
    NoListener { port: u16 },

    #[error("multiple processes are listening on port {port}: {}", format_pids(.pids))]
    MultipleListeners { port: u16, pids: Vec<u32> },
}

impl CollectError {
    pub fn parse(msg: impl Into<String>) -> Self {
        CollectError::Parse(msg.into())
    }

    /// True for output-shape failures, false for command-level failures
    pub fn is_parse(&self) -> bool {
        matches!(self, CollectError::Parse(_))
    }
}

fn format_after(after: &Duration) -> String {
    humantime::format_duration(*after).to_string()
}

fn format_pids(pids: &[u32]) -> String {
    pids.iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type CollectResult<T> = std::result::Result<T, CollectError>;
