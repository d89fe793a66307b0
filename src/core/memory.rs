/// System memory usage from `free -m`

use serde::Serialize;
use std::time::Duration;

use super::command::{run_checked, CommandRunner, ShellCommand};
use super::error::{CollectError, CollectResult};

/// Memory figures in MB plus the rounded usage percentage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MemoryReading {
    pub total: u64,
    pub used: u64,
    pub free: u64,
    pub usage: u64,
}

pub fn memory_command() -> ShellCommand {
    ShellCommand::new("free", ["-m"])
}

/// Parse the row after the header: `Mem: total used free ...`
pub fn parse_memory(output: &str) -> CollectResult<MemoryReading> {
    let row = output
        .lines()
        .nth(1)
        .ok_or_else(|| CollectError::parse("Unexpected output format for memory check."))?;

    let parts: Vec<&str> = row.split_whitespace().collect();
    if parts.len() < 4 {
        return Err(CollectError::parse(format!(
            "Unexpected memory row '{}'",
            row.trim()
        )));
    }

    let field = |idx: usize, name: &str| -> CollectResult<u64> {
        parts[idx].parse::<u64>().map_err(|_| {
            CollectError::parse(format!("Invalid {} memory value '{}'", name, parts[idx]))
        })
    };

    let total = field(1, "total")?;
    let used = field(2, "used")?;
    let free = field(3, "free")?;

    if total == 0 {
        return Err(CollectError::parse("Total memory reported as 0 MB"));
    }

    let usage = (used as f64 / total as f64 * 100.0).round() as u64;

    Ok(MemoryReading { total, used, free, usage })
}

pub async fn collect_memory(
    runner: &dyn CommandRunner,
    timeout: Duration,
) -> CollectResult<MemoryReading> {
    let stdout = run_checked(runner, &memory_command(), timeout).await?;
    parse_memory(&stdout)
}
