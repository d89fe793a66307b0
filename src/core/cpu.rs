/// CPU utilization from a single `top` sample

use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;
use std::time::Duration;

use super::command::{run_checked, CommandRunner, ShellCommand};
use super::error::{CollectError, CollectResult};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CpuReading {
    pub usage: f64,
}

fn float_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\d+\.\d+").expect("static regex"))
}

pub fn cpu_command() -> ShellCommand {
    ShellCommand::new("top", ["-bn1"])
}

/// First decimal number on the `Cpu(s)` summary line
pub fn parse_cpu(output: &str) -> CollectResult<CpuReading> {
    let line = output
        .lines()
        .find(|l| l.contains("Cpu(s)"))
        .ok_or_else(|| CollectError::parse("No Cpu(s) line in top output"))?;

    let number = float_pattern()
        .find(line)
        .ok_or_else(|| CollectError::parse(format!("No CPU figure in '{}'", line.trim())))?;

    let usage = number
        .as_str()
        .parse::<f64>()
        .map_err(|e| CollectError::parse(format!("Invalid CPU figure '{}': {}", number.as_str(), e)))?;

    Ok(CpuReading { usage })
}

pub async fn collect_cpu(runner: &dyn CommandRunner, timeout: Duration) -> CollectResult<CpuReading> {
    let stdout = run_checked(runner, &cpu_command(), timeout).await?;
    parse_cpu(&stdout)
}
