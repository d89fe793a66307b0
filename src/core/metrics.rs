/// Metric registry: collection, classification and the response body
///
/// Every endpoint and the `check` subcommand go through [`run_check`], so
/// HTTP and CLI always agree on messages and severity.

use serde::Serialize;
use tracing::warn;

use super::command::CommandRunner;
use super::config::Config;
use super::cpu::{collect_cpu, CpuReading};
use super::disk::{collect_disk, collect_tmp, DiskReading};
use super::error::CollectResult;
use super::health::{Severity, Thresholds};
use super::memory::{collect_memory, MemoryReading};
use super::threads::{collect_threads, ThreadReading};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Metric {
    Space,
    Tmp,
    Memory,
    Cpu,
    Threads,
}

impl Metric {
    pub const ALL: [Metric; 5] = [
        Metric::Space,
        Metric::Tmp,
        Metric::Memory,
        Metric::Cpu,
        Metric::Threads,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Metric::Space => "/space",
            Metric::Tmp => "/tmp",
            Metric::Memory => "/memory",
            Metric::Cpu => "/cpu",
            Metric::Threads => "/threads",
        }
    }

    /// Subject used in response messages
    pub fn subject(&self) -> &'static str {
        match self {
            Metric::Space => "Disk usage",
            Metric::Tmp => "Tmp storage usage",
            Metric::Memory => "Memory usage",
            Metric::Cpu => "CPU usage",
            Metric::Threads => "Thread count",
        }
    }

    fn advice(&self) -> &'static str {
        match self {
            Metric::Space | Metric::Tmp => "Consider freeing up some space.",
            Metric::Memory => "Consider optimizing memory usage.",
            Metric::Cpu => "Consider optimizing CPU usage.",
            Metric::Threads => "Consider investigating open file descriptors.",
        }
    }

    pub fn message(&self, severity: Severity) -> String {
        match severity {
            Severity::Ok => format!("{} is within safe limits.", self.subject()),
            Severity::Warning => format!("{} is high. {}", self.subject(), self.advice()),
            Severity::Critical => format!(
                "{} is critically high! Immediate action required.",
                self.subject()
            ),
        }
    }

    pub fn error_message(&self) -> &'static str {
        match self {
            Metric::Space => "Error retrieving disk space information.",
            Metric::Tmp => "Error retrieving tmp storage information.",
            Metric::Memory => "Error retrieving memory usage information.",
            Metric::Cpu => "Error retrieving CPU usage information.",
            Metric::Threads => "Error retrieving thread count.",
        }
    }

    pub fn thresholds(&self, config: &Config) -> Thresholds {
        match self {
            Metric::Threads => config.thresholds.threads(),
            _ => config.thresholds.percent(),
        }
    }

    /// Run the collector for this metric
    pub async fn collect(
        &self,
        runner: &dyn CommandRunner,
        config: &Config,
    ) -> CollectResult<MetricReading> {
        let timeout = config.command_timeout;
        let reading = match self {
            Metric::Space => {
                MetricReading::Disk(collect_disk(runner, &config.disk_device, timeout).await?)
            }
            Metric::Tmp => MetricReading::Disk(collect_tmp(runner, &config.tmp_path, timeout).await?),
            Metric::Memory => MetricReading::Memory(collect_memory(runner, timeout).await?),
            Metric::Cpu => MetricReading::Cpu(collect_cpu(runner, timeout).await?),
            Metric::Threads => {
                MetricReading::Threads(collect_threads(runner, config.watched_port, timeout).await?)
            }
        };
        Ok(reading)
    }
}

/// Collected details, serialized as the bare record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricReading {
    Disk(DiskReading),
    Memory(MemoryReading),
    Cpu(CpuReading),
    Threads(ThreadReading),
}

impl MetricReading {
    /// The value compared against the thresholds
    pub fn primary_value(&self) -> CollectResult<f64> {
        match self {
            MetricReading::Disk(d) => d.usage_percent(),
            MetricReading::Memory(m) => Ok(m.usage as f64),
            MetricReading::Cpu(c) => Ok(c.usage),
            MetricReading::Threads(t) => Ok(t.thread_count as f64),
        }
    }
}

/// JSON body: `{message, details}` on success, `{message, error}` on failure
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckBody {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<MetricReading>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of one check; failures are reported as Critical
#[derive(Debug, Clone, PartialEq)]
pub struct CheckOutcome {
    pub metric: Metric,
    pub severity: Severity,
    pub body: CheckBody,
}

impl CheckOutcome {
    pub fn is_failure(&self) -> bool {
        self.body.error.is_some()
    }
}

async fn evaluate(
    metric: Metric,
    runner: &dyn CommandRunner,
    config: &Config,
) -> CollectResult<(Severity, MetricReading)> {
    let reading = metric.collect(runner, config).await?;
    let severity = metric.thresholds(config).classify(reading.primary_value()?);
    Ok((severity, reading))
}

/// Collect, classify and build the response for one metric
pub async fn run_check(metric: Metric, runner: &dyn CommandRunner, config: &Config) -> CheckOutcome {
    match evaluate(metric, runner, config).await {
        Ok((severity, reading)) => CheckOutcome {
            metric,
            severity,
            body: CheckBody {
                message: metric.message(severity),
                details: Some(reading),
                error: None,
            },
        },
        Err(e) => {
            let kind = if e.is_parse() { "parse" } else { "command" };
            warn!(metric = ?metric, kind, error = %e, "collector failed");
            CheckOutcome {
                metric,
                severity: Severity::Critical,
                body: CheckBody {
                    message: metric.error_message().to_string(),
                    details: None,
                    error: Some(e.to_string()),
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::command::{canned, MockCommandRunner};

    fn runner_with(stdout: &'static str) -> MockCommandRunner {
        let mut runner = MockCommandRunner::new();
        runner.expect_run().returning(move |_| canned::stdout(stdout));
        runner
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            Metric::Space.message(Severity::Ok),
            "Disk usage is within safe limits."
        );
        assert_eq!(
            Metric::Tmp.message(Severity::Warning),
            "Tmp storage usage is high. Consider freeing up some space."
        );
        assert_eq!(
            Metric::Threads.message(Severity::Warning),
            "Thread count is high. Consider investigating open file descriptors."
        );
        assert_eq!(
            Metric::Cpu.message(Severity::Critical),
            "CPU usage is critically high! Immediate action required."
        );
    }

    #[test]
    fn test_every_metric_has_a_distinct_path() {
        let mut paths: Vec<_> = Metric::ALL.iter().map(|m| m.path()).collect();
        paths.sort();
        paths.dedup();
        assert_eq!(paths.len(), Metric::ALL.len());
    }

    #[tokio::test]
    async fn test_memory_at_seventy_is_warning() {
        let runner = runner_with("header\nMem: 1000 700 300\n");
        let outcome = run_check(Metric::Memory, &runner, &Config::default()).await;

        assert_eq!(outcome.severity, Severity::Warning);
        let json = serde_json::to_value(&outcome.body).unwrap();
        assert_eq!(json["details"]["usage"], 70);
        assert_eq!(json["message"], "Memory usage is high. Consider optimizing memory usage.");
        assert!(json.get("error").is_none());
    }

    #[tokio::test]
    async fn test_failure_is_critical_with_error() {
        let runner = runner_with("Filesystem Size Used Avail Capacity Mounted on\n");
        let outcome = run_check(Metric::Tmp, &runner, &Config::default()).await;

        assert!(outcome.is_failure());
        assert_eq!(outcome.severity, Severity::Critical);
        assert_eq!(outcome.body.message, "Error retrieving tmp storage information.");
        assert_eq!(
            outcome.body.error.as_deref(),
            Some("Unexpected output format for /tmp storage check.")
        );
        assert!(outcome.body.details.is_none());
    }

    #[tokio::test]
    async fn test_thread_thresholds_apply_to_threads() {
        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .withf(|cmd| cmd.program == "lsof")
            .returning(|_| canned::stdout("7\n"));
        runner
            .expect_run()
            .withf(|cmd| cmd.program == "ls")
            .returning(|_| canned::stdout(&"fd\n".repeat(95)));

        // 95 descriptors would be Critical as a percentage but is fine as a count
        let outcome = run_check(Metric::Threads, &runner, &Config::default()).await;
        assert_eq!(outcome.severity, Severity::Ok);
    }
}
