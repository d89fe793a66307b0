/// Open descriptor count for the process listening on the watched port
///
/// The listener is resolved with `lsof`, restricted to TCP sockets in LISTEN
/// state so clients connected to the port are not counted. Exactly one
/// process must match: none or several is reported as an error instead of
/// guessing.

use serde::Serialize;
use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use super::command::{check_output, run_checked, run_with_timeout, CommandRunner, ShellCommand};
use super::error::{CollectError, CollectResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadReading {
    pub thread_count: u64,
}

pub fn listener_command(port: u16) -> ShellCommand {
    ShellCommand::new(
        "lsof",
        ["-w".to_string(), "-t".to_string(), format!("-iTCP:{}", port), "-sTCP:LISTEN".to_string()],
    )
}

pub fn fd_list_command(pid: u32) -> ShellCommand {
    ShellCommand::new("ls", ["-1".to_string(), format!("/proc/{}/fd", pid)])
}

/// Distinct PIDs from `lsof -t` output, sorted
pub fn parse_listener_pids(output: &str) -> CollectResult<Vec<u32>> {
    let mut pids = BTreeSet::new();
    for line in output.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let pid = line
            .parse::<u32>()
            .map_err(|_| CollectError::parse(format!("Unexpected lsof output line '{}'", line)))?;
        pids.insert(pid);
    }
    Ok(pids.into_iter().collect())
}

/// Require exactly one listening process
pub fn single_listener(port: u16, pids: Vec<u32>) -> CollectResult<u32> {
    match pids.as_slice() {
        [] => Err(CollectError::NoListener { port }),
        [pid] => Ok(*pid),
        _ => Err(CollectError::MultipleListeners { port, pids }),
    }
}

/// One entry per line from `ls -1`
pub fn count_entries(output: &str) -> u64 {
    output.lines().filter(|l| !l.trim().is_empty()).count() as u64
}

async fn resolve_listener(
    runner: &dyn CommandRunner,
    port: u16,
    timeout: Duration,
) -> CollectResult<u32> {
    let command = listener_command(port);
    let output = run_with_timeout(runner, &command, timeout).await?;

    // lsof exits 1 without output when nothing matches
    if output.status_code == Some(1)
        && output.stdout.trim().is_empty()
        && output.stderr.trim().is_empty()
    {
        return Err(CollectError::NoListener { port });
    }

    let stdout = check_output(&command, output)?;
    single_listener(port, parse_listener_pids(&stdout)?)
}

/// Both commands share one deadline, so the whole collection stays within
/// `timeout`.
pub async fn collect_threads(
    runner: &dyn CommandRunner,
    port: u16,
    timeout: Duration,
) -> CollectResult<ThreadReading> {
    let deadline = Instant::now() + timeout;

    let pid = resolve_listener(runner, port, timeout).await?;
    let remaining = deadline.saturating_duration_since(Instant::now());
    let stdout = run_checked(runner, &fd_list_command(pid), remaining).await?;

    Ok(ThreadReading {
        thread_count: count_entries(&stdout),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::command::{canned, CommandOutput, MockCommandRunner};

    const TIMEOUT: Duration = Duration::from_secs(1);

    #[test]
    fn test_parse_pids_dedupes() {
        let pids = parse_listener_pids("4242\n4242\n17\n").unwrap();
        assert_eq!(pids, vec![17, 4242]);
    }

    #[test]
    fn test_parse_pids_rejects_garbage() {
        assert!(parse_listener_pids("4242\nnode\n").unwrap_err().is_parse());
    }

    #[test]
    fn test_single_listener_rules() {
        assert_eq!(single_listener(8888, vec![99]).unwrap(), 99);
        assert!(matches!(
            single_listener(8888, vec![]),
            Err(CollectError::NoListener { port: 8888 })
        ));
        assert!(matches!(
            single_listener(8888, vec![1, 2]),
            Err(CollectError::MultipleListeners { port: 8888, .. })
        ));
    }

    #[test]
    fn test_count_entries() {
        assert_eq!(count_entries("0\n1\n2\n10\n"), 4);
        assert_eq!(count_entries(""), 0);
    }

    #[tokio::test]
    async fn test_collect_counts_fds_of_listener() {
        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .withf(|cmd| cmd.to_string() == "lsof -w -t -iTCP:8888 -sTCP:LISTEN")
            .times(1)
            .returning(|_| canned::stdout("4242\n"));
        runner
            .expect_run()
            .withf(|cmd| cmd.to_string() == "ls -1 /proc/4242/fd")
            .times(1)
            .returning(|_| canned::stdout("0\n1\n2\n3\n4\n"));

        let reading = collect_threads(&runner, 8888, TIMEOUT).await.unwrap();
        assert_eq!(reading.thread_count, 5);
    }

    #[tokio::test]
    async fn test_lsof_no_match_is_no_listener() {
        let mut runner = MockCommandRunner::new();
        runner.expect_run().times(1).returning(|_| {
            canned::output(CommandOutput {
                status_code: Some(1),
                ..Default::default()
            })
        });

        let err = collect_threads(&runner, 8888, TIMEOUT).await.unwrap_err();
        assert_eq!(err.to_string(), "no process is listening on port 8888");
    }

    #[tokio::test]
    async fn test_multiple_listeners_fail_before_counting() {
        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .times(1)
            .returning(|_| canned::stdout("100\n200\n"));

        let err = collect_threads(&runner, 8888, TIMEOUT).await.unwrap_err();
        assert!(matches!(err, CollectError::MultipleListeners { .. }));
    }

    #[tokio::test]
    async fn test_both_commands_share_one_deadline() {
        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .withf(|cmd| cmd.program == "lsof")
            .returning(|_| canned::delayed("4242\n", Duration::from_millis(150)));
        runner
            .expect_run()
            .withf(|cmd| cmd.program == "ls")
            .returning(|_| canned::hang());

        let started = Instant::now();
        let err = collect_threads(&runner, 8888, Duration::from_millis(200))
            .await
            .unwrap_err();
        let elapsed = started.elapsed();

        match err {
            CollectError::Timeout { command, after } => {
                assert_eq!(command, "ls -1 /proc/4242/fd");
                assert!(after < Duration::from_millis(200));
            }
            other => panic!("expected timeout, got {}", other),
        }
        // a fresh timeout per command would take about 350ms
        assert!(elapsed < Duration::from_millis(320), "took {:?}", elapsed);
    }

    #[test]
    fn test_serializes_thread_count() {
        let json = serde_json::to_value(ThreadReading { thread_count: 12 }).unwrap();
        assert_eq!(json["threadCount"], 12);
    }
}
