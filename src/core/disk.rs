/// Filesystem usage for the primary partition and the temp mount
///
/// Both use `df -h -P`; POSIX mode keeps each filesystem on one line even
/// when the device name is long.

use serde::Serialize;
use std::time::Duration;

use super::command::{run_checked, CommandRunner, ShellCommand};
use super::error::{CollectError, CollectResult};

/// One `df` row, kept in df's human-readable units
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiskReading {
    pub filesystem: String,
    pub size: String,
    pub used: String,
    pub available: String,
    pub use_percentage: String,
}

impl DiskReading {
    /// Parse fields 0-4 of a whitespace-split df row
    fn from_row(row: &str) -> CollectResult<Self> {
        let parts: Vec<&str> = row.split_whitespace().collect();
        if parts.len() < 5 {
            return Err(CollectError::parse(format!(
                "Unexpected df row '{}': expected at least 5 columns",
                row.trim()
            )));
        }

        Ok(Self {
            filesystem: parts[0].to_string(),
            size: parts[1].to_string(),
            used: parts[2].to_string(),
            available: parts[3].to_string(),
            use_percentage: parts[4].to_string(),
        })
    }

    /// Numeric value of `use_percentage` ("45%" -> 45)
    pub fn usage_percent(&self) -> CollectResult<f64> {
        self.use_percentage
            .trim_end_matches('%')
            .parse::<u32>()
            .map(f64::from)
            .map_err(|_| {
                CollectError::parse(format!(
                    "Unexpected use percentage '{}' for {}",
                    self.use_percentage, self.filesystem
                ))
            })
    }
}

pub fn disk_command(device: &str) -> ShellCommand {
    ShellCommand::new("df", ["-h", "-P", device])
}

pub fn tmp_command(path: &str) -> ShellCommand {
    ShellCommand::new("df", ["-h", "-P", path])
}

/// Pick the row whose filesystem column is `device`
pub fn parse_device_usage(output: &str, device: &str) -> CollectResult<DiskReading> {
    let row = output
        .lines()
        .find(|line| line.split_whitespace().next() == Some(device))
        .ok_or_else(|| {
            CollectError::parse(format!("No df entry found for {}", device))
        })?;

    DiskReading::from_row(row)
}

/// Take the data row that follows the df header
pub fn parse_tmp_usage(output: &str) -> CollectResult<DiskReading> {
    let lines: Vec<&str> = output.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.len() < 2 {
        return Err(CollectError::parse(
            "Unexpected output format for /tmp storage check.",
        ));
    }

    DiskReading::from_row(lines[1])
}

pub async fn collect_disk(
    runner: &dyn CommandRunner,
    device: &str,
    timeout: Duration,
) -> CollectResult<DiskReading> {
    let stdout = run_checked(runner, &disk_command(device), timeout).await?;
    parse_device_usage(&stdout, device)
}

pub async fn collect_tmp(
    runner: &dyn CommandRunner,
    path: &str,
    timeout: Duration,
) -> CollectResult<DiskReading> {
    let stdout = run_checked(runner, &tmp_command(path), timeout).await?;
    parse_tmp_usage(&stdout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::command::{canned, MockCommandRunner};

    const DF_DEVICE: &str = "\
Filesystem      Size  Used Avail Capacity Mounted on
/dev/nvme0n1p1  484G  218G  242G      48% /
";

    const DF_TMP: &str = "\
Filesystem      Size  Used Avail Capacity Mounted on
tmpfs            16G  2.1G   14G      13% /tmp
";

    #[test]
    fn test_parse_device_usage() {
        let reading = parse_device_usage(DF_DEVICE, "/dev/nvme0n1p1").unwrap();
        assert_eq!(reading.filesystem, "/dev/nvme0n1p1");
        assert_eq!(reading.size, "484G");
        assert_eq!(reading.used, "218G");
        assert_eq!(reading.available, "242G");
        assert_eq!(reading.use_percentage, "48%");
        assert_eq!(reading.usage_percent().unwrap(), 48.0);
    }

    #[test]
    fn test_device_must_match_exactly() {
        let err = parse_device_usage(DF_DEVICE, "/dev/nvme0n1").unwrap_err();
        assert!(err.is_parse());
        assert_eq!(err.to_string(), "No df entry found for /dev/nvme0n1");
    }

    #[test]
    fn test_parse_tmp_usage() {
        let reading = parse_tmp_usage(DF_TMP).unwrap();
        assert_eq!(reading.filesystem, "tmpfs");
        assert_eq!(reading.use_percentage, "13%");
    }

    #[test]
    fn test_tmp_header_only_is_parse_error() {
        let err = parse_tmp_usage("Filesystem Size Used Avail Capacity Mounted on\n").unwrap_err();
        assert!(err.is_parse());
        assert_eq!(err.to_string(), "Unexpected output format for /tmp storage check.");
    }

    #[test]
    fn test_short_row_is_parse_error() {
        let err = parse_tmp_usage("header\ntmpfs 16G\n").unwrap_err();
        assert!(err.is_parse());
    }

    #[test]
    fn test_non_numeric_percentage() {
        let reading = parse_tmp_usage("header\nnone 0 0 0 - /tmp\n").unwrap();
        assert!(reading.usage_percent().unwrap_err().is_parse());
    }

    #[test]
    fn test_serializes_camel_case() {
        let reading = parse_tmp_usage(DF_TMP).unwrap();
        let json = serde_json::to_value(&reading).unwrap();
        assert_eq!(json["usePercentage"], "13%");
        assert_eq!(json["filesystem"], "tmpfs");
    }

    #[tokio::test]
    async fn test_collect_disk_runs_df_for_device() {
        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .withf(|cmd| cmd.to_string() == "df -h -P /dev/nvme0n1p1")
            .times(1)
            .returning(|_| canned::stdout(DF_DEVICE));

        let reading = collect_disk(&runner, "/dev/nvme0n1p1", Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(reading.use_percentage, "48%");
    }
}
