/// Defaults and fixed values for the health server
///
/// Everything here can be overridden through the config file or the
/// environment except the endpoint directory.

use std::time::Duration;

/// Port the HTTP server listens on
pub const DEFAULT_PORT: u16 = 6600;

/// Bind address, all interfaces
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Port whose listening process is inspected by `/threads`
pub const DEFAULT_WATCHED_PORT: u16 = 8888;

/// Block device treated as the primary data partition
pub const DEFAULT_DISK_DEVICE: &str = "/dev/nvme0n1p1";

/// Temp directory checked by `/tmp`
pub const DEFAULT_TMP_PATH: &str = "/tmp";

/// Upper bound on a single collector command
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

pub const DEFAULT_LOG_LEVEL: &str = "info";

// Percentage metrics (disk, tmp, memory, cpu)
pub const PERCENT_OK_CEILING: f64 = 70.0;
pub const PERCENT_WARN_CEILING: f64 = 90.0;

// Raw descriptor count for the watched process
pub const THREADS_OK_CEILING: f64 = 4000.0;
pub const THREADS_WARN_CEILING: f64 = 5000.0;

/// Prefix for environment overrides, e.g. `HOST_HEALTH_PORT`
pub const ENV_PREFIX: &str = "HOST_HEALTH_";

/// Directory name under the user config dir
pub const CONFIG_DIR_NAME: &str = "host-health";
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Endpoint directory reported by `GET /`
pub const ENDPOINTS: &[(&str, &str)] = &[
    ("/", "Server status"),
    ("/space", "Disk space usage"),
    ("/tmp", "Tmp storage usage"),
    ("/memory", "Memory usage"),
    ("/cpu", "CPU usage"),
    ("/threads", "Thread count"),
];
