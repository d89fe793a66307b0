/// Logging setup, powered by tracing-subscriber
///
/// `RUST_LOG` takes precedence over the configured level. `hyper` and `mio`
/// are capped at `warn`; `tower_http` stays at `info` so the request trace
/// layer still reports every request. A directive naming one of them wins.

use anyhow::{anyhow, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable text
    #[default]
    Compact,
    /// JSON lines
    Json,
}

const NOISY: &[(&str, &str)] = &[("hyper", "warn"), ("tower_http", "info"), ("mio", "warn")];

/// Build the filter string from the base level plus per-crate caps
pub fn filter_directives(level: &str) -> String {
    let mut directives = vec![level.to_string()];
    for (target, lvl) in NOISY {
        if !level.contains(target) {
            directives.push(format!("{}={}", target, lvl));
        }
    }
    directives.join(",")
}

fn build_env_filter(level: &str) -> Result<EnvFilter> {
    if let Ok(from_env) = EnvFilter::try_from_default_env() {
        return Ok(from_env);
    }

    let directives = filter_directives(level);
    EnvFilter::try_new(&directives)
        .map_err(|e| anyhow!("Invalid log filter '{}': {}", directives, e))
}

/// Install the global subscriber; call once from `main`
pub fn init_logging(level: &str, format: LogFormat) -> Result<()> {
    let filter = build_env_filter(level)?;
    let registry = tracing_subscriber::registry().with(filter);

    let result = match format {
        LogFormat::Compact => registry
            .with(tracing_subscriber::fmt::layer().compact().with_target(true))
            .try_init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(false))
            .try_init(),
    };

    result.map_err(|e| anyhow!("Failed to initialize logging: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directives() {
        assert_eq!(
            filter_directives("debug"),
            "debug,hyper=warn,tower_http=info,mio=warn"
        );
    }

    #[test]
    fn test_explicit_target_is_not_overridden() {
        let directives = filter_directives("info,hyper=debug");
        assert!(!directives.contains("hyper=warn"));
        assert!(EnvFilter::try_new(&directives).is_ok());
    }
}
