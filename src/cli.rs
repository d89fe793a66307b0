/// CLI argument parsing

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::core::config::Config;
use crate::core::metrics::Metric;
use crate::utils::logging::LogFormat;

pub const VERSION_WITH_BUILD: &str = concat!(env!("CARGO_PKG_VERSION"), " (built: ", env!("BUILD_TIMESTAMP"), ")");

#[derive(Parser)]
#[command(name = "host-health")]
#[command(author, version = VERSION_WITH_BUILD, about, long_about = None)]
pub struct Cli {
    /// Config file (default: ~/.config/host-health/config.toml)
    #[arg(short, long, global = true, env = "HOST_HEALTH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP server (default)
    Serve(ServeArgs),

    /// Run one check and print its JSON body
    ///
    /// Exit code: 0 ok, 1 warning, 2 critical or failure. A failure's
    /// `{message, error}` body is printed to stderr.
    Check {
        #[arg(value_enum)]
        metric: Metric,
    },

    /// Print the effective configuration as TOML
    Config,
}

#[derive(Args, Default)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Enable CORS for cross-origin requests
    #[arg(long)]
    pub cors: bool,
}

impl ServeArgs {
    /// Flags win over file and environment settings
    pub fn apply(&self, config: &mut Config) {
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if self.cors {
            config.cors = true;
        }
    }
}
