use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;

use host_health::cli::{Cli, Commands, ServeArgs};
use host_health::core::{run_check, Config, Metric, TokioCommandRunner};
use host_health::server;
use host_health::utils::logging::{init_logging, LogFormat};

#[tokio::main]
async fn main() -> ExitCode {
    // .env is optional
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        None => handle_serve(config, ServeArgs::default(), cli.log_format).await,
        Some(Commands::Serve(args)) => handle_serve(config, args, cli.log_format).await,
        Some(Commands::Check { metric }) => {
            config.ensure_valid()?;
            init_logging(&config.log_level, cli.log_format)?;
            handle_check(&config, metric).await
        }
        Some(Commands::Config) => {
            print!("{}", config.to_toml()?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn handle_serve(mut config: Config, args: ServeArgs, format: LogFormat) -> Result<ExitCode> {
    args.apply(&mut config);
    config.ensure_valid()?;
    init_logging(&config.log_level, format)?;

    server::run(config).await?;
    Ok(ExitCode::SUCCESS)
}

async fn handle_check(config: &Config, metric: Metric) -> Result<ExitCode> {
    let outcome = run_check(metric, &TokioCommandRunner, config).await;
    let body = serde_json::to_string_pretty(&outcome.body)?;

    // Readings go to stdout; collector failures go to stderr
    if outcome.is_failure() {
        eprintln!("{}", body);
    } else {
        println!("{}", body);
    }

    Ok(ExitCode::from(outcome.severity.exit_code() as u8))
}
