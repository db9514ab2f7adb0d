//! Argument parsing and command dispatch for the `homedash` binary.

use anyhow::anyhow;
use clap::{Args, Parser, Subcommand, ValueEnum};
use homedash_dispatch::config::{DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT_SECS};
use homedash_dispatch::{DispatchConfig, Outcome, RequestDescriptor};
use homedash_telemetry::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, init_logging};

use crate::client::{CliError, CliResult, ON_ERROR, ON_SUCCESS, dispatch_once};
use crate::output::{render_outcome, render_target};

/// Parses CLI arguments, executes the requested command, and returns the
/// process exit code.
pub async fn run() -> i32 {
    execute(Cli::parse()).await
}

async fn execute(cli: Cli) -> i32 {
    let logging = LoggingConfig {
        level: &cli.log_level,
        format: cli.log_format.unwrap_or_else(LogFormat::infer),
    };
    if let Err(err) = init_logging(&logging) {
        eprintln!("warning: {err}");
    }

    match dispatch(cli).await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

async fn dispatch(cli: Cli) -> CliResult<()> {
    let config = cli.dispatch_config();
    config.validate()?;

    match cli.command {
        Command::Get(args) => handle_get(&config, &args, cli.output).await,
        Command::Resolve(args) => handle_resolve(&args, cli.output),
    }
}

#[derive(Parser)]
#[command(name = "homedash", about = "Dispatch Homedash REST requests from the command line")]
pub(crate) struct Cli {
    #[arg(
        long,
        global = true,
        env = "HOMEDASH_BASE_URL",
        default_value = DEFAULT_BASE_URL
    )]
    base_url: String,
    #[arg(
        long,
        global = true,
        env = "HOMEDASH_HTTP_TIMEOUT_SECS",
        default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS
    )]
    timeout: u64,
    #[arg(
        long,
        global = true,
        env = "HOMEDASH_JSONP_CALLBACK",
        help = "Expect responses wrapped in this JSONP callback"
    )]
    jsonp_callback: Option<String>,
    #[arg(
        long,
        global = true,
        env = "HOMEDASH_LOG_LEVEL",
        default_value = DEFAULT_LOG_LEVEL
    )]
    log_level: String,
    #[arg(
        long,
        global = true,
        env = "HOMEDASH_LOG_FORMAT",
        value_parser = parse_log_format
    )]
    log_format: Option<LogFormat>,
    #[arg(
        long = "output",
        alias = "format",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format for outcomes and targets"
    )]
    output: OutputFormat,
    #[command(subcommand)]
    command: Command,
}

impl Cli {
    fn dispatch_config(&self) -> DispatchConfig {
        DispatchConfig {
            base_url: self.base_url.clone(),
            request_timeout_secs: self.timeout,
            jsonp_callback: self.jsonp_callback.clone(),
            ..DispatchConfig::default()
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Dispatch a GET to the resolved target and print its outcome.
    Get(TargetArgs),
    /// Print the resolved target without dispatching.
    Resolve(TargetArgs),
}

#[derive(Args)]
struct TargetArgs {
    /// Base path such as `/api/device`.
    base_target: String,
    /// Values appended to the base path as percent-encoded segments.
    parameters: Vec<String>,
}

impl TargetArgs {
    fn descriptor(&self) -> RequestDescriptor {
        RequestDescriptor::new(self.base_target.clone(), ON_SUCCESS, ON_ERROR)
            .with_parameters(self.parameters.iter().map(String::as_str))
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Table,
    Json,
}

fn parse_log_format(value: &str) -> Result<LogFormat, String> {
    value.parse().map_err(|err| format!("{err}"))
}

async fn handle_get(
    config: &DispatchConfig,
    args: &TargetArgs,
    format: OutputFormat,
) -> CliResult<()> {
    args.descriptor()
        .resolve()
        .map_err(|err| CliError::validation(err.reason()))?;

    let outcome = dispatch_once(config, &args.base_target, &args.parameters).await?;
    println!("{}", render_outcome(&outcome, format)?);

    match outcome {
        Outcome::Success { .. } => Ok(()),
        Outcome::Failure { code: Some(code), .. } => {
            Err(CliError::failure(anyhow!("request failed with status {code}")))
        }
        Outcome::Failure { .. } => Err(CliError::failure(anyhow!("request failed"))),
    }
}

fn handle_resolve(args: &TargetArgs, format: OutputFormat) -> CliResult<()> {
    let target = args
        .descriptor()
        .resolve()
        .map_err(|err| CliError::validation(err.reason()))?;
    println!("{}", render_target(&target, format)?);
    Ok(())
}
